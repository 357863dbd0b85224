//! SHA-256 digests used for fingerprints and key checksums.

use base64::{engine::general_purpose::STANDARD, Engine};
use sha2::{Digest, Sha256};

/// Lowercase hex SHA-256 of `input`.
pub fn sha256_hex(input: &str) -> String {
    hex::encode(Sha256::digest(input.as_bytes()))
}

/// SHA-256 of `input`, base64-encoded, reduced to uppercase alphanumerics.
///
/// `+`, `/` and `=` are dropped before uppercasing, so the result only
/// contains `[A-Z0-9]`.
pub fn sha256_alnum(input: &str) -> String {
    STANDARD
        .encode(Sha256::digest(input.as_bytes()))
        .chars()
        .filter(|c| !matches!(c, '+' | '/' | '='))
        .map(|c| c.to_ascii_uppercase())
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_sha256_hex_empty() {
        assert_eq!(
            sha256_hex(""),
            "e3b0c44298fc1c149afbf4c8996fb92427ae41e4649b934ca495991b7852b855"
        );
    }

    #[test]
    fn test_sha256_alnum_known_value() {
        // base64: 47DEQpj8HBSa+/TImW+5JCeuQeRkm5NMpJWZG3hSuFU=
        assert_eq!(sha256_alnum(""), "47DEQPJ8HBSATIMW5JCEUQERKM5NMPJWZG3HSUFU");
    }

    #[test]
    fn test_sha256_alnum_alphabet() {
        let out = sha256_alnum("Hello, World!");
        assert!(out.len() >= 4);
        assert!(out
            .chars()
            .all(|c| c.is_ascii_uppercase() || c.is_ascii_digit()));
    }
}
