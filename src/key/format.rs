//! Offline license-key syntax and checksum validation.
//!
//! Keys look like `CGFW-7K2P-Q9XM-ABCD`. The last segment is derived from
//! the two middle segments and a shared secret, so typos and guessed keys
//! are rejected before any request is made.

use crate::config::LicenseConfig;
use crate::crypto::digest::sha256_alnum;
use crate::LicenseError;
use once_cell::sync::Lazy;
use regex::Regex;

static KEY_PATTERN: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"^([A-Z0-9]+)-([A-Z0-9]{4})-([A-Z0-9]{4})-([A-Z0-9]{4})$")
        .expect("key pattern is a valid regex")
});

/// Length of every key segment after the prefix.
pub const SEGMENT_LEN: usize = 4;

/// Key validator bound to one product prefix and checksum secret.
#[derive(Debug, Clone)]
pub struct KeyFormat {
    prefix: &'static str,
    secret: &'static str,
}

impl KeyFormat {
    /// Create a validator for the given prefix and secret.
    pub fn new(prefix: &'static str, secret: &'static str) -> Self {
        Self { prefix, secret }
    }

    /// Create a validator from client configuration.
    pub fn from_config(config: &LicenseConfig) -> Self {
        Self::new(config.key_prefix, config.checksum_secret)
    }

    /// Whether `key` is well-formed and carries a matching checksum.
    pub fn validate(&self, key: &str) -> bool {
        self.check(key).is_ok()
    }

    /// Like [`validate`](Self::validate), but says which check failed.
    pub fn check(&self, key: &str) -> Result<(), LicenseError> {
        let caps = KEY_PATTERN
            .captures(key)
            .ok_or(LicenseError::InvalidFormat)?;

        if &caps[1] != self.prefix {
            return Err(LicenseError::InvalidFormat);
        }

        if caps[4] != self.checksum(&caps[2], &caps[3]) {
            return Err(LicenseError::ChecksumMismatch);
        }

        Ok(())
    }

    /// Checksum segment for the given middle segments.
    pub fn checksum(&self, second: &str, third: &str) -> String {
        let mut digest = sha256_alnum(&format!("{}{}{}", second, third, self.secret));
        digest.truncate(SEGMENT_LEN);
        digest
    }

    /// Expected shape, for error messages.
    pub fn template(&self) -> String {
        format!("{}-XXXX-XXXX-XXXX", self.prefix)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn format() -> KeyFormat {
        KeyFormat::new("CGFW", "atlashub-cgf-2024")
    }

    fn valid_key(second: &str, third: &str) -> String {
        let checksum = format().checksum(second, third);
        format!("CGFW-{}-{}-{}", second, third, checksum)
    }

    #[test]
    fn test_accepts_key_with_matching_checksum() {
        let key = valid_key("7K2P", "Q9XM");
        assert!(format().validate(&key), "{key} should validate");
    }

    #[test]
    fn test_checksum_is_uppercase_alnum() {
        let checksum = format().checksum("AAAA", "0000");
        assert_eq!(checksum.len(), 4);
        assert!(checksum
            .chars()
            .all(|c| c.is_ascii_uppercase() || c.is_ascii_digit()));
    }

    #[test]
    fn test_rejects_malformed_input() {
        let f = format();
        for key in [
            "",
            "CGFW",
            "CGFW-AAAA-BBBB",
            "CGFW-AAAA-BBBB-CCCC-DDDD",
            "CGFW-AAA-BBBB-CCCC",
            "CGFW-AAAAA-BBBB-CCCC",
            "cgfw-aaaa-bbbb-cccc",
            "CGFW_AAAA_BBBB_CCCC",
            " CGFW-AAAA-BBBB-CCCC",
            "CGFW-AAAA-BBBB-CCC\u{e9}",
            "CGFW-AA+A-BBBB-CCCC",
        ] {
            assert!(!f.validate(key), "{key:?} should be rejected");
            assert!(matches!(f.check(key), Err(LicenseError::InvalidFormat)));
        }
    }

    #[test]
    fn test_rejects_other_prefix() {
        let key = valid_key("7K2P", "Q9XM").replacen("CGFW", "ABCD", 1);
        assert!(matches!(format().check(&key), Err(LicenseError::InvalidFormat)));
    }

    #[test]
    fn test_every_checksum_mutation_is_rejected() {
        let f = format();
        let key = valid_key("7K2P", "Q9XM");
        let checksum_start = key.len() - SEGMENT_LEN;
        let alphabet = "ABCDEFGHIJKLMNOPQRSTUVWXYZ0123456789";

        for pos in checksum_start..key.len() {
            let original = key.as_bytes()[pos] as char;
            for replacement in alphabet.chars().filter(|c| *c != original) {
                let mut mutated = key.clone();
                mutated.replace_range(pos..pos + 1, &replacement.to_string());
                assert!(
                    matches!(f.check(&mutated), Err(LicenseError::ChecksumMismatch)),
                    "{mutated} should fail the checksum"
                );
            }
        }
    }

    #[test]
    fn test_middle_segment_mutation_is_rejected() {
        let key = valid_key("7K2P", "Q9XM");
        let mutated = key.replacen("7K2P", "7K2Q", 1);
        assert!(!format().validate(&mutated));
    }

    #[test]
    fn test_secret_binds_checksum() {
        let key = valid_key("7K2P", "Q9XM");
        assert!(!KeyFormat::new("CGFW", "another-secret").validate(&key));
    }

    #[test]
    fn test_template() {
        assert_eq!(format().template(), "CGFW-XXXX-XXXX-XXXX");
    }
}
