//! Remote validation against the licensing service.

pub mod http;

use crate::protocol::models::LicenseResponse;
use crate::LicenseError;
use thiserror::Error;

/// Why a validation round-trip produced no usable answer.
///
/// A server that answers `valid: false` is *not* a transport error; that
/// arrives as an `Ok(LicenseResponse)`.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum TransportError {
    /// Timeout, DNS failure, refused connection or a 5xx status.
    #[error("Connection error: {0}")]
    Unreachable(String),

    /// The server answered with a body that fails schema validation.
    #[error("Malformed response: {0}")]
    Malformed(String),
}

impl From<TransportError> for LicenseError {
    fn from(err: TransportError) -> Self {
        match err {
            TransportError::Unreachable(_) => LicenseError::NetworkUnavailable(err.to_string()),
            TransportError::Malformed(detail) => LicenseError::MalformedResponse(detail),
        }
    }
}

/// Performs the validation round-trip.
pub trait RemoteValidator: Send + Sync {
    /// Ask the service whether `license_key` is valid for `machine_id`.
    fn validate_online(
        &self,
        license_key: &str,
        machine_id: &str,
    ) -> Result<LicenseResponse, TransportError>;
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn unreachable_maps_to_network_unavailable() {
        let err: LicenseError = TransportError::Unreachable("timed out".into()).into();
        assert!(matches!(err, LicenseError::NetworkUnavailable(_)));
        assert_eq!(err.to_string(), "Connection error: timed out");
    }

    #[test]
    fn malformed_maps_to_malformed_response() {
        let err: LicenseError = TransportError::Malformed("missing field `valid`".into()).into();
        assert_eq!(
            err.to_string(),
            "Invalid response from license server: missing field `valid`"
        );
    }
}
