//! License error types.

use thiserror::Error;

/// Errors that can occur during license activation and validation.
///
/// The `Display` text of the policy variants (`NoLicense`, `Expired`,
/// `MachineMismatch`) is surfaced verbatim to users and collaborators.
#[derive(Debug, Error)]
pub enum LicenseError {
    /// Configuration is invalid.
    #[error("Configuration error: {0}")]
    ConfigError(String),

    /// Key does not match `PREFIX-XXXX-XXXX-XXXX`.
    #[error("Invalid license key format")]
    InvalidFormat,

    /// Key is well-formed but its checksum segment does not match.
    #[error("Invalid license key")]
    ChecksumMismatch,

    /// No license record is stored on this machine.
    #[error("No license found")]
    NoLicense,

    /// Stored license is at or past its expiry.
    #[error("License expired")]
    Expired,

    /// Stored license was activated on another machine.
    #[error("License registered to a different machine")]
    MachineMismatch,

    /// License server answered and refused the key.
    #[error("{0}")]
    ServerRejected(String),

    /// License server could not be reached.
    #[error("{0}")]
    NetworkUnavailable(String),

    /// License server answered with a body that does not fit the protocol.
    #[error("Invalid response from license server: {0}")]
    MalformedResponse(String),

    /// License file could not be written or removed.
    #[error("License store I/O error: {0}")]
    StoreIO(String),

    /// Machine fingerprint could not be derived.
    #[error("Could not determine machine identity: {0}")]
    MachineIdentity(String),
}

impl LicenseError {
    /// Suggested next step for the user, if there is one.
    pub fn remediation(&self) -> Option<&'static str> {
        match self {
            Self::InvalidFormat | Self::ChecksumMismatch => {
                Some("Check the key and try again. Expected format: CGFW-XXXX-XXXX-XXXX")
            }
            Self::NoLicense | Self::MachineMismatch => {
                Some("Run `gitflow-license activate <KEY>` with a valid key")
            }
            Self::Expired | Self::ServerRejected(_) => {
                Some("Renew your license, then run `gitflow-license activate <KEY>`")
            }
            Self::NetworkUnavailable(_) | Self::MalformedResponse(_) => {
                Some("Check your connection or LICENSE_API_URL and try again")
            }
            Self::ConfigError(_) | Self::StoreIO(_) | Self::MachineIdentity(_) => None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn policy_messages_are_stable() {
        assert_eq!(LicenseError::NoLicense.to_string(), "No license found");
        assert_eq!(LicenseError::Expired.to_string(), "License expired");
        assert_eq!(
            LicenseError::MachineMismatch.to_string(),
            "License registered to a different machine"
        );
    }

    #[test]
    fn server_messages_pass_through() {
        let err = LicenseError::ServerRejected("License revoked".to_string());
        assert_eq!(err.to_string(), "License revoked");
    }

    #[test]
    fn fatal_errors_have_no_remediation() {
        assert!(LicenseError::StoreIO("disk full".into()).remediation().is_none());
        assert!(LicenseError::NoLicense.remediation().is_some());
    }
}
