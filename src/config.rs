//! Client configuration.

use crate::LicenseError;
use reqwest::Url;
use std::path::PathBuf;
use std::time::Duration;

/// Production licensing endpoint.
pub const DEFAULT_API_URL: &str = "https://api.atlashub.ch/api/licenses";

/// Environment variable that overrides [`DEFAULT_API_URL`].
pub const API_URL_ENV: &str = "LICENSE_API_URL";

/// File name of the license record inside the home directory.
pub const LICENSE_FILE_NAME: &str = ".claude-gitflow-license.json";

/// How long a validated license is trusted without a network check.
pub const DEFAULT_GRACE_PERIOD: Duration = Duration::from_secs(7 * 24 * 60 * 60);

/// Configuration for license activation and validation.
#[derive(Debug, Clone)]
pub struct LicenseConfig {
    /// Application name, sent in the User-Agent.
    pub app_name: &'static str,

    /// Fixed tag every key starts with (the `CGFW` in `CGFW-XXXX-XXXX-XXXX`).
    pub key_prefix: &'static str,

    /// Shared secret mixed into the key checksum.
    pub checksum_secret: &'static str,

    /// Base URL of the licensing service; `/validate` is appended.
    pub api_url: String,

    /// Location of the machine-wide license record.
    pub license_file: PathBuf,

    /// Window during which a validated license needs no network check.
    pub grace_period: Duration,

    /// Upper bound on one validation round-trip.
    pub request_timeout: Duration,
}

impl LicenseConfig {
    /// Build the default configuration, honoring `LICENSE_API_URL`.
    ///
    /// # Errors
    /// `ConfigError` if the home directory cannot be determined.
    pub fn from_env() -> Result<Self, LicenseError> {
        let home = dirs::home_dir().ok_or_else(|| {
            LicenseError::ConfigError("Could not find home directory".to_string())
        })?;

        let api_url = std::env::var(API_URL_ENV)
            .ok()
            .map(|v| v.trim().to_string())
            .filter(|v| !v.is_empty())
            .unwrap_or_else(|| DEFAULT_API_URL.to_string());

        Ok(Self::with_paths(api_url, home.join(LICENSE_FILE_NAME)))
    }

    /// Default product settings with an explicit endpoint and record path.
    pub fn with_paths(api_url: impl Into<String>, license_file: PathBuf) -> Self {
        Self {
            app_name: concat!("gitflow-license/", env!("CARGO_PKG_VERSION")),
            key_prefix: "CGFW",
            checksum_secret: "atlashub-cgf-2024",
            api_url: api_url.into(),
            license_file,
            grace_period: DEFAULT_GRACE_PERIOD,
            request_timeout: Duration::from_secs(30),
        }
    }

    /// Validate configuration for obvious errors.
    pub fn validate(&self) -> Result<(), LicenseError> {
        if self.key_prefix.is_empty()
            || !self
                .key_prefix
                .chars()
                .all(|c| c.is_ascii_uppercase() || c.is_ascii_digit())
        {
            return Err(LicenseError::ConfigError(format!(
                "key_prefix must be uppercase alphanumeric, got {:?}",
                self.key_prefix
            )));
        }
        if self.checksum_secret.is_empty() {
            return Err(LicenseError::ConfigError(
                "checksum_secret cannot be empty".to_string(),
            ));
        }

        let url = Url::parse(&self.api_url).map_err(|e| {
            LicenseError::ConfigError(format!("api_url {:?} is not a URL: {}", self.api_url, e))
        })?;
        let loopback = matches!(url.host_str(), Some("localhost" | "127.0.0.1" | "[::1]"));
        match url.scheme() {
            "https" => {}
            "http" if loopback => {}
            other => {
                return Err(LicenseError::ConfigError(format!(
                    "api_url must use https, got {}",
                    other
                )))
            }
        }

        if self.license_file.as_os_str().is_empty() {
            return Err(LicenseError::ConfigError(
                "license_file cannot be empty".to_string(),
            ));
        }
        Ok(())
    }

    /// Full URL of the validation action.
    pub fn validate_url(&self) -> String {
        format!("{}/validate", self.api_url.trim_end_matches('/'))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn config(url: &str) -> LicenseConfig {
        LicenseConfig::with_paths(url, PathBuf::from("/tmp/license.json"))
    }

    #[test]
    fn test_default_config_is_valid() {
        let config = config(DEFAULT_API_URL);
        assert!(config.validate().is_ok());
        assert_eq!(config.grace_period, Duration::from_secs(604_800));
        assert_eq!(config.key_prefix, "CGFW");
    }

    #[test]
    fn test_validate_url_joins_action() {
        assert_eq!(
            config("https://licenses.example.com/api/").validate_url(),
            "https://licenses.example.com/api/validate"
        );
        assert_eq!(
            config(DEFAULT_API_URL).validate_url(),
            "https://api.atlashub.ch/api/licenses/validate"
        );
    }

    #[test]
    fn test_plain_http_only_on_loopback() {
        assert!(config("http://127.0.0.1:8080").validate().is_ok());
        assert!(config("http://localhost:9000/api").validate().is_ok());
        assert!(matches!(
            config("http://licenses.example.com").validate(),
            Err(LicenseError::ConfigError(_))
        ));
    }

    #[test]
    fn test_rejects_garbage_url() {
        assert!(matches!(
            config("not a url").validate(),
            Err(LicenseError::ConfigError(_))
        ));
    }

    fn with_api_env<T>(value: Option<&str>, f: impl FnOnce() -> T) -> T {
        let _guard = crate::TEST_ENV_LOCK
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner());
        let saved = std::env::var_os(API_URL_ENV);
        match value {
            Some(v) => std::env::set_var(API_URL_ENV, v),
            None => std::env::remove_var(API_URL_ENV),
        }

        let out = f();

        match saved {
            Some(v) => std::env::set_var(API_URL_ENV, v),
            None => std::env::remove_var(API_URL_ENV),
        }
        out
    }

    #[test]
    fn test_from_env_defaults() {
        let config = with_api_env(None, LicenseConfig::from_env).unwrap();
        assert_eq!(config.api_url, DEFAULT_API_URL);
        assert!(config.license_file.ends_with(LICENSE_FILE_NAME));
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_from_env_honors_override() {
        let config = with_api_env(Some("  https://staging.example.com/api/licenses "), || {
            LicenseConfig::from_env()
        })
        .unwrap();

        assert_eq!(config.api_url, "https://staging.example.com/api/licenses");
        assert_eq!(
            config.validate_url(),
            "https://staging.example.com/api/licenses/validate"
        );
    }

    #[test]
    fn test_from_env_ignores_blank_override() {
        for blank in ["", "   "] {
            let config = with_api_env(Some(blank), LicenseConfig::from_env).unwrap();
            assert_eq!(config.api_url, DEFAULT_API_URL);
        }
    }

    #[test]
    fn test_rejects_lowercase_prefix() {
        let mut config = config(DEFAULT_API_URL);
        config.key_prefix = "cgfw";
        assert!(config.validate().is_err());
    }
}
