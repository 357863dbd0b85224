//! Reqwest-based client for the licensing service.

use crate::client::{RemoteValidator, TransportError};
use crate::config::LicenseConfig;
use crate::protocol::models::{parse_license_response, LicenseResponse, ValidateRequest};
use crate::LicenseError;
use reqwest::blocking::Client;
use reqwest::header::{ACCEPT, USER_AGENT};
use std::time::Duration;

/// HTTPS validator for `POST <api_url>/validate`.
pub struct HttpValidator {
    client: Client,
    url: String,
    user_agent: String,
}

impl HttpValidator {
    /// Create a validator from config.
    pub fn new(config: &LicenseConfig) -> Result<Self, LicenseError> {
        let client = build_client(config.request_timeout)?;
        Ok(Self {
            client,
            url: config.validate_url(),
            user_agent: build_user_agent(config),
        })
    }

    /// Replace the request timeout.
    pub fn try_with_timeout(mut self, timeout: Duration) -> Result<Self, LicenseError> {
        self.client = build_client(timeout)?;
        Ok(self)
    }

    /// Full URL requests are sent to.
    pub fn url(&self) -> &str {
        &self.url
    }
}

impl RemoteValidator for HttpValidator {
    fn validate_online(
        &self,
        license_key: &str,
        machine_id: &str,
    ) -> Result<LicenseResponse, TransportError> {
        let body = ValidateRequest {
            license_key,
            machine_id,
        };

        tracing::debug!(url = %self.url, machine_id, "validating license online");

        let response = self
            .client
            .post(&self.url)
            .header(USER_AGENT, &self.user_agent)
            .header(ACCEPT, "application/json")
            .json(&body)
            .send()
            .map_err(|e| TransportError::Unreachable(e.to_string()))?;

        let status = response.status();
        if status.is_server_error() {
            return Err(TransportError::Unreachable(format!("HTTP {}", status)));
        }

        let bytes = response
            .bytes()
            .map_err(|e| TransportError::Unreachable(format!("Failed to read body: {}", e)))?;

        parse_license_response(&bytes)
    }
}

fn build_client(timeout: Duration) -> Result<Client, LicenseError> {
    Client::builder()
        .timeout(timeout)
        .build()
        .map_err(|e| LicenseError::ConfigError(format!("Failed to build HTTP client: {}", e)))
}

/// Build a User-Agent string from config.
///
/// Format: `<app>/<version> (<os>)`
pub fn build_user_agent(config: &LicenseConfig) -> String {
    format!("{} ({})", config.app_name, std::env::consts::OS)
}
