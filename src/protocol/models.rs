//! Wire types for the licensing service.

use crate::client::TransportError;
use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Deserializer, Serialize};
use std::fmt;
use std::str::FromStr;

/// Commercial plan a license is issued for.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Plan {
    /// Time-limited evaluation.
    Trial,
    /// Single developer.
    Pro,
    /// Small team.
    Team,
    /// Organization-wide.
    Enterprise,
}

impl Plan {
    /// Lowercase wire name.
    pub fn as_str(&self) -> &'static str {
        match self {
            Plan::Trial => "trial",
            Plan::Pro => "pro",
            Plan::Team => "team",
            Plan::Enterprise => "enterprise",
        }
    }
}

impl fmt::Display for Plan {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Plan {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "trial" => Ok(Plan::Trial),
            "pro" => Ok(Plan::Pro),
            "team" => Ok(Plan::Team),
            "enterprise" => Ok(Plan::Enterprise),
            other => Err(format!("unknown plan: {}", other)),
        }
    }
}

/// Body of `POST /validate`.
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ValidateRequest<'a> {
    /// License key being validated.
    pub license_key: &'a str,
    /// Fingerprint of the requesting machine.
    pub machine_id: &'a str,
}

/// Response of `POST /validate`.
///
/// Optional fields may be omitted but not sent as `null`.
#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct LicenseResponse {
    /// Whether the server accepts the key for this machine.
    pub valid: bool,

    /// Plan the key was issued for.
    #[serde(default, deserialize_with = "deserialize_present")]
    pub plan: Option<Plan>,

    /// Expiry of the license.
    #[serde(default, deserialize_with = "deserialize_expiry")]
    pub expires_at: Option<DateTime<Utc>>,

    /// Feature codes unlocked by the plan. Informational only.
    #[serde(default, deserialize_with = "deserialize_present")]
    pub features: Option<Vec<String>>,

    /// Human-readable reason when `valid` is false.
    #[serde(default, deserialize_with = "deserialize_present")]
    pub error: Option<String>,
}

impl LicenseResponse {
    /// Plan and expiry, if the server accepted the key and sent both.
    pub fn grant(&self) -> Option<(Plan, DateTime<Utc>)> {
        match (self.valid, self.plan, self.expires_at) {
            (true, Some(plan), Some(expires_at)) => Some((plan, expires_at)),
            _ => None,
        }
    }
}

impl From<TransportError> for LicenseResponse {
    fn from(err: TransportError) -> Self {
        Self {
            valid: false,
            plan: None,
            expires_at: None,
            features: None,
            error: Some(err.to_string()),
        }
    }
}

/// Parse an ISO-8601 timestamp: full RFC 3339 or a bare `YYYY-MM-DD` date
/// (taken as midnight UTC).
pub fn parse_timestamp(s: &str) -> Option<DateTime<Utc>> {
    if let Ok(dt) = DateTime::parse_from_rfc3339(s) {
        return Some(dt.with_timezone(&Utc));
    }
    NaiveDate::parse_from_str(s, "%Y-%m-%d")
        .ok()
        .and_then(|d| d.and_hms_opt(0, 0, 0))
        .map(|naive| naive.and_utc())
}

// Only called for keys that are present; `default` covers absent ones.
fn deserialize_present<'de, D, T>(deserializer: D) -> Result<Option<T>, D::Error>
where
    D: Deserializer<'de>,
    T: Deserialize<'de>,
{
    T::deserialize(deserializer).map(Some)
}

fn deserialize_expiry<'de, D>(deserializer: D) -> Result<Option<DateTime<Utc>>, D::Error>
where
    D: Deserializer<'de>,
{
    let raw = String::deserialize(deserializer)?;
    parse_timestamp(&raw)
        .map(Some)
        .ok_or_else(|| serde::de::Error::custom(format!("invalid expiresAt: {}", raw)))
}

/// Parse a raw response body.
pub fn parse_license_response(body: &[u8]) -> Result<LicenseResponse, TransportError> {
    serde_json::from_slice(body).map_err(|e| TransportError::Malformed(e.to_string()))
}
