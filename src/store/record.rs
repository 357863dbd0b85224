//! Persisted license record.
//!
//! One record per machine, stored as JSON:
//! `{key, plan, expiresAt, validatedAt, machineId}`. Unknown or missing
//! fields make the whole record unreadable, which callers treat as "no
//! license".
//!
//! Timestamps are written as RFC 3339. Reading also accepts a bare
//! `YYYY-MM-DD`, since older records hold the server's `expiresAt` verbatim.

use crate::clock::Clock;
use crate::protocol::models::{parse_timestamp, Plan};
use crate::LicenseError;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Deserializer, Serialize};

/// The activated license for this machine.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", deny_unknown_fields)]
pub struct License {
    /// Canonical license key.
    pub key: String,

    /// Plan granted by the server.
    pub plan: Plan,

    /// The license is void at or after this instant.
    #[serde(deserialize_with = "deserialize_timestamp")]
    pub expires_at: DateTime<Utc>,

    /// Last successful online validation.
    #[serde(deserialize_with = "deserialize_timestamp")]
    pub validated_at: DateTime<Utc>,

    /// Fingerprint of the machine that activated the license.
    pub machine_id: String,
}

impl License {
    /// Stamp a freshly validated license with the current time and machine.
    pub fn issue(
        key: impl Into<String>,
        plan: Plan,
        expires_at: DateTime<Utc>,
        machine_id: impl Into<String>,
        clock: &dyn Clock,
    ) -> Self {
        Self {
            key: key.into(),
            plan,
            expires_at,
            validated_at: clock.now_utc(),
            machine_id: machine_id.into(),
        }
    }

    /// Whether the license is void at `now`.
    pub fn is_expired_at(&self, now: DateTime<Utc>) -> bool {
        self.expires_at <= now
    }

    /// Time elapsed since the last successful validation.
    pub fn since_validation(&self, now: DateTime<Utc>) -> chrono::Duration {
        now.signed_duration_since(self.validated_at)
    }

    /// Abbreviated machine id for display.
    pub fn short_machine_id(&self) -> &str {
        let end = self
            .machine_id
            .char_indices()
            .nth(8)
            .map_or(self.machine_id.len(), |(i, _)| i);
        &self.machine_id[..end]
    }

    /// Serialize the record to JSON.
    pub fn to_json(&self) -> Result<String, LicenseError> {
        serde_json::to_string_pretty(self)
            .map_err(|e| LicenseError::StoreIO(format!("Failed to serialize license: {}", e)))
    }

    /// Deserialize a record from JSON.
    pub fn from_json(json: &str) -> Result<Self, serde_json::Error> {
        serde_json::from_str(json)
    }
}

fn deserialize_timestamp<'de, D>(deserializer: D) -> Result<DateTime<Utc>, D::Error>
where
    D: Deserializer<'de>,
{
    let raw = String::deserialize(deserializer)?;
    parse_timestamp(&raw)
        .ok_or_else(|| serde::de::Error::custom(format!("invalid timestamp: {}", raw)))
}
