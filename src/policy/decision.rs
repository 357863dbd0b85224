//! License validity decision.
//!
//! Checks run in a fixed order and the first match wins:
//! 1. no stored record
//! 2. expired (`expiresAt <= now`)
//! 3. fingerprint mismatch
//! 4. validated within the grace period: trusted, no network
//! 5. otherwise re-validate online; only an unreachable server falls back
//!    to the cached plan

use crate::client::TransportError;
use crate::identity::machine::MachineIdentity;
use crate::protocol::models::{LicenseResponse, Plan};
use crate::store::record::License;
use crate::LicenseError;
use chrono::{DateTime, Utc};
use serde::Serialize;
use std::time::Duration;

/// Outcome of evaluating the stored license.
#[derive(Debug)]
pub enum Decision {
    /// Validated recently enough to skip the network.
    Fresh {
        /// Cached plan.
        plan: Plan,
    },

    /// Server confirmed the license; the refreshed record must be stored.
    Revalidated {
        /// Record to persist.
        license: License,
    },

    /// Server unreachable past the grace period; cached plan is trusted.
    Offline {
        /// Cached plan.
        plan: Plan,
        /// Transport failure that triggered the fallback.
        reason: String,
    },

    /// License is not usable.
    Denied(LicenseError),
}

/// Applies the grace-period rules to a stored license.
#[derive(Debug, Clone, Copy)]
pub struct ValidationPolicy {
    grace_period: Duration,
}

impl ValidationPolicy {
    /// Policy with the given grace period.
    pub fn new(grace_period: Duration) -> Self {
        Self { grace_period }
    }

    /// The grace period.
    pub fn grace_period(&self) -> Duration {
        self.grace_period
    }

    /// Whether a license validated at `validated_at` needs no network check.
    ///
    /// A `validated_at` in the future counts as fresh.
    pub fn is_fresh(&self, license: &License, now: DateTime<Utc>) -> bool {
        match license.since_validation(now).to_std() {
            Ok(age) => age < self.grace_period,
            Err(_) => true,
        }
    }

    /// Decide whether `stored` is usable at `now`.
    ///
    /// `revalidate` is only invoked for a stale license, with the license and
    /// the current fingerprint.
    ///
    /// # Errors
    /// Only fatal errors from `identity`.
    pub fn evaluate<F>(
        &self,
        stored: Option<&License>,
        identity: &dyn MachineIdentity,
        now: DateTime<Utc>,
        revalidate: F,
    ) -> Result<Decision, LicenseError>
    where
        F: FnOnce(&License, &str) -> Result<LicenseResponse, TransportError>,
    {
        let Some(license) = stored else {
            return Ok(Decision::Denied(LicenseError::NoLicense));
        };

        if license.is_expired_at(now) {
            return Ok(Decision::Denied(LicenseError::Expired));
        }

        let machine_id = identity.compute_id()?;
        if license.machine_id != machine_id {
            return Ok(Decision::Denied(LicenseError::MachineMismatch));
        }

        if self.is_fresh(license, now) {
            return Ok(Decision::Fresh { plan: license.plan });
        }

        tracing::info!(validated_at = %license.validated_at, "license past grace period, re-validating");

        let decision = match revalidate(license, &machine_id) {
            Ok(response) => match response.grant() {
                Some((plan, expires_at)) => Decision::Revalidated {
                    license: License {
                        key: license.key.clone(),
                        plan,
                        expires_at,
                        validated_at: now.max(license.validated_at),
                        machine_id,
                    },
                },
                None => Decision::Denied(rejection(&response)),
            },
            Err(TransportError::Unreachable(reason)) => {
                tracing::warn!(%reason, "could not validate online, using cached license");
                Decision::Offline {
                    plan: license.plan,
                    reason,
                }
            }
            Err(TransportError::Malformed(detail)) => {
                Decision::Denied(LicenseError::MalformedResponse(detail))
            }
        };
        Ok(decision)
    }
}

/// Error for a response that does not grant the license.
pub fn rejection(response: &LicenseResponse) -> LicenseError {
    if response.valid {
        return LicenseError::MalformedResponse(
            "response is missing plan or expiresAt".to_string(),
        );
    }
    LicenseError::ServerRejected(
        response
            .error
            .clone()
            .unwrap_or_else(|| "License validation failed".to_string()),
    )
}

/// Result of a license check, as surfaced to the CLI and collaborators.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct CheckResult {
    /// Whether the gated functionality may run.
    pub valid: bool,

    /// Plan in effect, when valid.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub plan: Option<Plan>,

    /// Why the license is not valid.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,

    /// Set when validity rests on a cached record because the server was
    /// unreachable.
    #[serde(skip_serializing_if = "std::ops::Not::not")]
    pub offline: bool,

    /// Suggested next step for the user.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub remediation: Option<&'static str>,
}

impl CheckResult {
    /// A passing check.
    pub fn granted(plan: Plan) -> Self {
        Self {
            valid: true,
            plan: Some(plan),
            error: None,
            offline: false,
            remediation: None,
        }
    }

    /// A failing check.
    pub fn denied(err: &LicenseError) -> Self {
        Self {
            valid: false,
            plan: None,
            error: Some(err.to_string()),
            offline: false,
            remediation: err.remediation(),
        }
    }
}

impl From<&Decision> for CheckResult {
    fn from(decision: &Decision) -> Self {
        match decision {
            Decision::Fresh { plan } => Self::granted(*plan),
            Decision::Revalidated { license } => Self::granted(license.plan),
            Decision::Offline { plan, .. } => Self {
                offline: true,
                ..Self::granted(*plan)
            },
            Decision::Denied(err) => Self::denied(err),
        }
    }
}
