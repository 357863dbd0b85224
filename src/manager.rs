//! License Manager - the public API consumed by the CLI and installer.
//!
//! The `LicenseManager` wires the components together:
//! - Local key format and checksum checks
//! - Online activation against the licensing service
//! - A machine-bound license record with a 7-day offline grace period

use crate::client::http::HttpValidator;
use crate::client::RemoteValidator;
use crate::clock::{Clock, SystemClock};
use crate::config::LicenseConfig;
use crate::identity::machine::{HostIdentity, MachineIdentity};
use crate::key::format::KeyFormat;
use crate::policy::decision::{rejection, CheckResult, Decision, ValidationPolicy};
use crate::protocol::models::Plan;
use crate::store::file::FileStore;
use crate::store::record::License;
use crate::store::LicenseStore;
use crate::LicenseError;
use chrono::{DateTime, Utc};
use std::sync::Arc;

/// A successful activation.
#[derive(Debug, Clone)]
pub struct Activation {
    /// The record now stored on this machine.
    pub license: License,

    /// Feature codes reported by the server. Informational only.
    pub features: Vec<String>,
}

/// Stored record plus the current verdict, for status displays.
#[derive(Debug, Clone)]
pub struct LicenseStatus {
    /// The stored record, if any.
    pub license: Option<License>,

    /// Result of [`LicenseManager::check_license`].
    pub check: CheckResult,
}

/// Main license manager.
///
/// Create one instance per process and reuse it for all license operations.
pub struct LicenseManager {
    config: LicenseConfig,
    clock: Arc<dyn Clock>,
    identity: Arc<dyn MachineIdentity>,
    store: Arc<dyn LicenseStore>,
    validator: Arc<dyn RemoteValidator>,
    key_format: KeyFormat,
    policy: ValidationPolicy,
}

impl LicenseManager {
    /// Create a manager backed by the home-directory license file, the
    /// HTTPS validator, the host fingerprint and the system clock.
    ///
    /// # Errors
    /// Returns an error if:
    /// - Configuration validation fails
    /// - HTTP client creation fails
    pub fn new(config: LicenseConfig) -> Result<Self, LicenseError> {
        config.validate()?;
        let validator = HttpValidator::new(&config)?;
        let store = FileStore::new(config.license_file.clone());

        Self::with_components(
            config,
            Arc::new(SystemClock),
            Arc::new(HostIdentity),
            Arc::new(store),
            Arc::new(validator),
        )
    }

    /// Create a manager from explicit components.
    pub fn with_components(
        config: LicenseConfig,
        clock: Arc<dyn Clock>,
        identity: Arc<dyn MachineIdentity>,
        store: Arc<dyn LicenseStore>,
        validator: Arc<dyn RemoteValidator>,
    ) -> Result<Self, LicenseError> {
        config.validate()?;
        let key_format = KeyFormat::from_config(&config);
        let policy = ValidationPolicy::new(config.grace_period);

        Ok(Self {
            config,
            clock,
            identity,
            store,
            validator,
            key_format,
            policy,
        })
    }

    /// Decide whether the stored license may be used right now.
    ///
    /// Re-validates online once the grace period has passed and rewrites the
    /// stored record on success.
    ///
    /// # Errors
    /// Only unrecoverable problems: the machine fingerprint cannot be
    /// computed or the refreshed record cannot be written. Every licensing
    /// failure is reported through [`CheckResult`] instead.
    pub fn check_license(&self) -> Result<CheckResult, LicenseError> {
        let stored = self.store.load();
        let now = self.clock.now_utc();

        let decision = self.policy.evaluate(
            stored.as_ref(),
            self.identity.as_ref(),
            now,
            |license, machine_id| self.validator.validate_online(&license.key, machine_id),
        )?;

        if let Decision::Revalidated { license } = &decision {
            self.store.store(license)?;
            tracing::info!(plan = %license.plan, "license re-validated");
        }

        let result = CheckResult::from(&decision);
        tracing::debug!(valid = result.valid, offline = result.offline, "license checked");
        Ok(result)
    }

    /// Activate `key` on this machine.
    ///
    /// The key is checked locally first; malformed keys never reach the
    /// network. On success the record replaces any previous activation.
    pub fn activate(&self, key: &str) -> Result<Activation, LicenseError> {
        let key = key.trim();
        self.key_format.check(key)?;

        let machine_id = self.identity.compute_id()?;
        let response = self.validator.validate_online(key, &machine_id)?;

        let Some((plan, expires_at)) = response.grant() else {
            return Err(rejection(&response));
        };

        let license = self.save(key, plan, expires_at)?;
        tracing::info!(plan = %plan, expires_at = %expires_at, "license activated");

        Ok(Activation {
            license,
            features: response.features.unwrap_or_default(),
        })
    }

    /// Remove the activation from this machine.
    pub fn deactivate(&self) -> Result<(), LicenseError> {
        self.delete()?;
        tracing::info!("license deactivated");
        Ok(())
    }

    /// Store a license for this machine, stamped with the current time and
    /// fingerprint.
    pub fn save(
        &self,
        key: &str,
        plan: Plan,
        expires_at: DateTime<Utc>,
    ) -> Result<License, LicenseError> {
        let machine_id = self.identity.compute_id()?;
        let license = License::issue(key, plan, expires_at, machine_id, self.clock.as_ref());
        self.store.store(&license)?;
        Ok(license)
    }

    /// The stored license, if a readable one exists.
    pub fn load(&self) -> Option<License> {
        self.store.load()
    }

    /// Delete the stored license. Deleting nothing succeeds.
    pub fn delete(&self) -> Result<(), LicenseError> {
        self.store.delete()
    }

    /// Stored record together with the current check result.
    pub fn status(&self) -> Result<LicenseStatus, LicenseError> {
        let check = self.check_license()?;
        Ok(LicenseStatus {
            license: self.load(),
            check,
        })
    }

    /// Local key validator.
    pub fn key_format(&self) -> &KeyFormat {
        &self.key_format
    }

    /// Get the current configuration.
    pub fn config(&self) -> &LicenseConfig {
        &self.config
    }
}
