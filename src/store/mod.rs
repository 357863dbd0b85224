//! License persistence.

pub mod file;
pub mod record;

use crate::LicenseError;
use record::License;
use std::sync::Mutex;

/// Storage for the single license record of this machine.
pub trait LicenseStore: Send + Sync {
    /// Read the stored record.
    ///
    /// Missing, unreadable and corrupt records are all `None`.
    fn load(&self) -> Option<License>;

    /// Replace the stored record.
    fn store(&self, license: &License) -> Result<(), LicenseError>;

    /// Remove the stored record. Removing nothing succeeds.
    fn delete(&self) -> Result<(), LicenseError>;
}

/// In-memory store for tests and embedders that persist elsewhere.
#[derive(Debug, Default)]
pub struct MemoryStore {
    record: Mutex<Option<License>>,
}

impl MemoryStore {
    /// Empty store.
    pub fn new() -> Self {
        Self::default()
    }

    /// Store pre-seeded with `license`.
    pub fn with_license(license: License) -> Self {
        Self {
            record: Mutex::new(Some(license)),
        }
    }

    fn slot(&self) -> std::sync::MutexGuard<'_, Option<License>> {
        // A panic while holding the lock cannot leave a half-written record.
        self.record.lock().unwrap_or_else(|e| e.into_inner())
    }
}

impl LicenseStore for MemoryStore {
    fn load(&self) -> Option<License> {
        self.slot().clone()
    }

    fn store(&self, license: &License) -> Result<(), LicenseError> {
        *self.slot() = Some(license.clone());
        Ok(())
    }

    fn delete(&self) -> Result<(), LicenseError> {
        *self.slot() = None;
        Ok(())
    }
}
