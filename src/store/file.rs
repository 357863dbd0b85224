//! File-based license store with atomic writes.
//!
//! Stores the record at a single machine-wide path (by default
//! `~/.claude-gitflow-license.json`). Uses temp file + rename for atomic
//! writes.

use crate::store::record::License;
use crate::store::LicenseStore;
use crate::LicenseError;
use std::fs;
use std::io::ErrorKind;
use std::path::{Path, PathBuf};

/// License store backed by one JSON file.
#[derive(Debug, Clone)]
pub struct FileStore {
    path: PathBuf,
}

impl FileStore {
    /// Create a store for the given file path.
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    /// Location of the license file.
    pub fn path(&self) -> &Path {
        &self.path
    }

    fn temp_path(&self) -> PathBuf {
        let mut name = self
            .path
            .file_name()
            .map(|n| n.to_os_string())
            .unwrap_or_default();
        name.push(".tmp");
        self.path.with_file_name(name)
    }
}

impl LicenseStore for FileStore {
    fn load(&self) -> Option<License> {
        let json = match fs::read_to_string(&self.path) {
            Ok(json) => json,
            Err(e) if e.kind() == ErrorKind::NotFound => return None,
            Err(e) => {
                tracing::warn!(path = %self.path.display(), error = %e, "license file unreadable");
                return None;
            }
        };

        match License::from_json(&json) {
            Ok(license) => Some(license),
            Err(e) => {
                tracing::warn!(path = %self.path.display(), error = %e, "ignoring corrupt license file");
                None
            }
        }
    }

    fn store(&self, license: &License) -> Result<(), LicenseError> {
        if let Some(parent) = self.path.parent().filter(|p| !p.as_os_str().is_empty()) {
            fs::create_dir_all(parent).map_err(|e| {
                LicenseError::StoreIO(format!("Failed to create {}: {}", parent.display(), e))
            })?;
        }

        let json = license.to_json()?;
        let temp_path = self.temp_path();

        fs::write(&temp_path, json)
            .map_err(|e| LicenseError::StoreIO(format!("Failed to write temp file: {}", e)))?;

        fs::rename(&temp_path, &self.path).map_err(|e| {
            let _ = fs::remove_file(&temp_path);
            LicenseError::StoreIO(format!("Failed to rename license file: {}", e))
        })?;

        tracing::debug!(path = %self.path.display(), "license record written");
        Ok(())
    }

    fn delete(&self) -> Result<(), LicenseError> {
        match fs::remove_file(&self.path) {
            Ok(()) => Ok(()),
            Err(e) if e.kind() == ErrorKind::NotFound => Ok(()),
            Err(e) => Err(LicenseError::StoreIO(format!(
                "Failed to delete license file: {}",
                e
            ))),
        }
    }
}
