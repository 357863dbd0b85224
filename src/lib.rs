//! # gitflow-license
//!
//! **License activation and validation for the GitFlow developer tooling.**
//!
//! A license key is bound to one machine, confirmed by the licensing
//! service, and cached in the user's home directory. Cached licenses are
//! trusted for 7 days; after that the client re-validates online and, if
//! the service cannot be reached, keeps honoring the cached plan in
//! offline mode.
//!
//! ## Quickstart
//!
//! ```no_run
//! use gitflow_license::{LicenseConfig, LicenseManager};
//!
//! fn main() -> Result<(), gitflow_license::LicenseError> {
//!     let manager = LicenseManager::new(LicenseConfig::from_env()?)?;
//!
//!     let check = manager.check_license()?;
//!     if !check.valid {
//!         eprintln!("{}", check.error.unwrap_or_default());
//!         std::process::exit(1);
//!     }
//!     Ok(())
//! }
//! ```
//!
//! ## Components
//!
//! - [`identity`] — machine fingerprint (`host-user-platform`, SHA-256, 16 hex chars)
//! - [`key`] — offline `CGFW-XXXX-XXXX-XXXX` syntax and checksum check
//! - [`store`] — the single on-disk license record
//! - [`client`] — `POST <api>/validate` round-trip
//! - [`policy`] — the validity decision and offline fallback
//!
//! Client-side licensing does not stop a determined attacker with access
//! to the binary; the checksum and fingerprint only keep honest users on
//! the happy path.

#![warn(missing_docs)]

// Core modules
pub mod clock;
pub mod config;
pub mod errors;

// Crypto layer
pub mod crypto;

// Leaf components
pub mod identity;
pub mod key;

// Protocol and client layer
pub mod client;
pub mod protocol;

// Storage layer
pub mod store;

// Policy layer
pub mod policy;

// Manager (main public API)
pub mod manager;

// Re-exports for public API
pub use client::{RemoteValidator, TransportError};
pub use clock::{Clock, SystemClock};
pub use config::LicenseConfig;
pub use errors::LicenseError;
pub use identity::machine::{FixedIdentity, HostIdentity, MachineIdentity};
pub use key::format::KeyFormat;
pub use manager::{Activation, LicenseManager, LicenseStatus};
pub use policy::decision::CheckResult;
pub use protocol::models::{LicenseResponse, Plan};
pub use store::record::License;
pub use store::{file::FileStore, LicenseStore, MemoryStore};

#[cfg(any(test, feature = "test-seams"))]
pub use clock::MockClock;

/// Serializes tests that read or mutate process environment variables.
#[cfg(test)]
pub(crate) static TEST_ENV_LOCK: std::sync::Mutex<()> = std::sync::Mutex::new(());
