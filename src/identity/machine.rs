//! Machine fingerprint used to bind a license to one machine/user.

use crate::crypto::digest::sha256_hex;
use crate::LicenseError;

/// Number of hex characters kept from the digest.
pub const FINGERPRINT_LEN: usize = 16;

/// Source of the current machine fingerprint.
pub trait MachineIdentity: Send + Sync {
    /// Compute the fingerprint for this machine and user.
    ///
    /// # Errors
    /// `MachineIdentity` if the underlying OS query fails.
    fn compute_id(&self) -> Result<String, LicenseError>;
}

/// Fingerprint derived from host name, user name and platform.
#[derive(Debug, Clone, Copy, Default)]
pub struct HostIdentity;

impl MachineIdentity for HostIdentity {
    fn compute_id(&self) -> Result<String, LicenseError> {
        let host = hostname::get()
            .map_err(|e| LicenseError::MachineIdentity(format!("host name: {}", e)))?
            .into_string()
            .map_err(|_| LicenseError::MachineIdentity("host name is not UTF-8".to_string()))?;

        let user = user_name(|var| std::env::var(var).ok()).ok_or_else(|| {
            LicenseError::MachineIdentity("could not determine the user name".to_string())
        })?;

        Ok(fingerprint(&host, &user, platform()))
    }
}

/// Environment variables consulted for the user name, in order.
pub const USER_VARS: [&str; 2] = ["USER", "USERNAME"];

/// Current user name: the first non-empty [`USER_VARS`] entry, else the OS
/// account database.
///
/// `env` looks up one variable.
pub fn user_name(env: impl Fn(&str) -> Option<String>) -> Option<String> {
    USER_VARS
        .iter()
        .filter_map(|var| env(*var))
        .find(|name| !name.is_empty())
        .or_else(account_name)
}

/// Login name of the real user id from the password database.
#[cfg(unix)]
pub fn account_name() -> Option<String> {
    use std::ffi::CStr;

    let uid = unsafe { libc::getuid() };
    let mut buf: Vec<libc::c_char> = vec![0; 1024];
    loop {
        let mut pwd: libc::passwd = unsafe { std::mem::zeroed() };
        let mut entry: *mut libc::passwd = std::ptr::null_mut();
        let rc = unsafe { libc::getpwuid_r(uid, &mut pwd, buf.as_mut_ptr(), buf.len(), &mut entry) };

        if rc == libc::ERANGE && buf.len() < 1 << 20 {
            buf.resize(buf.len() * 2, 0);
            continue;
        }
        if rc != 0 || entry.is_null() || pwd.pw_name.is_null() {
            tracing::debug!(uid, rc, "no password database entry for current user");
            return None;
        }

        // pw_name points into `buf`, which is still alive here.
        let name = unsafe { CStr::from_ptr(pwd.pw_name) };
        return name
            .to_str()
            .ok()
            .filter(|n| !n.is_empty())
            .map(str::to_string);
    }
}

/// No account database lookup on this platform; [`USER_VARS`] must be set.
#[cfg(not(unix))]
pub fn account_name() -> Option<String> {
    None
}

/// Fingerprint pinned to a known value, for tests and embedders that
/// already manage device identity.
#[derive(Debug, Clone)]
pub struct FixedIdentity(pub String);

impl MachineIdentity for FixedIdentity {
    fn compute_id(&self) -> Result<String, LicenseError> {
        Ok(self.0.clone())
    }
}

/// Hash `host-user-platform` down to [`FINGERPRINT_LEN`] hex characters.
pub fn fingerprint(host: &str, user: &str, platform: &str) -> String {
    let mut id = sha256_hex(&format!("{}-{}-{}", host, user, platform));
    id.truncate(FINGERPRINT_LEN);
    id
}

/// Platform tag mixed into the fingerprint.
///
/// Uses `darwin`/`win32` rather than Rust's target names so fingerprints
/// stay compatible with records written by earlier releases.
pub fn platform() -> &'static str {
    match std::env::consts::OS {
        "macos" => "darwin",
        "windows" => "win32",
        other => other,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn fingerprint_is_16_hex_chars() {
        let id = fingerprint("build-box", "dev", "linux");
        assert_eq!(id.len(), FINGERPRINT_LEN);
        assert!(id.chars().all(|c| c.is_ascii_hexdigit() && !c.is_ascii_uppercase()));
    }

    #[test]
    fn fingerprint_depends_on_every_component() {
        let base = fingerprint("build-box", "dev", "linux");
        assert_eq!(base, fingerprint("build-box", "dev", "linux"));
        assert_ne!(base, fingerprint("build-box2", "dev", "linux"));
        assert_ne!(base, fingerprint("build-box", "ops", "linux"));
        assert_ne!(base, fingerprint("build-box", "dev", "darwin"));
    }

    #[test]
    fn fingerprint_matches_digest_prefix() {
        let full = sha256_hex("h-u-linux");
        assert_eq!(fingerprint("h", "u", "linux"), full[..16]);
    }

    fn env_lock() -> std::sync::MutexGuard<'static, ()> {
        crate::TEST_ENV_LOCK
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
    }

    #[test]
    fn host_identity_is_deterministic() {
        let _guard = env_lock();
        let first = HostIdentity.compute_id().unwrap();
        assert_eq!(first, HostIdentity.compute_id().unwrap());
        assert_eq!(first.len(), FINGERPRINT_LEN);
    }

    #[test]
    fn user_name_prefers_environment() {
        let env = |var: &str| (var == "USER").then(|| "dev".to_string());
        assert_eq!(user_name(env).as_deref(), Some("dev"));

        let env = |var: &str| match var {
            "USER" => Some(String::new()),
            "USERNAME" => Some("ops".to_string()),
            _ => None,
        };
        assert_eq!(user_name(env).as_deref(), Some("ops"));
    }

    #[cfg(unix)]
    #[test]
    fn user_name_falls_back_to_account_database() {
        let name = user_name(|_| None);
        assert!(name.is_some());
        assert_eq!(name, account_name());
    }

    #[cfg(unix)]
    #[test]
    fn host_identity_without_user_variables() {
        let _guard = env_lock();
        let saved: Vec<_> = USER_VARS
            .iter()
            .map(|var| (*var, std::env::var_os(var)))
            .collect();
        for var in USER_VARS {
            std::env::remove_var(var);
        }

        let result = HostIdentity.compute_id();

        for (var, value) in saved {
            if let Some(value) = value {
                std::env::set_var(var, value);
            }
        }

        let host = hostname::get().unwrap().into_string().unwrap();
        let expected = fingerprint(&host, &account_name().unwrap(), platform());
        assert_eq!(result.unwrap(), expected);
    }

    #[test]
    fn platform_uses_legacy_names() {
        let p = platform();
        assert!(!p.is_empty());
        assert_ne!(p, "macos");
        assert_ne!(p, "windows");
    }

    #[test]
    fn fixed_identity_returns_value() {
        let id = FixedIdentity("deadbeef".to_string());
        assert_eq!(id.compute_id().unwrap(), "deadbeef");
    }
}
