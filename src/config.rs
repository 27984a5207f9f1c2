//! Run configuration: the target network profile plus loop timing.
//!
//! Loaded once from a TOML file at process start and immutable for the run.
//! Every field has a default, so a missing config file yields a profile that
//! classifies every network as non-target and touches nothing.

use std::path::{Path, PathBuf};
use std::time::Duration;

use serde::Deserialize;

use crate::error::{NetwatchError, Result};
use crate::identity::normalize_mac;

/// Immutable configuration for one netwatch run.
///
/// # Example
///
/// ```toml
/// match_ips = ["192.168.31.1"]
/// match_mac = "a4:b1:c1:d2:e3:f4"
/// require_mac = true
/// dns_server = "192.168.31.53"
/// proxy_app = "Sparkle"
/// vpn_app = "Tailscale"
/// ```
#[derive(Debug, Clone, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct Config {
    /// Gateway IPs that classify the current network as the target network.
    pub match_ips: Vec<String>,

    /// Expected gateway MAC. Accepted in any form [`normalize_mac`] accepts;
    /// stored canonically after [`Config::load`].
    pub match_mac: Option<String>,

    /// When `true`, the gateway MAC must also match for target
    /// classification; when `false`, the IP set alone decides.
    pub require_mac: bool,

    /// DNS server to set on the target network. `None` leaves DNS untouched
    /// in both directions.
    pub dns_server: Option<String>,

    /// `networksetup` service whose DNS servers are managed.
    pub network_service: String,

    /// Helper app stopped on the target network and started elsewhere
    /// (e.g. a proxy client).
    pub proxy_app: Option<String>,

    /// Helper app stopped on the target network (e.g. a VPN client).
    pub vpn_app: Option<String>,

    /// Sleep between probe cycles while the identity is unresolvable.
    pub poll_interval_secs: u64,

    /// Total retry budget before the run gives up.
    pub max_retry_secs: u64,

    /// Grace period after a cooperative quit request.
    pub quit_grace_secs: u64,

    /// Grace period after escalating to `killall`.
    pub kill_grace_secs: u64,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            match_ips: Vec::new(),
            match_mac: None,
            require_mac: false,
            dns_server: None,
            network_service: "Wi-Fi".to_string(),
            proxy_app: None,
            vpn_app: None,
            poll_interval_secs: 5,
            max_retry_secs: 750,
            quit_grace_secs: 3,
            kill_grace_secs: 5,
        }
    }
}

impl Config {
    /// Loads and validates a config file.
    ///
    /// # Errors
    ///
    /// Returns [`NetwatchError::Io`] if the file cannot be read and
    /// [`NetwatchError::InvalidConfig`] for malformed TOML, a malformed
    /// `match_mac`, or `require_mac` without a `match_mac`.
    pub fn load(path: &Path) -> Result<Self> {
        let text = std::fs::read_to_string(path)?;
        let config: Self =
            toml::from_str(&text).map_err(|e| NetwatchError::InvalidConfig(e.to_string()))?;
        config.validate()
    }

    /// Loads `path` if given, else the per-user default location if it
    /// exists, else built-in defaults.
    ///
    /// # Errors
    ///
    /// Same as [`Config::load`]; a *missing* default file is not an error.
    pub fn load_or_default(path: Option<&Path>) -> Result<Self> {
        if let Some(path) = path {
            return Self::load(path);
        }
        match default_config_path() {
            Some(path) if path.exists() => Self::load(&path),
            _ => Ok(Self::default()),
        }
    }

    fn validate(mut self) -> Result<Self> {
        if let Some(raw) = &self.match_mac {
            let canonical = normalize_mac(raw).ok_or_else(|| {
                NetwatchError::InvalidConfig(format!("match_mac is not a MAC address: {raw}"))
            })?;
            self.match_mac = Some(canonical);
        } else if self.require_mac {
            return Err(NetwatchError::InvalidConfig(
                "require_mac is set but match_mac is not configured".to_string(),
            ));
        }
        Ok(self)
    }

    /// Sleep between probe cycles.
    #[must_use]
    pub const fn poll_interval(&self) -> Duration {
        Duration::from_secs(self.poll_interval_secs)
    }

    /// Total retry budget for one run.
    #[must_use]
    pub const fn retry_budget(&self) -> Duration {
        Duration::from_secs(self.max_retry_secs)
    }

    /// Grace period after a cooperative quit request.
    #[must_use]
    pub const fn quit_grace(&self) -> Duration {
        Duration::from_secs(self.quit_grace_secs)
    }

    /// Grace period after escalating to `killall`.
    #[must_use]
    pub const fn kill_grace(&self) -> Duration {
        Duration::from_secs(self.kill_grace_secs)
    }
}

/// Per-user config location (`~/Library/Application Support/netwatch` on
/// macOS).
#[must_use]
pub fn default_config_path() -> Option<PathBuf> {
    directories::ProjectDirs::from("", "", "netwatch")
        .map(|dirs| dirs.config_dir().join("netwatch.toml"))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_match_unattended_timings() {
        let c = Config::default();
        assert_eq!(c.poll_interval(), Duration::from_secs(5));
        assert_eq!(c.retry_budget(), Duration::from_secs(750));
        assert_eq!(c.network_service, "Wi-Fi");
        assert!(c.match_ips.is_empty());
        assert!(!c.require_mac);
    }

    #[test]
    fn load_parses_and_canonicalizes_mac() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("netwatch.toml");
        std::fs::write(
            &path,
            r#"
match_ips = ["192.168.31.1", "192.168.31.2"]
match_mac = "A4-B1-C1-D2-E3-F4"
require_mac = true
dns_server = "192.168.31.53"
proxy_app = "Sparkle"
max_retry_secs = 60
"#,
        )
        .unwrap();

        let c = Config::load(&path).unwrap();
        assert_eq!(c.match_ips.len(), 2);
        assert_eq!(c.match_mac.as_deref(), Some("a4:b1:c1:d2:e3:f4"));
        assert!(c.require_mac);
        assert_eq!(c.dns_server.as_deref(), Some("192.168.31.53"));
        assert_eq!(c.proxy_app.as_deref(), Some("Sparkle"));
        assert_eq!(c.max_retry_secs, 60);
        // Unspecified fields keep their defaults.
        assert_eq!(c.poll_interval_secs, 5);
        assert!(c.vpn_app.is_none());
    }

    #[test]
    fn load_rejects_bad_mac() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("netwatch.toml");
        std::fs::write(&path, "match_mac = \"not-a-mac\"\n").unwrap();
        assert!(matches!(
            Config::load(&path),
            Err(NetwatchError::InvalidConfig(_))
        ));
    }

    #[test]
    fn load_rejects_require_mac_without_mac() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("netwatch.toml");
        std::fs::write(&path, "require_mac = true\n").unwrap();
        assert!(matches!(
            Config::load(&path),
            Err(NetwatchError::InvalidConfig(_))
        ));
    }

    #[test]
    fn load_rejects_unknown_fields() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("netwatch.toml");
        std::fs::write(&path, "target_ips = [\"10.0.0.1\"]\n").unwrap();
        assert!(matches!(
            Config::load(&path),
            Err(NetwatchError::InvalidConfig(_))
        ));
    }

    #[test]
    fn load_or_default_with_explicit_missing_path_errors() {
        let dir = tempfile::tempdir().unwrap();
        let missing = dir.path().join("nope.toml");
        assert!(Config::load_or_default(Some(&missing)).is_err());
    }
}
