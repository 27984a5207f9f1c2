//! Network classification: observed identity → action.
//!
//! [`decide`] is a pure function so the whole decision table is unit
//! tested without touching the OS.

use crate::config::Config;
use crate::identity::NetworkIdentity;

/// The single action chosen for one detection cycle.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Action {
    /// Identity matches the target profile: set the target DNS and stop the
    /// helper apps.
    ApplyTargetConfig,

    /// Identity resolved but does not match: restore the default
    /// configuration.
    ApplyDefaultConfig,

    /// Nothing resolvable yet; probe again.
    Retry,

    /// The retry budget elapsed with nothing resolvable. Produced by the
    /// monitor loop on deadline, never by [`decide`].
    GiveUp,
}

/// Classifies the observed identity against the configured profile.
///
/// Rules, in order:
/// - no gateway IP → [`Action::Retry`];
/// - IP in `match_ips`, and either `require_mac` is off or the observed MAC
///   equals `match_mac` (case-insensitive) → [`Action::ApplyTargetConfig`];
/// - anything else resolvable → [`Action::ApplyDefaultConfig`].
///
/// With `require_mac` off the MAC is ignored for classification (the IP set
/// alone decides); with it on, an absent or mismatched MAC demotes an
/// otherwise matching gateway to the default branch.
#[must_use]
pub fn decide(identity: &NetworkIdentity, profile: &Config) -> Action {
    let Some(ip) = &identity.gateway_ip else {
        return Action::Retry;
    };

    let ip_match = profile.match_ips.iter().any(|candidate| candidate == ip);
    let mac_match = match (&profile.match_mac, &identity.gateway_mac) {
        (Some(want), Some(got)) => want.eq_ignore_ascii_case(got),
        _ => false,
    };

    tracing::debug!(
        ip = %ip,
        ip_match,
        mac = identity.gateway_mac.as_deref().unwrap_or("-"),
        mac_match,
        require_mac = profile.require_mac,
        "classifying network"
    );

    if ip_match && (mac_match || !profile.require_mac) {
        Action::ApplyTargetConfig
    } else {
        Action::ApplyDefaultConfig
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn profile(require_mac: bool) -> Config {
        Config {
            match_ips: vec!["192.168.1.1".to_string()],
            match_mac: Some("aa:bb:cc:dd:ee:ff".to_string()),
            require_mac,
            ..Config::default()
        }
    }

    fn identity(ip: &str, mac: Option<&str>) -> NetworkIdentity {
        NetworkIdentity {
            gateway_ip: Some(ip.to_string()),
            gateway_mac: mac.map(str::to_string),
        }
    }

    #[test]
    fn full_match_is_target() {
        let id = identity("192.168.1.1", Some("aa:bb:cc:dd:ee:ff"));
        assert_eq!(decide(&id, &profile(true)), Action::ApplyTargetConfig);
    }

    #[test]
    fn mac_compare_is_case_insensitive() {
        let id = identity("192.168.1.1", Some("AA:BB:CC:DD:EE:FF"));
        assert_eq!(decide(&id, &profile(true)), Action::ApplyTargetConfig);
    }

    #[test]
    fn foreign_gateway_is_default() {
        let id = identity("10.0.0.1", Some("11:22:33:44:55:66"));
        assert_eq!(decide(&id, &profile(true)), Action::ApplyDefaultConfig);
        assert_eq!(decide(&id, &profile(false)), Action::ApplyDefaultConfig);
    }

    #[test]
    fn unresolved_identity_retries() {
        let id = NetworkIdentity::unresolved();
        assert_eq!(decide(&id, &profile(true)), Action::Retry);
        assert_eq!(decide(&id, &profile(false)), Action::Retry);
    }

    #[test]
    fn require_mac_demotes_mismatch_to_default() {
        let id = identity("192.168.1.1", Some("11:22:33:44:55:66"));
        assert_eq!(decide(&id, &profile(true)), Action::ApplyDefaultConfig);
    }

    #[test]
    fn require_mac_demotes_missing_mac_to_default() {
        let id = identity("192.168.1.1", None);
        assert_eq!(decide(&id, &profile(true)), Action::ApplyDefaultConfig);
    }

    #[test]
    fn ip_only_match_suffices_when_mac_not_required() {
        let id = identity("192.168.1.1", None);
        assert_eq!(decide(&id, &profile(false)), Action::ApplyTargetConfig);

        // Even a mismatched MAC is advisory-only in this mode.
        let id = identity("192.168.1.1", Some("11:22:33:44:55:66"));
        assert_eq!(decide(&id, &profile(false)), Action::ApplyTargetConfig);
    }

    #[test]
    fn profile_without_mac_matches_by_ip_set() {
        let profile = Config {
            match_ips: vec!["192.168.1.1".to_string(), "192.168.1.2".to_string()],
            ..Config::default()
        };
        let id = identity("192.168.1.2", Some("aa:bb:cc:dd:ee:ff"));
        assert_eq!(decide(&id, &profile), Action::ApplyTargetConfig);
    }
}
