//! Network identity signals and MAC canonicalization.

/// Identity of the network we are currently attached to, as far as the OS
/// can tell us.
///
/// Re-read on every probe cycle and never persisted. Either field may be
/// absent: a machine with no default route has neither, and a gateway that
/// never answered ARP has an IP but no MAC.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct NetworkIdentity {
    /// IPv4 address of the default gateway.
    pub gateway_ip: Option<String>,

    /// Gateway hardware address in canonical form (see [`normalize_mac`]).
    pub gateway_mac: Option<String>,
}

impl NetworkIdentity {
    /// An identity with nothing resolvable.
    #[must_use]
    pub const fn unresolved() -> Self {
        Self {
            gateway_ip: None,
            gateway_mac: None,
        }
    }

    /// Returns `true` if at least the gateway IP was discovered.
    #[must_use]
    pub const fn is_resolved(&self) -> bool {
        self.gateway_ip.is_some()
    }
}

/// Canonicalizes a MAC address to lowercase colon-separated two-digit pairs.
///
/// Accepts six groups of one or two hex digits separated by `:`, `-`, or `.`
/// (`arp` on macOS drops leading zeros, and vendors disagree on separators).
/// Returns `None` for anything that is not MAC-shaped, so this doubles as
/// the MAC recognizer when scanning command output token by token.
///
/// Canonical input comes back unchanged.
#[must_use]
pub fn normalize_mac(raw: &str) -> Option<String> {
    let groups: Vec<&str> = raw
        .split(|c: char| matches!(c, ':' | '-' | '.'))
        .collect();
    if groups.len() != 6 {
        return None;
    }

    let mut octets = Vec::with_capacity(6);
    for group in groups {
        if group.is_empty() || group.len() > 2 {
            return None;
        }
        let value = u8::from_str_radix(group, 16).ok()?;
        octets.push(format!("{value:02x}"));
    }
    Some(octets.join(":"))
}
