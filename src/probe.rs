//! Gateway discovery.
//!
//! Discovery is an ordered list of strategies — `route -n get default`
//! first, a `netstat -rn` scan as fallback — where the first one to yield a
//! gateway IP wins. Adding or removing a strategy is a data change in
//! [`STRATEGIES`], not a control-flow edit. Once an IP is known, the
//! neighbor cache is refreshed best-effort and the MAC is looked up from
//! `arp` output.
//!
//! Probing never fails outward: a machine with no default route simply
//! produces an unresolved [`NetworkIdentity`].

use crate::identity::{NetworkIdentity, normalize_mac};
use crate::runner::CommandRunner;

/// One way of asking the OS for the default gateway IP.
struct Strategy {
    name: &'static str,
    program: &'static str,
    args: &'static [&'static str],
    parse: fn(&str) -> Option<String>,
}

/// Tried in order; first non-empty result wins.
const STRATEGIES: &[Strategy] = &[
    Strategy {
        name: "route",
        program: "route",
        args: &["-n", "get", "default"],
        parse: parse_route_get,
    },
    Strategy {
        name: "netstat",
        program: "netstat",
        args: &["-rn"],
        parse: parse_netstat,
    },
];

/// Reads the current network identity through a [`CommandRunner`].
pub struct Prober<'a, R> {
    runner: &'a R,
}

impl<'a, R: CommandRunner> Prober<'a, R> {
    #[must_use]
    pub const fn new(runner: &'a R) -> Self {
        Self { runner }
    }

    /// Probes the default gateway's IP and MAC.
    ///
    /// Total failure is not an error: the returned identity simply has both
    /// fields absent.
    pub fn probe(&self) -> NetworkIdentity {
        let Some(ip) = self.gateway_ip() else {
            tracing::warn!("no strategy produced a default gateway");
            return NetworkIdentity::unresolved();
        };

        self.refresh_neighbor_cache(&ip);
        let mac = self.gateway_mac(&ip);
        if mac.is_none() {
            tracing::warn!(ip = %ip, "gateway MAC not found in ARP table");
        }

        NetworkIdentity {
            gateway_ip: Some(ip),
            gateway_mac: mac,
        }
    }

    /// Runs every strategy and reports each result, for the debug command.
    pub fn probe_each(&self) -> Vec<(&'static str, Option<String>)> {
        STRATEGIES
            .iter()
            .map(|s| (s.name, self.try_strategy(s)))
            .collect()
    }

    fn gateway_ip(&self) -> Option<String> {
        for strategy in STRATEGIES {
            if let Some(ip) = self.try_strategy(strategy) {
                tracing::debug!(strategy = strategy.name, ip = %ip, "gateway discovered");
                return Some(ip);
            }
        }
        None
    }

    fn try_strategy(&self, strategy: &Strategy) -> Option<String> {
        match self.runner.run(strategy.program, strategy.args) {
            Ok(out) if out.success => (strategy.parse)(&out.stdout),
            Ok(_) => {
                tracing::debug!(strategy = strategy.name, "command exited non-zero");
                None
            }
            Err(e) => {
                tracing::warn!(strategy = strategy.name, error = %e, "command unavailable");
                None
            }
        }
    }

    /// Drops the gateway's neighbor-cache entry and pings it so the next
    /// `arp` read sees fresh data. Fire-and-forget; failures are ignored.
    fn refresh_neighbor_cache(&self, ip: &str) {
        let _ = self.runner.run("arp", &["-d", ip]);
        let _ = self.runner.run("ping", &["-c2", "-W1", ip]);
    }

    fn gateway_mac(&self, ip: &str) -> Option<String> {
        if let Ok(out) = self.runner.run("arp", &["-n", ip]) {
            if out.success {
                if let Some(mac) = extract_mac(&out.stdout) {
                    return Some(mac);
                }
            }
        }

        // `arp -n <ip>` missed; scan the full table.
        match self.runner.run("arp", &["-a"]) {
            Ok(out) if out.success => find_mac_for_ip(&out.stdout, ip),
            _ => None,
        }
    }
}

/// Parses `route -n get default` output:
///
/// ```text
///    route to: default
/// destination: default
///     gateway: 192.168.1.1
///   interface: en0
/// ```
fn parse_route_get(output: &str) -> Option<String> {
    output.lines().find_map(|line| {
        let ip = line.trim().strip_prefix("gateway:")?.trim();
        (!ip.is_empty()).then(|| ip.to_string())
    })
}

/// Parses `netstat -rn` output: the first `default` route carrying both the
/// `U` and `G` flags and an IPv4 gateway.
fn parse_netstat(output: &str) -> Option<String> {
    for line in output.lines() {
        if !line.starts_with("default") {
            continue;
        }
        let mut fields = line.split_whitespace();
        let (Some(_), Some(gateway), Some(flags)) =
            (fields.next(), fields.next(), fields.next())
        else {
            continue;
        };
        if flags.contains('U')
            && flags.contains('G')
            && gateway.parse::<std::net::Ipv4Addr>().is_ok()
        {
            return Some(gateway.to_string());
        }
    }
    None
}

/// Finds the first MAC-shaped token in `arp` output, canonicalized.
///
/// Incomplete entries (`... at (incomplete) on en0`) yield `None`.
fn extract_mac(output: &str) -> Option<String> {
    output.split_whitespace().find_map(normalize_mac)
}

/// Finds the MAC for `ip` in full `arp -a` output, e.g.
/// `? (192.168.1.1) at a4:b1:c1:d2:e3:f4 on en0 ifscope [ethernet]`.
fn find_mac_for_ip(output: &str, ip: &str) -> Option<String> {
    // Parenthesized needle so `(10.0.0.1)` never matches `(10.0.0.11)`.
    let needle = format!("({ip})");
    output
        .lines()
        .find(|line| line.contains(&needle))
        .and_then(extract_mac)
}
