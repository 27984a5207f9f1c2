//! # macos-netwatch
//!
//! Detect the current network's gateway identity and converge macOS
//! configuration to match.
//!
//! One run probes the default gateway's IP and MAC address, classifies the
//! network against a configured target profile, then applies exactly one
//! action: on the target network set a custom DNS server and stop the
//! configured helper apps (proxy / VPN clients); on any other network clear
//! DNS back to automatic and make sure the proxy helper is running. Both
//! directions flush the system DNS cache and are idempotent — state is
//! checked live before anything is touched.
//!
//! This is one-shot detection within a bounded retry budget, not a daemon:
//! schedule the `netwatch` binary from a launchd network-change trigger or
//! similar, and it exits after the first applied action or after the budget
//! (default 12.5 minutes) elapses.
//!
//! ## Quick start
//!
//! ```rust,ignore
//! use macos_netwatch::{Config, SystemRunner, monitor};
//!
//! let config = Config::load_or_default(None)?;
//! match monitor::run(&config, &SystemRunner) {
//!     monitor::RunOutcome::Done { action, outcome } => { /* logged */ }
//!     monitor::RunOutcome::TimedOut => { /* logged */ }
//! }
//! ```
//!
//! ## Failure policy
//!
//! Every OS command is best-effort: failures are logged and the run keeps
//! going, and the process exits 0 regardless of outcome. This is deliberate
//! for unattended background execution — operational detail lives in the
//! log, not the exit code.
//!
//! ## Permissions
//!
//! `networksetup` and `dscacheutil -flushcache` may require elevated
//! privileges depending on system policy. The caller is responsible for
//! running with sufficient rights.

#![warn(clippy::all, clippy::pedantic, clippy::nursery)]
#![allow(clippy::module_name_repetitions)]

pub mod apply;
pub mod config;
pub mod error;
pub mod identity;
pub mod monitor;
pub mod policy;
pub mod probe;
pub mod runner;

pub use apply::{Applier, Outcome};
pub use config::Config;
pub use error::{NetwatchError, Result};
pub use identity::{NetworkIdentity, normalize_mac};
pub use monitor::RunOutcome;
pub use policy::{Action, decide};
pub use probe::Prober;
pub use runner::{CmdOutput, CommandRunner, SystemRunner};
