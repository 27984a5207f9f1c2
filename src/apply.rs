//! Convergence actions: DNS configuration, helper-app lifecycle, and the
//! DNS cache flush.
//!
//! Every sub-step is independent and best-effort. A command that fails is
//! logged at warn level and the remaining steps still run; the [`Outcome`]
//! reports partial failure without aborting anything. Idempotency comes
//! from checking live state (`pgrep` before `open`/quit, DNS writes that
//! overwrite) rather than from remembering what was applied before.

use std::time::Duration;

use crate::config::Config;
use crate::policy::Action;
use crate::runner::CommandRunner;

/// Result of one `apply` call, consumed only by logging.
#[derive(Debug, Clone)]
pub struct Outcome {
    /// `false` if any sub-step failed.
    pub succeeded: bool,

    /// Human-readable summary for the log.
    pub detail: String,
}

impl Outcome {
    fn from_failures(failures: &[&str], ok_detail: &str) -> Self {
        if failures.is_empty() {
            Self {
                succeeded: true,
                detail: ok_detail.to_string(),
            }
        } else {
            Self {
                succeeded: false,
                detail: format!("partial failure: {}", failures.join(", ")),
            }
        }
    }
}

/// Applies a chosen [`Action`] to the system through a [`CommandRunner`].
pub struct Applier<'a, R> {
    runner: &'a R,
    config: &'a Config,
}

impl<'a, R: CommandRunner> Applier<'a, R> {
    #[must_use]
    pub const fn new(runner: &'a R, config: &'a Config) -> Self {
        Self { runner, config }
    }

    /// Executes `action` once. [`Action::Retry`] and [`Action::GiveUp`] are
    /// no-ops; the monitor loop never routes them here.
    pub fn apply(&self, action: Action) -> Outcome {
        match action {
            Action::ApplyTargetConfig => self.apply_target(),
            Action::ApplyDefaultConfig => self.apply_default(),
            Action::Retry | Action::GiveUp => Outcome {
                succeeded: true,
                detail: "nothing to apply".to_string(),
            },
        }
    }

    /// Target network: set the custom DNS, stop the helper apps, flush.
    fn apply_target(&self) -> Outcome {
        let mut failures = Vec::new();

        if let Some(dns) = &self.config.dns_server {
            tracing::info!(dns = %dns, service = %self.config.network_service, "setting DNS server");
            if !self.best_effort(
                "networksetup",
                &["-setdnsservers", &self.config.network_service, dns],
            ) {
                failures.push("set dns");
            }
        }

        if let Some(app) = &self.config.proxy_app {
            if !self.ensure_stopped(app) {
                failures.push("stop proxy app");
            }
        }
        if let Some(app) = &self.config.vpn_app {
            if !self.ensure_stopped(app) {
                failures.push("stop vpn app");
            }
        }

        if !self.flush_dns_cache() {
            failures.push("flush dns cache");
        }

        Outcome::from_failures(&failures, "target configuration applied")
    }

    /// Any other network: clear DNS back to automatic, make sure the proxy
    /// helper is running, flush.
    fn apply_default(&self) -> Outcome {
        let mut failures = Vec::new();

        if self.config.dns_server.is_some() {
            let service = self.config.network_service.as_str();
            tracing::info!(service = %service, "clearing DNS servers");
            if !self.best_effort("networksetup", &["-setdnsservers", service, "Empty"]) {
                failures.push("clear dns");
            }
            // Some macOS releases leave a literal entry behind; clearing with
            // an empty string as well covers both.
            let _ = self.runner.run("networksetup", &["-setdnsservers", service, ""]);
        }

        if let Some(app) = &self.config.proxy_app {
            if !self.ensure_started(app) {
                failures.push("start proxy app");
            }
        }

        if !self.flush_dns_cache() {
            failures.push("flush dns cache");
        }

        Outcome::from_failures(&failures, "default configuration restored")
    }

    /// Flushes the system DNS cache and pokes `mDNSResponder`.
    pub fn flush_dns_cache(&self) -> bool {
        tracing::info!("flushing DNS cache");
        let flushed = self.best_effort("dscacheutil", &["-flushcache"]);
        let signaled = self.best_effort("killall", &["-HUP", "mDNSResponder"]);
        flushed && signaled
    }

    /// Idempotent "ensure started": launches the app only when `pgrep` says
    /// it is not already running.
    fn ensure_started(&self, app: &str) -> bool {
        if self.is_running(app) {
            tracing::info!(app = %app, "already running");
            return true;
        }
        tracing::info!(app = %app, "starting");
        self.best_effort("open", &["-a", app])
    }

    /// Idempotent "ensure stopped": cooperative quit first, `killall` if the
    /// app ignores it, liveness re-checked after each grace period.
    ///
    /// Failure to terminate is reported, not retried further within this
    /// call.
    fn ensure_stopped(&self, app: &str) -> bool {
        if !self.is_running(app) {
            tracing::info!(app = %app, "not running");
            return true;
        }

        tracing::info!(app = %app, "requesting cooperative quit");
        let script = format!("tell application \"{app}\" to quit");
        let _ = self.best_effort("osascript", &["-e", &script]);
        sleep(self.config.quit_grace());
        if !self.is_running(app) {
            tracing::info!(app = %app, "quit cooperatively");
            return true;
        }

        tracing::warn!(app = %app, "still running, escalating to killall");
        let _ = self.best_effort("killall", &[app]);
        sleep(self.config.kill_grace());
        if !self.is_running(app) {
            tracing::info!(app = %app, "terminated after escalation");
            return true;
        }

        tracing::warn!(app = %app, "did not terminate after escalation");
        false
    }

    fn is_running(&self, app: &str) -> bool {
        self.runner
            .run("pgrep", &["-x", app])
            .is_ok_and(|out| out.success)
    }

    /// Runs one best-effort command; any failure becomes a warning.
    fn best_effort(&self, program: &str, args: &[&str]) -> bool {
        match self.runner.run(program, args) {
            Ok(out) if out.success => true,
            Ok(_) => {
                tracing::warn!(program = %program, "command exited non-zero");
                false
            }
            Err(e) => {
                tracing::warn!(program = %program, error = %e, "command could not run");
                false
            }
        }
    }
}

fn sleep(duration: Duration) {
    if !duration.is_zero() {
        std::thread::sleep(duration);
    }
}
