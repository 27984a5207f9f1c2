//! The bounded retry loop: probe, decide, apply once, terminate.
//!
//! One logical thread, blocking throughout. The loop suspends only via the
//! poll-interval sleep between unresolvable probes, and terminates on the
//! first cycle that yields an applicable action or when the retry budget is
//! exhausted. No action is ever retried within one run.

use std::time::Instant;

use crate::apply::{Applier, Outcome};
use crate::config::Config;
use crate::policy::{Action, decide};
use crate::probe::Prober;
use crate::runner::CommandRunner;

/// Terminal state of one monitor run.
#[derive(Debug)]
pub enum RunOutcome {
    /// Exactly one apply call was made; its result is attached regardless
    /// of success.
    Done {
        /// The action that was applied.
        action: Action,
        /// What the apply call reported.
        outcome: Outcome,
    },

    /// The retry budget elapsed without a resolvable identity.
    TimedOut,
}

/// Runs the detect-then-converge loop until the first apply or the
/// deadline.
///
/// Failures inside the loop never escape it; everything is logged and
/// folded into the returned [`RunOutcome`].
pub fn run<R: CommandRunner>(config: &Config, runner: &R) -> RunOutcome {
    let prober = Prober::new(runner);
    let applier = Applier::new(runner, config);
    let deadline = Instant::now() + config.retry_budget();

    tracing::info!(
        budget_secs = config.max_retry_secs,
        poll_secs = config.poll_interval_secs,
        "monitor run starting"
    );

    loop {
        let identity = prober.probe();
        tracing::info!(
            gateway_ip = identity.gateway_ip.as_deref().unwrap_or("-"),
            gateway_mac = identity.gateway_mac.as_deref().unwrap_or("-"),
            "probe complete"
        );

        match decide(&identity, config) {
            action @ (Action::ApplyTargetConfig | Action::ApplyDefaultConfig) => {
                tracing::info!(action = ?action, "applying");
                let outcome = applier.apply(action);
                if outcome.succeeded {
                    tracing::info!(detail = %outcome.detail, "apply finished");
                } else {
                    tracing::warn!(detail = %outcome.detail, "apply finished with failures");
                }
                return RunOutcome::Done { action, outcome };
            }
            Action::Retry if Instant::now() < deadline => {
                tracing::info!("identity unresolvable, retrying");
                std::thread::sleep(config.poll_interval());
            }
            Action::Retry | Action::GiveUp => {
                tracing::warn!("retry budget exhausted with no resolvable identity");
                // The original behavior flushes the cache even on timeout so
                // a half-configured DNS state does not linger.
                applier.flush_dns_cache();
                return RunOutcome::TimedOut;
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::Result;
    use crate::runner::CmdOutput;
    use std::cell::RefCell;

    fn zero_budget_config() -> Config {
        Config {
            max_retry_secs: 0,
            poll_interval_secs: 0,
            quit_grace_secs: 0,
            kill_grace_secs: 0,
            ..Config::default()
        }
    }

    #[test]
    fn retry_then_resolve_within_budget() {
        // The gateway appears on the second probe cycle.
        let probes = RefCell::new(0);
        let runner = |program: &str, _: &[&str]| -> Result<CmdOutput> {
            Ok(match program {
                "route" => {
                    *probes.borrow_mut() += 1;
                    if *probes.borrow() > 1 {
                        CmdOutput::ok("    gateway: 10.0.0.1\n")
                    } else {
                        CmdOutput::failed()
                    }
                }
                _ => CmdOutput::failed(),
            })
        };
        let config = Config {
            max_retry_secs: 60,
            ..zero_budget_config()
        };

        let outcome = run(&config, &runner);
        assert!(matches!(
            outcome,
            RunOutcome::Done {
                action: Action::ApplyDefaultConfig,
                ..
            }
        ));
        assert_eq!(*probes.borrow(), 2);
    }

    #[test]
    fn unresolvable_identity_times_out_at_deadline() {
        let flushed = RefCell::new(false);
        let runner = |program: &str, _: &[&str]| -> Result<CmdOutput> {
            if program == "dscacheutil" {
                *flushed.borrow_mut() = true;
            }
            Ok(CmdOutput::failed())
        };
        let config = zero_budget_config();

        let outcome = run(&config, &runner);
        assert!(matches!(outcome, RunOutcome::TimedOut));
        assert!(*flushed.borrow(), "timeout path must still flush the cache");
    }

    #[test]
    fn resolvable_identity_terminates_after_one_apply() {
        let applies = RefCell::new(0);
        let runner = |program: &str, args: &[&str]| -> Result<CmdOutput> {
            Ok(match program {
                "route" => CmdOutput::ok("    gateway: 10.0.0.1\n"),
                "arp" if args.first() == Some(&"-n") => {
                    CmdOutput::ok("? (10.0.0.1) at 11:22:33:44:55:66 on en0\n")
                }
                "networksetup" => {
                    *applies.borrow_mut() += 1;
                    CmdOutput::ok("")
                }
                "pgrep" => CmdOutput::failed(),
                _ => CmdOutput::ok(""),
            })
        };
        let config = Config {
            dns_server: Some("192.168.1.53".to_string()),
            ..zero_budget_config()
        };

        let outcome = run(&config, &runner);
        let RunOutcome::Done { action, outcome } = outcome else {
            panic!("expected Done");
        };
        assert_eq!(action, Action::ApplyDefaultConfig);
        assert!(outcome.succeeded);
        // One clear plus the belt-and-braces empty-string clear.
        assert_eq!(*applies.borrow(), 2);
    }
}
