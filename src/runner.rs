//! The OS command seam.
//!
//! Every external invocation — gateway lookups, `networksetup`, `pgrep`,
//! cache flushes — goes through [`CommandRunner`], so the probing and apply
//! logic can be exercised in tests with scripted output instead of a live
//! system.

use std::process::{Command, Stdio};

use crate::error::{NetwatchError, Result};

/// Captured result of one external command.
#[derive(Debug, Clone)]
pub struct CmdOutput {
    /// `true` if the command exited with status zero.
    pub success: bool,

    /// Captured standard output, lossily decoded.
    pub stdout: String,
}

impl CmdOutput {
    /// A successful invocation that printed `stdout`.
    #[must_use]
    pub fn ok(stdout: impl Into<String>) -> Self {
        Self {
            success: true,
            stdout: stdout.into(),
        }
    }

    /// A spawned command that exited non-zero.
    #[must_use]
    pub fn failed() -> Self {
        Self {
            success: false,
            stdout: String::new(),
        }
    }
}

/// Runs external commands on behalf of the prober and applier.
pub trait CommandRunner {
    /// Runs `program` with `args`, capturing stdout.
    ///
    /// # Errors
    ///
    /// Returns [`NetwatchError::CommandFailed`] only when the command could
    /// not be spawned (e.g. the program is missing). A non-zero exit is an
    /// ordinary [`CmdOutput`] with `success == false` — callers treat both
    /// the same way, as a best-effort step that did not pan out.
    fn run(&self, program: &str, args: &[&str]) -> Result<CmdOutput>;
}

/// Closures double as runners, which keeps test setups short.
impl<F> CommandRunner for F
where
    F: Fn(&str, &[&str]) -> Result<CmdOutput>,
{
    fn run(&self, program: &str, args: &[&str]) -> Result<CmdOutput> {
        self(program, args)
    }
}

/// The real thing: blocking `std::process::Command` invocations with
/// stderr discarded, matching the fire-and-forget character of every call
/// site.
pub struct SystemRunner;

impl CommandRunner for SystemRunner {
    fn run(&self, program: &str, args: &[&str]) -> Result<CmdOutput> {
        let output = Command::new(program)
            .args(args)
            .stdin(Stdio::null())
            .stderr(Stdio::null())
            .output()
            .map_err(|e| NetwatchError::CommandFailed {
                program: program.to_string(),
                detail: e.to_string(),
            })?;

        Ok(CmdOutput {
            success: output.status.success(),
            stdout: String::from_utf8_lossy(&output.stdout).into_owned(),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn system_runner_captures_stdout() {
        let out = SystemRunner.run("echo", &["hello"]).unwrap();
        assert!(out.success);
        assert_eq!(out.stdout.trim(), "hello");
    }

    #[test]
    fn missing_program_is_command_failed() {
        let err = SystemRunner
            .run("netwatch-no-such-program", &[])
            .unwrap_err();
        assert!(matches!(err, NetwatchError::CommandFailed { .. }));
    }

    #[test]
    fn closures_are_runners() {
        let runner = |program: &str, _args: &[&str]| Ok(CmdOutput::ok(program.to_uppercase()));
        let out = runner.run("arp", &["-a"]).unwrap();
        assert_eq!(out.stdout, "ARP");
    }
}
