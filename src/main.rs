//! `netwatch` — one-shot network-identity detection and convergence.
//!
//! Normal invocation runs the bounded retry loop and writes only to the log
//! file. `netwatch debug` prints the probe results and the decision to
//! stdout without applying anything. Both modes exit 0 regardless of
//! outcome; failure detail lives in the log.

use std::path::PathBuf;
use std::process::ExitCode;

use clap::{Parser, Subcommand};
use tracing_subscriber::EnvFilter;

use macos_netwatch::{
    Config, Prober, RunOutcome, SystemRunner, monitor, policy, runner::CommandRunner,
};

#[derive(Parser)]
#[command(name = "netwatch", version)]
#[command(about = "Detect the current gateway and converge macOS DNS and helper-app state")]
struct Cli {
    /// Path to the configuration file.
    #[arg(long, value_name = "FILE")]
    config: Option<PathBuf>,

    #[command(subcommand)]
    command: Option<Command>,
}

#[derive(Subcommand)]
enum Command {
    /// Print probe results and the decision without applying anything
    Debug,
}

fn main() -> ExitCode {
    let cli = Cli::parse();
    let debug = matches!(cli.command, Some(Command::Debug));

    // Keeps the non-blocking log writer alive until exit.
    let _guard = init_logging(debug);

    let config = match Config::load_or_default(cli.config.as_deref()) {
        Ok(config) => config,
        Err(e) => {
            // Unattended runs must not signal failure through the exit code.
            tracing::error!(error = %e, "could not load configuration");
            eprintln!("netwatch: {e}");
            return ExitCode::SUCCESS;
        }
    };

    if debug {
        debug_report(&config);
    } else {
        monitor_run(&config);
    }
    ExitCode::SUCCESS
}

fn monitor_run(config: &Config) {
    tracing::info!("netwatch starting");
    match monitor::run(config, &SystemRunner) {
        RunOutcome::Done { action, outcome } => tracing::info!(
            action = ?action,
            succeeded = outcome.succeeded,
            detail = %outcome.detail,
            "netwatch finished"
        ),
        RunOutcome::TimedOut => tracing::warn!("netwatch timed out"),
    }
}

/// Prints the raw ARP table, each probe strategy's result, the combined
/// identity, and the decision. Performs no apply calls.
fn debug_report(config: &Config) {
    let runner = SystemRunner;
    let prober = Prober::new(&runner);

    println!("=== arp table ===");
    match runner.run("arp", &["-a"]) {
        Ok(out) if out.success => println!("{}", out.stdout.trim_end()),
        _ => println!("(unavailable)"),
    }

    println!();
    println!("=== probe strategies ===");
    for (name, result) in prober.probe_each() {
        println!("{name}: {}", result.as_deref().unwrap_or("-"));
    }

    let identity = prober.probe();
    println!();
    println!("=== combined identity ===");
    println!("gateway ip:  {}", identity.gateway_ip.as_deref().unwrap_or("-"));
    println!("gateway mac: {}", identity.gateway_mac.as_deref().unwrap_or("-"));

    let action = policy::decide(&identity, config);
    println!();
    println!("decision: {action:?}");
}

/// Normal mode logs to a rolling file under `~/Library/Logs`; debug mode
/// logs to stderr so the stdout report stays clean.
fn init_logging(debug: bool) -> Option<tracing_appender::non_blocking::WorkerGuard> {
    if debug {
        let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn"));
        tracing_subscriber::fmt()
            .with_env_filter(filter)
            .with_writer(std::io::stderr)
            .init();
        return None;
    }

    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    let fmt = tracing_subscriber::fmt().with_env_filter(filter).with_ansi(false);

    if let Some(dirs) = directories::BaseDirs::new() {
        let log_dir = dirs.home_dir().join("Library/Logs");
        let appender = tracing_appender::rolling::daily(log_dir, "netwatch.log");
        let (writer, guard) = tracing_appender::non_blocking(appender);
        fmt.with_writer(writer).init();
        Some(guard)
    } else {
        fmt.with_writer(std::io::stderr).init();
        None
    }
}
