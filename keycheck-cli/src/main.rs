//! keycheck license checker
//!
//! Runs one license check against the licensing server, trusting the saved
//! offline snapshot while it is fresh, and prints the result as JSON.
//!
//! Usage:
//!   keycheck --config keycheck.toml --license-key LB-XXXX-XXXX
//!
//! Exits 0 when the license is active, 1 otherwise.

use anyhow::{Context, Result};
use clap::Parser;
use keycheck_cli::{run, EnvironmentOverrides, RunOptions};
use keycheck_license::DEFAULT_TIMEOUT;
use std::{path::PathBuf, process::ExitCode, time::Duration};
use tracing::{info, Level};
use tracing_subscriber::FmtSubscriber;

#[derive(Parser, Debug)]
#[command(name = "keycheck")]
#[command(about = "Check a software license, online or from an offline snapshot")]
struct Args {
    /// Path to the validator config (TOML)
    #[arg(short, long, default_value = "keycheck.toml")]
    config: PathBuf,

    /// License key to check
    #[arg(short, long, env = "KEYCHECK_LICENSE_KEY")]
    license_key: String,

    /// File holding the offline snapshot between runs
    #[arg(short, long, default_value = "keycheck.state")]
    state: PathBuf,

    /// Domain to report instead of the hostname
    #[arg(long)]
    domain: Option<String>,

    /// IP address to report instead of the detected one
    #[arg(long)]
    ip: Option<String>,

    /// Install directory to report instead of the working directory
    #[arg(long)]
    directory: Option<String>,

    /// Request timeout in seconds
    #[arg(long, default_value_t = DEFAULT_TIMEOUT.as_secs())]
    timeout: u64,

    /// Enable verbose debug logging
    #[arg(short, long)]
    verbose: bool,
}

#[tokio::main]
async fn main() -> Result<ExitCode> {
    let args = Args::parse();
    let log_level = if args.verbose { Level::DEBUG } else { Level::INFO };
    FmtSubscriber::builder()
        .with_max_level(log_level)
        .with_target(false)
        .with_writer(std::io::stderr)
        .compact()
        .init();

    let environment = EnvironmentOverrides {
        domain: args.domain,
        ip_address: args.ip,
        directory: args.directory,
    }
    .resolve();
    info!(
        "Checking license for {} ({}) in {}",
        environment.domain, environment.ip_address, environment.directory
    );

    let options = RunOptions {
        config: args.config,
        license_key: args.license_key,
        state: args.state,
        environment,
        timeout: Duration::from_secs(args.timeout),
    };
    let result = run(&options).await?;

    let json = serde_json::to_string_pretty(&result).context("Failed to render result")?;
    println!("{json}");

    Ok(if result.is_active() {
        ExitCode::SUCCESS
    } else {
        ExitCode::FAILURE
    })
}
