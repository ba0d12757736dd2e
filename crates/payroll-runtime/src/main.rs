//! # Payroll Runtime
//!
//! Replays a session script against the payroll engine wired to in-process
//! adapters.
//!
//! ## Startup Sequence
//!
//! 1. Initialize logging (`RUST_LOG` filter, default `info`)
//! 2. Load configuration from `PAYROLL_*` variables
//! 3. Load the session script
//! 4. Run every step and report outcomes

use std::path::PathBuf;

use anyhow::{Context, Result};
use clap::Parser;
use tracing::info;
use tracing_subscriber::{EnvFilter, FmtSubscriber};

use payroll_core::prelude::*;
use payroll_runtime::{Session, SessionRunner};

/// Payroll session runner
#[derive(Parser, Debug)]
#[command(name = "payroll-runtime")]
#[command(about = "Replay a payroll session script against an in-memory ledger")]
struct Args {
    /// Session script (JSON)
    script: PathBuf,

    /// Contract address; overrides PAYROLL_CONTRACT_ADDRESS
    #[arg(short, long)]
    contract: Option<String>,

    /// Print step outcomes as JSON on stdout
    #[arg(long)]
    json: bool,
}

fn load_config(args: &Args) -> Result<PayrollConfig> {
    let config = PayrollConfig::from_lookup(|name| {
        if name == "PAYROLL_CONTRACT_ADDRESS" {
            if let Some(contract) = &args.contract {
                return Some(contract.clone());
            }
        }
        std::env::var(name).ok()
    })
    .context("Failed to load payroll configuration")?;
    Ok(config)
}

#[tokio::main]
async fn main() -> Result<()> {
    let args = Args::parse();

    // Initialize logging
    let subscriber = FmtSubscriber::builder()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .with_target(true)
        .finish();
    tracing::subscriber::set_global_default(subscriber)?;

    let config = load_config(&args)?;
    info!(
        contract = %config.contract_address,
        pay_cycle_secs = config.pay_cycle_secs,
        min_reserve = config.min_reserve.get(),
        version = payroll_core::VERSION,
        "Payroll runtime starting"
    );

    let session = Session::load(&args.script)
        .with_context(|| format!("Failed to load {}", args.script.display()))?;
    let runner = SessionRunner::new(config, &session)?;
    let outcomes = runner.run(&session).await;

    let failed = outcomes.iter().filter(|o| !o.succeeded()).count();
    let stats = runner.service().stats().await;
    info!(
        steps = outcomes.len(),
        failed,
        submitted = stats.transitions_submitted,
        conflicts_retried = stats.conflicts_retried,
        "Session finished"
    );

    if args.json {
        println!("{}", serde_json::to_string_pretty(&outcomes)?);
    }

    Ok(())
}
