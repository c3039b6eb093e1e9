//! Standalone cleanup for clusters left behind by the acceptance harness.
//!
//! Runs the same after-suite cleanup the harness runs, using the same
//! configuration, and prints what happened.

use std::io::Write as _;

use clap::Parser;
use pgo_acceptance::{HarnessConfig, ProcessCommandRunner, cleanup};
use tracing_subscriber::EnvFilter;

#[derive(Debug, Parser)]
#[command(
    name = "pgo-acceptance-cleanup",
    about = "Delete every pgo cluster, falling back to deleting volume claims"
)]
struct Cli {
    /// Label selector for volume claims deleted by the fallback.
    #[arg(long)]
    pvc_selector: Option<String>,
}

fn main() -> Result<(), String> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .with_writer(std::io::stderr)
        .try_init()
        .ok();

    let cli = Cli::parse();
    let mut config = HarnessConfig::load_without_cli_args().map_err(|err| err.to_string())?;
    if let Some(selector) = cli.pvc_selector {
        config.cleanup_pvc_selector = selector;
    }
    config.validate().map_err(|err| err.to_string())?;

    let report = cleanup(&ProcessCommandRunner, &config);
    writeln!(
        std::io::stdout(),
        "cleanup complete: clusters_deleted={}, fallback_attempted={}, clean={}",
        report.primary_succeeded,
        report.fallback_attempted,
        report.is_clean()
    )
    .map_err(|err| err.to_string())?;
    if report.is_clean() {
        Ok(())
    } else {
        Err(String::from("cluster cleanup did not complete"))
    }
}
