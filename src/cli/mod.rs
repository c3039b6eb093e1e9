//! Command-line interface definitions for the `pgo-acceptance` binary.
//!
//! This module centralises the clap parser structures so both the main binary
//! and the build script can reuse them when generating the manual page.

use camino::Utf8PathBuf;
use clap::Parser;

/// Top-level CLI for the `pgo-acceptance` binary.
#[derive(Debug, Parser)]
#[command(
    name = "pgo-acceptance",
    about = "Run pgo acceptance scenarios against a live Kubernetes cluster"
)]
pub(crate) struct Cli {
    /// Feature files or directories of `.feature` files to run.
    #[arg(value_name = "PATH", default_value = "features")]
    pub(crate) paths: Vec<Utf8PathBuf>,
    /// Print every registered step pattern and exit.
    #[arg(long)]
    pub(crate) list_steps: bool,
    /// Parse and bind the scenarios without running any command.
    #[arg(long, conflicts_with = "list_steps")]
    pub(crate) dry_run: bool,
    /// Leave clusters in place after the run instead of deleting them.
    #[arg(long)]
    pub(crate) skip_cleanup: bool,
}
