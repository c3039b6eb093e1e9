//! Best-effort removal of everything the suite created.

use thiserror::Error;
use tracing::{info, warn};

use crate::config::HarnessConfig;
use crate::runner::{CommandOutput, CommandRunner, RunnerError, render_command};
use crate::steps::delete_all_clusters_args;

/// What a cleanup pass did.
#[derive(Clone, Copy, Debug, Default, Eq, PartialEq)]
pub struct CleanupReport {
    /// Whether deleting every cluster through the tool succeeded.
    pub primary_succeeded: bool,
    /// Whether the volume-claim fallback ran.
    pub fallback_attempted: bool,
    /// Outcome of the fallback, when it ran.
    pub fallback_succeeded: Option<bool>,
}

impl CleanupReport {
    /// Returns `true` when either action left the cluster clean.
    #[must_use]
    pub const fn is_clean(&self) -> bool {
        self.primary_succeeded || matches!(self.fallback_succeeded, Some(true))
    }
}

/// Reasons a cleanup action failed. Only ever logged.
#[derive(Debug, Error)]
pub enum CleanupError {
    /// Raised when the command cannot be spawned.
    #[error(transparent)]
    Spawn(#[from] RunnerError),
    /// Raised when the command exits unsuccessfully.
    #[error("{command} exited with status {status}")]
    ExitStatus {
        /// Rendered command line.
        command: String,
        /// Exit status text.
        status: String,
    },
    /// Raised when the command writes to stderr.
    #[error("{command} wrote to stderr: {stderr}")]
    Stderr {
        /// Rendered command line.
        command: String,
        /// Captured stderr.
        stderr: String,
    },
}

/// Deletes every cluster, falling back to deleting the clusters' volume
/// claims directly when that fails.
///
/// Never fails: the fallback runs at most once and its own failure is only
/// logged.
pub fn cleanup<R: CommandRunner>(runner: &R, config: &HarnessConfig) -> CleanupReport {
    let primary_args = delete_all_clusters_args();
    if let Err(err) = run_checked(runner, &config.tool_bin, &primary_args) {
        warn!(error = %err, "cluster cleanup failed; deleting volume claims instead");
        let fallback_args = vec![
            String::from("delete"),
            String::from("pvc"),
            String::from("-l"),
            config.cleanup_pvc_selector.clone(),
        ];
        let fallback = run_checked(runner, &config.kubectl_bin, &fallback_args);
        if let Err(fallback_err) = &fallback {
            warn!(error = %fallback_err, "volume claim cleanup failed");
        }
        return CleanupReport {
            primary_succeeded: false,
            fallback_attempted: true,
            fallback_succeeded: Some(fallback.is_ok()),
        };
    }

    info!("deleted all clusters");
    CleanupReport {
        primary_succeeded: true,
        ..CleanupReport::default()
    }
}

fn run_checked<R: CommandRunner>(
    runner: &R,
    program: &str,
    args: &[String],
) -> Result<CommandOutput, CleanupError> {
    let output = runner.run(program, args, None)?;
    if !output.is_success() {
        return Err(CleanupError::ExitStatus {
            command: render_command(program, args),
            status: output.status_text(),
        });
    }
    if output.has_stderr() {
        return Err(CleanupError::Stderr {
            command: render_command(program, args),
            stderr: output.stderr.unwrap_or_default(),
        });
    }
    Ok(output)
}
