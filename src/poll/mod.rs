//! Bounded convergence polling against the cluster query tool.
//!
//! The orchestrator is eventually consistent: a freshly created cluster takes
//! a while to schedule pods, and deleted pods linger while terminating. The
//! [`Poller`] repeatedly runs `get pod -l <selector>` until the output shows
//! the expected state or the attempt budget runs out.

use std::fmt;
use std::thread;
use std::time::Duration;

use thiserror::Error;
use tracing::{debug, info, warn};

use crate::config::HarnessConfig;
use crate::runner::{CommandRunner, RunnerError, render_command};

mod classify;

pub use classify::{
    ABSENT_MARKER, ERROR_MARKER, FULLY_READY_MARKER, PodState, RUNNING_MARKER,
    TERMINATING_MARKER, classify,
};

/// Label prepended to a selector to target a cluster's primary pod.
pub const PRIMARY_LABEL: &str = "primary=true";

/// State a poll is waiting for.
#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub enum PollTarget {
    /// At least one matching pod is running and fully ready.
    Ready,
    /// No pods match the selector.
    Absent,
}

impl PollTarget {
    const fn is_met_by(self, state: PodState) -> bool {
        matches!(
            (self, state),
            (Self::Ready, PodState::Ready) | (Self::Absent, PodState::Absent)
        )
    }
}

impl fmt::Display for PollTarget {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Ready => f.write_str("ready"),
            Self::Absent => f.write_str("absent"),
        }
    }
}

/// Parameters for a single poll.
#[derive(Clone, Debug, Eq, PartialEq)]
pub struct PollSpec {
    /// Label selector passed to `-l`.
    pub selector: String,
    /// State to wait for.
    pub target: PollTarget,
    /// Maximum number of inspection attempts.
    pub attempts: u32,
    /// Sleep before each attempt.
    pub interval: Duration,
}

impl PollSpec {
    /// Waits for pods matching `selector` to be ready, using the configured
    /// budget.
    #[must_use]
    pub fn ready(selector: impl Into<String>, config: &HarnessConfig) -> Self {
        Self::with_budget(selector, PollTarget::Ready, config)
    }

    /// Waits for no pods to match `selector`, using the configured budget.
    #[must_use]
    pub fn absent(selector: impl Into<String>, config: &HarnessConfig) -> Self {
        Self::with_budget(selector, PollTarget::Absent, config)
    }

    fn with_budget(
        selector: impl Into<String>,
        target: PollTarget,
        config: &HarnessConfig,
    ) -> Self {
        Self {
            selector: selector.into(),
            target,
            attempts: config.poll_attempts,
            interval: config.poll_interval(),
        }
    }
}

/// Builds the selector for the primary pod of the clusters matched by
/// `labels`.
#[must_use]
pub fn primary_selector(labels: &str) -> String {
    format!("{PRIMARY_LABEL},{labels}")
}

/// Successful poll result.
#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub struct PollOutcome {
    /// Attempt (1-based) on which the target state was observed.
    pub attempt: u32,
}

/// Errors raised while polling.
#[derive(Clone, Debug, Error, Eq, PartialEq)]
pub enum PollError {
    /// Raised when the inspection command cannot be run.
    #[error("pod inspection failed: {0}")]
    Inspection(#[source] RunnerError),
    /// Raised when pods enter a terminal state while waiting for readiness.
    #[error("pods labeled {selector} entered an unexpected state: {output}")]
    UnexpectedState {
        /// Selector being polled.
        selector: String,
        /// Inspection output that showed the terminal state.
        output: String,
    },
    /// Raised when the attempt budget is spent without reaching the target.
    #[error("pods labeled {selector} were not {target} after {attempts} attempts: {output}")]
    NotConverged {
        /// Selector being polled.
        selector: String,
        /// State that was expected.
        target: PollTarget,
        /// Number of attempts made.
        attempts: u32,
        /// Last inspection output.
        output: String,
    },
}

/// Polls pod state through a [`CommandRunner`].
#[derive(Debug)]
pub struct Poller<'a, R: CommandRunner> {
    runner: &'a R,
    program: &'a str,
}

impl<'a, R: CommandRunner> Poller<'a, R> {
    /// Creates a poller invoking `program` (the cluster query tool).
    #[must_use]
    pub const fn new(runner: &'a R, program: &'a str) -> Self {
        Self { runner, program }
    }

    /// Polls until `spec` is satisfied or its budget is exhausted.
    ///
    /// For [`PollTarget::Ready`], a terminating or errored pod aborts the poll
    /// at once. Both targets re-check the last captured output once the
    /// budget is spent.
    ///
    /// # Errors
    ///
    /// Returns [`PollError::Inspection`] when the query tool cannot run,
    /// [`PollError::UnexpectedState`] on a terminal pod state while waiting
    /// for readiness, and [`PollError::NotConverged`] when the budget runs
    /// out.
    pub fn wait(&self, spec: &PollSpec) -> Result<PollOutcome, PollError> {
        let args = inspection_args(&spec.selector);
        let mut last_stdout: Option<String> = None;

        for attempt in 1..=spec.attempts {
            thread::sleep(spec.interval);
            let output = self
                .runner
                .run(self.program, &args, None)
                .map_err(PollError::Inspection)?;
            if !output.is_success() {
                warn!(
                    command = %render_command(self.program, &args),
                    status = %output.status_text(),
                    "inspection exited unsuccessfully"
                );
            }

            let state = classify(output.stdout.as_deref());
            debug!(selector = %spec.selector, attempt, ?state, "inspected pods");
            if spec.target.is_met_by(state) {
                info!(selector = %spec.selector, target = %spec.target, attempt, "pods converged");
                return Ok(PollOutcome { attempt });
            }
            if spec.target == PollTarget::Ready && state == PodState::Failed {
                return Err(PollError::UnexpectedState {
                    selector: spec.selector.clone(),
                    output: output.stdout.unwrap_or_default(),
                });
            }
            last_stdout = output.stdout;
        }

        Self::final_check(spec, last_stdout)
    }

    fn final_check(spec: &PollSpec, last_stdout: Option<String>) -> Result<PollOutcome, PollError> {
        if spec.target.is_met_by(classify(last_stdout.as_deref())) {
            return Ok(PollOutcome {
                attempt: spec.attempts,
            });
        }
        warn!(selector = %spec.selector, target = %spec.target, attempts = spec.attempts, "pods did not converge");
        Err(PollError::NotConverged {
            selector: spec.selector.clone(),
            target: spec.target,
            attempts: spec.attempts,
            output: last_stdout.unwrap_or_default(),
        })
    }
}

fn inspection_args(selector: &str) -> Vec<String> {
    vec![
        String::from("get"),
        String::from("pod"),
        String::from("-l"),
        selector.to_owned(),
    ]
}
