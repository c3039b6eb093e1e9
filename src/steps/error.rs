//! Error types for step binding and execution.

use thiserror::Error;

use crate::poll::PollError;
use crate::runner::RunnerError;
use crate::version::VersionError;

/// How a failure affects the rest of the run.
#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub enum FailureKind {
    /// The suite itself is misconfigured; the run aborts.
    Configuration,
    /// A process could not be spawned; the scenario fails.
    Execution,
    /// Observed state differs from the expectation; the scenario fails.
    Assertion,
}

/// Errors raised by step handlers.
#[derive(Debug, Error)]
pub enum StepError {
    /// Raised when a command is run before a program was chosen.
    #[error("the terminal command to call is undefined")]
    UndefinedBinary,
    /// Raised when a bound step refers to a definition the registry lacks.
    #[error("no step definition at index {0}")]
    Unbound(usize),
    /// Raised when a process cannot be spawned.
    #[error(transparent)]
    Execution(#[from] RunnerError),
    /// Raised when output or state does not match the expectation.
    #[error("assertion failed: {0}")]
    Assertion(String),
    /// Raised when polling fails.
    #[error(transparent)]
    Poll(#[from] PollError),
    /// Raised when client and server versions do not line up.
    #[error(transparent)]
    Version(#[from] VersionError),
}

impl StepError {
    /// Classifies the error for the suite driver.
    #[must_use]
    pub const fn kind(&self) -> FailureKind {
        match self {
            Self::UndefinedBinary | Self::Unbound(_) => FailureKind::Configuration,
            Self::Execution(_) | Self::Poll(PollError::Inspection(_)) => FailureKind::Execution,
            Self::Assertion(_) | Self::Poll(_) | Self::Version(_) => FailureKind::Assertion,
        }
    }
}

/// Errors raised while building the step table or binding step text.
#[derive(Clone, Debug, Error, Eq, PartialEq)]
pub enum RegistryError {
    /// Raised when a pattern is not a valid regular expression.
    #[error("invalid step pattern `{pattern}`: {message}")]
    InvalidPattern {
        /// Pattern as registered.
        pattern: String,
        /// Regex compiler message.
        message: String,
    },
    /// Raised when a handler's arity differs from the pattern's captures.
    #[error("step pattern `{pattern}` has {found} capture groups but its handler takes {expected}")]
    ArityMismatch {
        /// Pattern as registered.
        pattern: String,
        /// Arguments the handler declared.
        expected: usize,
        /// Capture groups in the pattern.
        found: usize,
    },
    /// Raised when no pattern matches a step.
    #[error("undefined step: {step}")]
    Undefined {
        /// Step text.
        step: String,
    },
    /// Raised when several patterns match a step.
    #[error("ambiguous step: {step} matches {}", patterns.join(", "))]
    Ambiguous {
        /// Step text.
        step: String,
        /// Every matching pattern.
        patterns: Vec<String>,
    },
}
