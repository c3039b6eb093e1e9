//! Text-based pod state classification.
//!
//! The cluster query tool's only contract with the harness is the presence of
//! a handful of literal substrings in its output. All matching lives here so
//! the strategy can change without touching the poll loop.

/// Marker printed for pods whose containers are running.
pub const RUNNING_MARKER: &str = "Running";

/// Marker printed when every container of a single-container pod is ready.
pub const FULLY_READY_MARKER: &str = "1/1";

/// Marker printed for pods being torn down.
pub const TERMINATING_MARKER: &str = "Terminating";

/// Marker printed for pods whose containers failed.
pub const ERROR_MARKER: &str = "Error";

/// Marker printed when the selector matches nothing.
pub const ABSENT_MARKER: &str = "No resources found.";

/// Observed state of the pods matched by a selector.
#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub enum PodState {
    /// Running and fully ready.
    Ready,
    /// Terminating or errored; no further progress towards readiness.
    Failed,
    /// No pods match the selector.
    Absent,
    /// Anything else, including output that was never captured.
    Pending,
}

/// Classifies inspection output into a [`PodState`].
///
/// Readiness is checked before terminal-failure markers, so a listing where a
/// replacement pod is ready while an old one is still terminating converges.
#[must_use]
pub fn classify(stdout: Option<&str>) -> PodState {
    let Some(text) = stdout else {
        return PodState::Pending;
    };
    if text.contains(RUNNING_MARKER) && text.contains(FULLY_READY_MARKER) {
        PodState::Ready
    } else if text.contains(TERMINATING_MARKER) || text.contains(ERROR_MARKER) {
        PodState::Failed
    } else if text.contains(ABSENT_MARKER) {
        PodState::Absent
    } else {
        PodState::Pending
    }
}
