//! Captured process output and placeholder normalisation.

/// Literal text some capture layers emit in place of "no data".
///
/// A buffer that decodes to exactly this string is reported as absent so
/// callers checking for emptiness are not fooled by a stringified null.
pub const NIL_PLACEHOLDER: &str = "<nil>";

/// Result of running an external command.
#[derive(Clone, Debug, Default, Eq, PartialEq)]
pub struct CommandOutput {
    /// Exit code reported by the process, if available.
    pub code: Option<i32>,
    /// Captured standard output; `None` when nothing was captured.
    pub stdout: Option<String>,
    /// Captured standard error; `None` when nothing was captured.
    pub stderr: Option<String>,
}

impl CommandOutput {
    /// Builds an output from raw captured buffers.
    #[must_use]
    pub fn from_buffers(code: Option<i32>, stdout: &[u8], stderr: &[u8]) -> Self {
        Self {
            code,
            stdout: capture_buffer(stdout),
            stderr: capture_buffer(stderr),
        }
    }

    /// Returns `true` when the exit code equals zero.
    #[must_use]
    pub const fn is_success(&self) -> bool {
        matches!(self.code, Some(0))
    }

    /// Returns `true` when stderr holds any text.
    #[must_use]
    pub fn has_stderr(&self) -> bool {
        self.stderr.as_deref().is_some_and(|text| !text.is_empty())
    }

    /// Human readable exit status for error messages.
    #[must_use]
    pub fn status_text(&self) -> String {
        self.code
            .map_or_else(|| String::from("unknown"), |code| code.to_string())
    }
}

/// Decodes a captured buffer, mapping the placeholder to `None`.
///
/// Empty buffers stay present as an empty string: the process ran and wrote
/// nothing, which is different from "never captured".
#[must_use]
pub fn capture_buffer(buffer: &[u8]) -> Option<String> {
    let text = String::from_utf8_lossy(buffer);
    if text == NIL_PLACEHOLDER {
        return None;
    }
    Some(text.into_owned())
}
