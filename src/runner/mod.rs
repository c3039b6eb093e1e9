//! Blocking process execution with full output capture.
//!
//! Every external program the harness touches (the tool under test, the
//! cluster query tool, cleanup commands) goes through [`CommandRunner`], so
//! tests can replace process spawning with a scripted double.

use std::io::{self, Write};
use std::process::{ChildStdin, Command, Stdio};
use std::thread;

use shell_escape::unix::escape;
use thiserror::Error;
use tracing::debug;

mod output;

pub use output::{CommandOutput, NIL_PLACEHOLDER, capture_buffer};

/// Errors raised when a command cannot be run to completion.
#[derive(Clone, Debug, Error, Eq, PartialEq)]
pub enum RunnerError {
    /// Raised when a command cannot be spawned or its pipes fail.
    #[error("failed to spawn {program}: {message}")]
    Spawn {
        /// Command that failed to start.
        program: String,
        /// Operating system error string.
        message: String,
    },
}

/// Abstraction over command execution to support fakes in tests.
pub trait CommandRunner {
    /// Runs `program` with `args`, feeding `stdin` when provided, and
    /// captures stdout and stderr.
    ///
    /// Output is returned for any exit status; classifying failure is the
    /// caller's job.
    ///
    /// # Errors
    ///
    /// Returns [`RunnerError::Spawn`] if the command cannot be started.
    fn run(
        &self,
        program: &str,
        args: &[String],
        stdin: Option<&str>,
    ) -> Result<CommandOutput, RunnerError>;
}

/// Real command runner that shells out to the host operating system.
///
/// The child inherits the caller's environment unmodified.
#[derive(Clone, Copy, Debug, Default)]
pub struct ProcessCommandRunner;

impl CommandRunner for ProcessCommandRunner {
    fn run(
        &self,
        program: &str,
        args: &[String],
        stdin: Option<&str>,
    ) -> Result<CommandOutput, RunnerError> {
        debug!(command = %render_command(program, args), stdin = stdin.is_some(), "spawning");
        let spawn_error = |err: std::io::Error| RunnerError::Spawn {
            program: program.to_owned(),
            message: err.to_string(),
        };

        let mut child = Command::new(program)
            .args(args)
            .stdin(if stdin.is_some() {
                Stdio::piped()
            } else {
                Stdio::null()
            })
            .stdout(Stdio::piped())
            .stderr(Stdio::piped())
            .spawn()
            .map_err(spawn_error)?;

        // Input is fed from its own thread so a child that writes before it
        // reads cannot fill the output pipes and stall the writer.
        let input_pipe = child.stdin.take();
        let (waited, fed) = thread::scope(|scope| {
            let writer = stdin
                .zip(input_pipe)
                .map(|(input, pipe)| scope.spawn(move || feed_stdin(pipe, input)));
            let result = child.wait_with_output();
            let written = writer.map_or(Ok(()), |handle| {
                handle
                    .join()
                    .unwrap_or_else(|_| Err(io::Error::other("stdin writer panicked")))
            });
            (result, written)
        });
        fed.map_err(spawn_error)?;
        let output = waited.map_err(spawn_error)?;
        let captured =
            CommandOutput::from_buffers(output.status.code(), &output.stdout, &output.stderr);
        debug!(program, status = %captured.status_text(), "command finished");
        Ok(captured)
    }
}

/// Writes `input` in full, then closes the pipe so the child sees EOF.
///
/// A child that exits without reading everything closes its end first; the
/// resulting broken pipe is not an error.
fn feed_stdin(mut pipe: ChildStdin, input: &str) -> io::Result<()> {
    match pipe.write_all(input.as_bytes()) {
        Err(err) if err.kind() == io::ErrorKind::BrokenPipe => {
            debug!(input_bytes = input.len(), "child closed stdin before reading all input");
        }
        other => other?,
    }
    drop(pipe);
    Ok(())
}

/// Renders a shell-like, escaped command line for logs and reports.
#[must_use]
pub fn render_command(program: &str, args: &[String]) -> String {
    let mut rendered = String::from(escape(program.into()));
    for arg in args {
        rendered.push(' ');
        rendered.push_str(escape(arg.as_str().into()).as_ref());
    }
    rendered
}
