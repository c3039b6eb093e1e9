//! Per-scenario terminal state and the world handed to step handlers.

use tracing::debug;

use crate::config::HarnessConfig;
use crate::poll::Poller;
use crate::runner::{CommandRunner, render_command};
use crate::steps::StepError;

/// Mutable state of the command a scenario last prepared or ran.
///
/// Cleared before every scenario; streams are `None` until a command has
/// actually produced them.
#[derive(Clone, Debug, Default, Eq, PartialEq)]
pub struct ScenarioContext {
    /// Program to execute; empty means undefined.
    pub binary_to_call: String,
    /// Arguments passed to the program.
    pub cmd_args: Vec<String>,
    /// Input fed to the program, if any.
    pub stdin: Option<String>,
    /// Captured standard output of the last run.
    pub stdout: Option<String>,
    /// Captured standard error of the last run.
    pub stderr: Option<String>,
    /// Exit code of the last run.
    pub exit_code: Option<i32>,
}

impl ScenarioContext {
    /// Clears every field to its absent or empty state.
    pub fn reset(&mut self) {
        *self = Self::default();
    }

    /// Returns `true` when nothing is prepared or captured.
    #[must_use]
    pub fn is_clear(&self) -> bool {
        *self == Self::default()
    }

    /// Sets the command to run next.
    pub fn prepare(&mut self, binary: impl Into<String>, args: Vec<String>) {
        self.binary_to_call = binary.into();
        self.cmd_args = args;
    }

    /// Runs the prepared command, storing its output.
    ///
    /// Previous output is discarded first, so a spawn failure leaves the
    /// streams absent rather than stale.
    ///
    /// # Errors
    ///
    /// Returns [`StepError::UndefinedBinary`] when no program is prepared and
    /// [`StepError::Execution`] when it cannot be spawned.
    pub fn execute<R: CommandRunner>(&mut self, runner: &R) -> Result<(), StepError> {
        if self.binary_to_call.trim().is_empty() {
            return Err(StepError::UndefinedBinary);
        }
        self.stdout = None;
        self.stderr = None;
        self.exit_code = None;

        let output = runner.run(&self.binary_to_call, &self.cmd_args, self.stdin.as_deref())?;
        debug!(
            command = %render_command(&self.binary_to_call, &self.cmd_args),
            status = %output.status_text(),
            "captured command output"
        );
        self.exit_code = output.code;
        self.stdout = output.stdout;
        self.stderr = output.stderr;
        Ok(())
    }

    /// Fails when the last run wrote anything to stderr.
    ///
    /// # Errors
    ///
    /// Returns [`StepError::Assertion`] quoting the stderr text.
    pub fn ensure_no_stderr(&self) -> Result<(), StepError> {
        match self.stderr.as_deref() {
            Some(text) if !text.is_empty() => Err(StepError::Assertion(format!(
                "command errored with stderr of: {text}"
            ))),
            _ => Ok(()),
        }
    }

    /// Fails when the last run exited non-zero or wrote to stderr.
    ///
    /// # Errors
    ///
    /// Returns [`StepError::Assertion`] describing the failure.
    pub fn ensure_success(&self) -> Result<(), StepError> {
        if self.exit_code != Some(0) {
            let status = self
                .exit_code
                .map_or_else(|| String::from("unknown"), |code| code.to_string());
            return Err(StepError::Assertion(format!(
                "{} exited with status {status}: {}",
                render_command(&self.binary_to_call, &self.cmd_args),
                self.stdout.as_deref().unwrap_or_default().trim_end()
            )));
        }
        self.ensure_no_stderr()
    }

    /// Fails unless the captured stdout contains `needle`.
    ///
    /// # Errors
    ///
    /// Returns [`StepError::Assertion`] when stdout is absent or lacks the
    /// text.
    pub fn ensure_stdout_contains(&self, needle: &str) -> Result<(), StepError> {
        let Some(stdout) = self.stdout.as_deref() else {
            return Err(StepError::Assertion(format!(
                "expected stdout containing ({needle}) but nothing was captured"
            )));
        };
        if stdout.contains(needle) {
            return Ok(());
        }
        Err(StepError::Assertion(format!(
            "stdout did not contain ({needle}) and was:\n{stdout}"
        )))
    }
}

/// Everything a step handler may touch: the scenario context plus the
/// collaborators used to reach the outside world.
#[derive(Debug)]
pub struct World<R: CommandRunner> {
    /// Per-scenario state.
    pub context: ScenarioContext,
    /// Runner used for every external command.
    pub runner: R,
    /// Harness settings.
    pub config: HarnessConfig,
}

impl<R: CommandRunner> World<R> {
    /// Creates a world with a clear context.
    #[must_use]
    pub fn new(runner: R, config: HarnessConfig) -> Self {
        Self {
            context: ScenarioContext::default(),
            runner,
            config,
        }
    }

    /// Runs the tool under test with `args`, feeding the context stdin.
    ///
    /// # Errors
    ///
    /// Propagates [`ScenarioContext::execute`] failures.
    pub fn run_tool(&mut self, args: Vec<String>) -> Result<(), StepError> {
        self.context.prepare(self.config.tool_bin.clone(), args);
        self.context.execute(&self.runner)
    }

    /// Returns a poller using the configured cluster query tool.
    #[must_use]
    pub fn poller(&self) -> Poller<'_, R> {
        Poller::new(&self.runner, &self.config.kubectl_bin)
    }
}
