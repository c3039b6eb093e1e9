//! Suite lifecycle: binding feature files to steps and driving scenarios.
//!
//! A [`Suite`] owns the step registry, the [`World`] handed to handlers, and
//! two callback lists. Loading binds every step of every scenario before any
//! process runs; running drives scenarios one after another, resetting state
//! before each and running the after-suite callbacks once at the end.

use std::fmt;

use thiserror::Error;
use tracing::{error, info, warn};

use crate::config::HarnessConfig;
use crate::context::World;
use crate::feature::{Feature, FeatureError, Step};
use crate::runner::CommandRunner;
use crate::steps::{BoundStep, FailureKind, RegistryError, StepError, StepRegistry, pgo_steps};

mod cleanup;

pub use cleanup::{CleanupError, CleanupReport, cleanup};

/// Callback run before every scenario.
pub type BeforeScenario<R> = Box<dyn FnMut(&mut World<R>)>;

/// Callback run once after the last scenario.
pub type AfterSuite<R> = Box<dyn FnMut(&World<R>)>;

/// Errors that stop a suite from loading or finishing.
#[derive(Debug, Error)]
pub enum SuiteError {
    /// Raised when one or more steps cannot be bound.
    #[error("{} step(s) could not be bound:\n{}", failures.len(), failures.join("\n"))]
    Configuration {
        /// Each failure prefixed with its `path:line` location.
        failures: Vec<String>,
    },
    /// Raised when the step table itself is invalid.
    #[error(transparent)]
    Registry(#[from] RegistryError),
    /// Raised when feature files cannot be read or parsed.
    #[error(transparent)]
    Feature(#[from] FeatureError),
    /// Raised when a step reports a configuration failure mid-run.
    #[error("run aborted in scenario `{scenario}` at `{step}`: {message}")]
    Aborted {
        /// Scenario being run.
        scenario: String,
        /// Step that failed.
        step: String,
        /// Failure message.
        message: String,
    },
}

/// A scenario with every step resolved to its definition.
#[derive(Clone, Debug, Eq, PartialEq)]
pub struct BoundScenario {
    /// Name of the feature the scenario belongs to.
    pub feature: String,
    /// Scenario title.
    pub name: String,
    /// `path:line` of the scenario header.
    pub location: String,
    /// Steps in run order.
    pub steps: Vec<BoundStep>,
}

/// How a scenario ended.
#[derive(Clone, Debug, Eq, PartialEq)]
pub enum ScenarioStatus {
    /// Every step passed.
    Passed,
    /// A step failed; the steps after it were skipped.
    Failed {
        /// Text of the failing step.
        step: String,
        /// Failure message.
        message: String,
        /// Failure classification.
        kind: FailureKind,
    },
}

/// Result of one scenario.
#[derive(Clone, Debug, Eq, PartialEq)]
pub struct ScenarioOutcome {
    /// Feature name.
    pub feature: String,
    /// Scenario title.
    pub scenario: String,
    /// How it ended.
    pub status: ScenarioStatus,
}

impl ScenarioOutcome {
    /// Returns `true` when the scenario passed.
    #[must_use]
    pub const fn passed(&self) -> bool {
        matches!(self.status, ScenarioStatus::Passed)
    }
}

/// Outcomes of a full run.
#[derive(Clone, Debug, Default, Eq, PartialEq)]
pub struct SuiteReport {
    /// Outcomes in run order.
    pub outcomes: Vec<ScenarioOutcome>,
}

impl SuiteReport {
    /// Number of passing scenarios.
    #[must_use]
    pub fn passed(&self) -> usize {
        self.outcomes.iter().filter(|outcome| outcome.passed()).count()
    }

    /// Number of failing scenarios.
    #[must_use]
    pub fn failed(&self) -> usize {
        self.outcomes.len() - self.passed()
    }

    /// Returns `true` when no scenario failed.
    #[must_use]
    pub fn all_passed(&self) -> bool {
        self.failed() == 0
    }

    /// One-line summary such as `3 scenarios (2 passed, 1 failed)`.
    #[must_use]
    pub fn summary(&self) -> String {
        format!(
            "{} scenarios ({} passed, {} failed)",
            self.outcomes.len(),
            self.passed(),
            self.failed()
        )
    }
}

/// Step registry, world and lifecycle callbacks for one run.
pub struct Suite<R: CommandRunner> {
    registry: StepRegistry<R>,
    world: World<R>,
    before_scenario: Vec<BeforeScenario<R>>,
    after_suite: Vec<AfterSuite<R>>,
}

impl<R: CommandRunner> fmt::Debug for Suite<R> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Suite")
            .field("registry", &self.registry)
            .field("before_scenario", &self.before_scenario.len())
            .field("after_suite", &self.after_suite.len())
            .finish_non_exhaustive()
    }
}

impl<R: CommandRunner + 'static> Suite<R> {
    /// Creates a suite with no callbacks.
    #[must_use]
    pub const fn new(registry: StepRegistry<R>, world: World<R>) -> Self {
        Self {
            registry,
            world,
            before_scenario: Vec::new(),
            after_suite: Vec::new(),
        }
    }

    /// Builds the `pgo` suite: the canonical step table, a context reset
    /// before every scenario, and cluster cleanup after the run.
    ///
    /// # Errors
    ///
    /// Returns [`SuiteError::Registry`] when the step table fails to build.
    pub fn pgo(config: HarnessConfig, runner: R) -> Result<Self, SuiteError> {
        let mut suite = Self::new(pgo_steps()?, World::new(runner, config));
        suite.before_scenario(|world| world.context.reset());
        suite.after_suite(|world| {
            let report = cleanup(&world.runner, &world.config);
            info!(?report, "after-suite cleanup finished");
        });
        Ok(suite)
    }

    /// Adds a callback run before every scenario.
    pub fn before_scenario<F>(&mut self, callback: F)
    where
        F: FnMut(&mut World<R>) + 'static,
    {
        self.before_scenario.push(Box::new(callback));
    }

    /// Adds a callback run once after the last scenario.
    pub fn after_suite<F>(&mut self, callback: F)
    where
        F: FnMut(&World<R>) + 'static,
    {
        self.after_suite.push(Box::new(callback));
    }

    /// Drops every after-suite callback.
    pub fn clear_after_suite(&mut self) {
        self.after_suite.clear();
    }

    /// Step table used to bind scenarios.
    #[must_use]
    pub const fn registry(&self) -> &StepRegistry<R> {
        &self.registry
    }

    /// Step table, for registering steps beyond the built-in ones.
    pub const fn registry_mut(&mut self) -> &mut StepRegistry<R> {
        &mut self.registry
    }

    /// Binds every step of `features`.
    ///
    /// # Errors
    ///
    /// Returns [`SuiteError::Configuration`] listing every step that is
    /// undefined or ambiguous, each with its `path:line` location.
    pub fn load(self, features: &[Feature]) -> Result<LoadedSuite<R>, SuiteError> {
        let mut failures = Vec::new();
        let mut scenarios = Vec::new();

        for feature in features {
            for scenario in &feature.scenarios {
                let mut steps = Vec::with_capacity(scenario.steps.len());
                for step in &scenario.steps {
                    match self.registry.bind(&step.text) {
                        Ok(bound) => steps.push(bound),
                        Err(err) => failures.push(format!("{}: {err}", step_location(feature, step))),
                    }
                }
                scenarios.push(BoundScenario {
                    feature: feature.name.clone(),
                    name: scenario.name.clone(),
                    location: format!("{}:{}", feature.path, scenario.line),
                    steps,
                });
            }
        }

        if !failures.is_empty() {
            return Err(SuiteError::Configuration { failures });
        }
        Ok(LoadedSuite {
            suite: self,
            scenarios,
        })
    }
}

fn step_location(feature: &Feature, step: &Step) -> String {
    format!("{}:{}", feature.path, step.line)
}

/// A suite whose scenarios are bound and ready to run.
#[derive(Debug)]
pub struct LoadedSuite<R: CommandRunner> {
    suite: Suite<R>,
    scenarios: Vec<BoundScenario>,
}

impl<R: CommandRunner + 'static> LoadedSuite<R> {
    /// Bound scenarios in run order.
    #[must_use]
    pub fn scenarios(&self) -> &[BoundScenario] {
        &self.scenarios
    }

    /// Runs every scenario, then the after-suite callbacks.
    ///
    /// A failing step ends its scenario; later scenarios still run.
    ///
    /// # Errors
    ///
    /// Returns [`SuiteError::Aborted`] when a step reports a configuration
    /// failure. The after-suite callbacks still run first.
    pub fn run(&mut self) -> Result<SuiteReport, SuiteError> {
        let mut report = SuiteReport::default();

        for scenario in &self.scenarios {
            for callback in &mut self.suite.before_scenario {
                callback(&mut self.suite.world);
            }
            info!(feature = %scenario.feature, scenario = %scenario.name, "running scenario");

            let status = match run_steps(&self.suite.registry, &mut self.suite.world, scenario) {
                Ok(()) => ScenarioStatus::Passed,
                Err((step, err)) => {
                    let kind = err.kind();
                    if kind == FailureKind::Configuration {
                        error!(scenario = %scenario.name, step = %step, error = %err, "aborting run");
                        finish(&mut self.suite);
                        return Err(SuiteError::Aborted {
                            scenario: scenario.name.clone(),
                            step,
                            message: err.to_string(),
                        });
                    }
                    warn!(scenario = %scenario.name, step = %step, error = %err, "scenario failed");
                    ScenarioStatus::Failed {
                        step,
                        message: err.to_string(),
                        kind,
                    }
                }
            };
            report.outcomes.push(ScenarioOutcome {
                feature: scenario.feature.clone(),
                scenario: scenario.name.clone(),
                status,
            });
        }

        finish(&mut self.suite);
        info!(summary = %report.summary(), "suite finished");
        Ok(report)
    }
}

fn finish<R: CommandRunner>(suite: &mut Suite<R>) {
    for callback in &mut suite.after_suite {
        callback(&suite.world);
    }
}

fn run_steps<R: CommandRunner>(
    registry: &StepRegistry<R>,
    world: &mut World<R>,
    scenario: &BoundScenario,
) -> Result<(), (String, StepError)> {
    for step in &scenario.steps {
        registry
            .dispatch(world, step)
            .map_err(|err| (step.text.clone(), err))?;
    }
    Ok(())
}
