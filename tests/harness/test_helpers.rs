//! Shared fixtures and helpers for harness BDD scenarios.

use camino::Utf8Path;
use pgo_acceptance::test_support::ScriptedRunner;
use pgo_acceptance::{HarnessConfig, Suite, SuiteReport, parse_feature};
use rstest::fixture;

/// Path recorded for features built in memory.
pub const FEATURE_PATH: &str = "features/behaviour.feature";

#[derive(Clone, Debug)]
pub enum RunOutcome {
    Completed(SuiteReport),
    Failed(String),
}

#[derive(Clone, Debug)]
pub struct HarnessContext {
    pub config: HarnessConfig,
    pub runner: ScriptedRunner,
    pub feature: Option<String>,
    pub outcome: Option<RunOutcome>,
}

#[fixture]
pub fn harness_context() -> HarnessContext {
    HarnessContext {
        config: HarnessConfig {
            poll_interval_secs: 0,
            ..HarnessConfig::default()
        },
        runner: ScriptedRunner::new(),
        feature: None,
        outcome: None,
    }
}

/// Wraps step lines in a single-scenario feature.
pub fn single_scenario(steps: &[&str]) -> String {
    let mut text = String::from("Feature: Behaviour\n  Scenario: Under test\n");
    for step in steps {
        text.push_str("    When ");
        text.push_str(step);
        text.push('\n');
    }
    text
}

/// Loads and runs the context's feature through the `pgo` suite.
pub fn run_suite(context: &HarnessContext) -> RunOutcome {
    let text = context
        .feature
        .as_deref()
        .unwrap_or_else(|| panic!("test setup requires a feature"));
    let feature = parse_feature(Utf8Path::new(FEATURE_PATH), text)
        .unwrap_or_else(|err| panic!("feature should parse: {err}"));
    let suite = Suite::pgo(context.config.clone(), context.runner.clone())
        .unwrap_or_else(|err| panic!("pgo suite should build: {err}"));

    match suite.load(&[feature]).and_then(|mut loaded| loaded.run()) {
        Ok(report) => RunOutcome::Completed(report),
        Err(err) => RunOutcome::Failed(err.to_string()),
    }
}

/// Returns every recorded command line.
pub fn commands(runner: &ScriptedRunner) -> Vec<String> {
    runner
        .invocations()
        .iter()
        .map(|call| call.command_string())
        .collect()
}
