//! BDD step definitions for harness behaviour.

use pgo_acceptance::ScenarioStatus;
use pgo_acceptance::test_support::pod_listing;
use rstest_bdd_macros::{given, then, when};

use super::test_helpers::{HarnessContext, RunOutcome, commands, run_suite, single_scenario};

#[derive(Debug, thiserror::Error)]
pub enum StepError {
    #[error("assertion failed: {0}")]
    Assertion(String),
}

#[given("a pgo suite with a poll budget of {attempts:u32} attempts")]
fn suite_with_budget(mut harness_context: HarnessContext, attempts: u32) -> HarnessContext {
    harness_context.config.poll_attempts = attempts;
    harness_context
}

#[given("a feature waiting for the primary pod of \"{labels}\"")]
fn feature_waiting_for_primary(mut harness_context: HarnessContext, labels: String) -> HarnessContext {
    let step = format!("A primary pod labeled with \"{labels}\" should be up");
    harness_context.feature = Some(single_scenario(&[step.as_str()]));
    harness_context
}

#[given("a feature that checks the pgo version")]
fn feature_checking_version(mut harness_context: HarnessContext) -> HarnessContext {
    harness_context.feature = Some(single_scenario(&[
        "I run \"pgo version\"",
        "There should be matching version info for both client and server",
    ]));
    harness_context
}

#[given("a feature containing the step \"{step}\"")]
fn feature_with_step(mut harness_context: HarnessContext, step: String) -> HarnessContext {
    harness_context.feature = Some(single_scenario(&[step.as_str()]));
    harness_context
}

#[given("kubectl reports the pod as pending on every attempt")]
fn kubectl_reports_pending(harness_context: HarnessContext) -> HarnessContext {
    for _ in 0..harness_context.config.poll_attempts {
        harness_context
            .runner
            .push_stdout(pod_listing("mycluster-7d9f", "0/1", "Pending"));
    }
    harness_context
}

#[given("pgo reports matching client and server versions")]
fn pgo_reports_versions(harness_context: HarnessContext) -> HarnessContext {
    harness_context
        .runner
        .push_stdout("pgo client version 4.0.1\npgo-apiserver version 4.0.1\n");
    harness_context
}

#[given("deleting every cluster succeeds")]
fn delete_all_succeeds(harness_context: HarnessContext) -> HarnessContext {
    harness_context
        .runner
        .push_stdout("deleted all clusters\n");
    harness_context
}

#[given("deleting every cluster fails with \"{stderr}\"")]
fn delete_all_fails(harness_context: HarnessContext, stderr: String) -> HarnessContext {
    harness_context.runner.push_failure(1, stderr);
    harness_context
        .runner
        .push_stdout("persistentvolumeclaim \"mycluster\" deleted\n");
    harness_context
}

#[when("I run the suite")]
fn run_the_suite(mut harness_context: HarnessContext) -> HarnessContext {
    harness_context.outcome = Some(run_suite(&harness_context));
    harness_context
}

fn report(harness_context: &HarnessContext) -> Result<&pgo_acceptance::SuiteReport, StepError> {
    match harness_context.outcome.as_ref() {
        Some(RunOutcome::Completed(report)) => Ok(report),
        Some(RunOutcome::Failed(message)) => Err(StepError::Assertion(format!(
            "expected the suite to complete, got: {message}"
        ))),
        None => Err(StepError::Assertion(String::from("missing outcome"))),
    }
}

#[then("the scenario fails with \"{fragment}\"")]
fn scenario_fails_with(harness_context: &HarnessContext, fragment: String) -> Result<(), StepError> {
    let report = report(harness_context)?;
    let Some(outcome) = report.outcomes.first() else {
        return Err(StepError::Assertion(String::from("no scenario ran")));
    };
    match &outcome.status {
        ScenarioStatus::Failed { message, .. } if message.contains(&fragment) => Ok(()),
        status => Err(StepError::Assertion(format!(
            "expected a failure mentioning {fragment:?}, got {status:?}"
        ))),
    }
}

#[then("every scenario passes")]
fn every_scenario_passes(harness_context: &HarnessContext) -> Result<(), StepError> {
    let report = report(harness_context)?;
    if report.all_passed() && !report.outcomes.is_empty() {
        Ok(())
    } else {
        Err(StepError::Assertion(format!(
            "expected every scenario to pass, got {report:?}"
        )))
    }
}

#[then("kubectl was asked for pods labeled \"{selector}\"")]
fn kubectl_was_asked(harness_context: &HarnessContext, selector: String) -> Result<(), StepError> {
    let expected = format!("kubectl get pod -l {selector}");
    let asked = commands(&harness_context.runner)
        .iter()
        .filter(|command| **command == expected)
        .count();
    let budget = harness_context.config.poll_attempts as usize;
    if asked == budget {
        Ok(())
    } else {
        Err(StepError::Assertion(format!(
            "expected {budget} inspections of {selector}, saw {asked}"
        )))
    }
}

fn last_command(harness_context: &HarnessContext) -> Result<String, StepError> {
    commands(&harness_context.runner)
        .pop()
        .ok_or_else(|| StepError::Assertion(String::from("no command was run")))
}

#[then("cleanup deletes every cluster")]
fn cleanup_deletes_clusters(harness_context: &HarnessContext) -> Result<(), StepError> {
    let last = last_command(harness_context)?;
    if last == "pgo delete cluster all --no-prompt" {
        Ok(())
    } else {
        Err(StepError::Assertion(format!(
            "expected cluster deletion last, got {last}"
        )))
    }
}

#[then("cleanup deletes volume claims labeled \"{selector}\"")]
fn cleanup_deletes_claims(
    harness_context: &HarnessContext,
    selector: String,
) -> Result<(), StepError> {
    let last = last_command(harness_context)?;
    if last == format!("kubectl delete pvc -l {selector}") {
        Ok(())
    } else {
        Err(StepError::Assertion(format!(
            "expected volume claim deletion last, got {last}"
        )))
    }
}

#[then("loading fails naming \"{fragment}\"")]
fn loading_fails(harness_context: &HarnessContext, fragment: String) -> Result<(), StepError> {
    match harness_context.outcome.as_ref() {
        Some(RunOutcome::Failed(message)) if message.contains(&fragment) => Ok(()),
        other => Err(StepError::Assertion(format!(
            "expected a load failure mentioning {fragment:?}, got {other:?}"
        ))),
    }
}

#[then("no command was run")]
fn no_command_was_run(harness_context: &HarnessContext) -> Result<(), StepError> {
    let invocations = harness_context.runner.invocations();
    if invocations.is_empty() {
        Ok(())
    } else {
        Err(StepError::Assertion(format!(
            "expected no commands, got {invocations:?}"
        )))
    }
}
