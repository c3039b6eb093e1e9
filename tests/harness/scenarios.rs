//! BDD scenarios for the harness lifecycle.

use rstest_bdd_macros::scenario;

use super::test_helpers::{HarnessContext, harness_context};

#[scenario(
    path = "tests/features/harness.feature",
    name = "A primary pod that never becomes ready fails the scenario"
)]
fn scenario_poll_budget_exhausted(harness_context: HarnessContext) {
    let _ = harness_context;
}

#[scenario(
    path = "tests/features/harness.feature",
    name = "A failed cleanup falls back to deleting volume claims"
)]
fn scenario_cleanup_fallback(harness_context: HarnessContext) {
    let _ = harness_context;
}

#[scenario(
    path = "tests/features/harness.feature",
    name = "Undefined steps stop the suite before any command runs"
)]
fn scenario_undefined_steps(harness_context: HarnessContext) {
    let _ = harness_context;
}
