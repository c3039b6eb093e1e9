//! Behavioural smoke tests for the CLI entrypoint.

use assert_cmd::cargo::cargo_bin_cmd;
use camino::Utf8PathBuf;
use predicates::prelude::*;
use tempfile::TempDir;

fn feature_dir(text: &str) -> (TempDir, Utf8PathBuf) {
    let tmp = TempDir::new().unwrap_or_else(|err| panic!("create temp dir: {err}"));
    let path = Utf8PathBuf::from_path_buf(tmp.path().to_path_buf())
        .unwrap_or_else(|path| panic!("temp dir is not UTF-8: {}", path.display()));
    std::fs::write(path.join("smoke.feature"), text)
        .unwrap_or_else(|err| panic!("write feature: {err}"));
    (tmp, path)
}

#[test]
fn list_steps_prints_the_step_table() {
    let mut cmd = cargo_bin_cmd!("pgo-acceptance");
    cmd.arg("--list-steps")
        .assert()
        .success()
        .stdout(predicate::str::contains("I create a cluster named"))
        .stdout(predicate::str::contains("No clusters are currently running"));
}

#[test]
fn dry_run_binds_scenarios_without_running_them() {
    let (_tmp, dir) = feature_dir(
        "Feature: Smoke\n  Scenario: Version\n    When I run \"pgo version\"\n",
    );

    let mut cmd = cargo_bin_cmd!("pgo-acceptance");
    cmd.env("PGO_ACCEPTANCE_TOOL_BIN", "/nonexistent/pgo")
        .args(["--dry-run", dir.as_str()])
        .assert()
        .success()
        .stdout(predicate::str::contains("1 scenarios bound"));
}

#[test]
fn undefined_steps_exit_with_failure() {
    let (_tmp, dir) = feature_dir(
        "Feature: Smoke\n  Scenario: Typo\n    When I reticulate splines\n",
    );

    let mut cmd = cargo_bin_cmd!("pgo-acceptance");
    cmd.arg(dir.as_str())
        .assert()
        .code(1)
        .stderr(predicate::str::contains("undefined step: I reticulate splines"));
}

#[test]
fn runs_scenarios_against_a_stand_in_tool() {
    let (_tmp, dir) = feature_dir(concat!(
        "Feature: Smoke\n",
        "  Scenario: Echo\n",
        "    When I run \"pgo version\"\n",
        "    And Then pgo should have stdout containing \"version\"\n",
    ));

    let mut cmd = cargo_bin_cmd!("pgo-acceptance");
    cmd.env("PGO_ACCEPTANCE_TOOL_BIN", "echo")
        .arg(dir.as_str())
        .assert()
        .success()
        .stdout(predicate::str::contains("PASS Smoke: Echo"))
        .stdout(predicate::str::contains("1 scenarios (1 passed, 0 failed)"));
}

#[test]
fn missing_feature_path_is_reported() {
    let mut cmd = cargo_bin_cmd!("pgo-acceptance");
    cmd.arg("does/not/exist.feature")
        .assert()
        .code(1)
        .stderr(predicate::str::contains("does/not/exist.feature"));
}
