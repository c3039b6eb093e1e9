//! Binary entry point for the pgo acceptance harness.

use std::io::{self, Write};
use std::process;

use clap::Parser;
use thiserror::Error;
use tracing_subscriber::EnvFilter;

use pgo_acceptance::{
    CommandRunner, ConfigError, HarnessConfig, ProcessCommandRunner, ScenarioStatus, Suite,
    SuiteError, SuiteReport, load_features,
};

mod cli;

use cli::Cli;

#[derive(Debug, Error)]
enum CliError {
    #[error("configuration error: {0}")]
    Config(#[from] ConfigError),
    #[error(transparent)]
    Suite(#[from] SuiteError),
    #[error("failed to write report: {0}")]
    Output(#[from] io::Error),
}

fn main() {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .with_writer(io::stderr)
        .with_target(false)
        .try_init()
        .ok();

    let cli = Cli::parse();
    let exit_code = match dispatch(&cli) {
        Ok(code) => code,
        Err(err) => {
            write_error(io::stderr(), &err);
            1
        }
    };

    process::exit(exit_code);
}

fn dispatch(cli: &Cli) -> Result<i32, CliError> {
    let config = HarnessConfig::load_without_cli_args()?;
    config.validate()?;
    execute(cli, config, ProcessCommandRunner, &mut io::stdout())
}

fn execute<R: CommandRunner + 'static>(
    cli: &Cli,
    config: HarnessConfig,
    runner: R,
    out: &mut impl Write,
) -> Result<i32, CliError> {
    let mut suite = Suite::pgo(config, runner)?;
    if cli.list_steps {
        for pattern in suite.registry().patterns() {
            writeln!(out, "{pattern}")?;
        }
        return Ok(0);
    }
    if cli.skip_cleanup {
        suite.clear_after_suite();
    }

    let features = load_features(&cli.paths).map_err(SuiteError::from)?;
    let mut loaded = suite.load(&features)?;
    if cli.dry_run {
        let parsed = features.iter().flat_map(|feature| &feature.scenarios);
        for (scenario, source) in loaded.scenarios().iter().zip(parsed) {
            writeln!(
                out,
                "{} {}: {} ({} steps)",
                scenario.location,
                scenario.feature,
                scenario.name,
                scenario.steps.len()
            )?;
            for step in &source.steps {
                writeln!(out, "    {} {}", step.keyword, step.text)?;
            }
        }
        writeln!(out, "{} scenarios bound", loaded.scenarios().len())?;
        return Ok(0);
    }

    let report = loaded.run()?;
    write_report(out, &report)?;
    Ok(if report.all_passed() { 0 } else { 1 })
}

fn write_report(out: &mut impl Write, report: &SuiteReport) -> io::Result<()> {
    for outcome in &report.outcomes {
        match &outcome.status {
            ScenarioStatus::Passed => {
                writeln!(out, "PASS {}: {}", outcome.feature, outcome.scenario)?;
            }
            ScenarioStatus::Failed { step, message, .. } => {
                writeln!(out, "FAIL {}: {}", outcome.feature, outcome.scenario)?;
                writeln!(out, "  step: {step}")?;
                writeln!(out, "  {message}")?;
            }
        }
    }
    writeln!(out, "{}", report.summary())
}

fn write_error(mut target: impl Write, err: &CliError) {
    writeln!(target, "{err}").ok();
}

#[cfg(test)]
mod tests {
    use super::*;
    use camino::Utf8PathBuf;
    use pgo_acceptance::test_support::ScriptedRunner;
    use rstest::{fixture, rstest};
    use tempfile::TempDir;

    struct FeatureDir {
        _tmp: TempDir,
        path: Utf8PathBuf,
    }

    fn feature_dir(text: &str) -> FeatureDir {
        let tmp = TempDir::new().expect("tempdir");
        let path = Utf8PathBuf::from_path_buf(tmp.path().to_path_buf()).expect("utf8 tempdir");
        std::fs::write(path.join("version.feature"), text).expect("write feature");
        FeatureDir { _tmp: tmp, path }
    }

    #[fixture]
    fn runner() -> ScriptedRunner {
        ScriptedRunner::new()
    }

    fn cli(args: &[&str]) -> Cli {
        Cli::try_parse_from(std::iter::once("pgo-acceptance").chain(args.iter().copied()))
            .expect("valid arguments")
    }

    fn run(cli: &Cli, runner: &ScriptedRunner) -> (Result<i32, CliError>, String) {
        let mut out = Vec::new();
        let result = execute(cli, HarnessConfig::default(), runner.clone(), &mut out);
        (result, String::from_utf8(out).expect("utf8 output"))
    }

    const VERSION_FEATURE: &str = r#"Feature: Version
Scenario: Show the version
  When I run "pgo version"
  Then There should be matching version info for both client and server
"#;

    #[rstest]
    fn paths_default_to_features_directory() {
        let parsed = cli(&[]);
        assert_eq!(parsed.paths, vec![Utf8PathBuf::from("features")]);
        assert!(!parsed.dry_run && !parsed.list_steps && !parsed.skip_cleanup);
    }

    #[rstest]
    fn dry_run_conflicts_with_list_steps() {
        assert!(Cli::try_parse_from(["pgo-acceptance", "--dry-run", "--list-steps"]).is_err());
    }

    #[rstest]
    fn list_steps_prints_patterns_without_running(runner: ScriptedRunner) {
        let (result, stdout) = run(&cli(&["--list-steps"]), &runner);

        assert_eq!(result.expect("list succeeds"), 0);
        assert_eq!(stdout.lines().count(), 11);
        assert!(stdout.contains("No clusters are currently running"));
        assert!(runner.invocations().is_empty());
    }

    #[rstest]
    fn dry_run_binds_without_running(runner: ScriptedRunner) {
        let dir = feature_dir(VERSION_FEATURE);

        let (result, stdout) = run(&cli(&["--dry-run", dir.path.as_str()]), &runner);

        assert_eq!(result.expect("dry run succeeds"), 0);
        assert!(stdout.contains("Version: Show the version (2 steps)"), "stdout: {stdout}");
        assert!(stdout.contains("\n    When I run \"pgo version\"\n"), "stdout: {stdout}");
        assert!(stdout.ends_with("1 scenarios bound\n"));
        assert!(runner.invocations().is_empty());
    }

    #[rstest]
    fn passing_run_exits_zero(runner: ScriptedRunner) {
        let dir = feature_dir(VERSION_FEATURE);
        runner.push_stdout("pgo client version 4.0.1\npgo-apiserver version 4.0.1\n");
        runner.push_success();

        let (result, stdout) = run(&cli(&[dir.path.as_str()]), &runner);

        assert_eq!(result.expect("run completes"), 0);
        assert!(stdout.contains("PASS Version: Show the version"));
        assert!(stdout.ends_with("1 scenarios (1 passed, 0 failed)\n"));
    }

    #[rstest]
    fn failing_run_exits_one_and_reports_the_step(runner: ScriptedRunner) {
        let dir = feature_dir(VERSION_FEATURE);
        runner.push_stdout("pgo client version 4.0.1\npgo-apiserver version 4.0.2\n");

        let (result, stdout) = run(&cli(&["--skip-cleanup", dir.path.as_str()]), &runner);

        assert_eq!(result.expect("run completes"), 1);
        assert!(stdout.contains("FAIL Version: Show the version"));
        assert!(stdout.contains(
            "  step: There should be matching version info for both client and server"
        ));
        assert_eq!(runner.invocations().len(), 1);
    }

    #[rstest]
    fn undefined_steps_are_configuration_errors(runner: ScriptedRunner) {
        let dir = feature_dir("Feature: Bad\nScenario: typo\n  When I reticulate splines\n");

        let (result, _) = run(&cli(&[dir.path.as_str()]), &runner);

        let err = result.expect_err("undefined step");
        assert!(matches!(err, CliError::Suite(SuiteError::Configuration { .. })));
        assert!(runner.invocations().is_empty());
    }

    #[rstest]
    fn write_error_writes_cli_error() {
        let mut buf = Vec::new();
        let err = CliError::Config(ConfigError::InvalidField {
            field: String::from("tool_bin"),
        });
        write_error(&mut buf, &err);
        let rendered = String::from_utf8(buf).expect("utf8");
        assert!(
            rendered.contains("PGO_ACCEPTANCE_TOOL_BIN"),
            "rendered: {rendered}"
        );
    }
}
