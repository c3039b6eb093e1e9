//! Canonical step table for driving `pgo` against a live cluster.

use crate::context::World;
use crate::poll::{PollSpec, primary_selector};
use crate::runner::CommandRunner;
use crate::version::compare_client_server;

use super::{RegistryError, StepError, StepRegistry};

/// Builds the registry of `pgo` steps.
///
/// # Errors
///
/// Returns [`RegistryError`] if a built-in pattern fails to compile, which
/// indicates a programming error in this table.
pub fn pgo_steps<R: CommandRunner + 'static>() -> Result<StepRegistry<R>, RegistryError> {
    let mut registry = StepRegistry::new();
    registry.register(r#"^I run "pgo ([^"]+)"$"#, 1, run_pgo::<R>)?;
    registry.register(
        r#"^I run "pgo ([^"]+)" and type "([^"]+)"$"#,
        2,
        run_pgo_with_stdin::<R>,
    )?;
    registry.register(r"^I create a cluster named ([\w-]+)$", 1, create_cluster::<R>)?;
    registry.register(
        r"^I create a cluster named ([\w-]+) with pgbouncer$",
        1,
        create_cluster_with_pgbouncer::<R>,
    )?;
    registry.register(r"^An existing cluster named ([\w-]+)$", 1, create_cluster::<R>)?;
    registry.register(r"^No clusters are currently running$", 0, delete_all_clusters::<R>)?;
    registry.register(
        r"^There should be matching version info for both client and server$",
        0,
        compare_versions::<R>,
    )?;
    registry.register(
        r#"^A primary pod labeled with "([^"]+)" should be up$"#,
        1,
        primary_pod_is_up::<R>,
    )?;
    registry.register(r#"^A pod labeled with "([^"]+)" should be up$"#, 1, pod_is_up::<R>)?;
    registry.register(
        r#"^No pods with label "([^"]*)" should exist$"#,
        1,
        no_pods_exist::<R>,
    )?;
    registry.register(
        r#"^Then pgo should have stdout containing "([^"]+)"$"#,
        1,
        stdout_contains::<R>,
    )?;
    Ok(registry)
}

fn first(args: &[String]) -> &str {
    args.first().map_or("", String::as_str)
}

fn split_command(command: &str) -> Vec<String> {
    command.split_whitespace().map(str::to_owned).collect()
}

fn run_pgo<R: CommandRunner>(world: &mut World<R>, args: &[String]) -> Result<(), StepError> {
    world.run_tool(split_command(first(args)))
}

fn run_pgo_with_stdin<R: CommandRunner>(
    world: &mut World<R>,
    args: &[String],
) -> Result<(), StepError> {
    world.context.stdin = args.get(1).cloned();
    run_pgo(world, args)
}

fn create_cluster<R: CommandRunner>(world: &mut World<R>, args: &[String]) -> Result<(), StepError> {
    world.run_tool(vec![
        String::from("create"),
        String::from("cluster"),
        first(args).to_owned(),
    ])?;
    world.context.ensure_success()
}

fn create_cluster_with_pgbouncer<R: CommandRunner>(
    world: &mut World<R>,
    args: &[String],
) -> Result<(), StepError> {
    world.run_tool(vec![
        String::from("create"),
        String::from("cluster"),
        first(args).to_owned(),
        String::from("--pgbouncer"),
    ])?;
    world.context.ensure_success()
}

fn delete_all_clusters<R: CommandRunner>(
    world: &mut World<R>,
    _args: &[String],
) -> Result<(), StepError> {
    world.run_tool(delete_all_clusters_args())?;
    world.context.ensure_success()
}

/// Arguments asking the tool to delete every managed cluster without
/// prompting.
#[must_use]
pub fn delete_all_clusters_args() -> Vec<String> {
    ["delete", "cluster", "all", "--no-prompt"]
        .into_iter()
        .map(String::from)
        .collect()
}

fn compare_versions<R: CommandRunner>(
    world: &mut World<R>,
    _args: &[String],
) -> Result<(), StepError> {
    compare_client_server(world.context.stdout.as_deref())?;
    Ok(())
}

fn primary_pod_is_up<R: CommandRunner>(
    world: &mut World<R>,
    args: &[String],
) -> Result<(), StepError> {
    let spec = PollSpec::ready(primary_selector(first(args)), &world.config);
    world.poller().wait(&spec)?;
    Ok(())
}

fn pod_is_up<R: CommandRunner>(world: &mut World<R>, args: &[String]) -> Result<(), StepError> {
    let spec = PollSpec::ready(first(args), &world.config);
    world.poller().wait(&spec)?;
    Ok(())
}

fn no_pods_exist<R: CommandRunner>(world: &mut World<R>, args: &[String]) -> Result<(), StepError> {
    let spec = PollSpec::absent(first(args), &world.config);
    world.poller().wait(&spec)?;
    Ok(())
}

fn stdout_contains<R: CommandRunner>(
    world: &mut World<R>,
    args: &[String],
) -> Result<(), StepError> {
    world.context.ensure_stdout_contains(first(args))
}
