//! Acceptance-test harness for the `pgo` PostgreSQL operator CLI.
//!
//! Scenarios written as Gherkin-style feature files drive the real `pgo`
//! binary against a live Kubernetes cluster. Each step line binds to a
//! handler that runs a command, asserts on its captured output, or polls pod
//! state with `kubectl` until the cluster converges. After the last scenario
//! a best-effort cleanup removes every cluster the run created.

pub mod config;
pub mod context;
pub mod feature;
pub mod poll;
pub mod runner;
pub mod steps;
pub mod suite;
pub mod test_support;
pub mod version;

pub use config::{ConfigError, HarnessConfig};
pub use context::{ScenarioContext, World};
pub use feature::{Feature, FeatureError, Scenario, Step, load_features, parse_feature};
pub use poll::{PodState, PollError, PollOutcome, PollSpec, PollTarget, Poller, classify};
pub use runner::{CommandOutput, CommandRunner, ProcessCommandRunner, RunnerError};
pub use steps::{
    BoundStep, FailureKind, RegistryError, StepError, StepRegistry, pgo_steps,
};
pub use suite::{
    CleanupReport, LoadedSuite, ScenarioOutcome, ScenarioStatus, Suite, SuiteError, SuiteReport,
    cleanup,
};
pub use version::{VersionError, compare_client_server};
