//! Harness configuration loaded via `ortho-config`.

use std::time::Duration;

use ortho_config::OrthoConfig;
use serde::Deserialize;
use thiserror::Error;

/// Default binary for the tool under test.
pub const DEFAULT_TOOL_BIN: &str = "pgo";

/// Default binary for the cluster query tool.
pub const DEFAULT_KUBECTL_BIN: &str = "kubectl";

/// Default number of inspection attempts per poll.
pub const DEFAULT_POLL_ATTEMPTS: u32 = 30;

/// Default delay before each inspection attempt, in seconds.
pub const DEFAULT_POLL_INTERVAL_SECS: u64 = 3;

/// Default label selector used by the storage-claim fallback cleanup.
pub const DEFAULT_CLEANUP_PVC_SELECTOR: &str = "pg-cluster";

/// Harness settings derived from defaults, configuration files, and
/// environment variables.
#[derive(Clone, Debug, Deserialize, OrthoConfig, PartialEq, Eq)]
#[ortho_config(
    prefix = "PGO_ACCEPTANCE",
    discovery(
        app_name = "pgo-acceptance",
        env_var = "PGO_ACCEPTANCE_CONFIG_PATH",
        config_file_name = "pgo-acceptance.toml",
        dotfile_name = ".pgo-acceptance.toml",
        project_file_name = "pgo-acceptance.toml"
    )
)]
pub struct HarnessConfig {
    /// Path to the tool under test.
    #[ortho_config(default = DEFAULT_TOOL_BIN.to_owned())]
    pub tool_bin: String,
    /// Path to the cluster query tool used for pod inspection.
    #[ortho_config(default = DEFAULT_KUBECTL_BIN.to_owned())]
    pub kubectl_bin: String,
    /// Number of inspection attempts before a poll gives up.
    #[ortho_config(default = DEFAULT_POLL_ATTEMPTS)]
    pub poll_attempts: u32,
    /// Seconds to sleep before each inspection attempt.
    #[ortho_config(default = DEFAULT_POLL_INTERVAL_SECS)]
    pub poll_interval_secs: u64,
    /// Label selector for storage claims deleted when the primary cleanup
    /// fails.
    #[ortho_config(default = DEFAULT_CLEANUP_PVC_SELECTOR.to_owned())]
    pub cleanup_pvc_selector: String,
}

impl Default for HarnessConfig {
    fn default() -> Self {
        Self {
            tool_bin: DEFAULT_TOOL_BIN.to_owned(),
            kubectl_bin: DEFAULT_KUBECTL_BIN.to_owned(),
            poll_attempts: DEFAULT_POLL_ATTEMPTS,
            poll_interval_secs: DEFAULT_POLL_INTERVAL_SECS,
            cleanup_pvc_selector: DEFAULT_CLEANUP_PVC_SELECTOR.to_owned(),
        }
    }
}

/// Errors raised during configuration loading and validation.
#[derive(Debug, Error, Eq, PartialEq)]
pub enum ConfigError {
    /// Indicates a required configuration field is empty or invalid.
    #[error("invalid {field}: set PGO_ACCEPTANCE_{env_suffix} or add {field} to pgo-acceptance.toml", env_suffix = field.to_uppercase())]
    InvalidField {
        /// Configuration field that failed validation.
        field: String,
    },
    /// Surfaces errors from the `ortho-config` loader.
    #[error("configuration parsing failed: {0}")]
    Parse(String),
}

impl HarnessConfig {
    /// Loads configuration without attempting to parse CLI arguments. Values
    /// merge defaults, configuration files, and environment variables.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError::Parse`] when the merge fails.
    pub fn load_without_cli_args() -> Result<Self, ConfigError> {
        Self::load_from_iter([std::ffi::OsString::from("pgo-acceptance")])
            .map_err(|err| ConfigError::Parse(err.to_string()))
    }

    /// Ensures binaries are named and the poll budget is non-zero.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError::InvalidField`] naming the first bad field.
    pub fn validate(&self) -> Result<(), ConfigError> {
        Self::require_value(&self.tool_bin, "tool_bin")?;
        Self::require_value(&self.kubectl_bin, "kubectl_bin")?;
        Self::require_value(&self.cleanup_pvc_selector, "cleanup_pvc_selector")?;
        if self.poll_attempts == 0 {
            return Err(ConfigError::InvalidField {
                field: String::from("poll_attempts"),
            });
        }
        Ok(())
    }

    /// Delay before each inspection attempt.
    #[must_use]
    pub const fn poll_interval(&self) -> Duration {
        Duration::from_secs(self.poll_interval_secs)
    }

    fn require_value(value: &str, field: &str) -> Result<(), ConfigError> {
        if value.trim().is_empty() {
            return Err(ConfigError::InvalidField {
                field: field.to_owned(),
            });
        }
        Ok(())
    }
}
