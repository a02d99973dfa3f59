//! Process configuration read from environment variables.
//!
//! | variable | meaning | default |
//! |---|---|---|
//! | `DATABASE_CONNECTION_PARAMETERS` | store connection string | required |
//! | `DATABASE_MIGRATION_PATH` | schema source location | `file://migrations` |
//! | `ENVIRONMENT` | deployment name; `test` silences logging | `production` |
//! | `LOG_FORMAT` | `text` or `json` | `text` |
//! | `LOG_FILTER` | filter directive used when `RUST_LOG` is unset | `info` |

use std::str::FromStr;
use thiserror::Error;
use tracing_subscriber::EnvFilter;

/// Connection string variable.
pub const CONNECTION_PARAMETERS_VAR: &str = "DATABASE_CONNECTION_PARAMETERS";
/// Schema source variable.
pub const MIGRATION_PATH_VAR: &str = "DATABASE_MIGRATION_PATH";
/// Deployment environment variable.
pub const ENVIRONMENT_VAR: &str = "ENVIRONMENT";
/// Log format variable.
pub const LOG_FORMAT_VAR: &str = "LOG_FORMAT";
/// Log filter variable.
pub const LOG_FILTER_VAR: &str = "LOG_FILTER";

/// Schema source used when none is configured.
pub const DEFAULT_MIGRATION_PATH: &str = "file://migrations";
const DEFAULT_ENVIRONMENT: &str = "production";
const DEFAULT_LOG_FILTER: &str = "info";
const TEST_ENVIRONMENT: &str = "test";

/// Errors raised while reading configuration.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ConfigError {
    /// A required variable is unset or blank.
    #[error("required environment variable {0} is not set")]
    Missing(&'static str),

    /// `LOG_FORMAT` names an unknown format.
    #[error("unknown log format '{0}', expected text or json")]
    UnknownLogFormat(String),

    /// `LOG_FILTER` is not a valid filter directive.
    #[error("invalid log filter '{filter}': {reason}")]
    InvalidLogFilter {
        /// The rejected directive.
        filter: String,
        /// Why it was rejected.
        reason: String,
    },
}

/// Output format for log events.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum LogFormat {
    /// Human-readable lines.
    #[default]
    Text,
    /// One JSON object per event.
    Json,
}

impl FromStr for LogFormat {
    type Err = ConfigError;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        match value.trim().to_ascii_lowercase().as_str() {
            "text" => Ok(Self::Text),
            "json" => Ok(Self::Json),
            _ => Err(ConfigError::UnknownLogFormat(value.to_owned())),
        }
    }
}

/// Logging configuration consumed by [`crate::telemetry::build_dispatch`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LogConfig {
    /// Output format.
    pub format: LogFormat,
    /// Filter directive used when `RUST_LOG` is unset.
    pub filter: String,
    /// Discard all output.
    pub silent: bool,
}

impl Default for LogConfig {
    fn default() -> Self {
        Self {
            format: LogFormat::Text,
            filter: DEFAULT_LOG_FILTER.to_owned(),
            silent: false,
        }
    }
}

/// Full service configuration.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ServiceConfig {
    /// Connection string passed to [`crate::task::ports::TaskStore::open`].
    pub connection_parameters: String,
    /// Schema source passed to [`crate::task::ports::TaskStore::prepare`].
    pub migration_path: String,
    /// Deployment environment name.
    pub environment: String,
    /// Logging settings.
    pub log: LogConfig,
}

impl ServiceConfig {
    /// Reads configuration from the process environment.
    ///
    /// # Errors
    ///
    /// See [`ServiceConfig::from_lookup`].
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Reads configuration through `lookup`, treating blank values as unset.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError::Missing`] when the connection parameters are
    /// absent, and [`ConfigError::UnknownLogFormat`] or
    /// [`ConfigError::InvalidLogFilter`] for malformed logging settings.
    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Result<Self, ConfigError> {
        let read = |key: &str| {
            lookup(key)
                .map(|value| value.trim().to_owned())
                .filter(|value| !value.is_empty())
        };

        let connection_parameters =
            read(CONNECTION_PARAMETERS_VAR).ok_or(ConfigError::Missing(CONNECTION_PARAMETERS_VAR))?;
        let migration_path =
            read(MIGRATION_PATH_VAR).unwrap_or_else(|| DEFAULT_MIGRATION_PATH.to_owned());
        let environment = read(ENVIRONMENT_VAR).unwrap_or_else(|| DEFAULT_ENVIRONMENT.to_owned());
        let format = read(LOG_FORMAT_VAR)
            .map(|value| value.parse::<LogFormat>())
            .transpose()?
            .unwrap_or_default();
        let filter = read(LOG_FILTER_VAR).unwrap_or_else(|| DEFAULT_LOG_FILTER.to_owned());
        EnvFilter::try_new(&filter).map(drop).map_err(|err| ConfigError::InvalidLogFilter {
            filter: filter.clone(),
            reason: err.to_string(),
        })?;

        let silent = environment.eq_ignore_ascii_case(TEST_ENVIRONMENT);
        Ok(Self {
            connection_parameters,
            migration_path,
            environment,
            log: LogConfig {
                format,
                filter,
                silent,
            },
        })
    }
}
