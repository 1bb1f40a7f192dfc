//! CLI error types.

use std::fmt;

use xray_ui_core::{ConfigError, StoreError, TracingError};
use xray_ui_server::ServerError;

use crate::actions::geoip::GeoRefreshError;
use crate::migrate::MigrateError;

/// Result type for CLI operations.
pub type CliResult<T> = Result<T, CliError>;

/// Errors that end a command with a non-zero exit code.
#[derive(Debug)]
pub enum CliError {
    /// Configuration or log level error.
    Config(ConfigError),
    /// Logging could not be installed.
    Tracing(TracingError),
    /// The panel database could not be opened or written.
    Store(StoreError),
    /// The panel process failed.
    Server(ServerError),
    /// Geo data refresh failed.
    Geo(GeoRefreshError),
    /// v2-ui migration failed.
    Migrate(MigrateError),
    /// One or more steps of an action failed; details were already printed.
    Action(String),
}

impl fmt::Display for CliError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Config(err) => write!(f, "configuration error: {}", err),
            Self::Tracing(err) => write!(f, "logging error: {}", err),
            Self::Store(err) => write!(f, "{}", err),
            Self::Server(err) => write!(f, "{}", err),
            Self::Geo(err) => write!(f, "geo data update failed: {}", err),
            Self::Migrate(err) => write!(f, "migrate from v2-ui failed: {}", err),
            Self::Action(msg) => write!(f, "{}", msg),
        }
    }
}

impl std::error::Error for CliError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            Self::Config(err) => Some(err),
            Self::Tracing(err) => Some(err),
            Self::Store(err) => Some(err),
            Self::Server(err) => Some(err),
            Self::Geo(err) => Some(err),
            Self::Migrate(err) => Some(err),
            Self::Action(_) => None,
        }
    }
}

impl From<ConfigError> for CliError {
    fn from(err: ConfigError) -> Self {
        Self::Config(err)
    }
}

impl From<TracingError> for CliError {
    fn from(err: TracingError) -> Self {
        Self::Tracing(err)
    }
}

impl From<StoreError> for CliError {
    fn from(err: StoreError) -> Self {
        Self::Store(err)
    }
}

impl From<ServerError> for CliError {
    fn from(err: ServerError) -> Self {
        Self::Server(err)
    }
}

impl From<GeoRefreshError> for CliError {
    fn from(err: GeoRefreshError) -> Self {
        Self::Geo(err)
    }
}

impl From<MigrateError> for CliError {
    fn from(err: MigrateError) -> Self {
        Self::Migrate(err)
    }
}
