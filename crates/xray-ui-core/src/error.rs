//! Error types for configuration and storage.

use std::io;
use std::path::PathBuf;

use thiserror::Error;

/// Result type for store operations.
pub type StoreResult<T> = Result<T, StoreError>;

/// Errors raised by a [`PanelStore`](crate::store::PanelStore).
#[derive(Debug, Error)]
pub enum StoreError {
    /// Reading or writing the database file failed.
    #[error("database I/O error at {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: io::Error,
    },

    /// The database file exists but could not be decoded.
    #[error("database at {path} is corrupt: {source}")]
    Corrupt {
        path: PathBuf,
        #[source]
        source: serde_json::Error,
    },

    /// Encoding the database failed.
    #[error("failed to encode database: {0}")]
    Encode(#[source] serde_json::Error),

    /// A value was rejected before being stored.
    #[error("invalid value for {field}: {message}")]
    InvalidValue {
        field: &'static str,
        message: String,
    },

    /// An inbound already uses this port.
    #[error("port {port} is already used by another inbound")]
    PortInUse { port: u16 },

    /// The store holds no user record.
    #[error("no user record found")]
    NoUser,
}

impl StoreError {
    /// Creates an I/O error tagged with the file it concerns.
    pub fn io(path: impl Into<PathBuf>, source: io::Error) -> Self {
        Self::Io {
            path: path.into(),
            source,
        }
    }

    /// Creates an invalid value error.
    pub fn invalid(field: &'static str, message: impl Into<String>) -> Self {
        Self::InvalidValue {
            field,
            message: message.into(),
        }
    }
}

/// Errors raised while loading or interpreting the panel configuration.
#[derive(Debug, Error)]
pub enum ConfigError {
    /// The configured log level is not one of debug, info, warn, error.
    #[error("unknown log level: {0}")]
    UnknownLogLevel(String),

    /// The configuration file could not be read.
    #[error("failed to read config {path}: {source}")]
    Read {
        path: PathBuf,
        #[source]
        source: io::Error,
    },

    /// The configuration file is not valid TOML for [`PanelConfig`](crate::config::PanelConfig).
    #[error("failed to parse config {path}: {source}")]
    Parse {
        path: PathBuf,
        #[source]
        source: toml::de::Error,
    },
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn invalid_value_display() {
        let err = StoreError::invalid("port", "must be greater than zero");
        assert_eq!(
            err.to_string(),
            "invalid value for port: must be greater than zero"
        );
    }

    #[test]
    fn io_error_keeps_path() {
        let err = StoreError::io("/tmp/x.json", io::Error::other("boom"));
        assert!(err.to_string().contains("/tmp/x.json"));
        assert!(err.to_string().contains("boom"));
    }
}
