//! Panel configuration.
//!
//! Values come from three layers, later ones winning:
//! 1. built-in defaults
//! 2. a TOML file (`--config`, `$XRAY_UI_CONFIG`, or `/etc/xray-ui/config.toml`)
//! 3. `XRAY_UI_*` environment variables

use std::fmt;
use std::path::{Path, PathBuf};
use std::str::FromStr;

use serde::{Deserialize, Serialize};
use tracing::Level;

use crate::error::ConfigError;
use crate::tracing::TracingOutputFormat;

/// Program name, used for paths and log output.
pub const PANEL_NAME: &str = "xray-ui";

/// Program version.
pub const PANEL_VERSION: &str = env!("CARGO_PKG_VERSION");

/// File name of the panel database inside the database folder.
pub const DB_FILE_NAME: &str = "xray-ui.json";

const ENV_CONFIG: &str = "XRAY_UI_CONFIG";
const ENV_LOG_LEVEL: &str = "XRAY_UI_LOG_LEVEL";
const ENV_DEBUG: &str = "XRAY_UI_DEBUG";
const ENV_DB_FOLDER: &str = "XRAY_UI_DB_FOLDER";
const ENV_BIN_FOLDER: &str = "XRAY_UI_BIN_FOLDER";
const ENV_PID_FILE: &str = "XRAY_UI_PID_FILE";

/// Operator-selected log severity.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub enum LogLevel {
    Debug,
    Info,
    Warn,
    Error,
}

impl LogLevel {
    /// Returns the matching `tracing` threshold.
    pub fn as_tracing_level(self) -> Level {
        match self {
            Self::Debug => Level::DEBUG,
            Self::Info => Level::INFO,
            Self::Warn => Level::WARN,
            Self::Error => Level::ERROR,
        }
    }
}

impl FromStr for LogLevel {
    type Err = ConfigError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "debug" => Ok(Self::Debug),
            "info" => Ok(Self::Info),
            "warn" | "warning" => Ok(Self::Warn),
            "error" => Ok(Self::Error),
            _ => Err(ConfigError::UnknownLogLevel(s.to_string())),
        }
    }
}

impl fmt::Display for LogLevel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Self::Debug => "debug",
            Self::Info => "info",
            Self::Warn => "warn",
            Self::Error => "error",
        };
        f.write_str(name)
    }
}

/// Runtime configuration for the panel and its administrative commands.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct PanelConfig {
    /// Log level name; validated when the panel starts.
    pub log_level: String,

    /// Forces the debug log level.
    pub debug: bool,

    /// Log line format of the panel process.
    pub log_format: TracingOutputFormat,

    /// Folder holding the panel database.
    pub db_folder: PathBuf,

    /// Folder holding the proxy binary and its geo data files.
    pub bin_folder: PathBuf,

    /// Optional PID file written while the panel runs.
    pub pid_file: Option<PathBuf>,

    /// Geo data release endpoints.
    #[serde(default)]
    pub geo: GeoSettings,
}

impl Default for PanelConfig {
    fn default() -> Self {
        Self {
            log_level: LogLevel::Info.to_string(),
            debug: false,
            log_format: TracingOutputFormat::Compact,
            db_folder: PathBuf::from("/etc").join(PANEL_NAME),
            bin_folder: PathBuf::from("bin"),
            pid_file: None,
            geo: GeoSettings::default(),
        }
    }
}

/// Where geo data bundles are fetched from.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct GeoSettings {
    /// Releases API endpoint returning the latest release as JSON.
    pub release_api: String,

    /// Base URL for release assets; `<base>/<version>/<file>` is downloaded.
    pub download_base: String,

    /// HTTP timeout in seconds.
    pub timeout_secs: u64,
}

impl Default for GeoSettings {
    fn default() -> Self {
        Self {
            release_api: "https://api.github.com/repos/Loyalsoldier/v2ray-rules-dat/releases/latest"
                .to_string(),
            download_base: "https://github.com/Loyalsoldier/v2ray-rules-dat/releases/download"
                .to_string(),
            timeout_secs: 30,
        }
    }
}

impl PanelConfig {
    /// Loads configuration from `explicit`, `$XRAY_UI_CONFIG`, or the default
    /// path, then applies environment overrides.
    ///
    /// An explicitly named file must exist; the default path is optional.
    pub fn load(explicit: Option<&Path>) -> Result<Self, ConfigError> {
        let named = explicit
            .map(Path::to_path_buf)
            .or_else(|| std::env::var_os(ENV_CONFIG).map(PathBuf::from));

        let mut config = match named {
            Some(path) => Self::load_from(&path)?,
            None => {
                let path = Self::default_path();
                if path.exists() {
                    Self::load_from(&path)?
                } else {
                    Self::default()
                }
            }
        };

        config.apply_env(|key| std::env::var(key).ok());
        Ok(config)
    }

    /// Loads configuration from a specific TOML file.
    pub fn load_from(path: &Path) -> Result<Self, ConfigError> {
        let content = std::fs::read_to_string(path).map_err(|source| ConfigError::Read {
            path: path.to_path_buf(),
            source,
        })?;
        toml::from_str(&content).map_err(|source| ConfigError::Parse {
            path: path.to_path_buf(),
            source,
        })
    }

    /// Applies `XRAY_UI_*` overrides using `lookup` to read variables.
    pub fn apply_env<F>(&mut self, lookup: F)
    where
        F: Fn(&str) -> Option<String>,
    {
        if let Some(level) = lookup(ENV_LOG_LEVEL).filter(|v| !v.is_empty()) {
            self.log_level = level;
        }
        if let Some(debug) = lookup(ENV_DEBUG) {
            self.debug = debug == "true";
        }
        if let Some(folder) = lookup(ENV_DB_FOLDER).filter(|v| !v.is_empty()) {
            self.db_folder = PathBuf::from(folder);
        }
        if let Some(folder) = lookup(ENV_BIN_FOLDER).filter(|v| !v.is_empty()) {
            self.bin_folder = PathBuf::from(folder);
        }
        if let Some(pid) = lookup(ENV_PID_FILE).filter(|v| !v.is_empty()) {
            self.pid_file = Some(PathBuf::from(pid));
        }
    }

    /// Resolves the effective log level.
    ///
    /// Debug mode wins over the configured name.
    pub fn log_level(&self) -> Result<LogLevel, ConfigError> {
        if self.debug {
            return Ok(LogLevel::Debug);
        }
        self.log_level.parse()
    }

    /// Returns the path of the panel database.
    pub fn db_path(&self) -> PathBuf {
        self.db_folder.join(DB_FILE_NAME)
    }

    /// Returns the default configuration file path.
    pub fn default_path() -> PathBuf {
        PathBuf::from("/etc").join(PANEL_NAME).join("config.toml")
    }
}
