//! Service configuration file support

use crate::service::SERVICE_NAME;
use crate::worker::WorkerConfig;
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use std::time::Duration;

/// Service configuration loaded from a TOML file
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ServiceConfig {
    /// Arguments handed to the worker entry point
    #[serde(default)]
    pub arguments: Vec<String>,

    /// Delay between work loop iterations in milliseconds
    pub pace_ms: u64,

    /// Longest sleep between stop checks in milliseconds
    pub stop_check_ms: u64,

    /// Iterations before the worker finishes on its own (0 = run until stopped)
    #[serde(default)]
    pub max_iterations: u64,

    /// Log level (trace, debug, info, warn, error)
    pub log_level: String,

    /// Log file path (empty = log to the console)
    #[serde(default)]
    pub log_file: String,
}

impl Default for ServiceConfig {
    fn default() -> Self {
        Self {
            arguments: Vec::new(),
            pace_ms: 100,
            stop_check_ms: 10,
            max_iterations: 0,
            log_level: "info".to_string(),
            log_file: String::new(),
        }
    }
}

impl ServiceConfig {
    /// Load configuration from a TOML file
    pub fn load<P: AsRef<Path>>(path: P) -> Result<Self, ConfigError> {
        let content = std::fs::read_to_string(path.as_ref()).map_err(|e| ConfigError::Io {
            path: path.as_ref().to_string_lossy().to_string(),
            source: e,
        })?;

        toml::from_str(&content).map_err(|e| ConfigError::Parse {
            path: path.as_ref().to_string_lossy().to_string(),
            source: e,
        })
    }

    /// Load configuration from default locations
    ///
    /// Searches in order:
    /// 1. Same directory as executable: svcrun.toml
    /// 2. User config directory: svcrun/config.toml
    pub fn load_default() -> Result<Self, ConfigError> {
        if let Some(path) = Self::exe_dir_config() {
            if path.exists() {
                return Self::load(&path);
            }
        }

        if let Some(path) = Self::user_config() {
            if path.exists() {
                return Self::load(&path);
            }
        }

        // Return default config if no file found
        Ok(Self::default())
    }

    /// Save configuration to a TOML file
    pub fn save<P: AsRef<Path>>(&self, path: P) -> Result<(), ConfigError> {
        let content = toml::to_string_pretty(self).map_err(ConfigError::Serialize)?;

        // Create parent directories if needed
        if let Some(parent) = path.as_ref().parent() {
            std::fs::create_dir_all(parent).map_err(|e| ConfigError::Io {
                path: parent.to_string_lossy().to_string(),
                source: e,
            })?;
        }

        std::fs::write(path.as_ref(), content).map_err(|e| ConfigError::Io {
            path: path.as_ref().to_string_lossy().to_string(),
            source: e,
        })
    }

    /// Convert to the worker's runtime pacing configuration
    pub fn to_worker_config(&self) -> WorkerConfig {
        WorkerConfig {
            pace: Duration::from_millis(self.pace_ms),
            stop_check_interval: Duration::from_millis(self.stop_check_ms.max(1)),
        }
    }

    /// Iteration limit as the workload expects it
    pub fn iteration_limit(&self) -> Option<u64> {
        if self.max_iterations == 0 {
            None
        } else {
            Some(self.max_iterations)
        }
    }

    fn exe_dir_config() -> Option<PathBuf> {
        let exe_path = std::env::current_exe().ok()?;
        Some(exe_path.parent()?.join(format!("{}.toml", SERVICE_NAME)))
    }

    fn user_config() -> Option<PathBuf> {
        Some(dirs::config_dir()?.join(SERVICE_NAME).join("config.toml"))
    }

    /// Generate a sample configuration file content
    pub fn sample_config() -> String {
        r#"# Svcrun worker configuration

# Arguments handed to the worker entry point
# Example: arguments = ["a", "b"]
arguments = []

# Delay between work loop iterations in milliseconds (default: 100)
pace_ms = 100

# Longest sleep between stop checks in milliseconds (default: 10)
# Stop latency is bounded by one iteration plus this interval.
stop_check_ms = 10

# Iterations before the worker finishes on its own (0 = run until stopped)
max_iterations = 0

# Log level: trace, debug, info, warn, error (default: info)
log_level = "info"

# Log file path (empty = log to the console)
# Example: log_file = "/var/log/svcrun.log"
log_file = ""
"#
        .to_string()
    }
}

/// Configuration error types
#[derive(Debug)]
pub enum ConfigError {
    /// IO error reading/writing config file
    Io {
        path: String,
        source: std::io::Error,
    },
    /// Error parsing TOML
    Parse {
        path: String,
        source: toml::de::Error,
    },
    /// Error serializing config
    Serialize(toml::ser::Error),
}

impl std::fmt::Display for ConfigError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ConfigError::Io { path, source } => {
                write!(f, "Failed to read config file '{}': {}", path, source)
            }
            ConfigError::Parse { path, source } => {
                write!(f, "Failed to parse config file '{}': {}", path, source)
            }
            ConfigError::Serialize(e) => write!(f, "Failed to serialize config: {}", e),
        }
    }
}

impl std::error::Error for ConfigError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            ConfigError::Io { source, .. } => Some(source),
            ConfigError::Parse { source, .. } => Some(source),
            ConfigError::Serialize(e) => Some(e),
        }
    }
}
