//! Configuration for the netdev exporter.

use std::net::{IpAddr, Ipv4Addr, SocketAddr};
use std::path::{Path, PathBuf};
use std::time::Duration;

use serde::{Deserialize, Serialize};
use thiserror::Error;
use tracing::Level;

/// Configuration errors.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Failed to read config file: {0}")]
    Io(#[from] std::io::Error),
    #[error("Failed to parse config: {0}")]
    Parse(#[from] json5::Error),
    #[error("Validation error: {0}")]
    Validation(String),
    #[error("Failed to resolve bind address {host}: {reason}")]
    Resolve { host: String, reason: String },
}

/// Complete exporter configuration.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ExporterConfig {
    /// HTTP endpoint settings.
    #[serde(default)]
    pub http: HttpConfig,

    /// External tool settings.
    #[serde(default)]
    pub tools: ToolsConfig,

    /// Locations of the sysfs classes that are read.
    #[serde(default)]
    pub sysfs: SysfsConfig,

    /// Logging configuration.
    #[serde(default)]
    pub logging: LoggingConfig,
}

/// HTTP endpoint configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct HttpConfig {
    /// Port to listen on (default: 9117).
    #[serde(default = "default_port")]
    pub port: u16,

    /// Local address or host name to bind (default: all interfaces).
    #[serde(default)]
    pub bind: Option<String>,

    /// Path for metrics endpoint (default: "/metrics").
    #[serde(default = "default_path")]
    pub path: String,
}

fn default_port() -> u16 {
    9117
}

fn default_path() -> String {
    "/metrics".to_string()
}

impl Default for HttpConfig {
    fn default() -> Self {
        Self {
            port: default_port(),
            bind: None,
            path: default_path(),
        }
    }
}

/// External tool locations and limits.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ToolsConfig {
    /// Path of `ibdev2netdev`.
    #[serde(default = "default_ibdev2netdev")]
    pub ibdev2netdev: PathBuf,

    /// Path of `ethtool`.
    #[serde(default = "default_ethtool")]
    pub ethtool: PathBuf,

    /// Maximum run time of a single tool invocation (seconds).
    #[serde(default = "default_timeout")]
    pub timeout_secs: u64,

    /// Exit code of `ethtool -S` meaning the device has no statistics.
    #[serde(default = "default_no_stats_code")]
    pub ethtool_no_stats_code: i32,
}

fn default_ibdev2netdev() -> PathBuf {
    PathBuf::from("/usr/bin/ibdev2netdev")
}

fn default_ethtool() -> PathBuf {
    PathBuf::from("/sbin/ethtool")
}

fn default_timeout() -> u64 {
    5
}

fn default_no_stats_code() -> i32 {
    crate::ethtool::NO_STATS_EXIT_CODE
}

impl Default for ToolsConfig {
    fn default() -> Self {
        Self {
            ibdev2netdev: default_ibdev2netdev(),
            ethtool: default_ethtool(),
            timeout_secs: default_timeout(),
            ethtool_no_stats_code: default_no_stats_code(),
        }
    }
}

impl ToolsConfig {
    pub fn timeout(&self) -> Duration {
        Duration::from_secs(self.timeout_secs)
    }
}

/// sysfs class directories.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SysfsConfig {
    #[serde(default = "default_net_class")]
    pub net_class: PathBuf,

    #[serde(default = "default_infiniband_class")]
    pub infiniband_class: PathBuf,
}

fn default_net_class() -> PathBuf {
    PathBuf::from("/sys/class/net")
}

fn default_infiniband_class() -> PathBuf {
    PathBuf::from("/sys/class/infiniband")
}

impl Default for SysfsConfig {
    fn default() -> Self {
        Self {
            net_class: default_net_class(),
            infiniband_class: default_infiniband_class(),
        }
    }
}

/// Logging configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LoggingConfig {
    /// Log level: "trace", "debug", "info", "warn" (or "warning"), "error".
    #[serde(default = "default_log_level")]
    pub level: String,

    /// Log output format: "text" or "json".
    #[serde(default)]
    pub format: LogFormat,
}

fn default_log_level() -> String {
    "warn".to_string()
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: default_log_level(),
            format: LogFormat::default(),
        }
    }
}

impl LoggingConfig {
    /// Parse the configured level, case-insensitively.
    pub fn tracing_level(&self) -> Result<Level, ConfigError> {
        let level = self.level.to_ascii_lowercase();
        match level.as_str() {
            "warning" => Ok(Level::WARN),
            "critical" => Ok(Level::ERROR),
            other => other
                .parse()
                .map_err(|_| ConfigError::Validation(format!("Invalid log level: {}", self.level))),
        }
    }
}

/// Log output format.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum LogFormat {
    #[default]
    Text,
    Json,
}

impl ExporterConfig {
    /// Load configuration from a JSON5 file.
    pub fn load_from_file<P: AsRef<Path>>(path: P) -> Result<Self, ConfigError> {
        let content = std::fs::read_to_string(path)?;
        let config: ExporterConfig = json5::from_str(&content)?;
        config.validate()?;
        Ok(config)
    }

    /// Parse configuration from a JSON5 string.
    pub fn parse(content: &str) -> Result<Self, ConfigError> {
        let config: ExporterConfig = json5::from_str(content)?;
        config.validate()?;
        Ok(config)
    }

    /// Address the HTTP server listens on.
    ///
    /// IP literals are used as is; host names are resolved and the first
    /// address returned wins.
    pub async fn listen_addr(&self) -> Result<SocketAddr, ConfigError> {
        let Some(bind) = &self.http.bind else {
            return Ok(SocketAddr::new(
                IpAddr::V4(Ipv4Addr::UNSPECIFIED),
                self.http.port,
            ));
        };

        let resolve_error = |reason: String| ConfigError::Resolve {
            host: bind.clone(),
            reason,
        };
        tokio::net::lookup_host((bind.as_str(), self.http.port))
            .await
            .map_err(|e| resolve_error(e.to_string()))?
            .next()
            .ok_or_else(|| resolve_error("no addresses found".to_string()))
    }

    /// Validate the configuration.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if let Some(bind) = &self.http.bind {
            if bind.trim().is_empty() {
                return Err(ConfigError::Validation(
                    "Bind address must not be empty".to_string(),
                ));
            }
        }

        if !self.http.path.starts_with('/') {
            return Err(ConfigError::Validation(
                "Metrics path must start with /".to_string(),
            ));
        }

        if self.tools.timeout_secs == 0 {
            return Err(ConfigError::Validation(
                "timeout_secs must be > 0".to_string(),
            ));
        }

        self.logging.tracing_level()?;

        Ok(())
    }
}
