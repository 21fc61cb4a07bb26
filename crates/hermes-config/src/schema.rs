//! Configuration section types.

use hermes_telemetry::{LogConfig, LogFormat};
use serde::{Deserialize, Serialize};

/// `[server]` section.
///
/// # Example
///
/// ```
/// use hermes_config::ServerSettings;
///
/// let settings = ServerSettings {
///     port: 8080,
///     prefix: Some("/api".to_string()),
///     ..Default::default()
/// };
/// assert_eq!(settings.hostname, "0.0.0.0");
/// assert_eq!(settings.addr(), "0.0.0.0:8080");
/// ```
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(deny_unknown_fields)]
pub struct ServerSettings {
    /// Interface to bind.
    #[serde(default = "default_hostname")]
    pub hostname: String,

    /// Port to bind. `0` is rejected by validation.
    #[serde(default = "default_port")]
    pub port: u16,

    /// Global path prefix applied to every route.
    #[serde(default)]
    pub prefix: Option<String>,

    /// Whether a trailing slash changes route identity.
    #[serde(default)]
    pub strict: bool,

    /// Suppresses the startup banner.
    #[serde(default)]
    pub disable_startup_message: bool,

    /// Graceful shutdown timeout in seconds.
    #[serde(default = "default_shutdown_timeout")]
    pub shutdown_timeout_secs: u64,
}

impl ServerSettings {
    /// Returns `hostname:port`.
    #[must_use]
    pub fn addr(&self) -> String {
        format!("{}:{}", self.hostname, self.port)
    }
}

impl Default for ServerSettings {
    fn default() -> Self {
        Self {
            hostname: default_hostname(),
            port: default_port(),
            prefix: None,
            strict: false,
            disable_startup_message: false,
            shutdown_timeout_secs: default_shutdown_timeout(),
        }
    }
}

fn default_hostname() -> String {
    "0.0.0.0".to_string()
}

fn default_port() -> u16 {
    3000
}

fn default_shutdown_timeout() -> u64 {
    30
}

/// `[logging]` section.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(deny_unknown_fields)]
pub struct LoggingSettings {
    /// Install a subscriber at startup.
    #[serde(default = "default_true")]
    pub enabled: bool,

    /// Filter directive, e.g. `info` or `hermes_server=debug,hyper=warn`.
    #[serde(default = "default_level")]
    pub level: String,

    /// Output format.
    #[serde(default)]
    pub format: LogFormat,
}

impl Default for LoggingSettings {
    fn default() -> Self {
        Self {
            enabled: true,
            level: default_level(),
            format: LogFormat::Json,
        }
    }
}

impl LoggingSettings {
    /// Converts these settings into a subscriber configuration.
    ///
    /// Fields not exposed in the file come from the preset matching the
    /// format: JSON uses the production preset, the others development.
    #[must_use]
    pub fn to_log_config(&self) -> LogConfig {
        let base = match self.format {
            LogFormat::Json => LogConfig::production(),
            LogFormat::Pretty | LogFormat::Compact => LogConfig::development(),
        };
        LogConfig {
            enabled: self.enabled,
            level: self.level.clone(),
            format: self.format,
            ..base
        }
    }
}

fn default_true() -> bool {
    true
}

fn default_level() -> String {
    "info".to_string()
}
