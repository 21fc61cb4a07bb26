//! Top-level [`HermesConfig`].

use hermes_telemetry::LogFormat;
use serde::{Deserialize, Serialize};

use crate::{ConfigError, ConfigResult, LoggingSettings, ServerSettings};

/// Complete Hermes settings.
///
/// Use [`ConfigLoader`](crate::ConfigLoader) to layer files and environment
/// variables on top of the defaults.
///
/// # Example
///
/// ```
/// use hermes_config::HermesConfig;
///
/// let config = HermesConfig::default();
/// assert_eq!(config.server.port, 3000);
/// assert!(config.validate().is_ok());
/// ```
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq, Default)]
#[serde(deny_unknown_fields)]
pub struct HermesConfig {
    /// Server section.
    #[serde(default)]
    pub server: ServerSettings,

    /// Logging section.
    #[serde(default)]
    pub logging: LoggingSettings,
}

impl HermesConfig {
    /// Checks values the type system cannot.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError::InvalidValue`] for an empty hostname, port 0,
    /// a prefix without a leading `/`, or an unparsable log filter.
    pub fn validate(&self) -> ConfigResult<()> {
        if self.server.hostname.trim().is_empty() {
            return Err(ConfigError::invalid_value(
                "server.hostname",
                "must not be empty",
            ));
        }

        if self.server.port == 0 {
            return Err(ConfigError::invalid_value("server.port", "must not be 0"));
        }

        if let Some(prefix) = &self.server.prefix {
            if !prefix.is_empty() && !prefix.starts_with('/') {
                return Err(ConfigError::invalid_value(
                    "server.prefix",
                    format!("must start with '/': {prefix}"),
                ));
            }
        }

        if let Err(err) = hermes_telemetry::create_env_filter(&self.logging.level) {
            return Err(ConfigError::invalid_value("logging.level", err.to_string()));
        }

        Ok(())
    }

    /// Local development preset: debug level, pretty output.
    #[must_use]
    pub fn development() -> Self {
        let mut config = Self::default();
        config.server.hostname = "127.0.0.1".to_string();
        config.logging.level = "debug".to_string();
        config.logging.format = LogFormat::Pretty;
        config
    }

    /// Production preset: info level, JSON output, no banner.
    #[must_use]
    pub fn production() -> Self {
        let mut config = Self::default();
        config.server.disable_startup_message = true;
        config.logging.level = "info".to_string();
        config.logging.format = LogFormat::Json;
        config
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_config_is_valid() {
        let config = HermesConfig::default();
        assert_eq!(config.server.hostname, "0.0.0.0");
        assert_eq!(config.logging.level, "info");
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_validate_empty_hostname() {
        let mut config = HermesConfig::default();
        config.server.hostname = "  ".to_string();
        let err = config.validate().unwrap_err();
        assert!(err.to_string().contains("server.hostname"));
    }

    #[test]
    fn test_validate_zero_port() {
        let mut config = HermesConfig::default();
        config.server.port = 0;
        assert!(matches!(
            config.validate(),
            Err(ConfigError::InvalidValue { ref field, .. }) if field == "server.port"
        ));
    }

    #[test]
    fn test_validate_prefix() {
        let mut config = HermesConfig::default();
        config.server.prefix = Some("api".to_string());
        assert!(config.validate().is_err());

        config.server.prefix = Some("/api".to_string());
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_presets() {
        let dev = HermesConfig::development();
        assert_eq!(dev.logging.format, LogFormat::Pretty);
        assert_eq!(dev.logging.level, "debug");
        assert!(dev.validate().is_ok());

        let prod = HermesConfig::production();
        assert_eq!(prod.logging.format, LogFormat::Json);
        assert!(prod.server.disable_startup_message);
    }
}
