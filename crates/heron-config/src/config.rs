//! The root configuration type.

use std::net::SocketAddr;

use serde::{Deserialize, Serialize};

use crate::schema::{LogFormat, LoggingSection, MetricsSection, RoutingSection, ServerSection};
use crate::ConfigError;

/// Complete Heron configuration.
///
/// Use [`ConfigLoader`](crate::ConfigLoader) to layer files and environment
/// variables over the defaults.
///
/// # Example
///
/// ```
/// use heron_config::HeronConfig;
///
/// let config = HeronConfig::default();
/// assert_eq!(config.server.http_addr, "0.0.0.0:8080");
/// assert!(!config.routing.reject_duplicate_routes);
/// ```
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq, Default)]
#[serde(default, deny_unknown_fields)]
pub struct HeronConfig {
    /// Transport settings.
    pub server: ServerSection,

    /// Log subscriber settings.
    pub logging: LoggingSection,

    /// Prometheus export.
    pub metrics: MetricsSection,

    /// Route compilation.
    pub routing: RoutingSection,
}

impl HeronConfig {
    /// Checks values serde cannot: addresses parse, the log level is set.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError::InvalidValue`] naming the first bad field.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.server.http_addr.parse::<SocketAddr>().is_err() {
            return Err(ConfigError::invalid_value(
                "server.http_addr",
                format!("invalid socket address: {}", self.server.http_addr),
            ));
        }

        if self.server.max_connections == Some(0) {
            return Err(ConfigError::invalid_value(
                "server.max_connections",
                "must be at least 1",
            ));
        }

        if self.logging.enabled && self.logging.level.trim().is_empty() {
            return Err(ConfigError::invalid_value("logging.level", "must not be empty"));
        }

        if let Some(addr) = &self.metrics.listen_addr {
            if addr.parse::<SocketAddr>().is_err() {
                return Err(ConfigError::invalid_value(
                    "metrics.listen_addr",
                    format!("invalid socket address: {addr}"),
                ));
            }
        }

        Ok(())
    }

    /// Local development: pretty debug logs with source locations.
    #[must_use]
    pub fn development() -> Self {
        let mut config = Self::default();
        config.logging.level = "debug".to_string();
        config.logging.format = LogFormat::Pretty;
        config.logging.include_location = true;
        config
    }

    /// Production: JSON info logs, duplicate routes rejected.
    #[must_use]
    pub fn production() -> Self {
        let mut config = Self::default();
        config.logging.level = "info".to_string();
        config.logging.format = LogFormat::Json;
        config.routing.reject_duplicate_routes = true;
        config
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_validates() {
        assert!(HeronConfig::default().validate().is_ok());
    }

    #[test]
    fn test_invalid_http_addr() {
        let mut config = HeronConfig::default();
        config.server.http_addr = "localhost".to_string();
        let err = config.validate().unwrap_err();
        assert!(matches!(err, ConfigError::InvalidValue { ref field, .. } if field == "server.http_addr"));
    }

    #[test]
    fn test_zero_max_connections() {
        let mut config = HeronConfig::default();
        config.server.max_connections = Some(0);
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_empty_log_level() {
        let mut config = HeronConfig::default();
        config.logging.level = "  ".to_string();
        assert!(config.validate().is_err());

        config.logging.enabled = false;
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_invalid_metrics_addr() {
        let mut config = HeronConfig::default();
        config.metrics.listen_addr = Some("nowhere".to_string());
        let err = config.validate().unwrap_err();
        assert!(matches!(err, ConfigError::InvalidValue { ref field, .. } if field == "metrics.listen_addr"));
    }

    #[test]
    fn test_presets() {
        let dev = HeronConfig::development();
        assert_eq!(dev.logging.level, "debug");
        assert_eq!(dev.logging.format, LogFormat::Pretty);
        assert!(!dev.routing.reject_duplicate_routes);

        let prod = HeronConfig::production();
        assert_eq!(prod.logging.format, LogFormat::Json);
        assert!(prod.routing.reject_duplicate_routes);
    }

    #[test]
    fn test_toml_roundtrip() {
        let config = HeronConfig::development();
        let text = toml::to_string(&config).unwrap();
        assert!(text.contains("[server]"));
        let parsed: HeronConfig = toml::from_str(&text).unwrap();
        assert_eq!(parsed, config);
    }

    #[test]
    fn test_unknown_section_rejected() {
        let result: Result<HeronConfig, _> = toml::from_str("[tracing]\nenabled = true\n");
        assert!(result.is_err());
    }
}
