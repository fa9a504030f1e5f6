//! Top-level configuration.

use serde::{Deserialize, Serialize};
use std::net::SocketAddr;

use crate::{ConfigError, LoggingSettings, RateLimitSettings, ServerSettings, ServiceSettings};

/// Complete configuration for the trips service.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq, Default)]
#[serde(deny_unknown_fields)]
pub struct TripsConfig {
    /// HTTP server settings.
    #[serde(default)]
    pub server: ServerSettings,

    /// Rate limiting.
    #[serde(default)]
    pub rate_limit: RateLimitSettings,

    /// Logging.
    #[serde(default)]
    pub logging: LoggingSettings,

    /// Service identity.
    #[serde(default)]
    pub service: ServiceSettings,
}

impl TripsConfig {
    /// Checks values that parse but cannot work.
    pub fn validate(&self) -> Result<(), ConfigError> {
        self.socket_addr()?;

        if self.server.request_timeout_ms == 0 {
            return Err(ConfigError::invalid_value(
                "server.request_timeout_ms",
                "must be greater than zero",
            ));
        }

        if self.server.max_body_bytes == 0 {
            return Err(ConfigError::invalid_value(
                "server.max_body_bytes",
                "must be greater than zero",
            ));
        }

        if self.server.max_connections == Some(0) {
            return Err(ConfigError::invalid_value(
                "server.max_connections",
                "must be greater than zero when set",
            ));
        }

        if self.rate_limit.enabled {
            if self.rate_limit.requests == 0 {
                return Err(ConfigError::invalid_value(
                    "rate_limit.requests",
                    "must be greater than zero",
                ));
            }
            if self.rate_limit.window_ms == 0 {
                return Err(ConfigError::invalid_value(
                    "rate_limit.window_ms",
                    "must be greater than zero",
                ));
            }
        }

        if self.logging.level.trim().is_empty() {
            return Err(ConfigError::invalid_value("logging.level", "must not be empty"));
        }

        if self.service.name.trim().is_empty() {
            return Err(ConfigError::invalid_value("service.name", "must not be empty"));
        }

        Ok(())
    }

    /// Parses `server.http_addr`.
    pub fn socket_addr(&self) -> Result<SocketAddr, ConfigError> {
        self.server.http_addr.parse().map_err(|_| {
            ConfigError::invalid_value(
                "server.http_addr",
                format!("invalid socket address: {}", self.server.http_addr),
            )
        })
    }

    /// Local development preset: loopback address, pretty debug logs.
    #[must_use]
    pub fn development() -> Self {
        let mut config = Self::default();
        config.server.http_addr = "127.0.0.1:8080".to_string();
        config.logging.level = "debug".to_string();
        config.logging.format = crate::LogFormat::Pretty;
        config.logging.ansi = true;
        config
    }
}
