//! Configuration sections.

use serde::{Deserialize, Serialize};
use std::time::Duration;
use trips_telemetry::{LogConfig, LogFormat};

/// HTTP server settings.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(deny_unknown_fields)]
pub struct ServerSettings {
    /// Address to listen on.
    #[serde(default = "default_http_addr")]
    pub http_addr: String,

    /// Upper bound for reading the body and running the handler.
    #[serde(default = "default_request_timeout_ms")]
    pub request_timeout_ms: u64,

    /// How long in-flight connections may drain after a shutdown signal.
    #[serde(default = "default_shutdown_timeout_secs")]
    pub shutdown_timeout_secs: u64,

    /// Maximum concurrent connections; unlimited when absent.
    #[serde(default)]
    pub max_connections: Option<usize>,

    /// Maximum accepted request body size.
    #[serde(default = "default_max_body_bytes")]
    pub max_body_bytes: usize,
}

impl ServerSettings {
    /// Request timeout as a [`Duration`].
    #[must_use]
    pub const fn request_timeout(&self) -> Duration {
        Duration::from_millis(self.request_timeout_ms)
    }

    /// Shutdown timeout as a [`Duration`].
    #[must_use]
    pub const fn shutdown_timeout(&self) -> Duration {
        Duration::from_secs(self.shutdown_timeout_secs)
    }
}

impl Default for ServerSettings {
    fn default() -> Self {
        Self {
            http_addr: default_http_addr(),
            request_timeout_ms: default_request_timeout_ms(),
            shutdown_timeout_secs: default_shutdown_timeout_secs(),
            max_connections: None,
            max_body_bytes: default_max_body_bytes(),
        }
    }
}

fn default_http_addr() -> String {
    "0.0.0.0:8080".to_string()
}

fn default_request_timeout_ms() -> u64 {
    10_000
}

fn default_shutdown_timeout_secs() -> u64 {
    30
}

fn default_max_body_bytes() -> usize {
    1024 * 1024
}

/// Per-client request rate limiting.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(deny_unknown_fields)]
pub struct RateLimitSettings {
    /// Whether requests are limited at all.
    #[serde(default = "default_true")]
    pub enabled: bool,

    /// Requests allowed per window and client IP.
    #[serde(default = "default_requests")]
    pub requests: u32,

    /// Window length.
    #[serde(default = "default_window_ms")]
    pub window_ms: u64,
}

impl RateLimitSettings {
    /// Window as a [`Duration`].
    #[must_use]
    pub const fn window(&self) -> Duration {
        Duration::from_millis(self.window_ms)
    }
}

impl Default for RateLimitSettings {
    fn default() -> Self {
        Self {
            enabled: true,
            requests: default_requests(),
            window_ms: default_window_ms(),
        }
    }
}

fn default_true() -> bool {
    true
}

fn default_requests() -> u32 {
    100
}

fn default_window_ms() -> u64 {
    1000
}

/// Logging settings.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(deny_unknown_fields)]
pub struct LoggingSettings {
    /// Whether to install a log subscriber.
    #[serde(default = "default_true")]
    pub enabled: bool,

    /// Filter directive.
    #[serde(default = "default_level")]
    pub level: String,

    /// Output format.
    #[serde(default)]
    pub format: LogFormat,

    /// Colored output for the human readable formats.
    #[serde(default)]
    pub ansi: bool,
}

impl LoggingSettings {
    /// Builds the telemetry [`LogConfig`] for `service_name`.
    #[must_use]
    pub fn to_log_config(&self, service_name: &str) -> LogConfig {
        LogConfig {
            enabled: self.enabled,
            level: self.level.clone(),
            format: self.format,
            ansi: self.ansi,
            include_target: true,
            service_name: service_name.to_string(),
        }
    }
}

impl Default for LoggingSettings {
    fn default() -> Self {
        Self {
            enabled: true,
            level: default_level(),
            format: LogFormat::Json,
            ansi: false,
        }
    }
}

fn default_level() -> String {
    "info".to_string()
}

/// Service identity reported by the health endpoint and logs.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(deny_unknown_fields)]
pub struct ServiceSettings {
    /// Service name.
    #[serde(default = "default_service_name")]
    pub name: String,

    /// Service version; defaults to the crate version.
    #[serde(default = "default_service_version")]
    pub version: String,
}

impl Default for ServiceSettings {
    fn default() -> Self {
        Self {
            name: default_service_name(),
            version: default_service_version(),
        }
    }
}

fn default_service_name() -> String {
    "trips".to_string()
}

fn default_service_version() -> String {
    env!("CARGO_PKG_VERSION").to_string()
}
