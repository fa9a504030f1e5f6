//! Structured logging setup.
//!
//! [`init_logging`] installs a global `tracing` subscriber. JSON output is the
//! default so log lines can be shipped as-is; `pretty` and `compact` are meant
//! for local development.
//!
//! The filter comes from `RUST_LOG` when set, otherwise from
//! [`LogConfig::level`].
//!
//! # Example
//!
//! ```rust,ignore
//! use trips_telemetry::logging::{init_logging, LogConfig};
//!
//! init_logging(&LogConfig::development("trips"))?;
//! trips_telemetry::log_request_start!(request_id, "POST", "/calculate", "10.0.0.1");
//! ```

use crate::error::TelemetryError;
use crate::TelemetryResult;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;
use tracing_subscriber::layer::SubscriberExt;
use tracing_subscriber::util::SubscriberInitExt;
use tracing_subscriber::{EnvFilter, Layer};

/// Output format for log lines.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum LogFormat {
    /// One JSON object per line.
    #[default]
    Json,
    /// Multi-line human readable output.
    Pretty,
    /// Single-line human readable output.
    Compact,
}

impl fmt::Display for LogFormat {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Self::Json => "json",
            Self::Pretty => "pretty",
            Self::Compact => "compact",
        })
    }
}

impl FromStr for LogFormat {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "json" => Ok(Self::Json),
            "pretty" => Ok(Self::Pretty),
            "compact" => Ok(Self::Compact),
            other => Err(format!(
                "unknown log format '{other}', expected 'json', 'pretty' or 'compact'"
            )),
        }
    }
}

/// Logging configuration.
#[derive(Debug, Clone)]
pub struct LogConfig {
    /// Whether to install a subscriber at all.
    pub enabled: bool,
    /// Filter directive, e.g. `info` or `trips=debug,hyper=warn`.
    pub level: String,
    /// Output format.
    pub format: LogFormat,
    /// Whether to emit ANSI colors (ignored for JSON).
    pub ansi: bool,
    /// Whether to include the event target.
    pub include_target: bool,
    /// Name of the service, recorded once at startup.
    pub service_name: String,
}

impl Default for LogConfig {
    fn default() -> Self {
        Self::production("trips")
    }
}

impl LogConfig {
    /// JSON output at `info`.
    #[must_use]
    pub fn production(service_name: impl Into<String>) -> Self {
        Self {
            enabled: true,
            level: "info".to_string(),
            format: LogFormat::Json,
            ansi: false,
            include_target: true,
            service_name: service_name.into(),
        }
    }

    /// Pretty, colored output at `debug`.
    #[must_use]
    pub fn development(service_name: impl Into<String>) -> Self {
        Self {
            enabled: true,
            level: "debug".to_string(),
            format: LogFormat::Pretty,
            ansi: true,
            include_target: true,
            service_name: service_name.into(),
        }
    }

    /// Builds the filter for this configuration.
    ///
    /// `RUST_LOG` wins over the configured level when it is set and valid.
    pub fn env_filter(&self) -> TelemetryResult<EnvFilter> {
        if let Ok(filter) = EnvFilter::try_from_default_env() {
            return Ok(filter);
        }
        EnvFilter::try_new(&self.level).map_err(|e| TelemetryError::InvalidFilter {
            directive: self.level.clone(),
            reason: e.to_string(),
        })
    }
}

/// Installs the global subscriber described by `config`.
///
/// Does nothing when logging is disabled.
///
/// # Errors
///
/// Fails if the filter is invalid or a global subscriber is already set.
pub fn init_logging(config: &LogConfig) -> TelemetryResult<()> {
    if !config.enabled {
        return Ok(());
    }

    let filter = config.env_filter()?;

    let layer = match config.format {
        LogFormat::Json => tracing_subscriber::fmt::layer()
            .json()
            .with_current_span(true)
            .with_span_list(false)
            .with_target(config.include_target)
            .with_filter(filter)
            .boxed(),
        LogFormat::Pretty => tracing_subscriber::fmt::layer()
            .pretty()
            .with_ansi(config.ansi)
            .with_target(config.include_target)
            .with_filter(filter)
            .boxed(),
        LogFormat::Compact => tracing_subscriber::fmt::layer()
            .compact()
            .with_ansi(config.ansi)
            .with_target(config.include_target)
            .with_filter(filter)
            .boxed(),
    };

    tracing_subscriber::registry()
        .with(layer)
        .try_init()
        .map_err(|e| TelemetryError::LoggingInit(e.to_string()))?;

    tracing::debug!(
        service.name = %config.service_name,
        log.format = %config.format,
        "logging initialized"
    );

    Ok(())
}

/// Creates the span that wraps one HTTP request.
#[must_use]
pub fn request_span(request_id: &str, method: &str, path: &str) -> tracing::Span {
    tracing::info_span!(
        "request",
        request_id = %request_id,
        http.method = %method,
        http.path = %path,
    )
}

/// Standard field names used in log events.
pub mod fields {
    /// Request identifier.
    pub const REQUEST_ID: &str = "request_id";

    /// HTTP method.
    pub const HTTP_METHOD: &str = "http.method";

    /// Request path.
    pub const HTTP_PATH: &str = "http.path";

    /// Response status code.
    pub const HTTP_STATUS: &str = "http.status_code";

    /// Request duration in milliseconds.
    pub const DURATION_MS: &str = "duration_ms";

    /// Resolved client IP.
    pub const CLIENT_IP: &str = "client.ip";

    /// Number of flights in a trip request.
    pub const FLIGHT_COUNT: &str = "trip.flights";

    /// Error description.
    pub const ERROR: &str = "error";

    /// Service name.
    pub const SERVICE_NAME: &str = "service.name";
}

/// Logs the arrival of a request.
#[macro_export]
macro_rules! log_request_start {
    ($request_id:expr, $method:expr, $path:expr, $client_ip:expr) => {
        tracing::info!(
            request_id = %$request_id,
            http.method = %$method,
            http.path = %$path,
            client.ip = %$client_ip,
            "request started"
        );
    };
}

/// Logs the completion of a request.
#[macro_export]
macro_rules! log_request_complete {
    ($request_id:expr, $status:expr, $duration_ms:expr) => {
        tracing::info!(
            request_id = %$request_id,
            http.status_code = $status,
            duration_ms = $duration_ms,
            "request completed"
        );
    };
}

/// Logs a failed request.
#[macro_export]
macro_rules! log_request_error {
    ($request_id:expr, $error:expr) => {
        tracing::error!(
            request_id = %$request_id,
            error = %$error,
            "request failed"
        );
    };
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_production_config() {
        let config = LogConfig::production("trips");
        assert!(config.enabled);
        assert_eq!(config.format, LogFormat::Json);
        assert_eq!(config.level, "info");
        assert!(!config.ansi);
    }

    #[test]
    fn test_development_config() {
        let config = LogConfig::development("trips");
        assert_eq!(config.format, LogFormat::Pretty);
        assert_eq!(config.level, "debug");
        assert_eq!(config.service_name, "trips");
    }

    #[test]
    fn test_log_format_parsing() {
        assert_eq!("JSON".parse::<LogFormat>(), Ok(LogFormat::Json));
        assert_eq!("pretty".parse::<LogFormat>(), Ok(LogFormat::Pretty));
        assert_eq!("compact".parse::<LogFormat>(), Ok(LogFormat::Compact));
        assert!("xml".parse::<LogFormat>().is_err());
    }

    #[test]
    fn test_log_format_serde() {
        let format: LogFormat = serde_json::from_str("\"compact\"").unwrap();
        assert_eq!(format, LogFormat::Compact);
        assert_eq!(serde_json::to_string(&LogFormat::Json).unwrap(), "\"json\"");
    }

    #[test]
    fn test_disabled_logging_is_noop() {
        let config = LogConfig {
            enabled: false,
            ..LogConfig::default()
        };
        assert!(init_logging(&config).is_ok());
    }

    #[test]
    fn test_request_span_is_created() {
        let span = request_span("abc", "POST", "/calculate");
        // No subscriber is installed in unit tests, so the span is disabled.
        let _entered = span.enter();
    }

    #[test]
    fn test_field_names() {
        assert_eq!(fields::REQUEST_ID, "request_id");
        assert_eq!(fields::HTTP_STATUS, "http.status_code");
    }
}
