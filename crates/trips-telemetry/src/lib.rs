//! # Trips Telemetry
//!
//! Structured logging for the trips service, built on `tracing` and
//! `tracing-subscriber`.
//!
//! ## Example
//!
//! ```rust,ignore
//! use trips_telemetry::{init_logging, LogConfig};
//!
//! init_logging(&LogConfig::production("trips"))?;
//! tracing::info!(flights = 3, "resolving trip");
//! ```

#![doc(html_root_url = "https://docs.rs/trips-telemetry/0.1.0")]
#![warn(missing_docs)]
#![forbid(unsafe_code)]

pub mod error;
pub mod logging;

pub use error::TelemetryError;
pub use logging::{fields, init_logging, request_span, LogConfig, LogFormat};

/// Result type for telemetry operations.
pub type TelemetryResult<T> = Result<T, TelemetryError>;
