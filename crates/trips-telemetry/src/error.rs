//! Telemetry error types.

use thiserror::Error;

/// Errors that can occur while setting up telemetry.
#[derive(Debug, Error)]
pub enum TelemetryError {
    /// The log filter directive could not be parsed.
    #[error("invalid log filter '{directive}': {reason}")]
    InvalidFilter {
        /// The directive as configured.
        directive: String,
        /// Parser message.
        reason: String,
    },

    /// A global subscriber is already installed, or installation failed.
    #[error("failed to initialize logging: {0}")]
    LoggingInit(String),
}
