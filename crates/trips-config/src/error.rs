//! Configuration error types.

use std::path::PathBuf;
use thiserror::Error;

/// Errors that can occur while loading or validating configuration.
#[derive(Error, Debug)]
pub enum ConfigError {
    /// The configuration file does not exist.
    #[error("configuration file not found: {path}")]
    FileNotFound {
        /// Path that was looked up.
        path: PathBuf,
    },

    /// The configuration file could not be read.
    #[error("failed to read configuration file: {path}")]
    ReadError {
        /// Path that failed.
        path: PathBuf,
        /// Underlying I/O error.
        #[source]
        source: std::io::Error,
    },

    /// The file extension or format name is not supported.
    #[error("unsupported configuration format: {0}")]
    UnsupportedFormat(String),

    /// TOML parse failure, including unknown fields.
    #[error("failed to parse TOML configuration: {0}")]
    Toml(#[from] toml::de::Error),

    /// JSON parse failure, including unknown fields.
    #[error("failed to parse JSON configuration: {0}")]
    Json(#[from] serde_json::Error),

    /// An environment variable override could not be parsed.
    #[error("failed to parse environment variable {var}: {reason}")]
    EnvParse {
        /// Variable name.
        var: String,
        /// What was expected.
        reason: String,
    },

    /// A value is out of range or malformed.
    #[error("invalid configuration value for {field}: {reason}")]
    InvalidValue {
        /// Dotted field path, e.g. `server.http_addr`.
        field: String,
        /// What is wrong with it.
        reason: String,
    },
}

impl ConfigError {
    /// Creates a file-not-found error.
    pub fn file_not_found(path: impl Into<PathBuf>) -> Self {
        Self::FileNotFound { path: path.into() }
    }

    /// Creates a read error.
    pub fn read_error(path: impl Into<PathBuf>, source: std::io::Error) -> Self {
        Self::ReadError {
            path: path.into(),
            source,
        }
    }

    /// Creates an environment parse error.
    pub fn env_parse(var: impl Into<String>, reason: impl Into<String>) -> Self {
        Self::EnvParse {
            var: var.into(),
            reason: reason.into(),
        }
    }

    /// Creates an invalid value error.
    pub fn invalid_value(field: impl Into<String>, reason: impl Into<String>) -> Self {
        Self::InvalidValue {
            field: field.into(),
            reason: reason.into(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_file_not_found_error() {
        let err = ConfigError::file_not_found("/etc/trips/trips.toml");
        assert!(err.to_string().contains("/etc/trips/trips.toml"));
    }

    #[test]
    fn test_env_parse_error() {
        let err = ConfigError::env_parse("TRIPS__RATE_LIMIT__REQUESTS", "expected integer");
        assert_eq!(
            err.to_string(),
            "failed to parse environment variable TRIPS__RATE_LIMIT__REQUESTS: expected integer"
        );
    }

    #[test]
    fn test_invalid_value_error() {
        let err = ConfigError::invalid_value("server.http_addr", "invalid socket address");
        assert!(err.to_string().contains("server.http_addr"));
    }
}
