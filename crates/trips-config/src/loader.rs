//! Layered configuration loading.
//!
//! Layers apply in call order, with environment overrides always last:
//!
//! 1. defaults ([`ConfigLoader::with_defaults`] or a preset)
//! 2. a TOML or JSON file, or an inline string
//! 3. `.env` contents ([`ConfigLoader::with_dotenv`])
//! 4. `PREFIX__SECTION__KEY` environment variables
//!
//! A file replaces the whole configuration; fields it leaves out fall back
//! to their defaults, not to earlier layers.

use std::env;
use std::fs;
use std::path::Path;
use std::str::FromStr;

use crate::{ConfigError, LogFormat, TripsConfig};

/// Builder that assembles a [`TripsConfig`] from several sources.
#[derive(Debug, Default)]
pub struct ConfigLoader {
    config: TripsConfig,
    env_prefix: Option<String>,
}

impl ConfigLoader {
    /// Starts from the built-in defaults.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Resets to the built-in defaults.
    #[must_use]
    pub fn with_defaults(mut self) -> Self {
        self.config = TripsConfig::default();
        self
    }

    /// Resets to the development preset.
    #[must_use]
    pub fn with_development(mut self) -> Self {
        self.config = TripsConfig::development();
        self
    }

    /// Loads a `.toml` or `.json` file.
    pub fn with_file<P: AsRef<Path>>(mut self, path: P) -> Result<Self, ConfigError> {
        let path = path.as_ref();

        if !path.exists() {
            return Err(ConfigError::file_not_found(path));
        }

        let content = fs::read_to_string(path).map_err(|e| ConfigError::read_error(path, e))?;

        let format = path
            .extension()
            .and_then(|e| e.to_str())
            .map(str::to_lowercase)
            .ok_or_else(|| ConfigError::UnsupportedFormat(path.display().to_string()))?;

        self.config = parse(&content, &format)?;
        Ok(self)
    }

    /// Loads a file if it exists, otherwise leaves the configuration as is.
    pub fn with_optional_file<P: AsRef<Path>>(self, path: P) -> Result<Self, ConfigError> {
        if path.as_ref().exists() {
            self.with_file(path)
        } else {
            Ok(self)
        }
    }

    /// Loads configuration from a string in the given format (`toml` or `json`).
    pub fn with_string(mut self, content: &str, format: &str) -> Result<Self, ConfigError> {
        self.config = parse(content, &format.to_lowercase())?;
        Ok(self)
    }

    /// Reads a `.env` file into the process environment, if one exists.
    #[must_use]
    pub fn with_dotenv(self) -> Self {
        // A missing .env is the normal case outside development.
        let _ = dotenvy::dotenv();
        self
    }

    /// Enables `PREFIX__SECTION__KEY` overrides, applied by [`load`](Self::load).
    #[must_use]
    pub fn with_env_prefix(mut self, prefix: &str) -> Self {
        self.env_prefix = Some(prefix.to_uppercase());
        self
    }

    /// Applies environment overrides and validates.
    pub fn load(mut self) -> Result<TripsConfig, ConfigError> {
        if let Some(prefix) = self.env_prefix.take() {
            self.apply_env_overrides(&prefix)?;
        }

        self.config.validate()?;
        Ok(self.config)
    }

    /// Returns the configuration without env overrides or validation.
    #[must_use]
    pub fn load_unvalidated(self) -> TripsConfig {
        self.config
    }

    fn apply_env_overrides(&mut self, prefix: &str) -> Result<(), ConfigError> {
        let marker = format!("{prefix}__");
        let mut vars: Vec<(String, String)> =
            env::vars().filter(|(k, _)| k.starts_with(&marker)).collect();
        vars.sort();

        for (key, value) in vars {
            let path = &key[marker.len()..];
            self.apply_env_var(&key, path, &value)?;
        }

        Ok(())
    }

    fn apply_env_var(&mut self, key: &str, path: &str, value: &str) -> Result<(), ConfigError> {
        let parts: Vec<&str> = path.split("__").collect();
        let config = &mut self.config;

        match parts.as_slice() {
            ["SERVER", "HTTP_ADDR"] => config.server.http_addr = value.to_string(),
            ["SERVER", "REQUEST_TIMEOUT_MS"] => {
                config.server.request_timeout_ms = parse_value(key, value, "expected integer")?;
            }
            ["SERVER", "SHUTDOWN_TIMEOUT_SECS"] => {
                config.server.shutdown_timeout_secs = parse_value(key, value, "expected integer")?;
            }
            ["SERVER", "MAX_CONNECTIONS"] => {
                config.server.max_connections = if value.eq_ignore_ascii_case("none") {
                    None
                } else {
                    Some(parse_value(key, value, "expected integer or 'none'")?)
                };
            }
            ["SERVER", "MAX_BODY_BYTES"] => {
                config.server.max_body_bytes = parse_value(key, value, "expected integer")?;
            }

            ["RATE_LIMIT", "ENABLED"] => config.rate_limit.enabled = parse_flag(key, value)?,
            ["RATE_LIMIT", "REQUESTS"] => {
                config.rate_limit.requests = parse_value(key, value, "expected integer")?;
            }
            ["RATE_LIMIT", "WINDOW_MS"] => {
                config.rate_limit.window_ms = parse_value(key, value, "expected integer")?;
            }

            ["LOGGING", "ENABLED"] => config.logging.enabled = parse_flag(key, value)?,
            ["LOGGING", "LEVEL"] => config.logging.level = value.to_string(),
            ["LOGGING", "FORMAT"] => {
                config.logging.format = value
                    .parse::<LogFormat>()
                    .map_err(|reason| ConfigError::env_parse(key, reason))?;
            }
            ["LOGGING", "ANSI"] => config.logging.ansi = parse_flag(key, value)?,

            ["SERVICE", "NAME"] => config.service.name = value.to_string(),
            ["SERVICE", "VERSION"] => config.service.version = value.to_string(),

            _ => return Err(ConfigError::env_parse(key, "unknown configuration key")),
        }

        Ok(())
    }
}

fn parse(content: &str, format: &str) -> Result<TripsConfig, ConfigError> {
    match format {
        "toml" => Ok(toml::from_str(content)?),
        "json" => Ok(serde_json::from_str(content)?),
        other => Err(ConfigError::UnsupportedFormat(other.to_string())),
    }
}

fn parse_value<T: FromStr>(key: &str, value: &str, expected: &str) -> Result<T, ConfigError> {
    value
        .trim()
        .parse()
        .map_err(|_| ConfigError::env_parse(key, expected))
}

fn parse_flag(key: &str, value: &str) -> Result<bool, ConfigError> {
    match value.trim().to_lowercase().as_str() {
        "true" | "1" | "yes" | "on" => Ok(true),
        "false" | "0" | "no" | "off" => Ok(false),
        _ => Err(ConfigError::env_parse(key, "expected boolean")),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;
    use tempfile::NamedTempFile;

    fn temp_file(suffix: &str, content: &str) -> NamedTempFile {
        let mut file = tempfile::Builder::new().suffix(suffix).tempfile().unwrap();
        file.write_all(content.as_bytes()).unwrap();
        file
    }

    #[test]
    fn test_defaults() {
        let config = ConfigLoader::new().with_defaults().load().unwrap();
        assert_eq!(config, TripsConfig::default());
    }

    #[test]
    fn test_toml_file() {
        let file = temp_file(
            ".toml",
            r#"
            [server]
            http_addr = "127.0.0.1:9090"

            [rate_limit]
            requests = 5
            "#,
        );

        let config = ConfigLoader::new().with_file(file.path()).unwrap().load().unwrap();
        assert_eq!(config.server.http_addr, "127.0.0.1:9090");
        assert_eq!(config.rate_limit.requests, 5);
        assert_eq!(config.rate_limit.window_ms, 1000);
    }

    #[test]
    fn test_json_file() {
        let file = temp_file(".json", r#"{"logging": {"format": "compact"}}"#);
        let config = ConfigLoader::new().with_file(file.path()).unwrap().load().unwrap();
        assert_eq!(config.logging.format, LogFormat::Compact);
    }

    #[test]
    fn test_missing_file() {
        let err = ConfigLoader::new()
            .with_file("/definitely/not/here/trips.toml")
            .unwrap_err();
        assert!(matches!(err, ConfigError::FileNotFound { .. }));
    }

    #[test]
    fn test_optional_missing_file() {
        let config = ConfigLoader::new()
            .with_optional_file("/definitely/not/here/trips.toml")
            .unwrap()
            .load()
            .unwrap();
        assert_eq!(config, TripsConfig::default());
    }

    #[test]
    fn test_unsupported_extension() {
        let file = temp_file(".yaml", "server: {}");
        let err = ConfigLoader::new().with_file(file.path()).unwrap_err();
        assert!(matches!(err, ConfigError::UnsupportedFormat(_)));
    }

    #[test]
    fn test_unknown_field_rejected() {
        let err = ConfigLoader::new()
            .with_string("[server]\nport = 8080", "toml")
            .unwrap_err();
        assert!(matches!(err, ConfigError::Toml(_)));
    }

    #[test]
    fn test_invalid_values_fail_validation() {
        let err = ConfigLoader::new()
            .with_string(r#"{"server": {"http_addr": "localhost"}}"#, "json")
            .unwrap()
            .load()
            .unwrap_err();
        assert!(matches!(err, ConfigError::InvalidValue { .. }));
    }

    #[test]
    fn test_env_overrides() {
        env::set_var("TRIPS_LOADER_A__SERVER__HTTP_ADDR", "127.0.0.1:7000");
        env::set_var("TRIPS_LOADER_A__RATE_LIMIT__ENABLED", "off");
        env::set_var("TRIPS_LOADER_A__SERVER__MAX_CONNECTIONS", "64");
        env::set_var("TRIPS_LOADER_A__LOGGING__FORMAT", "pretty");

        let config = ConfigLoader::new()
            .with_env_prefix("trips_loader_a")
            .load()
            .unwrap();

        assert_eq!(config.server.http_addr, "127.0.0.1:7000");
        assert!(!config.rate_limit.enabled);
        assert_eq!(config.server.max_connections, Some(64));
        assert_eq!(config.logging.format, LogFormat::Pretty);
    }

    #[test]
    fn test_env_override_bad_integer() {
        env::set_var("TRIPS_LOADER_B__RATE_LIMIT__REQUESTS", "lots");

        let err = ConfigLoader::new()
            .with_env_prefix("TRIPS_LOADER_B")
            .load()
            .unwrap_err();
        assert!(err.to_string().contains("TRIPS_LOADER_B__RATE_LIMIT__REQUESTS"));
    }

    #[test]
    fn test_env_override_unknown_key() {
        env::set_var("TRIPS_LOADER_C__SERVER__PORT", "80");

        let err = ConfigLoader::new()
            .with_env_prefix("TRIPS_LOADER_C")
            .load()
            .unwrap_err();
        assert!(matches!(err, ConfigError::EnvParse { .. }));
    }

    #[test]
    fn test_env_applies_after_file() {
        env::set_var("TRIPS_LOADER_D__SERVICE__NAME", "trips-canary");

        let config = ConfigLoader::new()
            .with_string("[service]\nname = \"trips-file\"", "toml")
            .unwrap()
            .with_env_prefix("TRIPS_LOADER_D")
            .load()
            .unwrap();
        assert_eq!(config.service.name, "trips-canary");
    }

    #[test]
    fn test_parse_flag() {
        assert!(parse_flag("K", "Yes").unwrap());
        assert!(!parse_flag("K", "0").unwrap());
        assert!(parse_flag("K", "maybe").is_err());
    }
}
