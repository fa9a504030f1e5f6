//! Typed configuration for the trips service.
//!
//! Configuration is layered: built-in defaults, then an optional TOML or JSON
//! file, then `TRIPS__SECTION__KEY` environment variables (optionally read
//! from a `.env` file). Unknown fields are rejected.
//!
//! # Example
//!
//! ```no_run
//! use trips_config::ConfigLoader;
//!
//! # fn main() -> Result<(), trips_config::ConfigError> {
//! let config = ConfigLoader::new()
//!     .with_defaults()
//!     .with_optional_file("trips.toml")?
//!     .with_dotenv()
//!     .with_env_prefix("TRIPS")
//!     .load()?;
//!
//! println!("listening on {}", config.server.http_addr);
//! # Ok(())
//! # }
//! ```
//!
//! # File format
//!
//! ```toml
//! [server]
//! http_addr = "0.0.0.0:8080"
//! request_timeout_ms = 10000
//! shutdown_timeout_secs = 30
//! max_body_bytes = 1048576
//!
//! [rate_limit]
//! enabled = true
//! requests = 100
//! window_ms = 1000
//!
//! [logging]
//! level = "info"
//! format = "json"
//!
//! [service]
//! name = "trips"
//! ```

#![doc(html_root_url = "https://docs.rs/trips-config/0.1.0")]
#![warn(missing_docs)]
#![forbid(unsafe_code)]

mod config;
mod error;
mod loader;
mod schema;

pub use config::TripsConfig;
pub use error::ConfigError;
pub use loader::ConfigLoader;
pub use schema::{LoggingSettings, RateLimitSettings, ServerSettings, ServiceSettings};
pub use trips_telemetry::LogFormat;
