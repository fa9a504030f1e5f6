//! # Trips
//!
//! Resolves the origin and final destination of a trip from its unordered
//! flight legs, served as `POST /calculate`.
//!
//! The resolver itself lives in [`trips_core`]; this crate adds the HTTP
//! endpoint ([`api`]), the service assembly ([`service`]) and the `trips`
//! binary.
//!
//! ## Example
//!
//! ```rust,ignore
//! use trips::{build_server, TripsConfig};
//!
//! let server = build_server(&TripsConfig::default());
//! server.run().await?;
//! ```

#![doc(html_root_url = "https://docs.rs/trips/0.1.0")]
#![warn(missing_docs)]
#![forbid(unsafe_code)]

pub mod api;
pub mod service;

pub use api::{CalculateRequest, CalculateResponse, CALCULATE_OPERATION, CALCULATE_PATH};
pub use service::{build_server, pipeline};
pub use trips_config::TripsConfig;

// Re-export the workspace crates
pub use trips_config as config;
pub use trips_core as core;
pub use trips_middleware as middleware;
pub use trips_server as server;
pub use trips_telemetry as telemetry;

/// Crate version.
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
