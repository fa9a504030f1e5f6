//! # Trips Core
//!
//! Core types for the trips service.
//!
//! This crate provides the foundational pieces used by every other crate:
//!
//! - [`resolve`] - Finds the origin and final destination of a trip
//! - [`OccurrenceCounts`] - Per-airport occurrence tally used by the resolver
//! - [`Airport`], [`Flight`], [`TripEndpoints`] - Itinerary value types
//! - [`TripError`] / [`ServiceError`] - Domain and transport error types
//! - [`RequestId`] - UUID v7 request identifier
//!
//! ## Example
//!
//! ```
//! use trips_core::{resolve, Flight};
//!
//! let flights = vec![Flight::new("ATL", "EWR"), Flight::new("SFO", "ATL")];
//! let trip = resolve(&flights).unwrap();
//!
//! assert_eq!(trip.origin.as_str(), "SFO");
//! assert_eq!(trip.destination.as_str(), "EWR");
//! ```

#![doc(html_root_url = "https://docs.rs/trips-core/0.1.0")]
#![warn(missing_docs)]
#![forbid(unsafe_code)]

mod context;
mod error;
mod itinerary;
pub mod resolver;

pub use context::RequestId;
pub use error::{
    ErrorCategory, ErrorDetail, ErrorEnvelope, Malformation, ServiceError, ServiceResult,
    TripError,
};
pub use itinerary::{Airport, Flight, TripEndpoints};
pub use resolver::{resolve, OccurrenceCounts};
