//! The `POST /calculate` endpoint.
//!
//! ```text
//! POST /calculate
//! {"data":{"flights":[["ATL","EWR"],["SFO","ATL"]]}}
//!
//! 200 OK
//! {"data":{"trip":["SFO","EWR"]}}
//! ```

use serde::{Deserialize, Serialize};
use trips_core::{resolve, Flight, ServiceError, TripEndpoints};
use trips_server::{HandlerContext, HandlerRegistry};

/// Path of the calculate endpoint.
pub const CALCULATE_PATH: &str = "/calculate";

/// Operation id of the calculate endpoint.
pub const CALCULATE_OPERATION: &str = "calculate";

/// Request body.
///
/// A missing `data` or `flights` field reads as an empty trip.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct CalculateRequest {
    /// Request payload.
    #[serde(default)]
    pub data: FlightsData,
}

/// The `data` object of a [`CalculateRequest`].
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct FlightsData {
    /// The legs of the trip, in any order.
    #[serde(default)]
    pub flights: Vec<Flight>,
}

/// Response body.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CalculateResponse {
    /// Response payload.
    pub data: TripData,
}

/// The `data` object of a [`CalculateResponse`].
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TripData {
    /// `[origin, destination]`.
    pub trip: TripEndpoints,
}

impl CalculateRequest {
    /// Wraps a list of flights.
    #[must_use]
    pub fn new(flights: Vec<Flight>) -> Self {
        Self {
            data: FlightsData { flights },
        }
    }
}

impl From<TripEndpoints> for CalculateResponse {
    fn from(trip: TripEndpoints) -> Self {
        Self {
            data: TripData { trip },
        }
    }
}

/// Resolves the origin and final destination of the submitted trip.
pub async fn calculate(
    ctx: HandlerContext,
    request: CalculateRequest,
) -> Result<CalculateResponse, ServiceError> {
    let flights = request.data.flights;

    match resolve(&flights) {
        Ok(trip) => {
            tracing::debug!(
                request_id = %ctx.request_id(),
                flights = flights.len(),
                origin = %trip.origin,
                destination = %trip.destination,
                "trip resolved"
            );
            Ok(trip.into())
        }
        Err(error) => {
            tracing::debug!(
                request_id = %ctx.request_id(),
                flights = flights.len(),
                error = %error,
                "trip rejected"
            );
            Err(error.into())
        }
    }
}

/// Registers the calculate handler.
pub fn register(handlers: &mut HandlerRegistry) {
    handlers.register(CALCULATE_OPERATION, calculate);
}
