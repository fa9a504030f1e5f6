//! Itinerary value types.
//!
//! Airports are opaque, case-sensitive codes. A [`Flight`] is one directed
//! leg and travels on the wire as a two-element array `[source, destination]`.
//! [`TripEndpoints`] uses the same array shape: `[origin, destination]`.

use serde::{Deserialize, Serialize};
use std::fmt;

/// An airport code such as `SFO`.
///
/// Codes are compared by exact string equality; no normalization or format
/// validation is applied.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Airport(String);

impl Airport {
    /// Creates an airport from its code.
    #[must_use]
    pub fn new(code: impl Into<String>) -> Self {
        Self(code.into())
    }

    /// Returns the airport code.
    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for Airport {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<&str> for Airport {
    fn from(code: &str) -> Self {
        Self(code.to_string())
    }
}

impl From<String> for Airport {
    fn from(code: String) -> Self {
        Self(code)
    }
}

/// One directed leg of a trip.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(from = "(Airport, Airport)", into = "(Airport, Airport)")]
pub struct Flight {
    /// Departure airport.
    pub source: Airport,
    /// Arrival airport.
    pub destination: Airport,
}

impl Flight {
    /// Creates a flight from `source` to `destination`.
    #[must_use]
    pub fn new(source: impl Into<Airport>, destination: impl Into<Airport>) -> Self {
        Self {
            source: source.into(),
            destination: destination.into(),
        }
    }
}

impl From<(Airport, Airport)> for Flight {
    fn from((source, destination): (Airport, Airport)) -> Self {
        Self {
            source,
            destination,
        }
    }
}

impl From<Flight> for (Airport, Airport) {
    fn from(flight: Flight) -> Self {
        (flight.source, flight.destination)
    }
}

impl fmt::Display for Flight {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} -> {}", self.source, self.destination)
    }
}

/// The first and last airports of a trip.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(from = "(Airport, Airport)", into = "(Airport, Airport)")]
pub struct TripEndpoints {
    /// The airport the trip starts from. It is never a destination.
    pub origin: Airport,
    /// The airport the trip ends at. It is never a source.
    pub destination: Airport,
}

impl TripEndpoints {
    /// Creates a new endpoint pair.
    #[must_use]
    pub fn new(origin: impl Into<Airport>, destination: impl Into<Airport>) -> Self {
        Self {
            origin: origin.into(),
            destination: destination.into(),
        }
    }
}

impl From<(Airport, Airport)> for TripEndpoints {
    fn from((origin, destination): (Airport, Airport)) -> Self {
        Self {
            origin,
            destination,
        }
    }
}

impl From<TripEndpoints> for (Airport, Airport) {
    fn from(endpoints: TripEndpoints) -> Self {
        (endpoints.origin, endpoints.destination)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_airport_is_case_sensitive() {
        assert_ne!(Airport::from("sfo"), Airport::from("SFO"));
        assert_eq!(Airport::new("SFO").as_str(), "SFO");
    }

    #[test]
    fn test_flight_deserializes_from_pair() {
        let flight: Flight = serde_json::from_str(r#"["ATL","EWR"]"#).unwrap();
        assert_eq!(flight, Flight::new("ATL", "EWR"));
    }

    #[test]
    fn test_flight_rejects_wrong_arity() {
        assert!(serde_json::from_str::<Flight>(r#"["ATL"]"#).is_err());
        assert!(serde_json::from_str::<Flight>(r#"["ATL","EWR","SFO"]"#).is_err());
        assert!(serde_json::from_str::<Flight>(r#"{"source":"ATL"}"#).is_err());
    }

    #[test]
    fn test_flight_rejects_non_string_codes() {
        assert!(serde_json::from_str::<Flight>(r#"["ATL", 7]"#).is_err());
    }

    #[test]
    fn test_endpoints_serialize_as_array() {
        let endpoints = TripEndpoints::new("SFO", "EWR");
        let json = serde_json::to_string(&endpoints).unwrap();
        assert_eq!(json, r#"["SFO","EWR"]"#);
    }

    #[test]
    fn test_flight_display() {
        assert_eq!(Flight::new("SFO", "ATL").to_string(), "SFO -> ATL");
    }
}
