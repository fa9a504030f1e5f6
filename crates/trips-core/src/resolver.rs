//! Trip endpoint resolution.
//!
//! Given the flights of one trip in any order, [`resolve`] finds the airport
//! the trip starts from and the airport it ends at. It makes a single pass
//! over the flights, counting how often each airport occurs and remembering
//! which airports were departed from.
//!
//! In a well-formed trip every intermediate airport occurs twice (once as an
//! arrival, once as a departure). The origin and the final destination occur
//! exactly once. The origin is the one of the two that was departed from.
//!
//! Anything that does not reduce to exactly two such airports, with exactly
//! one of them a departure, is reported as [`TripError::Malformed`]. The
//! resolver never picks an arbitrary pair.
//!
//! # Example
//!
//! ```
//! use trips_core::{resolve, Flight, TripEndpoints};
//!
//! let flights = [
//!     Flight::new("IND", "EWR"),
//!     Flight::new("SFO", "ATL"),
//!     Flight::new("GSO", "IND"),
//!     Flight::new("ATL", "GSO"),
//! ];
//!
//! assert_eq!(resolve(&flights).unwrap(), TripEndpoints::new("SFO", "EWR"));
//! ```

use crate::error::{Malformation, TripError};
use crate::itinerary::{Airport, Flight, TripEndpoints};
use std::collections::{HashMap, HashSet};

/// How often each airport occurs in a list of flights, and which airports
/// appear as a departure.
#[derive(Debug, Clone, Default)]
pub struct OccurrenceCounts<'a> {
    counts: HashMap<&'a Airport, usize>,
    sources: HashSet<&'a Airport>,
}

impl<'a> OccurrenceCounts<'a> {
    /// Tallies every airport in `flights`.
    #[must_use]
    pub fn tally(flights: &'a [Flight]) -> Self {
        let mut tally = Self {
            counts: HashMap::with_capacity(flights.len() + 1),
            sources: HashSet::with_capacity(flights.len()),
        };

        for flight in flights {
            *tally.counts.entry(&flight.source).or_insert(0) += 1;
            *tally.counts.entry(&flight.destination).or_insert(0) += 1;
            tally.sources.insert(&flight.source);
        }

        tally
    }

    /// Returns how many times `airport` occurs, as source or destination.
    #[must_use]
    pub fn count(&self, airport: &Airport) -> usize {
        self.counts.get(airport).copied().unwrap_or(0)
    }

    /// Returns true if `airport` is the source of at least one flight.
    #[must_use]
    pub fn is_source(&self, airport: &Airport) -> bool {
        self.sources.contains(airport)
    }

    /// Returns every airport that occurs exactly once, sorted by code.
    #[must_use]
    pub fn endpoints(&self) -> Vec<&'a Airport> {
        let mut ends: Vec<&'a Airport> = self
            .counts
            .iter()
            .filter(|(_, &count)| count == 1)
            .map(|(&airport, _)| airport)
            .collect();
        ends.sort_unstable();
        ends
    }

    /// Iterates over each distinct airport with its occurrence count.
    pub fn iter(&self) -> impl Iterator<Item = (&'a Airport, usize)> + '_ {
        self.counts.iter().map(|(&airport, &count)| (airport, count))
    }

    /// Returns the number of distinct airports.
    #[must_use]
    pub fn len(&self) -> usize {
        self.counts.len()
    }

    /// Returns true if no airports were tallied.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.counts.is_empty()
    }
}

/// Finds the origin and final destination of the trip described by `flights`.
///
/// The result does not depend on the order of `flights`.
///
/// # Errors
///
/// - [`TripError::Empty`] if `flights` is empty.
/// - [`TripError::Malformed`] if the flights do not have exactly two
///   endpoint airports, or if those two cannot be told apart as origin and
///   destination.
pub fn resolve(flights: &[Flight]) -> Result<TripEndpoints, TripError> {
    if flights.is_empty() {
        return Err(TripError::Empty);
    }

    let counts = OccurrenceCounts::tally(flights);
    let ends = counts.endpoints();

    let [first, second] = ends.as_slice() else {
        return Err(Malformation::EndpointCount(ends.len()).into());
    };

    match (counts.is_source(first), counts.is_source(second)) {
        (true, false) => Ok(TripEndpoints::new((*first).clone(), (*second).clone())),
        (false, true) => Ok(TripEndpoints::new((*second).clone(), (*first).clone())),
        (true, true) => Err(Malformation::NoDestination.into()),
        (false, false) => Err(Malformation::NoOrigin.into()),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn flights(pairs: &[(&str, &str)]) -> Vec<Flight> {
        pairs.iter().map(|&(s, d)| Flight::new(s, d)).collect()
    }

    #[test]
    fn test_single_flight() {
        let trip = resolve(&flights(&[("SFO", "EWR")])).unwrap();
        assert_eq!(trip, TripEndpoints::new("SFO", "EWR"));
    }

    #[test]
    fn test_two_flights_out_of_order() {
        let trip = resolve(&flights(&[("ATL", "EWR"), ("SFO", "ATL")])).unwrap();
        assert_eq!(trip, TripEndpoints::new("SFO", "EWR"));
    }

    #[test]
    fn test_known_itineraries() {
        let cases: &[&[(&str, &str)]] = &[
            &[("SFO", "ATL"), ("ATL", "EWR")],
            &[("SFO", "ATL"), ("ATL", "GSO"), ("GSO", "EWR")],
            &[("GSO", "EWR"), ("ATL", "GSO"), ("SFO", "ATL")],
            &[("GSO", "EWR"), ("SFO", "ATL"), ("ATL", "GSO")],
            &[("IND", "EWR"), ("SFO", "ATL"), ("GSO", "IND"), ("ATL", "GSO")],
        ];

        for case in cases {
            let trip = resolve(&flights(case)).unwrap();
            assert_eq!(trip, TripEndpoints::new("SFO", "EWR"), "case {case:?}");
        }
    }

    #[test]
    fn test_empty_trip() {
        assert_eq!(resolve(&[]), Err(TripError::Empty));
    }

    #[test]
    fn test_two_cycle_is_malformed() {
        let err = resolve(&flights(&[("A", "B"), ("B", "A")])).unwrap_err();
        assert_eq!(err, TripError::Malformed(Malformation::EndpointCount(0)));
    }

    #[test]
    fn test_disjoint_trips_are_malformed() {
        let err = resolve(&flights(&[("A", "B"), ("C", "D")])).unwrap_err();
        assert_eq!(err, TripError::Malformed(Malformation::EndpointCount(4)));
    }

    #[test]
    fn test_duplicate_leg_is_malformed() {
        let err = resolve(&flights(&[("A", "B"), ("A", "B"), ("B", "C")])).unwrap_err();
        assert_eq!(err, TripError::Malformed(Malformation::EndpointCount(1)));
    }

    #[test]
    fn test_converging_flights_have_no_destination() {
        // A and C both fly into B: both endpoints are departures.
        let err = resolve(&flights(&[("A", "B"), ("C", "B")])).unwrap_err();
        assert_eq!(err, TripError::Malformed(Malformation::NoDestination));
    }

    #[test]
    fn test_diverging_flights_have_no_origin() {
        let err = resolve(&flights(&[("B", "A"), ("B", "C")])).unwrap_err();
        assert_eq!(err, TripError::Malformed(Malformation::NoOrigin));
    }

    #[test]
    fn test_self_loop_only_is_malformed() {
        let err = resolve(&flights(&[("A", "A")])).unwrap_err();
        assert_eq!(err, TripError::Malformed(Malformation::EndpointCount(0)));
    }

    #[test]
    fn test_occurrence_counts() {
        let legs = flights(&[("ATL", "EWR"), ("SFO", "ATL")]);
        let counts = OccurrenceCounts::tally(&legs);

        assert_eq!(counts.len(), 3);
        assert_eq!(counts.count(&Airport::from("ATL")), 2);
        assert_eq!(counts.count(&Airport::from("SFO")), 1);
        assert_eq!(counts.count(&Airport::from("EWR")), 1);
        assert_eq!(counts.count(&Airport::from("JFK")), 0);

        assert!(counts.is_source(&Airport::from("SFO")));
        assert!(counts.is_source(&Airport::from("ATL")));
        assert!(!counts.is_source(&Airport::from("EWR")));

        let ends: Vec<&str> = counts.endpoints().iter().map(|a| a.as_str()).collect();
        assert_eq!(ends, vec!["EWR", "SFO"]);
    }

    #[test]
    fn test_occurrence_counts_empty() {
        let counts = OccurrenceCounts::tally(&[]);
        assert!(counts.is_empty());
        assert!(counts.endpoints().is_empty());
    }
}
