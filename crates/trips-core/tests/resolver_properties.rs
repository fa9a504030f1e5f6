//! Property tests for trip endpoint resolution.

use proptest::prelude::*;
use trips_core::{resolve, Airport, Flight, Malformation, OccurrenceCounts, TripError};

/// Builds the chain `A0 -> A1 -> ... -> An`.
fn chain(len: usize) -> Vec<Flight> {
    (0..len)
        .map(|i| Flight::new(format!("A{i}"), format!("A{}", i + 1)))
        .collect()
}

fn shuffled_chain() -> impl Strategy<Value = (usize, Vec<Flight>)> {
    (1usize..=200).prop_flat_map(|len| (Just(len), Just(chain(len)).prop_shuffle()))
}

proptest! {
    #[test]
    fn resolves_chain_endpoints_in_any_order((len, flights) in shuffled_chain()) {
        let trip = resolve(&flights).unwrap();
        prop_assert_eq!(trip.origin, Airport::new("A0"));
        prop_assert_eq!(trip.destination, Airport::new(format!("A{len}")));
    }

    #[test]
    fn result_does_not_depend_on_order((len, flights) in shuffled_chain()) {
        let ordered = chain(len);
        prop_assert_eq!(resolve(&flights).unwrap(), resolve(&ordered).unwrap());
    }

    #[test]
    fn exactly_two_airports_occur_once((len, flights) in shuffled_chain()) {
        let counts = OccurrenceCounts::tally(&flights);

        prop_assert_eq!(counts.len(), len + 1);
        prop_assert_eq!(counts.endpoints().len(), 2);
        for (airport, count) in counts.iter() {
            let is_end = airport.as_str() == "A0" || *airport == Airport::new(format!("A{len}"));
            prop_assert_eq!(count, if is_end { 1 } else { 2 });
        }
    }

    #[test]
    fn closing_a_chain_into_a_cycle_is_malformed((len, mut flights) in shuffled_chain()) {
        flights.push(Flight::new(format!("A{len}"), "A0"));
        prop_assert_eq!(
            resolve(&flights),
            Err(TripError::Malformed(Malformation::EndpointCount(0)))
        );
    }

    #[test]
    fn single_flight_resolves_to_itself(
        source in "[A-Z]{3}",
        destination in "[A-Z]{3}",
    ) {
        prop_assume!(source != destination);
        let trip = resolve(&[Flight::new(source.as_str(), destination.as_str())]).unwrap();
        prop_assert_eq!(trip.origin.as_str(), source.as_str());
        prop_assert_eq!(trip.destination.as_str(), destination.as_str());
    }
}

#[test]
fn empty_trip_is_rejected() {
    assert_eq!(resolve(&[]), Err(TripError::Empty));
}
