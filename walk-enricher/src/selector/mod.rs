//! Candidate selection: the N stops nearest to an address.
//!
//! Selection uses the straight-line distance on raw degrees (see
//! [`Coordinate::planar_distance`]). It is a cheap filter that bounds how
//! many expensive routing queries are issued per address; the distances it
//! computes are never persisted.

use std::cmp::Ordering;

use crate::domain::{Address, Coordinate, Stop};

/// Return the `n` stops closest to `address`, nearest first.
///
/// The result has exactly `min(n, stops.len())` entries. Equidistant stops
/// keep their relative order from `stops`, so the output is deterministic
/// for a given input order. An empty `stops` or `n == 0` yields an empty
/// result.
pub fn select_closest(address: &Address, stops: &[Stop], n: usize) -> Vec<Stop> {
    closest_to(&address.location, stops, n)
        .into_iter()
        .map(|idx| stops[idx])
        .collect()
}

/// Indices into `stops` of the `n` nearest to `origin`, nearest first.
fn closest_to(origin: &Coordinate, stops: &[Stop], n: usize) -> Vec<usize> {
    let n = n.min(stops.len());
    if n == 0 {
        return Vec::new();
    }

    let mut ranked: Vec<(f64, usize)> = stops
        .iter()
        .enumerate()
        .map(|(idx, stop)| (origin.planar_distance(&stop.location), idx))
        .collect();

    // (distance, index) is a total order with unique keys, so partial
    // selection followed by an unstable sort gives the same result as a
    // full stable sort.
    if n < ranked.len() {
        ranked.select_nth_unstable_by(n - 1, by_distance_then_index);
        ranked.truncate(n);
    }
    ranked.sort_unstable_by(by_distance_then_index);

    ranked.into_iter().map(|(_, idx)| idx).collect()
}

fn by_distance_then_index(a: &(f64, usize), b: &(f64, usize)) -> Ordering {
    a.0.total_cmp(&b.0).then(a.1.cmp(&b.1))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::{AddressId, StopId};

    fn coord(lat: f64, lon: f64) -> Coordinate {
        Coordinate::new(lat, lon).unwrap()
    }

    fn stop(id: i64, lat: f64, lon: f64) -> Stop {
        Stop::new(StopId::new(id), coord(lat, lon))
    }

    fn address(lat: f64, lon: f64) -> Address {
        Address::new(AddressId::new(1), coord(lat, lon))
    }

    fn ids(stops: &[Stop]) -> Vec<i64> {
        stops.iter().map(|s| s.id.get()).collect()
    }

    #[test]
    fn picks_nearest_two_of_three() {
        let stops = vec![stop(1, 0.0, 0.0), stop(2, 1.0, 1.0), stop(3, 10.0, 10.0)];
        let chosen = select_closest(&address(0.0, 0.1), &stops, 2);
        assert_eq!(ids(&chosen), vec![1, 2]);
    }

    #[test]
    fn orders_nearest_first_regardless_of_input_order() {
        let stops = vec![stop(3, 10.0, 10.0), stop(2, 1.0, 1.0), stop(1, 0.0, 0.0)];
        let chosen = select_closest(&address(0.0, 0.1), &stops, 3);
        assert_eq!(ids(&chosen), vec![1, 2, 3]);
    }

    #[test]
    fn n_larger_than_set_returns_all() {
        let stops = vec![stop(1, 5.0, 5.0), stop(2, 1.0, 1.0)];
        let chosen = select_closest(&address(0.0, 0.0), &stops, 10);
        assert_eq!(ids(&chosen), vec![2, 1]);
    }

    #[test]
    fn zero_n_is_empty() {
        let stops = vec![stop(1, 0.0, 0.0)];
        assert!(select_closest(&address(0.0, 0.0), &stops, 0).is_empty());
    }

    #[test]
    fn empty_stops_is_empty() {
        assert!(select_closest(&address(0.0, 0.0), &[], 5).is_empty());
    }

    #[test]
    fn ties_keep_input_order() {
        // All four are at distance 1 from the origin.
        let stops = vec![
            stop(40, 0.0, 1.0),
            stop(10, 1.0, 0.0),
            stop(30, 0.0, -1.0),
            stop(20, -1.0, 0.0),
        ];
        let chosen = select_closest(&address(0.0, 0.0), &stops, 3);
        assert_eq!(ids(&chosen), vec![40, 10, 30]);
    }

    #[test]
    fn tie_at_cutoff_prefers_earlier_stop() {
        let stops = vec![
            stop(1, 2.0, 0.0),
            stop(2, 0.5, 0.0),
            stop(3, 0.0, 2.0),
        ];
        let chosen = select_closest(&address(0.0, 0.0), &stops, 2);
        assert_eq!(ids(&chosen), vec![2, 1]);
    }

    #[test]
    fn repeated_calls_agree() {
        let stops: Vec<Stop> = (0..50)
            .map(|i| stop(i, (i % 7) as f64, (i % 5) as f64))
            .collect();
        let a = address(2.0, 2.0);
        assert_eq!(select_closest(&a, &stops, 8), select_closest(&a, &stops, 8));
    }
}
