//! Walking route results and the records persisted for them.

use super::ids::{AddressId, StopId};

/// Walking distance and time between an address and a stop, as reported by
/// the routing service.
///
/// Values are taken verbatim from the service; they are never derived from
/// the straight-line approximation used for candidate selection.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct WalkingRoute {
    /// Walking distance in meters.
    pub distance_m: f64,
    /// Walking time in seconds.
    pub duration_s: f64,
}

impl WalkingRoute {
    pub fn new(distance_m: f64, duration_s: f64) -> Self {
        Self {
            distance_m,
            duration_s,
        }
    }
}

/// One persisted address-stop pair with its measured walking cost.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct RouteRecord {
    pub address_id: AddressId,
    pub stop_id: StopId,
    pub distance: f64,
    pub time: f64,
}

impl RouteRecord {
    pub fn new(address_id: AddressId, stop_id: StopId, route: WalkingRoute) -> Self {
        Self {
            address_id,
            stop_id,
            distance: route.distance_m,
            time: route.duration_s,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn record_copies_route_values() {
        let record = RouteRecord::new(
            AddressId::new(1),
            StopId::new(2),
            WalkingRoute::new(350.5, 260.0),
        );
        assert_eq!(record.address_id, AddressId::new(1));
        assert_eq!(record.stop_id, StopId::new(2));
        assert_eq!(record.distance, 350.5);
        assert_eq!(record.time, 260.0);
    }
}
