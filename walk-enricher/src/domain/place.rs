//! Stops and addresses: the two kinds of located entity the enricher pairs up.

use std::sync::Arc;

use super::coordinate::Coordinate;
use super::ids::{AddressId, StopId};

/// A transit stop with a fixed location.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Stop {
    pub id: StopId,
    pub location: Coordinate,
}

impl Stop {
    pub fn new(id: StopId, location: Coordinate) -> Self {
        Self { id, location }
    }
}

/// An address that needs walking access to nearby stops.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Address {
    pub id: AddressId,
    pub location: Coordinate,
}

impl Address {
    pub fn new(id: AddressId, location: Coordinate) -> Self {
        Self { id, location }
    }
}

/// The full, immutable set of stops for a run.
///
/// Built once at startup and shared by reference (or cheap clone) between
/// the candidate selector and the enrichment driver. There is no way to
/// mutate it after construction.
#[derive(Debug, Clone, Default)]
pub struct StopSet {
    stops: Arc<[Stop]>,
}

impl StopSet {
    /// Create a stop set, preserving the given order.
    ///
    /// Order matters only for tie-breaking: equidistant stops are returned
    /// in the order they appear here.
    pub fn new(stops: Vec<Stop>) -> Self {
        Self {
            stops: stops.into(),
        }
    }

    pub fn as_slice(&self) -> &[Stop] {
        &self.stops
    }

    pub fn len(&self) -> usize {
        self.stops.len()
    }

    pub fn is_empty(&self) -> bool {
        self.stops.is_empty()
    }
}

impl FromIterator<Stop> for StopSet {
    fn from_iter<I: IntoIterator<Item = Stop>>(iter: I) -> Self {
        Self {
            stops: iter.into_iter().collect(),
        }
    }
}
