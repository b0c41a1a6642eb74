//! Domain types for the walk enricher.
//!
//! Stops, addresses and the routes measured between them. Coordinates are
//! validated at construction time, so code that receives a `Coordinate`
//! can compare distances without guarding against NaN.

mod coordinate;
mod ids;
mod place;
mod route;

pub use coordinate::{Coordinate, InvalidCoordinate};
pub use ids::{AddressId, StopId};
pub use place::{Address, Stop, StopSet};
pub use route::{RouteRecord, WalkingRoute};
