//! Mapbox Directions client.
//!
//! Provides walking distance and duration between an address and a stop
//! through the Mapbox Directions API (`mapbox/walking` profile).
//!
//! Key characteristics of the API:
//! - Coordinates are sent as `longitude,latitude`, the reverse of how the
//!   rest of this crate orders them
//! - A 200 response can still carry an error `code` such as `NoRoute`
//! - Distances are meters, durations are seconds

mod client;
mod error;
mod types;

pub use client::{DEFAULT_BASE_URL, MapboxClient, MapboxConfig};
pub use error::MapboxError;
pub use types::{DirectionsResponse, DirectionsRoute};
