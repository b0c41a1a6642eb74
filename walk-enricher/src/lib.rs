//! Walking access enrichment for street addresses.
//!
//! For every address, shortlist the nearest transit stops by straight-line
//! distance, ask a routing service for the real walking distance and time
//! to each, and store one route record per address-stop pair.

pub mod cache;
pub mod config;
pub mod domain;
pub mod enrich;
pub mod mapbox;
pub mod selector;
pub mod store;
