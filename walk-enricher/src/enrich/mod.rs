//! Address-to-stop enrichment.
//!
//! For every address from the source, the driver shortlists the nearest
//! stops by straight-line distance, asks the routing service for the real
//! walking distance and time to each, and writes one record per successful
//! answer. Routing failures are isolated to the candidate they belong to.

mod config;
mod driver;
mod error;

pub use config::EnrichConfig;
pub use driver::{Enricher, RouteSink, RoutingService, RunReport};
pub use error::EnrichError;
