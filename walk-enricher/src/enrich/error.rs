//! Run-level errors.
//!
//! Only these abort a run. Routing failures for a single candidate and
//! unreadable address rows are isolated by the driver and never surface here.

use crate::domain::{AddressId, StopId};
use crate::store::StoreError;

/// Error that stops an enrichment run.
#[derive(Debug, thiserror::Error)]
pub enum EnrichError {
    /// No stops were loaded, so no address can be matched
    #[error("stop set is empty: nothing to match addresses against")]
    NoStops,

    /// Driver configuration cannot make progress
    #[error("invalid enrichment config: {0}")]
    InvalidConfig(&'static str),

    /// The address source itself failed (not a single bad row)
    #[error("address source failed: {0}")]
    Source(#[source] StoreError),

    /// A route could not be written
    #[error("failed to persist route {address} -> {stop}: {source}")]
    Persistence {
        address: AddressId,
        stop: StopId,
        #[source]
        source: StoreError,
    },
}
