//! Enrichment driver.
//!
//! Pulls addresses one at a time, shortlists the nearest stops for each,
//! resolves real walking routes for the shortlist and persists every
//! successful result.

use std::fmt;
use std::pin::pin;

use futures::future::join_all;
use futures::{Stream, StreamExt};
use tracing::{debug, error, info, warn};

use crate::domain::{Address, RouteRecord, Stop, StopSet, WalkingRoute};
use crate::selector::select_closest;
use crate::store::StoreError;

use super::config::EnrichConfig;
use super::error::EnrichError;

/// Trait for resolving walking routes.
///
/// This abstraction allows the driver to be tested without network access,
/// and lets wrappers such as the routing cache sit in front of the client.
pub trait RoutingService {
    /// Error for a single failed query. The driver only logs it.
    type Error: fmt::Display;

    /// Get walking distance and time from `origin` to `destination`.
    async fn walking_route(
        &self,
        origin: &Address,
        destination: &Stop,
    ) -> Result<WalkingRoute, Self::Error>;
}

/// Trait for persisting route records.
pub trait RouteSink {
    /// Append one record.
    async fn add_route(&self, record: &RouteRecord) -> Result<(), StoreError>;
}

/// Counters describing a finished run.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct RunReport {
    /// Addresses pulled from the source and processed.
    pub addresses: usize,

    /// Address rows that could not be turned into an address.
    pub skipped_addresses: usize,

    /// Routing queries issued.
    pub queries: usize,

    /// Records written to the sink.
    pub routes_written: usize,

    /// Routing queries that failed and were skipped.
    pub failed_queries: usize,
}

/// Address-to-stop enrichment driver.
pub struct Enricher<'a, R: RoutingService, K: RouteSink> {
    stops: &'a StopSet,
    routing: &'a R,
    sink: &'a K,
    config: &'a EnrichConfig,
}

impl<'a, R: RoutingService, K: RouteSink> Enricher<'a, R, K> {
    /// Create a new driver.
    pub fn new(
        stops: &'a StopSet,
        routing: &'a R,
        sink: &'a K,
        config: &'a EnrichConfig,
    ) -> Self {
        Self {
            stops,
            routing,
            sink,
            config,
        }
    }

    /// Process every address from `addresses`.
    ///
    /// The stream is consumed exactly once. A failed routing query is logged
    /// and skipped; a failed write aborts the run.
    pub async fn run<S>(&self, addresses: S) -> Result<RunReport, EnrichError>
    where
        S: Stream<Item = Result<Address, StoreError>>,
    {
        self.config.validate().map_err(EnrichError::InvalidConfig)?;

        if self.stops.is_empty() {
            return Err(EnrichError::NoStops);
        }

        let mut report = RunReport::default();
        let mut addresses = pin!(addresses);

        while let Some(item) = addresses.next().await {
            let address = match item {
                Ok(address) => address,
                Err(e) if e.is_row_error() => {
                    warn!(error = %e, "skipping unreadable address");
                    report.skipped_addresses += 1;
                    continue;
                }
                Err(e) => {
                    error!(error = %e, "address source failed");
                    return Err(EnrichError::Source(e));
                }
            };

            report.addresses += 1;
            self.resolve(&address, &mut report).await?;
        }

        info!(
            addresses = report.addresses,
            skipped = report.skipped_addresses,
            queries = report.queries,
            written = report.routes_written,
            failed = report.failed_queries,
            "enrichment run complete"
        );

        Ok(report)
    }

    /// Query and persist routes for one address's candidates.
    ///
    /// Candidates are issued nearest-first in batches of `max_in_flight`;
    /// results within a batch are written in candidate order.
    async fn resolve(&self, address: &Address, report: &mut RunReport) -> Result<(), EnrichError> {
        let candidates = select_closest(
            address,
            self.stops.as_slice(),
            self.config.stops_per_address,
        );

        debug!(
            address = %address.id,
            candidates = candidates.len(),
            "resolving candidates"
        );

        for batch in candidates.chunks(self.config.max_in_flight) {
            let queries: Vec<_> = batch
                .iter()
                .map(|stop| async move {
                    let result = self.routing.walking_route(address, stop).await;
                    (stop, result)
                })
                .collect();

            let results = join_all(queries).await;

            for (stop, result) in results {
                report.queries += 1;

                let route = match result {
                    Ok(route) => route,
                    Err(e) => {
                        warn!(
                            address = %address.id,
                            stop = %stop.id,
                            error = %e,
                            "routing query failed, skipping candidate"
                        );
                        report.failed_queries += 1;
                        continue;
                    }
                };

                let record = RouteRecord::new(address.id, stop.id, route);
                if let Err(source) = self.sink.add_route(&record).await {
                    error!(
                        address = %address.id,
                        stop = %stop.id,
                        error = %source,
                        "failed to persist route"
                    );
                    return Err(EnrichError::Persistence {
                        address: address.id,
                        stop: stop.id,
                        source,
                    });
                }
                report.routes_written += 1;
            }
        }

        Ok(())
    }
}
