use std::process::ExitCode;

use tracing::{error, info};
use tracing_subscriber::EnvFilter;

use walk_enricher::cache::{CacheConfig, CachedRoutingService};
use walk_enricher::config::{AppConfig, load_api_key};
use walk_enricher::enrich::Enricher;
use walk_enricher::mapbox::MapboxClient;
use walk_enricher::store::SqliteStore;

#[tokio::main]
async fn main() -> ExitCode {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .init();

    match run().await {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            error!(error = %e, "enrichment failed");
            ExitCode::FAILURE
        }
    }
}

async fn run() -> Result<(), Box<dyn std::error::Error>> {
    let config = AppConfig::from_env()?;
    info!(
        database = %config.database_path,
        stops_per_address = config.stops_per_address,
        max_in_flight = config.max_in_flight,
        resume = config.resume,
        "starting enrichment"
    );

    // Stops are loaded once and shared read-only for the whole run
    let store = SqliteStore::open(&config.database())?;
    let stops = store.all_stops().await?;
    info!(stops = stops.len(), "loaded stops");

    let api_key = load_api_key(&config.api_key_file)?;
    let client = MapboxClient::new(config.mapbox(api_key))?;
    let routing = CachedRoutingService::new(client, &CacheConfig::default());

    let enrich_config = config.enrich();
    let enricher = Enricher::new(&stops, &routing, &store, &enrich_config);
    let report = enricher.run(store.addresses(config.address_query())).await?;

    info!(
        addresses = report.addresses,
        routes_written = report.routes_written,
        failed_queries = report.failed_queries,
        cache_hits = routing.hits(),
        total_routes = store.route_count().await?,
        "finished"
    );

    Ok(())
}
