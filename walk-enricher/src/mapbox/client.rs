//! Mapbox Directions HTTP client.
//!
//! Resolves walking distance and time between two coordinates using the
//! `mapbox/walking` routing profile. Concurrent requests are bounded by a
//! semaphore so a wide driver batch cannot exceed the account's rate limit.

use std::fmt;
use std::sync::Arc;
use std::time::Duration;

use tokio::sync::Semaphore;
use tracing::debug;

use crate::domain::{Address, Coordinate, Stop, WalkingRoute};
use crate::enrich::RoutingService;

use super::error::MapboxError;
use super::types::{DirectionsResponse, ErrorBody};

/// Default base URL for the Mapbox API.
pub const DEFAULT_BASE_URL: &str = "https://api.mapbox.com";

/// Default maximum concurrent requests.
const DEFAULT_MAX_CONCURRENT: usize = 5;

/// Default request timeout in seconds.
const DEFAULT_TIMEOUT_SECS: u64 = 30;

/// Routing profile used for every query.
const PROFILE: &str = "mapbox/walking";

/// Configuration for the Mapbox client.
#[derive(Clone)]
pub struct MapboxConfig {
    /// Access token sent as the `access_token` query parameter
    pub access_token: String,
    /// Base URL for the API (defaults to production Mapbox)
    pub base_url: String,
    /// Maximum concurrent requests
    pub max_concurrent: usize,
    /// Request timeout in seconds
    pub timeout_secs: u64,
}

impl MapboxConfig {
    /// Create a new config with the given access token.
    pub fn new(access_token: impl Into<String>) -> Self {
        Self {
            access_token: access_token.into(),
            base_url: DEFAULT_BASE_URL.to_string(),
            max_concurrent: DEFAULT_MAX_CONCURRENT,
            timeout_secs: DEFAULT_TIMEOUT_SECS,
        }
    }

    /// Set a custom base URL (for testing).
    pub fn with_base_url(mut self, url: impl Into<String>) -> Self {
        self.base_url = url.into();
        self
    }

    /// Set maximum concurrent requests.
    pub fn with_max_concurrent(mut self, n: usize) -> Self {
        self.max_concurrent = n;
        self
    }

    /// Set request timeout.
    pub fn with_timeout(mut self, secs: u64) -> Self {
        self.timeout_secs = secs;
        self
    }
}

impl fmt::Debug for MapboxConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("MapboxConfig")
            .field("access_token", &"<redacted>")
            .field("base_url", &self.base_url)
            .field("max_concurrent", &self.max_concurrent)
            .field("timeout_secs", &self.timeout_secs)
            .finish()
    }
}

/// Mapbox Directions API client.
#[derive(Clone)]
pub struct MapboxClient {
    http: reqwest::Client,
    base_url: String,
    access_token: String,
    semaphore: Arc<Semaphore>,
}

impl MapboxClient {
    /// Create a new Mapbox client with the given configuration.
    pub fn new(config: MapboxConfig) -> Result<Self, MapboxError> {
        if config.access_token.trim().is_empty() {
            return Err(MapboxError::InvalidConfig(
                "access token is empty".to_string(),
            ));
        }
        if config.max_concurrent == 0 {
            return Err(MapboxError::InvalidConfig(
                "max_concurrent must be at least 1".to_string(),
            ));
        }

        let http = reqwest::Client::builder()
            .timeout(Duration::from_secs(config.timeout_secs))
            .build()?;

        Ok(Self {
            http,
            base_url: config.base_url.trim_end_matches('/').to_string(),
            access_token: config.access_token,
            semaphore: Arc::new(Semaphore::new(config.max_concurrent)),
        })
    }

    /// Get the walking route from `origin` to `destination`.
    ///
    /// Returns the first (recommended) route's distance in meters and
    /// duration in seconds.
    pub async fn directions(
        &self,
        origin: Coordinate,
        destination: Coordinate,
    ) -> Result<WalkingRoute, MapboxError> {
        let _permit = self
            .semaphore
            .acquire()
            .await
            .map_err(|_| MapboxError::Api {
                status: 0,
                message: "Semaphore closed".to_string(),
            })?;

        let url = self.directions_url(origin, destination);

        let response = self
            .http
            .get(&url)
            .query(&[
                ("access_token", self.access_token.as_str()),
                ("overview", "false"),
                ("alternatives", "false"),
            ])
            .send()
            .await?;

        let status = response.status();

        if status == reqwest::StatusCode::UNAUTHORIZED || status == reqwest::StatusCode::FORBIDDEN
        {
            return Err(MapboxError::Unauthorized);
        }

        if status == reqwest::StatusCode::TOO_MANY_REQUESTS {
            return Err(MapboxError::RateLimited);
        }

        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            // Mapbox wraps most errors as {"message": ...}; fall back to the raw body
            let message = serde_json::from_str::<ErrorBody>(&body)
                .map(|b| b.message)
                .unwrap_or(body);
            return Err(MapboxError::Api {
                status: status.as_u16(),
                message,
            });
        }

        let body = response.text().await?;

        let directions: DirectionsResponse =
            serde_json::from_str(&body).map_err(|e| MapboxError::Json {
                message: e.to_string(),
                body: Some(body.chars().take(500).collect()),
            })?;

        route_from_response(directions)
    }

    /// Build the request path: coordinates are `lon,lat` pairs joined by `;`.
    fn directions_url(&self, origin: Coordinate, destination: Coordinate) -> String {
        format!(
            "{}/directions/v5/{}/{},{};{},{}",
            self.base_url,
            PROFILE,
            origin.longitude(),
            origin.latitude(),
            destination.longitude(),
            destination.latitude()
        )
    }
}

impl fmt::Debug for MapboxClient {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("MapboxClient")
            .field("base_url", &self.base_url)
            .field("available_permits", &self.semaphore.available_permits())
            .finish_non_exhaustive()
    }
}

impl RoutingService for MapboxClient {
    type Error = MapboxError;

    async fn walking_route(
        &self,
        origin: &Address,
        destination: &Stop,
    ) -> Result<WalkingRoute, MapboxError> {
        debug!(address = %origin.id, stop = %destination.id, "querying walking route");
        self.directions(origin.location, destination.location).await
    }
}

/// Pick the recommended route out of a successful response.
fn route_from_response(response: DirectionsResponse) -> Result<WalkingRoute, MapboxError> {
    if response.code != "Ok" {
        return Err(MapboxError::NoRoute {
            code: response.code,
        });
    }

    response
        .routes
        .first()
        .map(|r| WalkingRoute::new(r.distance, r.duration))
        .ok_or(MapboxError::NoRoute {
            code: response.code,
        })
}
