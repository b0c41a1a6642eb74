//! Runtime configuration.
//!
//! Everything is read from environment variables at startup, each with a
//! default that matches a local run against `db.sqlite3`.

use std::path::{Path, PathBuf};
use std::str::FromStr;

use crate::enrich::EnrichConfig;
use crate::mapbox::{DEFAULT_BASE_URL, MapboxConfig};
use crate::store::{AddressQuery, DatabaseConfig};

/// Errors while assembling the runtime configuration.
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    /// An environment variable has a value that does not parse
    #[error("invalid value {value:?} for {var}: {reason}")]
    InvalidVar {
        var: &'static str,
        value: String,
        reason: String,
    },

    /// The API key file could not be read
    #[error("failed to read API key from {}: {source}", path.display())]
    KeyFile {
        path: PathBuf,
        source: std::io::Error,
    },

    /// The API key file exists but holds no key
    #[error("API key file {} is empty", path.display())]
    EmptyKey { path: PathBuf },
}

/// Settings for one run of the enricher.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AppConfig {
    /// SQLite database holding stops, addresses and routes.
    pub database_path: String,
    /// Pooled SQLite connections.
    pub database_connections: u32,
    /// File containing the Mapbox access token.
    pub api_key_file: PathBuf,
    /// Nearest stops routed per address.
    pub stops_per_address: usize,
    /// Concurrent routing queries per address.
    pub max_in_flight: usize,
    /// Skip addresses that already have routes.
    pub resume: bool,
    /// Address rows fetched per query.
    pub page_size: u32,
    /// Mapbox API base URL.
    pub mapbox_base_url: String,
    /// Mapbox request timeout in seconds.
    pub timeout_secs: u64,
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            database_path: "db.sqlite3".to_string(),
            database_connections: 4,
            api_key_file: PathBuf::from("api_key.txt"),
            stops_per_address: 5,
            max_in_flight: 1,
            resume: false,
            page_size: 500,
            mapbox_base_url: DEFAULT_BASE_URL.to_string(),
            timeout_secs: 30,
        }
    }
}

impl AppConfig {
    /// Read the configuration from the process environment.
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|var| std::env::var(var).ok())
    }

    /// Read the configuration through `lookup`, falling back to defaults
    /// for unset variables.
    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Result<Self, ConfigError> {
        let defaults = Self::default();

        Ok(Self {
            database_path: lookup("ENRICH_DB").unwrap_or(defaults.database_path),
            database_connections: nonzero(
                "ENRICH_DB_CONNECTIONS",
                parse_var(&lookup, "ENRICH_DB_CONNECTIONS", defaults.database_connections)?,
            )?,
            api_key_file: lookup("MAPBOX_API_KEY_FILE")
                .map(PathBuf::from)
                .unwrap_or(defaults.api_key_file),
            stops_per_address: parse_var(
                &lookup,
                "ENRICH_STOPS_PER_ADDRESS",
                defaults.stops_per_address,
            )?,
            max_in_flight: parse_var(&lookup, "ENRICH_MAX_IN_FLIGHT", defaults.max_in_flight)?,
            resume: parse_var(&lookup, "ENRICH_RESUME", defaults.resume)?,
            page_size: nonzero(
                "ENRICH_PAGE_SIZE",
                parse_var(&lookup, "ENRICH_PAGE_SIZE", defaults.page_size)?,
            )?,
            mapbox_base_url: lookup("MAPBOX_BASE_URL").unwrap_or(defaults.mapbox_base_url),
            timeout_secs: nonzero(
                "MAPBOX_TIMEOUT_SECS",
                parse_var(&lookup, "MAPBOX_TIMEOUT_SECS", defaults.timeout_secs)?,
            )?,
        })
    }

    pub fn database(&self) -> DatabaseConfig {
        DatabaseConfig::new(&self.database_path)
            .with_max_connections(self.database_connections)
    }

    pub fn enrich(&self) -> EnrichConfig {
        EnrichConfig::new(self.stops_per_address, self.max_in_flight)
    }

    pub fn address_query(&self) -> AddressQuery {
        AddressQuery::default()
            .with_page_size(self.page_size)
            .pending_only(self.resume)
    }

    /// Build the Mapbox client config with the given access token.
    pub fn mapbox(&self, access_token: String) -> MapboxConfig {
        MapboxConfig::new(access_token)
            .with_base_url(&self.mapbox_base_url)
            .with_max_concurrent(self.max_in_flight.max(1))
            .with_timeout(self.timeout_secs)
    }
}

fn parse_var<T>(
    lookup: &impl Fn(&str) -> Option<String>,
    var: &'static str,
    default: T,
) -> Result<T, ConfigError>
where
    T: FromStr,
    T::Err: std::fmt::Display,
{
    match lookup(var) {
        None => Ok(default),
        Some(value) => value.trim().parse().map_err(|e: T::Err| ConfigError::InvalidVar {
            var,
            reason: e.to_string(),
            value,
        }),
    }
}

/// Reject a zero value for `var`.
fn nonzero<T>(var: &'static str, value: T) -> Result<T, ConfigError>
where
    T: Default + PartialEq + ToString,
{
    if value == T::default() {
        return Err(ConfigError::InvalidVar {
            var,
            value: value.to_string(),
            reason: "must be at least 1".to_string(),
        });
    }
    Ok(value)
}

/// Read an API key from a text file, trimming surrounding whitespace.
pub fn load_api_key(path: impl AsRef<Path>) -> Result<String, ConfigError> {
    let path = path.as_ref();
    let contents = std::fs::read_to_string(path).map_err(|source| ConfigError::KeyFile {
        path: path.to_path_buf(),
        source,
    })?;

    let key = contents.trim();
    if key.is_empty() {
        return Err(ConfigError::EmptyKey {
            path: path.to_path_buf(),
        });
    }

    Ok(key.to_string())
}
