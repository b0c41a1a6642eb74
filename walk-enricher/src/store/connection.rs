//! Database connection management.
//!
//! SQLite connection pooling via r2d2, plus the schema the enricher reads
//! and writes.

use std::path::Path;

use r2d2::Pool;
use r2d2_sqlite::SqliteConnectionManager;
use rusqlite::Connection;
use tracing::{debug, info};

use super::error::StoreError;

/// Path that selects an in-memory database.
pub const MEMORY_PATH: &str = ":memory:";

/// SQLite connection pool type alias.
pub type ConnectionPool = Pool<SqliteConnectionManager>;

/// Configuration for the SQLite database.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DatabaseConfig {
    /// Path to the database file, or `:memory:`.
    pub path: String,
    /// Maximum pooled connections.
    pub max_connections: u32,
}

impl DatabaseConfig {
    /// Create a config for the given database path.
    pub fn new(path: impl Into<String>) -> Self {
        Self {
            path: path.into(),
            max_connections: 4,
        }
    }

    /// Set the pool size.
    pub fn with_max_connections(mut self, n: u32) -> Self {
        self.max_connections = n;
        self
    }
}

impl Default for DatabaseConfig {
    fn default() -> Self {
        Self::new("db.sqlite3")
    }
}

/// Create a connection pool and make sure the schema exists.
pub fn create_pool(config: &DatabaseConfig) -> Result<ConnectionPool, StoreError> {
    info!(path = %config.path, max_connections = config.max_connections, "opening database");

    let (manager, max_size) = if config.path == MEMORY_PATH {
        // Every in-memory connection is its own database; keep exactly one.
        (SqliteConnectionManager::memory().with_init(configure_connection), 1)
    } else {
        if let Some(parent) = Path::new(&config.path).parent()
            && !parent.as_os_str().is_empty()
        {
            std::fs::create_dir_all(parent).map_err(|e| {
                StoreError::Setup(format!("failed to create database directory: {e}"))
            })?;
        }
        (
            SqliteConnectionManager::file(&config.path).with_init(configure_connection),
            config.max_connections.max(1),
        )
    };

    let pool = Pool::builder().max_size(max_size).build(manager)?;

    {
        let conn = pool.get()?;
        initialize_database(&conn)?;
    }

    debug!("database ready");
    Ok(pool)
}

/// Per-connection settings, applied whenever the pool opens a connection.
fn configure_connection(conn: &mut Connection) -> Result<(), rusqlite::Error> {
    conn.execute_batch(
        "
        PRAGMA journal_mode = WAL;
        PRAGMA synchronous = NORMAL;
        PRAGMA busy_timeout = 5000;
        ",
    )
}

/// Create missing tables.
fn initialize_database(conn: &Connection) -> Result<(), StoreError> {
    conn.execute_batch(
        "
        CREATE TABLE IF NOT EXISTS stops (
            id        INTEGER PRIMARY KEY,
            latitude  REAL NOT NULL,
            longitude REAL NOT NULL
        );

        CREATE TABLE IF NOT EXISTS addresses (
            id        INTEGER PRIMARY KEY,
            latitude  REAL NOT NULL,
            longitude REAL NOT NULL
        );

        CREATE TABLE IF NOT EXISTS routes (
            address_id INTEGER NOT NULL,
            stop_id    INTEGER NOT NULL,
            distance   REAL NOT NULL,
            time       REAL NOT NULL,
            PRIMARY KEY (address_id, stop_id)
        );
        ",
    )?;
    Ok(())
}
