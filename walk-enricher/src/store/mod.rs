//! SQLite persistence.
//!
//! One database holds the three tables the enricher works with:
//! `stops` (read once at startup), `addresses` (streamed in pages) and
//! `routes` (appended to as walking routes are resolved).

mod connection;
mod error;
mod sqlite;

pub use connection::{ConnectionPool, DatabaseConfig, MEMORY_PATH, create_pool};
pub use error::StoreError;
pub use sqlite::{AddressQuery, SqliteStore};
