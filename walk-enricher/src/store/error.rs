//! Storage error types.

use crate::domain::InvalidCoordinate;

/// Errors from the SQLite stop store, address source and route sink.
#[derive(Debug, thiserror::Error)]
pub enum StoreError {
    /// Could not get a connection from the pool
    #[error("connection pool error: {0}")]
    Pool(#[from] r2d2::Error),

    /// Query or statement failed
    #[error("SQLite error: {0}")]
    Sqlite(#[from] rusqlite::Error),

    /// A row holds a coordinate that cannot be used
    #[error("{table} row {id} has an invalid coordinate: {source}")]
    InvalidCoordinate {
        table: &'static str,
        id: i64,
        source: InvalidCoordinate,
    },

    /// Database file or directory could not be prepared
    #[error("database setup failed: {0}")]
    Setup(String),

    /// Storage is not reachable (blocking task failed, backend gone)
    #[error("storage unavailable: {0}")]
    Unavailable(String),
}

impl StoreError {
    /// Whether the error concerns one row only, leaving the rest readable.
    pub fn is_row_error(&self) -> bool {
        matches!(self, StoreError::InvalidCoordinate { .. })
    }
}
