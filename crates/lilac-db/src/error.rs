//! Database error types.

use thiserror::Error;

#[derive(Debug, Error)]
pub enum DatabaseError {
    /// A SQL query failed.
    #[error("query failed: {0}")]
    Query(String),

    /// Schema migration failed.
    #[error("migration failed: {0}")]
    Migration(String),

    /// A row referenced by id doesn't exist.
    #[error("not found: {0}")]
    NotFound(String),

    /// A TEXT column held JSON or an enum tag that didn't parse.
    #[error("invalid stored value in '{column}': {reason}")]
    InvalidValue { column: String, reason: String },

    /// Underlying libSQL error.
    #[error("libSQL error: {0}")]
    LibSql(#[from] libsql::Error),
}
