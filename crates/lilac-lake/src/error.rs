//! Columnar store error types (spec.md §7).

use thiserror::Error;

/// Errors raised by the columnar store.
#[derive(Debug, Error)]
pub enum LakeError {
    /// A shard file could not be read or parsed. Isolated to the shard; the
    /// enclosing `iter_rows`/`get` call continues over the remaining shards.
    #[error("corrupt shard {shard_path} (rows {row_id_start}..{row_id_end}): {message}")]
    CorruptShard {
        shard_path: String,
        row_id_start: String,
        row_id_end: String,
        message: String,
    },

    /// The dataset manifest file is missing or unreadable.
    #[error("manifest not found or unreadable at {0}")]
    ManifestMissing(String),

    /// A requested path does not resolve against the dataset's merged
    /// schema.
    #[error("unknown path in projection or filter: {0}")]
    UnknownPath(String),

    /// Arrow/Parquet encode or decode failure.
    #[error("arrow error: {0}")]
    Arrow(#[from] arrow_schema::ArrowError),

    /// Parquet encode or decode failure.
    #[error("parquet error: {0}")]
    Parquet(#[from] parquet::errors::ParquetError),

    /// I/O error reading or writing a shard or manifest file.
    #[error("io error: {0}")]
    Io(#[from] std::io::Error),

    /// Manifest (de)serialization failure.
    #[error("manifest serialization error: {0}")]
    Serde(#[from] serde_json::Error),

    /// Schema algebra error (merge conflict, unregistered signal).
    #[error(transparent)]
    Schema(#[from] lilac_schema::SchemaError),

    /// Core invariant violation surfaced from `lilac-core`.
    #[error(transparent)]
    Core(#[from] lilac_core::CoreError),
}
