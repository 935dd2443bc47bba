//! # lilac-core
//!
//! Core types shared across every Lilac crate:
//! - `DType` / `Field`: the typed, recursive schema tree (spec.md §3)
//! - `Path` / `PathComponent`: selectors and write templates (spec.md §4.A)
//! - `RowId`: the stable join key across shards, enrichments, and the vector index
//! - `Value`: the dynamically-typed runtime counterpart to `Field`, with the
//!   absent-value convention
//! - `flatten`/`unflatten`: the universal nested-value flattening utility
//!   the enrichment executor uses to batch ragged inputs
//! - `CoreError`: cross-cutting error kinds (spec.md §7)
//! - Arrow serialization adapters for chrono types, used when bridging row
//!   structs to Arrow `RecordBatch`es in `lilac-lake`

pub mod arrow_serde;
pub mod dtype;
pub mod errors;
pub mod field;
pub mod flatten;
pub mod path;
pub mod row;
pub mod value;

pub use dtype::DType;
pub use errors::CoreError;
pub use field::{ClusterDescriptor, Field, SignalDescriptor};
pub use path::{normalize_path, Path, PathComponent};
pub use row::RowId;
pub use value::{EmbeddingChunk, Span, Value};
