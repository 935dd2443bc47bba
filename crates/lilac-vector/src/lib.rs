//! # lilac-vector
//!
//! The vector index (spec.md §4.C): a keyed dense-vector store over
//! `(row_id, path_indices, chunk_index)` composite keys, backed by an
//! HNSW graph for approximate nearest-neighbor search.

pub mod error;
pub mod index;
pub mod key;

pub use error::VectorError;
pub use index::{chunks_to_matrix, HnswParams, VectorIndex};
pub use key::VectorKey;
