//! # lilac-embeddings
//!
//! Local embedding generation via `fastembed` (ONNX runtime), wired up as a
//! concrete `lilac-signals::EmbeddingSignal` (spec.md §4.D). Generates
//! 384-dimensional vectors for text content without requiring any external
//! API keys.

pub mod engine;
pub mod error;

pub use engine::FastEmbedSignal;
pub use error::EmbeddingError;
