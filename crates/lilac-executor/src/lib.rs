//! # lilac-executor
//!
//! The enrichment executor (spec.md §4.E): reads a dataset's rows at an
//! input path, batches them through a signal's `compute`, and writes the
//! result back as a new enrichment column — for embedding signals, also
//! into the vector index.

mod dag;
pub mod error;
pub mod executor;

pub use error::ExecutorError;
pub use executor::{
    run_embedding_signal, run_model_signal, run_splitter_signal, run_text_signal, EnrichmentOutcome, EnrichmentRequest, Executor,
};
