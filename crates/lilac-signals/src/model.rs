//! `ModelSignal`: embedding in, any field out (spec.md §4.D). Reads from an
//! already-built [`VectorIndex`] rather than raw text, so it can run over
//! embeddings produced by an upstream `EmbeddingSignal` without
//! re-embedding.

use lilac_core::Value;
use lilac_vector::{VectorIndex, VectorKey};

use crate::signal::SignalMeta;

/// Computes a field from vectors already sitting in an index (e.g. a
/// classifier head, or a nearest-neighbor lookup against a fixed set of
/// reference vectors).
pub trait ModelSignal: SignalMeta {
    /// The name of the `EmbeddingSignal` this model reads vectors from
    /// (spec.md §4.E step 1 "a ModelSignal keyed by embedding name E"). The
    /// executor auto-schedules that embedding (and, transitively, its
    /// splitter) when its output column is absent at the model's input
    /// path.
    fn embedding_name(&self) -> &str;

    fn vector_compute(&self, keys: &[VectorKey], index: &VectorIndex) -> Vec<Value>;

    /// Top-k nearest neighbors per key, optionally restricted to a subset of
    /// the index (spec.md §4.G "concept search" is the main caller of this
    /// shape).
    fn vector_compute_topk(
        &self,
        keys: &[VectorKey],
        index: &VectorIndex,
        k: usize,
        restrict_keys: Option<&[VectorKey]>,
    ) -> Vec<Vec<(VectorKey, f32)>> {
        let queries = index.get(keys);
        queries
            .into_iter()
            .map(|maybe_query| match maybe_query {
                Some(query) => index.topk(&query, k, restrict_keys).unwrap_or_default(),
                None => Vec::new(),
            })
            .collect()
    }
}
