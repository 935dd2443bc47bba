//! `ClusterSignal`: embeddings in, per-row cluster membership out (spec.md
//! §4.D, §4.F).
//!
//! This trait only covers the per-signal compute contract; the actual
//! reduce → cluster → title pipeline over a whole dataset lives in the
//! clustering component, which composes a `ClusterSignal` with a
//! `Reducer`/`Clusterer`/`Titler`.

use lilac_core::Value;

use crate::signal::SignalMeta;

/// Assigns each row in a batch a cluster id (and, once titling has run, a
/// human-readable title/category). `compute` takes pre-reduced coordinates
/// rather than raw embeddings — dimensionality reduction is a dataset-wide
/// operation, not a per-row one, so it happens upstream of this trait.
pub trait ClusterSignal: SignalMeta {
    fn compute(&self, coords: &[Vec<f32>]) -> Vec<Value>;
}
