//! `EmbeddingSignal`: string (+ optional chunker) in, list of
//! `{span, vector}` entries out (spec.md §4.D). May suspend for a remote
//! call.

use lilac_core::EmbeddingChunk;

use crate::signal::SignalMeta;

/// Produces dense embedding chunks for a batch of strings. `compute` is the
/// local (in-process) path; `compute_remote` is an optional async path for
/// signals backed by a hosted embedding API (spec.md §6 "Signal plug-in
/// contract").
pub trait EmbeddingSignal: SignalMeta {
    fn compute(&self, batch: &[String]) -> Vec<Vec<EmbeddingChunk>>;

    /// The name of the `SplitterSignal` this embedding expects to have run
    /// first, if any (spec.md §4.E step 1 "if E in turn declares a
    /// splitter dependency"). `None` means this embedding runs directly
    /// over whole input strings.
    fn splitter_name(&self) -> Option<&str> {
        None
    }
}
