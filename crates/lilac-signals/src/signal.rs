//! The common shape every signal variant shares (spec.md §4.D, §6 "Signal
//! plug-in contract").

use lilac_core::Field;
use serde::{Deserialize, Serialize};

/// What kind of value a signal consumes.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum InputType {
    Text,
    TextEmbedding,
}

/// Whether the executor should shard a signal's work across OS threads or
/// (an approximation of) separate processes (spec.md §5).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ExecutionKind {
    /// I/O-bound or natively-parallel numeric work (remote calls, BLAS).
    Threads,
    /// CPU-bound pure-function work. The executor approximates this with a
    /// dedicated OS thread pool rather than true multiprocessing — see
    /// SPEC_FULL.md §9 for why a faithful IPC layer was judged out of scope.
    Processes,
}

/// Declarations shared by every signal variant. Concrete signals also
/// implement exactly one of [`crate::TextSignal`], [`crate::SplitterSignal`],
/// [`crate::EmbeddingSignal`], [`crate::ModelSignal`], or
/// [`crate::ClusterSignal`], which extend this trait with their `compute`
/// shape.
pub trait SignalMeta: Send + Sync {
    /// Unique, non-empty name this signal is registered under.
    fn name(&self) -> &str;

    fn input_type(&self) -> InputType;

    /// Preferred number of items per `compute` call.
    fn local_batch_size(&self) -> usize {
        64
    }

    /// Preferred number of shards to run this signal's compute across in
    /// parallel, before the global worker pool's cap applies.
    fn local_parallelism(&self) -> usize {
        1
    }

    fn execution_kind(&self) -> ExecutionKind {
        ExecutionKind::Threads
    }

    /// Whether this signal supports a remote/"garden" backend in addition
    /// to its local `compute`.
    fn supports_remote(&self) -> bool {
        false
    }

    /// The schema this signal's output occupies once wrapped by
    /// `create_enrichment_schema` (spec.md §4.A, §4.E step 2).
    fn fields(&self) -> Field;

    /// Called once before the first `compute` call of a run.
    fn setup(&mut self) {}

    /// Called once after the last `compute` call of a run, successful or
    /// not.
    fn teardown(&mut self) {}

    /// Serialized constructor arguments, used to build the `SignalDescriptor`
    /// that records provenance and to detect a same-instance re-run under
    /// `overwrite=false` (spec.md §4.E "Idempotence").
    fn signal_args(&self) -> serde_json::Value {
        serde_json::Value::Null
    }
}
