//! # lilac-signals
//!
//! The signal taxonomy and registry (spec.md §4.D): the shared
//! [`SignalMeta`] contract plus its five concrete variants (`TextSignal`,
//! `SplitterSignal`, `EmbeddingSignal`, `ModelSignal`, `ClusterSignal`) and
//! the [`SignalRegistry`] that holds named instances of each.

pub mod cluster;
pub mod embedding;
pub mod error;
pub mod model;
pub mod registry;
pub mod signal;
pub mod splitter;
pub mod text;

pub use cluster::ClusterSignal;
pub use embedding::EmbeddingSignal;
pub use error::SignalError;
pub use model::ModelSignal;
pub use registry::SignalRegistry;
pub use signal::{ExecutionKind, InputType, SignalMeta};
pub use splitter::{SentenceSplitterSignal, SplitterSignal};
pub use text::{TextSignal, TextStatisticsSignal};
