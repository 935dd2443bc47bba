//! Default local `EmbeddingSignal`: wraps `fastembed`'s ONNX-backed text
//! encoder (spec.md §4.D "EmbeddingSignal").
//!
//! Grounded on `spike_fastembed.rs`'s validated `TextInitOptions`/
//! `TextEmbedding` usage: same cache-dir discipline, same default model
//! choice, same synchronous `embed(texts, batch_size)` call shape. The
//! spike's `spawn_blocking` note for calling from an async context applies
//! to this signal's caller (the executor), not to this crate.

use std::path::PathBuf;
use std::sync::Mutex;

use fastembed::{EmbeddingModel, TextEmbedding, TextInitOptions};
use lilac_core::{DType, EmbeddingChunk, Field, Span, Value};
use lilac_signals::{EmbeddingSignal, ExecutionKind, InputType, SignalMeta};

use crate::error::EmbeddingError;

fn default_cache_dir() -> PathBuf {
    dirs::home_dir()
        .unwrap_or_else(|| PathBuf::from("."))
        .join(".lilac")
        .join("cache")
        .join("fastembed")
}

/// A single-chunk text embedder: each input string becomes exactly one
/// `EmbeddingChunk` spanning the whole string. Splitting a string into
/// multiple chunks before embedding is the executor's job (it runs a
/// `SplitterSignal` first and calls `compute` once per span) — this signal
/// never receives sub-spans itself.
pub struct FastEmbedSignal {
    name: String,
    model: Mutex<TextEmbedding>,
    dim: usize,
}

impl FastEmbedSignal {
    /// Loads `fastembed`'s default model (`BGESmallENV15`, 384-dim).
    ///
    /// # Errors
    ///
    /// Returns `EmbeddingError::InitFailed` if the model fails to download
    /// or initialize.
    pub fn new(name: impl Into<String>) -> Result<Self, EmbeddingError> {
        let opts = TextInitOptions::new(EmbeddingModel::BGESmallENV15)
            .with_cache_dir(default_cache_dir())
            .with_show_download_progress(false);
        let model = TextEmbedding::try_new(opts).map_err(|e| EmbeddingError::InitFailed(e.to_string()))?;
        Ok(Self {
            name: name.into(),
            model: Mutex::new(model),
            dim: 384,
        })
    }

    #[must_use]
    pub fn dim(&self) -> usize {
        self.dim
    }
}

impl SignalMeta for FastEmbedSignal {
    fn name(&self) -> &str {
        &self.name
    }

    fn input_type(&self) -> InputType {
        InputType::Text
    }

    fn local_batch_size(&self) -> usize {
        256
    }

    fn execution_kind(&self) -> ExecutionKind {
        // Native BLAS/ONNX work releases the executor's worker to do other
        // scheduling while inference runs (spec.md §5 "threads for ...
        // GIL-releasing numeric work").
        ExecutionKind::Threads
    }

    fn fields(&self) -> Field {
        Field::leaf(DType::Embedding)
    }
}

impl EmbeddingSignal for FastEmbedSignal {
    fn compute(&self, batch: &[String]) -> Vec<Vec<EmbeddingChunk>> {
        if batch.is_empty() {
            return Vec::new();
        }
        let mut model = self.model.lock().expect("embedding model mutex poisoned");
        match model.embed(batch.to_vec(), None) {
            Ok(vectors) => batch
                .iter()
                .zip(vectors)
                .map(|(text, vector)| {
                    vec![EmbeddingChunk {
                        span: Span::new(0, text.chars().count()),
                        vector,
                    }]
                })
                .collect(),
            Err(e) => {
                tracing::error!(signal = %self.name, error = %e, "embedding batch failed");
                batch.iter().map(|_| Vec::new()).collect()
            }
        }
    }
}
