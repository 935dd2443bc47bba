//! `ConceptModel`: owns every draft's fitted [`LogisticModel`] for one
//! `(concept, embedding_name)` pair and keeps them in sync with a
//! [`Concept`]'s labeled examples (spec.md §4.H).
//!
//! Grounded on `examples/original_source/src/concepts/concept.py`'s
//! `ConceptModel` class: `_embeddings` is this struct's embedding cache,
//! `_logistic_models` its per-draft model map, `_negative_vectors` its
//! dataset-sampled negative calibration set, and `sync`/`_compute_embeddings`
//! /`_calibrate_on_dataset` map 1:1 onto the methods of the same name.

use std::collections::HashMap;

use lilac_core::Path;
use lilac_signals::EmbeddingSignal;
use lilac_vector::VectorIndex;
use rand::seq::SliceRandom;
use serde::{Deserialize, Serialize};

use crate::concept::{Concept, DRAFT_MAIN};
use crate::error::ConceptError;
use crate::metrics::{compute_metrics, ConceptMetrics};
use crate::model::LogisticModel;

/// How many negative vectors to sample from the dataset's vector index for
/// calibration (spec.md §4.H "optional negative calibration vectors sampled
/// from the target dataset"; `300` is the reference implementation's
/// `DEFAULT_NUM_NEG_EXAMPLES`).
pub const DEFAULT_NUM_NEGATIVE_EXAMPLES: usize = 300;

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ConceptColumnInfo {
    pub namespace: String,
    pub name: String,
    pub path: Path,
    pub num_negative_examples: usize,
}

pub struct ConceptModel {
    pub namespace: String,
    pub concept_name: String,
    pub embedding_name: String,
    pub version: i64,
    column_info: Option<ConceptColumnInfo>,
    embeddings: HashMap<String, Vec<f32>>,
    logistic_models: HashMap<String, LogisticModel>,
    negative_vectors: Option<Vec<Vec<f32>>>,
}

impl ConceptModel {
    #[must_use]
    pub fn new(namespace: impl Into<String>, concept_name: impl Into<String>, embedding_name: impl Into<String>) -> Self {
        Self {
            namespace: namespace.into(),
            concept_name: concept_name.into(),
            embedding_name: embedding_name.into(),
            version: -1,
            column_info: None,
            embeddings: HashMap::new(),
            logistic_models: HashMap::new(),
            negative_vectors: None,
        }
    }

    /// Samples negative calibration vectors from `index`, up to
    /// `column_info.num_negative_examples` (spec.md §4.H
    /// `_calibrate_on_dataset`).
    pub fn calibrate_on_dataset(&mut self, column_info: ConceptColumnInfo, index: &VectorIndex) {
        let keys = index.keys().to_vec();
        let sample_size = column_info.num_negative_examples.min(keys.len());
        let mut rng = rand::thread_rng();
        let sample_keys: Vec<_> = keys.choose_multiple(&mut rng, sample_size).cloned().collect();
        let vectors: Vec<Vec<f32>> = index.get(&sample_keys).into_iter().flatten().collect();
        self.negative_vectors = Some(vectors);
        self.column_info = Some(column_info);
    }

    fn logistic_model(&mut self, draft: &str) -> &mut LogisticModel {
        self.logistic_models.entry(draft.to_string()).or_default()
    }

    /// Scores already-embedded vectors under `draft`'s fitted model.
    #[must_use]
    pub fn score_embeddings(&mut self, draft: &str, embeddings: &[Vec<f32>]) -> Vec<f64> {
        self.logistic_model(draft).score_embeddings(embeddings)
    }

    /// Embeds `texts` fresh via `signal` and scores them — the entry point
    /// used outside a sync loop (e.g. scoring a dataset column for search).
    #[must_use]
    pub fn score(&mut self, draft: &str, texts: &[String], signal: &dyn EmbeddingSignal) -> Vec<f64> {
        let embeddings: Vec<Vec<f32>> = signal
            .compute(texts)
            .into_iter()
            .map(|chunks| chunks.into_iter().next().map(|c| c.vector).unwrap_or_default())
            .collect();
        self.score_embeddings(draft, &embeddings)
    }

    /// The fitted coefficient vector for `draft` — `None` before the first
    /// successful fit.
    #[must_use]
    pub fn coef(&self, draft: &str) -> Option<Vec<f64>> {
        self.logistic_models.get(draft).filter(|m| m.is_fitted()).map(LogisticModel::coef)
    }

    fn compute_embeddings(&mut self, concept: &Concept, signal: &dyn EmbeddingSignal) {
        let missing: Vec<(&String, &str)> = concept
            .data
            .iter()
            .filter(|(id, _)| !self.embeddings.contains_key(id.as_str()))
            .map(|(id, example)| (id, example.input.text.as_deref().unwrap_or("")))
            .collect();
        if missing.is_empty() {
            return;
        }

        let texts: Vec<String> = missing.iter().map(|(_, text)| (*text).to_string()).collect();
        let vectors: Vec<Vec<f32>> = signal
            .compute(&texts)
            .into_iter()
            .map(|chunks| chunks.into_iter().next().map(|c| c.vector).unwrap_or_default())
            .collect();

        for ((id, _), vector) in missing.into_iter().zip(vectors) {
            self.embeddings.insert(id.clone(), vector);
        }
    }

    /// Refits every draft against `concept`'s current labels if the
    /// concept's version has moved past this model's. Returns whether a
    /// refit happened (spec.md §4.H `sync`).
    ///
    /// # Errors
    ///
    /// Propagates `ConceptError` from a per-draft fit.
    pub fn sync(&mut self, concept: &Concept, signal: &dyn EmbeddingSignal) -> Result<bool, ConceptError> {
        if concept.version == self.version {
            return Ok(false);
        }

        self.compute_embeddings(concept, signal);

        for draft in concept.drafts() {
            let examples = concept.draft_examples(&draft)?;
            let mut embeddings: Vec<Vec<f32>> = Vec::with_capacity(examples.len());
            let mut labels: Vec<bool> = Vec::with_capacity(examples.len());
            for example in examples.values() {
                if let Some(vector) = self.embeddings.get(&example.id) {
                    embeddings.push(vector.clone());
                    labels.push(example.input.label);
                }
            }

            let num_pos = labels.iter().filter(|&&l| l).count().max(1);
            let num_neg = labels.iter().filter(|&&l| !l).count().max(1);
            let mut sample_weights: Vec<f64> = labels.iter().map(|&l| if l { 1.0 / num_pos as f64 } else { 1.0 / num_neg as f64 }).collect();

            if let Some(negatives) = &self.negative_vectors {
                let implicit = negatives.len();
                embeddings.splice(0..0, negatives.iter().cloned());
                labels.splice(0..0, std::iter::repeat(false).take(implicit));
                sample_weights.splice(0..0, std::iter::repeat(1.0 / implicit.max(1) as f64).take(implicit));
            }

            let model = self.logistic_model(&draft);
            model.fit(&embeddings, &labels, &sample_weights)?;
            model.version = concept.version;
        }

        self.version = concept.version;
        Ok(true)
    }

    /// Cross-validated F1 metrics for `main`, including the negative
    /// calibration set when present (spec.md §4.H, `compute_metrics`).
    ///
    /// # Errors
    ///
    /// See [`compute_metrics`].
    pub fn compute_metrics(&self, concept: &Concept) -> Result<ConceptMetrics, ConceptError> {
        let examples = concept.draft_examples(DRAFT_MAIN)?;
        let mut embeddings: Vec<Vec<f32>> = Vec::with_capacity(examples.len());
        let mut labels: Vec<bool> = Vec::with_capacity(examples.len());
        for example in examples.values() {
            if let Some(vector) = self.embeddings.get(&example.id) {
                embeddings.push(vector.clone());
                labels.push(example.input.label);
            }
        }

        if let Some(negatives) = &self.negative_vectors {
            embeddings.splice(0..0, negatives.iter().cloned());
            labels.splice(0..0, std::iter::repeat(false).take(negatives.len()));
        }

        let sample_weights = vec![1.0; labels.len()];
        compute_metrics(&embeddings, &labels, &sample_weights)
    }
}
