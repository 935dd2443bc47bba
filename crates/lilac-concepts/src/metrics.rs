//! 3-fold cross-validated F1 metrics (spec.md §4.H "metrics are 3-fold
//! cross-validated F1"), grounded on
//! `examples/original_source/src/concepts/concept.py`'s
//! `LogisticEmbeddingModel.compute_metrics` (`KFold(n_splits=3, shuffle=True,
//! random_state=42)` + `cross_val_score(..., scoring='f1')`) and
//! `_get_overall_score`'s threshold ladder.

use rand::rngs::StdRng;
use rand::seq::SliceRandom;
use rand::SeedableRng;
use serde::{Deserialize, Serialize};

use crate::error::ConceptError;
use crate::model::fit_and_predict;

/// The random seed the reference implementation hardcodes
/// (`random_state=42`) so fold assignment is reproducible across runs.
const FOLD_SEED: u64 = 42;
const NUM_FOLDS: usize = 3;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum OverallScore {
    NotGood,
    Ok,
    Good,
    VeryGood,
    Great,
}

fn overall_score(f1: f64) -> OverallScore {
    if f1 < 0.5 {
        OverallScore::NotGood
    } else if f1 < 0.8 {
        OverallScore::Ok
    } else if f1 < 0.9 {
        OverallScore::Good
    } else if f1 < 0.95 {
        OverallScore::VeryGood
    } else {
        OverallScore::Great
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ConceptMetrics {
    pub avg_f1_score: f64,
    pub overall_score: OverallScore,
}

fn f1_score(predicted: &[bool], actual: &[bool]) -> f64 {
    let mut true_positive = 0u32;
    let mut false_positive = 0u32;
    let mut false_negative = 0u32;
    for (&p, &a) in predicted.iter().zip(actual) {
        match (p, a) {
            (true, true) => true_positive += 1,
            (true, false) => false_positive += 1,
            (false, true) => false_negative += 1,
            (false, false) => {}
        }
    }
    let precision_denom = true_positive + false_positive;
    let recall_denom = true_positive + false_negative;
    if precision_denom == 0 || recall_denom == 0 {
        return 0.0;
    }
    let precision = f64::from(true_positive) / f64::from(precision_denom);
    let recall = f64::from(true_positive) / f64::from(recall_denom);
    if precision + recall == 0.0 {
        0.0
    } else {
        2.0 * precision * recall / (precision + recall)
    }
}

/// Splits `0..n` into `NUM_FOLDS` shuffled, roughly-equal partitions.
fn make_folds(n: usize) -> Vec<Vec<usize>> {
    let mut indices: Vec<usize> = (0..n).collect();
    indices.shuffle(&mut StdRng::seed_from_u64(FOLD_SEED));
    let mut folds = vec![Vec::new(); NUM_FOLDS];
    for (i, index) in indices.into_iter().enumerate() {
        folds[i % NUM_FOLDS].push(index);
    }
    folds
}

/// Computes 3-fold cross-validated F1. Fewer than two examples per class
/// makes folding meaningless, so a single global fit-predict pass is used
/// instead as a degenerate single "fold" (still produces a meaningful F1
/// for tiny concepts with only a handful of labeled examples).
///
/// # Errors
///
/// Propagates `ConceptError` from the underlying per-fold fits.
pub fn compute_metrics(embeddings: &[Vec<f32>], labels: &[bool], sample_weights: &[f64]) -> Result<ConceptMetrics, ConceptError> {
    let n = embeddings.len();
    if n < NUM_FOLDS * 2 {
        let predicted = fit_and_predict(embeddings, labels, sample_weights, embeddings)?;
        let f1 = f1_score(&predicted, labels);
        return Ok(ConceptMetrics {
            avg_f1_score: f1,
            overall_score: overall_score(f1),
        });
    }

    let folds = make_folds(n);
    let mut scores = Vec::with_capacity(NUM_FOLDS);

    for (fold_index, test_indices) in folds.iter().enumerate() {
        if test_indices.is_empty() {
            continue;
        }
        let train_indices: Vec<usize> = folds
            .iter()
            .enumerate()
            .filter(|(i, _)| *i != fold_index)
            .flat_map(|(_, fold)| fold.iter().copied())
            .collect();

        let train_embeddings: Vec<Vec<f32>> = train_indices.iter().map(|&i| embeddings[i].clone()).collect();
        let train_labels: Vec<bool> = train_indices.iter().map(|&i| labels[i]).collect();
        let train_weights: Vec<f64> = train_indices.iter().map(|&i| sample_weights[i]).collect();
        let test_embeddings: Vec<Vec<f32>> = test_indices.iter().map(|&i| embeddings[i].clone()).collect();
        let test_labels: Vec<bool> = test_indices.iter().map(|&i| labels[i]).collect();

        let predicted = fit_and_predict(&train_embeddings, &train_labels, &train_weights, &test_embeddings)?;
        scores.push(f1_score(&predicted, &test_labels));
    }

    let avg_f1_score = if scores.is_empty() { 0.0 } else { scores.iter().sum::<f64>() / scores.len() as f64 };
    Ok(ConceptMetrics {
        avg_f1_score,
        overall_score: overall_score(avg_f1_score),
    })
}
