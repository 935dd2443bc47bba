//! `LogisticModel`: a class-balanced-weighted logistic regression over
//! embedding vectors (spec.md §4.H "logistic regression ... class-balanced
//! sample weights").
//!
//! Grounded on `examples/original_source/src/concepts/concept.py`'s
//! `LogisticEmbeddingModel`, which wraps `sklearn.linear_model
//! .LogisticRegression(class_weight=None, C=30, tol=1e-5, warm_start=True)`
//! and falls back to a random score when the model hasn't been fit yet.
//! `linfa-logistic` (this workspace's usual classifier crate) does not
//! expose per-sample weights or a raw probability output, both of which
//! this module needs to reproduce the reference's class-balancing and
//! scoring behavior, so the fit itself is a direct, hand-rolled batch
//! gradient descent over `ndarray` — the same "write it directly against
//! the algorithm the reference uses" choice `lilac-lake::arrow_bridge`
//! made when no existing crate matched the bridging it needed.

use ndarray::{Array1, Array2};
use rand::Rng;

use crate::error::ConceptError;

/// `C=30` in the reference implementation's sklearn constructor; converted
/// to an L2 penalty coefficient (`lambda = 1/C`) for the gradient-descent
/// formulation used here.
const INVERSE_REGULARIZATION_STRENGTH: f64 = 30.0;
const MAX_ITERATIONS: usize = 1_000;
const CONVERGENCE_TOLERANCE: f64 = 1e-5;
const LEARNING_RATE: f64 = 0.1;

#[derive(Debug, Clone)]
pub struct LogisticModel {
    weights: Array1<f64>,
    bias: f64,
    fitted: bool,
    pub version: i64,
}

impl Default for LogisticModel {
    fn default() -> Self {
        Self {
            weights: Array1::zeros(0),
            bias: 0.0,
            fitted: false,
            version: -1,
        }
    }
}

fn sigmoid(z: f64) -> f64 {
    1.0 / (1.0 + (-z).exp())
}

fn to_array2(embeddings: &[Vec<f32>]) -> Array2<f64> {
    let rows = embeddings.len();
    let cols = embeddings.first().map_or(0, Vec::len);
    let mut array = Array2::zeros((rows, cols));
    for (r, row) in embeddings.iter().enumerate() {
        for (c, &v) in row.iter().enumerate() {
            array[[r, c]] = f64::from(v);
        }
    }
    array
}

impl LogisticModel {
    /// Scores each embedding with `P(label=true)`. Mirrors
    /// `LogisticEmbeddingModel.score_embeddings`: an unfit model (no
    /// examples labeled yet) returns uniform random scores rather than
    /// erroring, since a concept with zero or one-class examples is a
    /// normal state the UI still needs to render a score for.
    #[must_use]
    pub fn score_embeddings(&self, embeddings: &[Vec<f32>]) -> Vec<f64> {
        if !self.fitted {
            let mut rng = rand::thread_rng();
            return embeddings.iter().map(|_| rng.gen_range(0.0..1.0)).collect();
        }
        embeddings
            .iter()
            .map(|row| {
                let dot: f64 = row.iter().zip(self.weights.iter()).map(|(&x, &w)| f64::from(x) * w).sum();
                sigmoid(dot + self.bias)
            })
            .collect()
    }

    /// Fits the model via class-balanced-weighted gradient descent.
    /// A no-op when fewer than two distinct labels are present — mirroring
    /// the reference's `if len(set(labels)) < 2: return`, since a
    /// single-class fit is meaningless for a binary classifier.
    ///
    /// # Errors
    ///
    /// Returns `ConceptError::LabelLengthMismatch`/`WeightLengthMismatch` if
    /// the input slices disagree in length.
    pub fn fit(&mut self, embeddings: &[Vec<f32>], labels: &[bool], sample_weights: &[f64]) -> Result<(), ConceptError> {
        if labels.iter().all(|&l| l) || labels.iter().all(|&l| !l) {
            return Ok(());
        }
        if embeddings.len() != labels.len() {
            return Err(ConceptError::LabelLengthMismatch {
                embeddings: embeddings.len(),
                labels: labels.len(),
            });
        }
        if sample_weights.len() != labels.len() {
            return Err(ConceptError::WeightLengthMismatch {
                weights: sample_weights.len(),
                labels: labels.len(),
            });
        }

        let x = to_array2(embeddings);
        let y: Array1<f64> = labels.iter().map(|&l| if l { 1.0 } else { 0.0 }).collect();
        let weights: Array1<f64> = sample_weights.iter().copied().collect();
        let n = x.nrows() as f64;
        let dim = x.ncols();

        let mut w = Array1::<f64>::zeros(dim);
        let mut b = 0.0_f64;
        let lambda = 1.0 / INVERSE_REGULARIZATION_STRENGTH;

        for _ in 0..MAX_ITERATIONS {
            let logits = x.dot(&w) + b;
            let preds = logits.mapv(sigmoid);
            let residual = (&preds - &y) * &weights;

            let grad_w = x.t().dot(&residual) / n + lambda * &w;
            let grad_b = residual.sum() / n;

            w -= &(LEARNING_RATE * &grad_w);
            b -= LEARNING_RATE * grad_b;

            if grad_w.mapv(f64::abs).sum() / dim.max(1) as f64 + grad_b.abs() < CONVERGENCE_TOLERANCE {
                break;
            }
        }

        self.weights = w;
        self.bias = b;
        self.fitted = true;
        Ok(())
    }

    /// The fitted coefficient vector, flattened — mirrors
    /// `ConceptModel.coef`'s `_model.coef_.reshape(-1)`.
    #[must_use]
    pub fn coef(&self) -> Vec<f64> {
        self.weights.iter().copied().collect()
    }

    #[must_use]
    pub const fn is_fitted(&self) -> bool {
        self.fitted
    }
}

/// Computes predictions for held-out rows using a model fit only on the
/// remaining rows — the inner primitive [`crate::metrics::compute_metrics`]
/// calls once per cross-validation fold.
pub fn fit_and_predict(
    train_embeddings: &[Vec<f32>],
    train_labels: &[bool],
    train_weights: &[f64],
    test_embeddings: &[Vec<f32>],
) -> Result<Vec<bool>, ConceptError> {
    let mut model = LogisticModel::default();
    model.fit(train_embeddings, train_labels, train_weights)?;
    Ok(model.score_embeddings(test_embeddings).into_iter().map(|p| p >= 0.5).collect())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn separable_data() -> (Vec<Vec<f32>>, Vec<bool>) {
        let embeddings = vec![
            vec![1.0, 0.0],
            vec![0.9, 0.1],
            vec![0.0, 1.0],
            vec![0.1, 0.9],
        ];
        let labels = vec![true, true, false, false];
        (embeddings, labels)
    }

    #[test]
    fn unfit_model_returns_scores_in_unit_range() {
        let model = LogisticModel::default();
        let scores = model.score_embeddings(&[vec![1.0, 2.0]]);
        assert_eq!(scores.len(), 1);
        assert!(scores[0] >= 0.0 && scores[0] <= 1.0);
    }

    #[test]
    fn fit_separates_linearly_separable_classes() {
        let (embeddings, labels) = separable_data();
        let weights = vec![1.0; labels.len()];
        let mut model = LogisticModel::default();
        model.fit(&embeddings, &labels, &weights).unwrap();
        assert!(model.is_fitted());

        let scores = model.score_embeddings(&embeddings);
        assert!(scores[0] > 0.5);
        assert!(scores[2] < 0.5);
    }

    #[test]
    fn single_class_labels_are_a_fit_noop() {
        let embeddings = vec![vec![1.0, 0.0], vec![0.9, 0.1]];
        let labels = vec![true, true];
        let weights = vec![1.0, 1.0];
        let mut model = LogisticModel::default();
        model.fit(&embeddings, &labels, &weights).unwrap();
        assert!(!model.is_fitted());
    }
}
