//! Dimensionality reduction (spec.md §4.F step 2).
//!
//! The spec names UMAP as the reference reducer; no example repo in the
//! pack carries a UMAP binding, and `linfa-reduction::Pca` is the closest
//! real crate in the same family the workspace already depends on for
//! clustering. Substituting PCA for UMAP is a deliberate, documented
//! redesign (see DESIGN.md) — both are dimensionality reducers feeding the
//! same downstream HDBSCAN stage, and PCA needs no extra dependency beyond
//! what `linfa`'s own ecosystem already provides.

use linfa::traits::{Fit, Predict};
use linfa::DatasetBase;
use linfa_reduction::Pca;
use ndarray::Array2;

use crate::error::ClusterError;

/// Projects `vectors` down to `n_components` dimensions. Returns the input
/// unchanged when `dim <= n_components` or `vectors.len() <= n_components`
/// (spec.md §4.F step 2 "skip when ...").
///
/// # Errors
///
/// Returns `ClusterError::Reduction` if the PCA fit fails (e.g. degenerate
/// input with zero variance).
pub fn reduce(vectors: &[Vec<f32>], n_components: usize) -> Result<Vec<Vec<f32>>, ClusterError> {
    if vectors.is_empty() {
        return Ok(Vec::new());
    }
    let dim = vectors[0].len();
    if dim <= n_components || vectors.len() <= n_components {
        return Ok(vectors.to_vec());
    }

    let flat: Vec<f64> = vectors.iter().flatten().map(|&v| f64::from(v)).collect();
    let array = Array2::from_shape_vec((vectors.len(), dim), flat)
        .map_err(|e| ClusterError::Reduction(e.to_string()))?;
    let dataset = DatasetBase::from(array);

    let pca = Pca::params(n_components)
        .fit(&dataset)
        .map_err(|e| ClusterError::Reduction(e.to_string()))?;
    let reduced = pca.predict(&dataset);

    Ok(reduced
        .rows()
        .into_iter()
        .map(|row| row.iter().map(|&v| v as f32).collect())
        .collect())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn skips_reduction_when_already_below_target_dims() {
        let vectors = vec![vec![1.0, 2.0], vec![3.0, 4.0]];
        let reduced = reduce(&vectors, 10).unwrap();
        assert_eq!(reduced, vectors);
    }

    #[test]
    fn empty_input_returns_empty() {
        assert_eq!(reduce(&[], 10).unwrap(), Vec::<Vec<f32>>::new());
    }
}
