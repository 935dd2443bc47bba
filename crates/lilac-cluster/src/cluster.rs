//! Density clustering over reduced coordinates (spec.md §4.F step 3):
//! HDBSCAN, producing a `(cluster_id, membership_prob)` per point with
//! `cluster_id = -1` signaling noise.

use hdbscan::{Hdbscan, HdbscanHyperParams};

use crate::error::ClusterError;

/// Runs HDBSCAN with `min_cluster_size`. Returns one `(cluster_id,
/// membership_prob)` pair per input row, in input order.
///
/// # Errors
///
/// Returns `ClusterError::Clustering` if the underlying HDBSCAN run fails
/// (degenerate input, e.g. empty or inconsistent row widths).
pub fn cluster(coords: &[Vec<f32>], min_cluster_size: usize) -> Result<Vec<(i32, f64)>, ClusterError> {
    if coords.is_empty() {
        return Ok(Vec::new());
    }

    let hyper_params = HdbscanHyperParams::builder().min_cluster_size(min_cluster_size.max(2)).build();
    let clusterer = Hdbscan::new(coords, hyper_params);
    let labels = clusterer.cluster().map_err(|e| ClusterError::Clustering(e.to_string()))?;
    let probabilities = clusterer
        .calc_membership_probabilities()
        .map_err(|e| ClusterError::Clustering(e.to_string()))?;

    if labels.len() != coords.len() || probabilities.len() != coords.len() {
        return Err(ClusterError::Clustering("label/probability count mismatch".to_string()));
    }

    Ok(labels.into_iter().zip(probabilities).collect())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn clusters_two_well_separated_groups() {
        let coords = vec![
            vec![0.0, 0.0],
            vec![0.1, 0.1],
            vec![0.0, 0.1],
            vec![10.0, 10.0],
            vec![10.1, 10.1],
            vec![10.0, 10.1],
        ];
        let result = cluster(&coords, 2).unwrap();
        assert_eq!(result.len(), 6);
        // Points in the same tight group should share a cluster id.
        assert_eq!(result[0].0, result[1].0);
        assert_eq!(result[3].0, result[4].0);
        assert_ne!(result[0].0, result[3].0);
    }
}
