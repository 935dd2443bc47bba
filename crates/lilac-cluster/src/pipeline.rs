//! Gather → reduce → cluster → title → categorize → write (spec.md §4.F
//! steps 1-6), the orchestration that ties [`crate::reduce`],
//! [`crate::cluster`], and [`crate::titler`] together into one enrichment
//! run over an embedding column, mirroring how `lilac-executor::executor`
//! strings signal `compute` calls into a single run against a `LakeStore`.

use std::collections::{BTreeMap, HashMap};

use lilac_core::{ClusterDescriptor, Field, Path, RowId, Value};
use lilac_vector::VectorIndex;
use rand::seq::SliceRandom;

use crate::cluster::cluster;
use crate::error::ClusterError;
use crate::reduce::reduce;
use crate::titler::{title_with_retry, Categorizer, RetryConfig, Titler};

pub const NOISE_CLUSTER_ID: i32 = -1;

#[derive(Debug, Clone)]
pub struct ClusterPipelineConfig {
    pub min_cluster_size: usize,
    pub n_components: usize,
    /// How many example texts per cluster/category are shown to the
    /// titler — spec.md §4.F step 4 "a representative top-K sample".
    pub top_k_examples: usize,
    pub remote: bool,
}

impl Default for ClusterPipelineConfig {
    fn default() -> Self {
        Self {
            min_cluster_size: 5,
            n_components: 5,
            top_k_examples: 25,
            remote: false,
        }
    }
}

/// One row's worth of clustering output, ready to fold into an enrichment
/// column (spec.md §4.F step 6's `{cluster_id, cluster_membership_prob,
/// cluster_title, category_id, category_membership_prob, category_title}`).
#[derive(Debug, Clone)]
pub struct ClusterAssignment {
    pub cluster_id: i32,
    pub cluster_membership_prob: f64,
    pub cluster_title: String,
    pub category_id: i32,
    pub category_membership_prob: f64,
    pub category_title: String,
}

/// Runs the full pipeline over every vector currently in `index`, paired
/// with the source text each vector was computed from via `texts` (same
/// row granularity as `index.keys()` — one text per key's `row_id`; a row
/// with several embedding chunks is clustered once per chunk, sharing a
/// `RowId`, which is fine since the final write step keys by row).
///
/// # Errors
///
/// Propagates `ClusterError` from the reduce/cluster stages.
pub fn run(
    index: &VectorIndex,
    texts: &HashMap<RowId, String>,
    titler: &dyn Titler,
    categorizer: &dyn Categorizer,
    config: &ClusterPipelineConfig,
) -> Result<Vec<(RowId, ClusterAssignment)>, ClusterError> {
    let keys = index.keys().to_vec();
    if keys.is_empty() {
        return Ok(Vec::new());
    }

    // Step 1: gather.
    let vectors: Vec<Vec<f32>> = keys
        .iter()
        .map(|k| index.get(std::slice::from_ref(k))[0].clone().unwrap_or_default())
        .collect();

    // Step 2: reduce.
    let coords = reduce(&vectors, config.n_components)?;

    // Step 3: cluster.
    let assignments = cluster(&coords, config.min_cluster_size)?;

    // Step 4: group & title.
    let mut members_by_cluster: BTreeMap<i32, Vec<usize>> = BTreeMap::new();
    for (i, (cluster_id, _)) in assignments.iter().enumerate() {
        if *cluster_id != NOISE_CLUSTER_ID {
            members_by_cluster.entry(*cluster_id).or_default().push(i);
        }
    }

    let cluster_ids: Vec<i32> = members_by_cluster.keys().copied().collect();
    let example_groups: Vec<Vec<(String, f64)>> = cluster_ids
        .iter()
        .map(|id| top_k_examples(&members_by_cluster[id], &keys, &assignments, texts, config.top_k_examples))
        .collect();

    let retry_config = RetryConfig::default();
    let cluster_titles = title_with_retry(titler, &example_groups, &retry_config);
    let title_by_cluster: HashMap<i32, String> = cluster_ids.iter().copied().zip(cluster_titles.clone()).collect();

    // Step 5: categorize — cluster the clusters' own centroids to group
    // related titles together, then ask the categorizer for one name per
    // group (spec.md §4.F step 5 "group titles, call categorizer").
    let centroids: Vec<Vec<f32>> = cluster_ids.iter().map(|id| centroid(&members_by_cluster[id], &coords)).collect();
    let category_assignments = if centroids.len() > 1 {
        cluster(&centroids, 2.min(centroids.len()).max(1))?
    } else {
        centroids.iter().map(|_| (0, 1.0)).collect()
    };

    let mut clusters_by_category: BTreeMap<i32, Vec<usize>> = BTreeMap::new();
    for (i, (category_id, _)) in category_assignments.iter().enumerate() {
        clusters_by_category.entry(*category_id).or_default().push(i);
    }
    let category_ids: Vec<i32> = clusters_by_category.keys().copied().collect();
    let category_groups: Vec<Vec<(String, f64)>> = category_ids
        .iter()
        .map(|cat_id| {
            clusters_by_category[cat_id]
                .iter()
                .map(|&ci| (cluster_titles[ci].clone(), category_assignments[ci].1))
                .collect()
        })
        .collect();
    let category_title_results = title_with_retry_categorizer(categorizer, &category_groups, &retry_config);
    let category_title_by_category: HashMap<i32, String> =
        category_ids.iter().copied().zip(category_title_results).collect();

    // Step 6: write — back-propagate per-row assignments.
    let mut by_row: HashMap<RowId, ClusterAssignment> = HashMap::new();
    for (i, key) in keys.iter().enumerate() {
        let (cluster_id, cluster_prob) = assignments[i];
        let (category_id, category_prob, cluster_title, category_title) = if cluster_id == NOISE_CLUSTER_ID {
            (NOISE_CLUSTER_ID, 0.0, crate::titler::FAILED_TO_TITLE.to_string(), crate::titler::FAILED_TO_TITLE.to_string())
        } else {
            let cluster_index = cluster_ids.iter().position(|id| *id == cluster_id).unwrap_or(0);
            let category_id = category_assignments[cluster_index].0;
            let category_prob = category_assignments[cluster_index].1;
            let cluster_title = title_by_cluster.get(&cluster_id).cloned().unwrap_or_else(|| crate::titler::FAILED_TO_TITLE.to_string());
            let category_title = category_title_by_category
                .get(&category_id)
                .cloned()
                .unwrap_or_else(|| crate::titler::FAILED_TO_TITLE.to_string());
            (category_id, category_prob, cluster_title, category_title)
        };
        by_row.insert(
            key.row_id.clone(),
            ClusterAssignment {
                cluster_id,
                cluster_membership_prob: cluster_prob,
                cluster_title,
                category_id,
                category_membership_prob: category_prob,
                category_title,
            },
        );
    }

    Ok(by_row.into_iter().collect())
}

fn top_k_examples(
    members: &[usize],
    keys: &[lilac_vector::VectorKey],
    assignments: &[(i32, f64)],
    texts: &HashMap<RowId, String>,
    top_k: usize,
) -> Vec<(String, f64)> {
    let mut scored: Vec<(String, f64)> = members
        .iter()
        .filter_map(|&i| texts.get(&keys[i].row_id).map(|t| (t.clone(), assignments[i].1)))
        .collect();
    // Shuffle first so ties at the same membership probability don't always
    // favor whichever row happened to be inserted first.
    scored.shuffle(&mut rand::thread_rng());
    scored.sort_by(|a, b| b.1.partial_cmp(&a.1).unwrap_or(std::cmp::Ordering::Equal));

    let mut seen = std::collections::HashSet::new();
    scored.retain(|(text, _)| seen.insert(text.clone()));
    scored.truncate(top_k.max(1));
    scored
}

fn centroid(members: &[usize], coords: &[Vec<f32>]) -> Vec<f32> {
    let dim = coords[0].len();
    let mut sum = vec![0.0f32; dim];
    for &i in members {
        for (d, value) in coords[i].iter().enumerate() {
            sum[d] += value;
        }
    }
    let n = members.len().max(1) as f32;
    sum.iter().map(|v| v / n).collect()
}

fn title_with_retry_categorizer(categorizer: &dyn Categorizer, groups: &[Vec<(String, f64)>], config: &RetryConfig) -> Vec<String> {
    struct Adapter<'a>(&'a dyn Categorizer);
    impl Titler for Adapter<'_> {
        fn title_batch(&self, groups: &[Vec<(String, f64)>], max_tokens: usize) -> Result<Vec<String>, crate::titler::TitlerError> {
            self.0.categorize_batch(groups, max_tokens)
        }
    }
    title_with_retry(&Adapter(categorizer), groups, config)
}

/// The schema fragment a completed cluster run contributes: a struct field
/// carrying the six `ClusterAssignment` members plus the `ClusterDescriptor`
/// provenance sidecar (spec.md §4.F step 6).
#[must_use]
pub fn cluster_output_field(config: &ClusterPipelineConfig, input_path: Path) -> Field {
    use lilac_core::DType;
    let mut fields = BTreeMap::new();
    fields.insert("cluster_id".to_string(), Field::leaf(DType::Int32));
    fields.insert("cluster_membership_prob".to_string(), Field::leaf(DType::Float32));
    fields.insert("cluster_title".to_string(), Field::leaf(DType::String));
    fields.insert("category_id".to_string(), Field::leaf(DType::Int32));
    fields.insert("category_membership_prob".to_string(), Field::leaf(DType::Float32));
    fields.insert("category_title".to_string(), Field::leaf(DType::String));
    Field::struct_(fields).with_cluster(ClusterDescriptor {
        min_cluster_size: config.min_cluster_size,
        input_path,
        remote: config.remote,
    })
}

/// Converts one row's assignment into the `Value::Struct` the lake store
/// expects from `add_column`.
#[must_use]
pub fn assignment_to_value(assignment: &ClusterAssignment) -> Value {
    let mut fields = BTreeMap::new();
    fields.insert("cluster_id".to_string(), Value::Int(i64::from(assignment.cluster_id)));
    fields.insert("cluster_membership_prob".to_string(), Value::Float(assignment.cluster_membership_prob));
    fields.insert("cluster_title".to_string(), Value::String(assignment.cluster_title.clone()));
    fields.insert("category_id".to_string(), Value::Int(i64::from(assignment.category_id)));
    fields.insert("category_membership_prob".to_string(), Value::Float(assignment.category_membership_prob));
    fields.insert("category_title".to_string(), Value::String(assignment.category_title.clone()));
    Value::Struct(fields)
}

#[cfg(test)]
mod tests {
    use super::*;
    use lilac_core::RowId;
    use lilac_vector::{HnswParams, VectorKey};

    struct StubTitler;
    impl Titler for StubTitler {
        fn title_batch(&self, groups: &[Vec<(String, f64)>], _max_tokens: usize) -> Result<Vec<String>, crate::titler::TitlerError> {
            Ok(groups.iter().map(|g| format!("cluster-of-{}", g.len())).collect())
        }
    }
    struct StubCategorizer;
    impl Categorizer for StubCategorizer {
        fn categorize_batch(&self, groups: &[Vec<(String, f64)>], _max_tokens: usize) -> Result<Vec<String>, crate::titler::TitlerError> {
            Ok(groups.iter().map(|g| format!("category-of-{}", g.len())).collect())
        }
    }

    #[test]
    fn assigns_every_row_a_cluster_and_category() {
        let mut index = VectorIndex::new(2, HnswParams::default());
        let keys: Vec<VectorKey> = (0..6).map(|i| VectorKey::whole_value(RowId::from(format!("r{i}")))).collect();
        let vectors = vec![
            vec![0.0, 0.0],
            vec![0.1, 0.1],
            vec![0.0, 0.1],
            vec![10.0, 10.0],
            vec![10.1, 10.1],
            vec![10.0, 10.1],
        ];
        index.add(keys.clone(), vectors).unwrap();

        let mut texts = HashMap::new();
        for (i, key) in keys.iter().enumerate() {
            texts.insert(key.row_id.clone(), format!("text {i}"));
        }

        let config = ClusterPipelineConfig {
            min_cluster_size: 2,
            n_components: 2,
            top_k_examples: 10,
            remote: false,
        };
        let result = run(&index, &texts, &StubTitler, &StubCategorizer, &config).unwrap();
        assert_eq!(result.len(), 6);
        for (_, assignment) in &result {
            assert_ne!(assignment.cluster_id, NOISE_CLUSTER_ID);
            assert!(!assignment.cluster_title.is_empty());
            assert!(!assignment.category_title.is_empty());
        }
    }

    #[test]
    fn empty_index_produces_no_assignments() {
        let index = VectorIndex::new(2, HnswParams::default());
        let texts = HashMap::new();
        let config = ClusterPipelineConfig::default();
        let result = run(&index, &texts, &StubTitler, &StubCategorizer, &config).unwrap();
        assert!(result.is_empty());
    }
}
