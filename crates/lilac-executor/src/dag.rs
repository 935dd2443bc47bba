//! Dependency resolution for `ModelSignal` runs (spec.md §4.E step 1): "a
//! ModelSignal keyed by embedding name E" auto-schedules E, and E's own
//! splitter dependency if it declares one, before the model reads the
//! vector index. Builds an explicit DAG over the handful of signals a model
//! can depend on and topologically sorts it with a small DFS, the same
//! shape as any textbook dependency resolver, rather than hand-checking the
//! (splitter, embedding) pair as a special case — a third signal variant
//! gaining its own dependency later only needs a new `SignalNode` arm.

use std::collections::HashSet;

use lilac_lake::LakeError;
use lilac_signals::{ModelSignal, SignalRegistry};

use crate::error::ExecutorError;
use crate::executor::{default_output_path, run_embedding_signal, run_splitter_signal, EnrichmentRequest};

/// One signal in a model's dependency chain.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SignalNode {
    Splitter(String),
    Embedding(String),
}

impl SignalNode {
    fn key(&self) -> String {
        match self {
            Self::Splitter(name) => format!("splitter:{name}"),
            Self::Embedding(name) => format!("embedding:{name}"),
        }
    }
}

fn dependencies_of(node: &SignalNode, registry: &SignalRegistry) -> Result<Vec<SignalNode>, ExecutorError> {
    match node {
        SignalNode::Splitter(_) => Ok(Vec::new()),
        SignalNode::Embedding(name) => {
            let embedding = registry.get_embedding(name)?;
            Ok(embedding.splitter_name().map(|s| SignalNode::Splitter(s.to_string())).into_iter().collect())
        }
    }
}

/// Depth-first topological sort rooted at `root`: dependencies appear
/// before the nodes that need them. `visiting` tracks the current DFS
/// path; revisiting a node still on it is a cycle (spec.md §4.E step 1
/// "cycles are a configuration error").
fn topo_order(root: SignalNode, registry: &SignalRegistry) -> Result<Vec<SignalNode>, ExecutorError> {
    let mut order = Vec::new();
    let mut visited = HashSet::new();
    let mut visiting = Vec::new();
    visit(root, registry, &mut order, &mut visited, &mut visiting)?;
    Ok(order)
}

fn visit(
    node: SignalNode,
    registry: &SignalRegistry,
    order: &mut Vec<SignalNode>,
    visited: &mut HashSet<String>,
    visiting: &mut Vec<String>,
) -> Result<(), ExecutorError> {
    let key = node.key();
    if visiting.contains(&key) {
        let mut cycle = visiting.clone();
        cycle.push(key);
        return Err(ExecutorError::DependencyCycle(cycle));
    }
    if visited.contains(&key) {
        return Ok(());
    }
    visiting.push(key.clone());
    for dependency in dependencies_of(&node, registry)? {
        visit(dependency, registry, order, visited, visiting)?;
    }
    visiting.pop();
    visited.insert(key);
    order.push(node);
    Ok(())
}

/// Ensures `model`'s embedding (and that embedding's splitter, if any) has
/// already written its output column at `request.input_path` — running
/// whichever of the two is missing, in dependency order — before the
/// caller reads the vector index. A no-op when the embedding's column is
/// already present (spec.md §4.E "Idempotence" applies transitively here
/// too: a model run never re-embeds data that's already been embedded).
///
/// # Errors
///
/// Returns `ExecutorError::Signal` if the embedding or splitter name isn't
/// registered, `ExecutorError::DependencyCycle` if the chain cycles, or
/// any error the underlying `run_splitter_signal`/`run_embedding_signal`
/// calls raise.
pub(crate) fn resolve_model_dependencies(
    store: &mut lilac_lake::LakeStore,
    index: &mut lilac_vector::VectorIndex,
    registry: &SignalRegistry,
    model: &dyn ModelSignal,
    request: &EnrichmentRequest,
) -> Result<Vec<LakeError>, ExecutorError> {
    let embedding_name = model.embedding_name();
    let embedding_output_path = default_output_path(&request.input_path, embedding_name);
    if lilac_schema::contains_path(&store.manifest().schema, &embedding_output_path) {
        return Ok(Vec::new());
    }

    let order = topo_order(SignalNode::Embedding(embedding_name.to_string()), registry)?;

    let mut errors = Vec::new();
    for node in order {
        let dependency_request = EnrichmentRequest {
            input_path: request.input_path.clone(),
            output_path: None,
            overwrite: false,
            task_manager: request.task_manager,
        };
        match node {
            SignalNode::Splitter(name) => {
                let splitter = registry.get_splitter(&name)?;
                let outcome = run_splitter_signal(store, splitter.as_ref(), &dependency_request)?;
                errors.extend(outcome.errors);
            }
            SignalNode::Embedding(name) => {
                let embedding = registry.get_embedding(&name)?;
                let outcome = run_embedding_signal(store, index, embedding.as_ref(), &dependency_request)?;
                errors.extend(outcome.errors);
            }
        }
    }
    Ok(errors)
}
