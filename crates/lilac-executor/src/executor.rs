//! Shard, batch, compute, write: the enrichment run loop (spec.md §4.E).
//!
//! Grounded on `lilac-core::flatten`'s own module docs, which describe
//! exactly this pipeline; this crate supplies the missing pieces flatten.rs
//! names but doesn't implement itself: reading from the store (through any
//! wildcard nesting in the input path), batching at `local_batch_size`,
//! sharding across `local_parallelism` shards run per the signal's
//! `execution_kind`, calling a signal's `compute`, and writing the result
//! back as a new column.
//!
//! Scope note: `LakeStore::add_column` writes a single top-level struct
//! field, so an enrichment's *output* always lands as a fresh top-level
//! column (mirroring `default_output_path`'s naming) even when its *input*
//! path walks through a `Wildcard` — the output column's own schema is
//! wrapped in the matching `repeated_field` nesting by
//! `create_enrichment_schema`, so the ragged shape survives, just not nested
//! back under the original struct. Writing a sibling field at an arbitrary
//! nesting depth would need `add_column` to merge below the schema root;
//! that generalization is noted here rather than built speculatively (see
//! DESIGN.md).

use std::sync::atomic::Ordering;
use std::sync::Arc;

use lilac_core::flatten::{batched, flatten, unflatten, Trail};
use lilac_core::{Field, Path, PathComponent, RowId, SignalDescriptor, Value};
use lilac_lake::{LakeError, LakeStore};
use lilac_schema::create_enrichment_schema;
use lilac_signals::{EmbeddingSignal, ExecutionKind, ModelSignal, SignalMeta, SignalRegistry, SplitterSignal, TextSignal};
use lilac_tasks::TaskManager;
use lilac_vector::{chunks_to_matrix, VectorIndex, VectorKey};

use crate::dag::resolve_model_dependencies;
use crate::error::ExecutorError;

/// One enrichment invocation: a signal applied to a dataset's `input_path`.
pub struct EnrichmentRequest<'a> {
    pub input_path: Path,
    pub output_path: Option<Path>,
    pub overwrite: bool,
    pub task_manager: Option<&'a TaskManager>,
}

impl<'a> EnrichmentRequest<'a> {
    #[must_use]
    pub fn new(input_path: Path) -> Self {
        Self {
            input_path,
            output_path: None,
            overwrite: false,
            task_manager: None,
        }
    }

    #[must_use]
    pub fn with_overwrite(mut self, overwrite: bool) -> Self {
        self.overwrite = overwrite;
        self
    }

    #[must_use]
    pub fn with_task_manager(mut self, manager: &'a TaskManager) -> Self {
        self.task_manager = Some(manager);
        self
    }
}

/// What a `run_*` call produced: the column it wrote, plus any per-shard
/// read errors the underlying store surfaced along the way. A corrupt shard
/// is isolated to the rows it held — the run still completes over the rest
/// (spec.md §4.B "Failure", §7 "isolated to the shard; the enclosing
/// operation continues and reports the error set in the task record").
#[derive(Debug)]
pub struct EnrichmentOutcome {
    pub output_path: Path,
    pub errors: Vec<LakeError>,
}

fn root_name(path: &Path) -> Result<&str, ExecutorError> {
    match path.as_slice() {
        [PathComponent::Name(name)] => Ok(name.as_str()),
        _ => Err(ExecutorError::UnknownPath(path.to_string())),
    }
}

fn top_level_name(path: &Path) -> Result<&str, ExecutorError> {
    match path.as_slice().first() {
        Some(PathComponent::Name(name)) => Ok(name.as_str()),
        _ => Err(ExecutorError::UnknownPath(path.to_string())),
    }
}

pub(crate) fn default_output_path(input_path: &Path, signal_name: &str) -> Path {
    let leaf = input_path.leaf_name().unwrap_or("value");
    Path::new(vec![PathComponent::Name(format!("{leaf}__{signal_name}"))])
}

/// Looks up an existing top-level field's `SignalDescriptor`, if any — used
/// for the idempotence check (spec.md §4.E step 6).
fn existing_descriptor(schema: &Field, output_name: &str) -> Option<SignalDescriptor> {
    schema.fields.as_ref()?.get(output_name)?.signal.clone()
}

fn is_same_run(existing: &SignalDescriptor, signal_name: &str, signal_args: &serde_json::Value) -> bool {
    existing.signal_name == signal_name && &existing.signal_args == signal_args
}

fn should_skip(store: &LakeStore, output_path: &Path, overwrite: bool, signal_name: &str, signal_args: &serde_json::Value) -> bool {
    if overwrite {
        return false;
    }
    let Ok(name) = root_name(output_path) else {
        return false;
    };
    existing_descriptor(&store.manifest().schema, name)
        .is_some_and(|d| is_same_run(&d, signal_name, signal_args))
}

/// Walks `components` into `value`, collecting every element at a
/// `Wildcard` level into its own `Repeated` (spec.md §4.E step 3). Missing
/// data at any step becomes `Value::Absent` rather than an error — a
/// per-row hole, not a schema problem (the schema-level check already ran
/// in `read_input_values`).
fn extract_at_path(value: &Value, components: &[PathComponent]) -> Value {
    match components.split_first() {
        None => value.clone(),
        Some((PathComponent::Name(name), rest)) => match value {
            Value::Struct(fields) => fields.get(name).map_or(Value::Absent, |v| extract_at_path(v, rest)),
            _ => Value::Absent,
        },
        Some((PathComponent::Wildcard, rest)) => match value {
            Value::Repeated(items) => Value::Repeated(items.iter().map(|item| extract_at_path(item, rest)).collect()),
            _ => Value::Absent,
        },
        Some((PathComponent::Index(i), rest)) => match value {
            Value::Repeated(items) => items.get(*i).map_or(Value::Absent, |v| extract_at_path(v, rest)),
            _ => Value::Absent,
        },
    }
}

/// Reads every row's value at `input_path`, walking through any `Wildcard`
/// components so the result is ready for `flatten` regardless of nesting
/// depth. Rows whose top-level field is entirely absent are dropped; a
/// per-row hole *inside* a wildcard list becomes `Value::Absent` leaves
/// instead, since the row itself is still present.
///
/// # Errors
///
/// Returns `ExecutorError::UnknownPath` if `input_path` isn't present in
/// the dataset's current schema.
fn read_input_values(store: &LakeStore, input_path: &Path) -> Result<(Vec<(RowId, Value)>, Vec<LakeError>), ExecutorError> {
    let top = top_level_name(input_path)?;
    if !lilac_schema::contains_path(&store.manifest().schema, input_path) {
        return Err(ExecutorError::UnknownPath(input_path.to_string()));
    }
    let (rows, errors) = store.iter_rows(&[], None);
    let rest = &input_path.as_slice()[1..];
    let values = rows
        .into_iter()
        .filter_map(|(id, mut fields)| {
            let root = fields.remove(top)?;
            Some((id, extract_at_path(&root, rest)))
        })
        .collect();
    Ok((values, errors))
}

fn check_cancelled(task_manager: Option<&TaskManager>, task_id: &str) -> Result<(), ExecutorError> {
    if let Some(manager) = task_manager {
        if let Some(flag) = manager.cancellation_flag(task_id) {
            if flag.load(Ordering::SeqCst) {
                return Err(ExecutorError::Cancelled);
            }
        }
    }
    Ok(())
}

/// Splits `rows` into up to `parallelism` contiguous, roughly-even shards
/// (spec.md §4.E step 4 "shards within a signal run in parallel"). Never
/// produces more shards than rows, and always produces at least one (even
/// empty) shard so callers can still report a single completed task.
fn shard_rows<T>(rows: Vec<T>, parallelism: usize) -> Vec<Vec<T>> {
    if rows.is_empty() {
        return vec![Vec::new()];
    }
    let shard_count = parallelism.max(1).min(rows.len());
    let shard_size = rows.len().div_ceil(shard_count);
    let mut shards = Vec::with_capacity(shard_count);
    let mut iter = rows.into_iter();
    loop {
        let chunk: Vec<T> = (&mut iter).take(shard_size).collect();
        if chunk.is_empty() {
            break;
        }
        shards.push(chunk);
    }
    shards
}

/// Flattens every row in a shard into one leaf-ordered text batch plus each
/// row's `Trail`, so the shard's rows can be computed as a single stream of
/// batches (spec.md §4.E step 3's flatten half).
fn flatten_shard(shard: Vec<(RowId, Value)>) -> (Vec<String>, Vec<(RowId, Trail, usize)>) {
    let mut texts = Vec::new();
    let mut layout = Vec::with_capacity(shard.len());
    for (row_id, value) in shard {
        let (leaves, trail) = flatten(&value);
        let count = leaves.len();
        for leaf in leaves {
            texts.push(match leaf {
                Value::String(s) => s,
                _ => String::new(),
            });
        }
        layout.push((row_id, trail, count));
    }
    (texts, layout)
}

/// Rebuilds each row's nested output shape from a shard's flat result
/// stream, using the `Trail`s `flatten_shard` saved (spec.md §4.E step 3's
/// unflatten half).
fn unflatten_shard(layout: Vec<(RowId, Trail, usize)>, results: Vec<Value>) -> Vec<(RowId, Value)> {
    let mut outputs = Vec::with_capacity(layout.len());
    let mut cursor = 0;
    for (row_id, trail, count) in layout {
        let slice = &results[cursor..cursor + count];
        cursor += count;
        outputs.push((row_id, unflatten(slice, &trail)));
    }
    outputs
}

/// Runs `per_shard` over every shard, in parallel, honoring `execution_kind`
/// (spec.md §4.E step 4, §5 "Concurrency & Resource Model"): `Threads` uses
/// a `rayon` parallel iterator; `Processes` is approximated with a scoped
/// `std::thread` per shard and an `mpsc` channel to collect results in shard
/// order, the same approximation `lilac-tasks::TaskManager` already makes
/// for its own `process_pool` (see that module's docs and DESIGN.md).
fn execute_shards<F>(shards: Vec<Vec<(RowId, Value)>>, execution_kind: ExecutionKind, per_shard: F) -> Result<Vec<(RowId, Value)>, ExecutorError>
where
    F: Fn(usize, Vec<(RowId, Value)>) -> Result<Vec<(RowId, Value)>, ExecutorError> + Sync,
{
    match execution_kind {
        ExecutionKind::Threads => {
            use rayon::prelude::*;
            let results: Vec<Result<Vec<(RowId, Value)>, ExecutorError>> =
                shards.into_par_iter().enumerate().map(|(i, shard)| per_shard(i, shard)).collect();
            let mut out = Vec::new();
            for result in results {
                out.extend(result?);
            }
            Ok(out)
        }
        ExecutionKind::Processes => {
            let (tx, rx) = std::sync::mpsc::channel();
            std::thread::scope(|scope| {
                for (i, shard) in shards.into_iter().enumerate() {
                    let tx = tx.clone();
                    let per_shard = &per_shard;
                    scope.spawn(move || {
                        let result = per_shard(i, shard);
                        tx.send((i, result)).expect("executor result channel receiver dropped");
                    });
                }
                drop(tx);
                let mut collected: Vec<(usize, Result<Vec<(RowId, Value)>, ExecutorError>)> = rx.iter().collect();
                collected.sort_by_key(|(i, _)| *i);
                let mut out = Vec::new();
                for (_, result) in collected {
                    out.extend(result?);
                }
                Ok(out)
            })
        }
    }
}

/// Runs a `TextSignal` over `request.input_path`, writing its output as a
/// new top-level column (spec.md §4.E steps 2-6).
///
/// # Errors
///
/// Returns `ExecutorError::UnknownPath` if `input_path` isn't present in
/// the schema, or a lake/schema error from the write.
pub fn run_text_signal(store: &mut LakeStore, signal: &dyn TextSignal, request: &EnrichmentRequest) -> Result<EnrichmentOutcome, ExecutorError> {
    let output_path = request.output_path.clone().unwrap_or_else(|| default_output_path(&request.input_path, signal.name()));
    let signal_args = signal.signal_args();
    if should_skip(store, &output_path, request.overwrite, signal.name(), &signal_args) {
        tracing::debug!(signal = signal.name(), "skipping — already enriched with same signal_args");
        return Ok(EnrichmentOutcome { output_path, errors: Vec::new() });
    }

    let (rows, errors) = read_input_values(store, &request.input_path)?;
    let batch_size = signal.local_batch_size().max(1);
    let shards = shard_rows(rows, signal.local_parallelism());
    let shard_ids: Vec<String> = (0..shards.len()).map(|i| format!("shard-{i}")).collect();
    let task_id = request.task_manager.map(|m| m.start_task(signal.name(), "text", &shard_ids));

    let outputs = execute_shards(shards, signal.execution_kind(), |shard_index, shard_rows| {
        let shard_id = &shard_ids[shard_index];
        let (texts, layout) = flatten_shard(shard_rows);
        let mut results: Vec<Value> = Vec::with_capacity(texts.len());
        for batch in batched(&texts, batch_size) {
            if let Some(task_id) = &task_id {
                check_cancelled(request.task_manager, task_id)?;
            }
            results.extend(signal.compute(&batch));
            if let (Some(manager), Some(task_id)) = (request.task_manager, &task_id) {
                manager.report_progress(task_id, shard_id, results.len() as u64, texts.len() as u64).ok();
            }
        }
        if let (Some(manager), Some(task_id)) = (request.task_manager, &task_id) {
            manager.complete_shard(task_id, shard_id).ok();
        }
        Ok(unflatten_shard(layout, results))
    })?;

    let output_name = root_name(&output_path)?;
    let descriptor = SignalDescriptor {
        signal_name: signal.name().to_string(),
        signal_args,
    };
    let output_field = create_enrichment_schema(signal.fields(), &request.input_path, descriptor);
    store.add_column(output_name, outputs, output_field)?;
    Ok(EnrichmentOutcome { output_path, errors })
}

/// Runs a `SplitterSignal` over `request.input_path`, writing a repeated
/// span column.
///
/// # Errors
///
/// See [`run_text_signal`].
pub fn run_splitter_signal(store: &mut LakeStore, signal: &dyn SplitterSignal, request: &EnrichmentRequest) -> Result<EnrichmentOutcome, ExecutorError> {
    let output_path = request.output_path.clone().unwrap_or_else(|| default_output_path(&request.input_path, signal.name()));
    let signal_args = signal.signal_args();
    if should_skip(store, &output_path, request.overwrite, signal.name(), &signal_args) {
        return Ok(EnrichmentOutcome { output_path, errors: Vec::new() });
    }

    let (rows, errors) = read_input_values(store, &request.input_path)?;
    let batch_size = signal.local_batch_size().max(1);
    let shards = shard_rows(rows, signal.local_parallelism());
    let shard_ids: Vec<String> = (0..shards.len()).map(|i| format!("shard-{i}")).collect();
    let task_id = request.task_manager.map(|m| m.start_task(signal.name(), "splitter", &shard_ids));

    let outputs = execute_shards(shards, signal.execution_kind(), |shard_index, shard_rows| {
        let shard_id = &shard_ids[shard_index];
        let (texts, layout) = flatten_shard(shard_rows);
        let mut results: Vec<Value> = Vec::with_capacity(texts.len());
        for batch in batched(&texts, batch_size) {
            if let Some(task_id) = &task_id {
                check_cancelled(request.task_manager, task_id)?;
            }
            let spans = signal.compute(&batch);
            results.extend(spans.into_iter().map(|spans| Value::Repeated(spans.into_iter().map(Value::Span).collect())));
            if let (Some(manager), Some(task_id)) = (request.task_manager, &task_id) {
                manager.report_progress(task_id, shard_id, results.len() as u64, texts.len() as u64).ok();
            }
        }
        if let (Some(manager), Some(task_id)) = (request.task_manager, &task_id) {
            manager.complete_shard(task_id, shard_id).ok();
        }
        Ok(unflatten_shard(layout, results))
    })?;

    let output_name = root_name(&output_path)?;
    let descriptor = SignalDescriptor {
        signal_name: signal.name().to_string(),
        signal_args,
    };
    let output_field = create_enrichment_schema(signal.fields(), &request.input_path, descriptor);
    store.add_column(output_name, outputs, output_field)?;
    Ok(EnrichmentOutcome { output_path, errors })
}

/// Runs an `EmbeddingSignal` over `request.input_path`, writing the chunked
/// embedding column via 4.B *and* populating `index` via 4.C (spec.md §4.E
/// step 3 "For embedding signals, also emit (key, vector) pairs into 4.C").
///
/// The vector index is rebuilt wholesale rather than upserted in place
/// (spec.md §9's "Open question — upsert into the ANN index", resolved by
/// `VectorIndex::rebuild`'s blue-green swap) — existing vectors not touched
/// by this run are carried forward unchanged.
///
/// # Errors
///
/// See [`run_text_signal`]; also propagates `VectorError` from the rebuild.
pub fn run_embedding_signal(
    store: &mut LakeStore,
    index: &mut VectorIndex,
    signal: &dyn EmbeddingSignal,
    request: &EnrichmentRequest,
) -> Result<EnrichmentOutcome, ExecutorError> {
    let output_path = request.output_path.clone().unwrap_or_else(|| default_output_path(&request.input_path, signal.name()));
    let signal_args = signal.signal_args();
    if should_skip(store, &output_path, request.overwrite, signal.name(), &signal_args) {
        return Ok(EnrichmentOutcome { output_path, errors: Vec::new() });
    }

    let (rows, errors) = read_input_values(store, &request.input_path)?;
    let batch_size = signal.local_batch_size().max(1);
    let shards = shard_rows(rows, signal.local_parallelism());
    let shard_ids: Vec<String> = (0..shards.len()).map(|i| format!("shard-{i}")).collect();
    let task_id = request.task_manager.map(|m| m.start_task(signal.name(), "embedding", &shard_ids));

    let outputs = execute_shards(shards, signal.execution_kind(), |shard_index, shard_rows| {
        let shard_id = &shard_ids[shard_index];
        let (texts, layout) = flatten_shard(shard_rows);
        let mut results: Vec<Value> = Vec::with_capacity(texts.len());
        for batch in batched(&texts, batch_size) {
            if let Some(task_id) = &task_id {
                check_cancelled(request.task_manager, task_id)?;
            }
            let chunks = signal.compute(&batch);
            results.extend(chunks.into_iter().map(Value::Embedding));
            if let (Some(manager), Some(task_id)) = (request.task_manager, &task_id) {
                manager.report_progress(task_id, shard_id, results.len() as u64, texts.len() as u64).ok();
            }
        }
        if let (Some(manager), Some(task_id)) = (request.task_manager, &task_id) {
            manager.complete_shard(task_id, shard_id).ok();
        }
        Ok(unflatten_shard(layout, results))
    })?;

    let mut new_keys: Vec<VectorKey> = Vec::new();
    let mut new_vectors: Vec<Vec<f32>> = Vec::new();
    for (row_id, value) in &outputs {
        let (leaves, _) = flatten(value);
        for (leaf_index, leaf) in leaves.iter().enumerate() {
            if let Value::Embedding(chunks) = leaf {
                let base = new_keys.len();
                new_keys.extend((0..chunks.len()).map(|chunk_index| VectorKey::new(row_id.clone(), vec![leaf_index], chunk_index)));
                new_vectors.extend(chunks_to_matrix(chunks));
                debug_assert_eq!(new_keys.len() - base, chunks.len());
            }
        }
    }

    // Carry forward vectors from rows this run didn't touch.
    let touched: std::collections::HashSet<&RowId> = new_keys.iter().map(|k| &k.row_id).collect();
    let mut all_keys = new_keys;
    let mut all_vectors = new_vectors;
    for key in index.keys() {
        if !touched.contains(&key.row_id) {
            if let [Some(vector)] = index.get(std::slice::from_ref(key)).as_slice() {
                all_keys.push(key.clone());
                all_vectors.push(vector.clone());
            }
        }
    }
    if !all_keys.is_empty() {
        *index = VectorIndex::rebuild(index.dim(), lilac_vector::HnswParams::default(), all_keys, all_vectors)?;
    }

    let output_name = root_name(&output_path)?;
    let descriptor = SignalDescriptor {
        signal_name: signal.name().to_string(),
        signal_args,
    };
    let output_field = create_enrichment_schema(signal.fields(), &request.input_path, descriptor);
    store.add_column(output_name, outputs, output_field)?;
    Ok(EnrichmentOutcome { output_path, errors })
}

/// Runs a `ModelSignal` over vectors in `index`, first auto-scheduling its
/// embedding dependency (and that embedding's own splitter dependency, if
/// any) over `request.input_path` when the embedding's output column isn't
/// already present (spec.md §4.E step 1).
///
/// # Errors
///
/// Returns `ExecutorError::DependencyCycle` or `ExecutorError::Signal` if
/// the dependency chain can't be resolved; otherwise see
/// [`run_text_signal`].
pub fn run_model_signal(
    store: &mut LakeStore,
    index: &mut VectorIndex,
    registry: &SignalRegistry,
    signal: &dyn ModelSignal,
    request: &EnrichmentRequest,
) -> Result<EnrichmentOutcome, ExecutorError> {
    let output_path = request.output_path.clone().unwrap_or_else(|| default_output_path(&request.input_path, signal.name()));
    let signal_args = signal.signal_args();
    if should_skip(store, &output_path, request.overwrite, signal.name(), &signal_args) {
        return Ok(EnrichmentOutcome { output_path, errors: Vec::new() });
    }

    let errors = resolve_model_dependencies(store, index, registry, signal, request)?;

    let keys = index.keys().to_vec();
    let values = signal.vector_compute(&keys, index);
    let outputs: Vec<(RowId, Value)> = keys.into_iter().map(|k| k.row_id).zip(values).collect();

    let output_name = root_name(&output_path)?;
    let descriptor = SignalDescriptor {
        signal_name: signal.name().to_string(),
        signal_args,
    };
    let output_field = create_enrichment_schema(signal.fields(), &request.input_path, descriptor);
    store.add_column(output_name, outputs, output_field)?;
    Ok(EnrichmentOutcome { output_path, errors })
}

/// Thin facade bundling a store with the task manager its runs report
/// progress into.
pub struct Executor {
    pub task_manager: Arc<TaskManager>,
}

impl Executor {
    #[must_use]
    pub fn new(task_manager: Arc<TaskManager>) -> Self {
        Self { task_manager }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use lilac_core::{normalize_path, DType};
    use lilac_lake::SourceDescriptor;
    use lilac_signals::TextStatisticsSignal;
    use std::collections::BTreeMap as Map;

    fn source() -> SourceDescriptor {
        SourceDescriptor {
            name: "test".into(),
            config: serde_json::json!({}),
        }
    }

    fn text_schema() -> Field {
        let mut fields = Map::new();
        fields.insert("text".to_string(), Field::leaf(DType::String));
        Field::struct_(fields)
    }

    fn paragraphs_schema() -> Field {
        let mut text_field = Map::new();
        text_field.insert("text".to_string(), Field::leaf(DType::String));
        let mut fields = Map::new();
        fields.insert("paragraphs".to_string(), Field::repeated(Field::struct_(text_field)));
        Field::struct_(fields)
    }

    #[test]
    fn text_signal_writes_enrichment_column() {
        let dir = tempfile::tempdir().unwrap();
        let mut store = LakeStore::create(dir.path(), text_schema(), source()).unwrap();
        let mut row = Map::new();
        row.insert("text".to_string(), Value::String("hello world".into()));
        store.append(vec![(RowId::from("r0"), row)], &text_schema()).unwrap();

        let signal = TextStatisticsSignal;
        let request = EnrichmentRequest::new(normalize_path("text"));
        let outcome = run_text_signal(&mut store, &signal, &request).unwrap();

        assert_eq!(outcome.output_path.to_string(), "text__text_statistics");
        assert!(outcome.errors.is_empty());
        let (rows, _) = store.iter_rows(&[], None);
        let Some(Value::Struct(fields)) = rows[0].1.get("text__text_statistics") else {
            panic!("expected struct enrichment column");
        };
        assert_eq!(fields.get("num_words"), Some(&Value::Int(2)));
    }

    #[test]
    fn idempotent_rerun_without_overwrite_is_noop() {
        let dir = tempfile::tempdir().unwrap();
        let mut store = LakeStore::create(dir.path(), text_schema(), source()).unwrap();
        let mut row = Map::new();
        row.insert("text".to_string(), Value::String("hi".into()));
        store.append(vec![(RowId::from("r0"), row)], &text_schema()).unwrap();

        let signal = TextStatisticsSignal;
        let request = EnrichmentRequest::new(normalize_path("text"));
        run_text_signal(&mut store, &signal, &request).unwrap();
        let shard_count_after_first = store.manifest().shards.len();

        run_text_signal(&mut store, &signal, &request).unwrap();
        assert_eq!(store.manifest().shards.len(), shard_count_after_first, "rerun should not write a new shard");
    }

    #[test]
    fn wildcard_input_path_flattens_and_renests_ragged_rows() {
        let dir = tempfile::tempdir().unwrap();
        let mut store = LakeStore::create(dir.path(), paragraphs_schema(), source()).unwrap();

        let mut paragraph = |text: &str| {
            let mut fields = Map::new();
            fields.insert("text".to_string(), Value::String(text.to_string()));
            Value::Struct(fields)
        };
        let mut row0 = Map::new();
        row0.insert("paragraphs".to_string(), Value::Repeated(vec![paragraph("one two"), paragraph("three four five")]));
        let mut row1 = Map::new();
        row1.insert("paragraphs".to_string(), Value::Repeated(vec![paragraph("six")]));
        store.append(vec![(RowId::from("r0"), row0), (RowId::from("r1"), row1)], &paragraphs_schema()).unwrap();

        let signal = TextStatisticsSignal;
        let request = EnrichmentRequest::new(normalize_path("paragraphs.*.text"));
        let outcome = run_text_signal(&mut store, &signal, &request).unwrap();

        let (rows, _) = store.iter_rows(&[], None);
        let row0 = rows.iter().find(|(id, _)| id == &RowId::from("r0")).unwrap();
        let Some(Value::Repeated(items)) = row0.1.get(outcome.output_path.to_string().as_str()) else {
            panic!("expected a repeated enrichment column matching the wildcard's ragged shape");
        };
        assert_eq!(items.len(), 2);
        let Value::Struct(first) = &items[0] else { panic!("expected struct leaf") };
        assert_eq!(first.get("num_words"), Some(&Value::Int(2)));
    }

    #[test]
    fn multiple_shards_still_cover_every_row() {
        let dir = tempfile::tempdir().unwrap();
        let mut store = LakeStore::create(dir.path(), text_schema(), source()).unwrap();
        let rows: Vec<_> = (0..10)
            .map(|i| {
                let mut row = Map::new();
                row.insert("text".to_string(), Value::String(format!("word{i}")));
                (RowId::from(format!("r{i}").as_str()), row)
            })
            .collect();
        store.append(rows, &text_schema()).unwrap();

        struct ParallelTextStatistics;
        impl SignalMeta for ParallelTextStatistics {
            fn name(&self) -> &str {
                "parallel_text_statistics"
            }
            fn input_type(&self) -> lilac_signals::InputType {
                lilac_signals::InputType::Text
            }
            fn local_parallelism(&self) -> usize {
                4
            }
            fn fields(&self) -> Field {
                Field::leaf(DType::Int32)
            }
        }
        impl TextSignal for ParallelTextStatistics {
            fn compute(&self, batch: &[String]) -> Vec<Value> {
                batch.iter().map(|t| Value::Int(t.len() as i64)).collect()
            }
        }

        let signal = ParallelTextStatistics;
        let request = EnrichmentRequest::new(normalize_path("text"));
        let outcome = run_text_signal(&mut store, &signal, &request).unwrap();

        let (rows, _) = store.iter_rows(&[], None);
        let output_name = outcome.output_path.to_string();
        assert_eq!(rows.iter().filter(|(_, v)| v.contains_key(&output_name)).count(), 10);
    }
}
