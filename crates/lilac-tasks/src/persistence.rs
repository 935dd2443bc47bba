//! Converts between `TaskInfo` and `lilac-db`'s storage-agnostic
//! `TaskRecord`, and offers manifest-wide save/restore helpers so task
//! history survives a process restart (spec.md §6 "`lilac-db`... used
//! only by `lilac-tasks`...").

use lilac_db::{LilacDb, TaskRecord};

use crate::error::TaskError;
use crate::manager::TaskManager;
use crate::task::{TaskInfo, TaskStatus};

fn status_to_string(status: TaskStatus) -> String {
    match serde_json::to_value(status) {
        Ok(serde_json::Value::String(s)) => s,
        _ => unreachable!("TaskStatus always serializes to a string"),
    }
}

fn string_to_status(s: &str) -> Result<TaskStatus, TaskError> {
    serde_json::from_value(serde_json::Value::String(s.to_string())).map_err(|e| TaskError::Persistence(format!("unknown task status '{s}': {e}")))
}

fn to_record(info: &TaskInfo) -> Result<TaskRecord, TaskError> {
    let shards = serde_json::to_value(&info.shards).map_err(|e| TaskError::Persistence(e.to_string()))?;
    Ok(TaskRecord {
        id: info.id.clone(),
        name: info.name.clone(),
        task_type: info.task_type.clone(),
        status: status_to_string(info.status),
        progress: info.progress,
        shards,
        start_ts: info.start_ts,
        end_ts: info.end_ts,
        error: info.error.clone(),
    })
}

fn from_record(record: TaskRecord) -> Result<TaskInfo, TaskError> {
    let shards = serde_json::from_value(record.shards).map_err(|e| TaskError::Persistence(e.to_string()))?;
    Ok(TaskInfo {
        id: record.id,
        name: record.name,
        task_type: record.task_type,
        status: string_to_status(&record.status)?,
        progress: record.progress,
        shards,
        start_ts: record.start_ts,
        end_ts: record.end_ts,
        error: record.error,
    })
}

impl TaskManager {
    /// Persists every task's current snapshot. A point-in-time dump, not a
    /// subscription — call it after a run completes, or periodically for a
    /// long-running one.
    ///
    /// # Errors
    ///
    /// Returns `TaskError::Persistence` if a snapshot fails to convert or
    /// write.
    pub async fn persist_manifest(&self, db: &LilacDb) -> Result<(), TaskError> {
        for info in self.manifest().tasks.into_values() {
            let record = to_record(&info)?;
            db.upsert_task(&record).await.map_err(|e| TaskError::Persistence(e.to_string()))?;
        }
        Ok(())
    }
}

/// Loads every task record persisted by a prior process, for historical
/// inspection. A restored task is never resumed — its thread/process pool
/// is gone along with the process that owned it — only reported.
///
/// # Errors
///
/// Returns `TaskError::Persistence` if a stored record doesn't convert back
/// to a `TaskInfo`.
pub async fn load_task_history(db: &LilacDb) -> Result<Vec<TaskInfo>, TaskError> {
    let records = db.load_all_tasks().await.map_err(|e| TaskError::Persistence(e.to_string()))?;
    records.into_iter().map(from_record).collect()
}
