//! The task record (spec.md §4.I): `{id, name, type, status, progress,
//! shards, start_ts, end_ts, error?}`.

use std::collections::BTreeMap;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TaskStatus {
    Pending,
    Completed,
    Error,
}

/// One shard's progress: `current` out of an `estimated` total. `estimated`
/// is a hint, not a guarantee — a shard whose true length was unknown at
/// dispatch time reports its best guess and corrects it as it learns more.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct ShardProgress {
    pub current: u64,
    pub estimated: u64,
}

impl ShardProgress {
    #[must_use]
    pub const fn fraction(&self) -> f64 {
        if self.estimated == 0 {
            0.0
        } else {
            self.current as f64 / self.estimated as f64
        }
    }
}

/// A task's external, read-only snapshot.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TaskInfo {
    pub id: String,
    pub name: String,
    pub task_type: String,
    pub status: TaskStatus,
    /// Average of per-shard fractions (spec.md §4.I "aggregating progress
    /// averages shard fractions").
    pub progress: f64,
    pub shards: BTreeMap<String, ShardProgress>,
    pub start_ts: DateTime<Utc>,
    pub end_ts: Option<DateTime<Utc>>,
    pub error: Option<String>,
}

impl TaskInfo {
    pub(crate) fn new(id: String, name: String, task_type: String) -> Self {
        Self {
            id,
            name,
            task_type,
            status: TaskStatus::Pending,
            progress: 0.0,
            shards: BTreeMap::new(),
            start_ts: Utc::now(),
            end_ts: None,
            error: None,
        }
    }

    pub(crate) fn recompute_progress(&mut self) {
        if self.shards.is_empty() {
            return;
        }
        let total: f64 = self.shards.values().map(ShardProgress::fraction).sum();
        self.progress = total / self.shards.len() as f64;
    }
}
