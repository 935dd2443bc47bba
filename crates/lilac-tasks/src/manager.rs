//! `TaskManager`: owns a thread pool and a process pool, shards tasks
//! across them, and aggregates progress into a process-safe map (spec.md
//! §4.I).
//!
//! Generalizes a terminal-bound spinner/bar into a process-safe registry
//! multiple concurrent shards report into. "Processes" is approximated
//! with a second, dedicated `rayon` thread pool rather than true
//! multiprocessing — see DESIGN.md for why a faithful IPC layer was judged
//! out of scope.

use std::collections::HashMap;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;

use chrono::Utc;
use serde::Serialize;
use uuid::Uuid;

use crate::error::TaskError;
use crate::task::{ShardProgress, TaskInfo, TaskStatus};

/// Read-only snapshot of every task plus an overall progress figure
/// (spec.md §6 "Task manifest").
#[derive(Debug, Clone, Serialize)]
pub struct TaskManifest {
    pub tasks: HashMap<String, TaskInfo>,
    pub progress: f64,
}

struct TaskState {
    info: TaskInfo,
    cancel: Arc<AtomicBool>,
}

/// Coordinates background work. One `TaskManager` is constructed per
/// executor/cluster-pipeline run and shared by the shards it dispatches.
pub struct TaskManager {
    tasks: Mutex<HashMap<String, TaskState>>,
    thread_pool: rayon::ThreadPool,
    process_pool: rayon::ThreadPool,
}

impl TaskManager {
    /// # Errors
    ///
    /// Returns `TaskError` (via a panic-free build) if either `rayon`
    /// thread pool fails to construct.
    pub fn new(thread_workers: usize, process_workers: usize) -> Result<Self, TaskError> {
        let thread_pool = rayon::ThreadPoolBuilder::new()
            .num_threads(thread_workers)
            .thread_name(|i| format!("lilac-threads-{i}"))
            .build()
            .map_err(|e| TaskError::ShardFailed {
                task: "<pool-init>".to_string(),
                shard: "threads".to_string(),
                message: e.to_string(),
            })?;
        let process_pool = rayon::ThreadPoolBuilder::new()
            .num_threads(process_workers)
            .thread_name(|i| format!("lilac-processes-{i}"))
            .build()
            .map_err(|e| TaskError::ShardFailed {
                task: "<pool-init>".to_string(),
                shard: "processes".to_string(),
                message: e.to_string(),
            })?;
        Ok(Self {
            tasks: Mutex::new(HashMap::new()),
            thread_pool,
            process_pool,
        })
    }

    /// Registers a new task with one pending shard per id in `shard_ids`.
    /// Returns the generated task id.
    #[must_use]
    pub fn start_task(&self, name: &str, task_type: &str, shard_ids: &[String]) -> String {
        let id = Uuid::new_v4().to_string();
        let mut info = TaskInfo::new(id.clone(), name.to_string(), task_type.to_string());
        for shard in shard_ids {
            info.shards.insert(shard.clone(), ShardProgress { current: 0, estimated: 0 });
        }
        let state = TaskState {
            info,
            cancel: Arc::new(AtomicBool::new(false)),
        };
        self.tasks.lock().expect("task map poisoned").insert(id.clone(), state);
        id
    }

    /// The cooperative cancellation flag a worker should poll between
    /// batches (spec.md §4.E step 5, §5 "Cancellation & timeouts").
    #[must_use]
    pub fn cancellation_flag(&self, task_id: &str) -> Option<Arc<AtomicBool>> {
        self.tasks.lock().expect("task map poisoned").get(task_id).map(|s| s.cancel.clone())
    }

    /// Runs `f` on the thread-kind pool (spec.md §5 "threads for I/O-bound
    /// or GIL-releasing numeric work").
    pub fn spawn_threads<F: FnOnce() + Send + 'static>(&self, f: F) {
        self.thread_pool.spawn(f);
    }

    /// Runs `f` on the process-kind pool (approximated — see module docs).
    pub fn spawn_processes<F: FnOnce() + Send + 'static>(&self, f: F) {
        self.process_pool.spawn(f);
    }

    /// Updates one shard's `(current, estimated)` counters.
    ///
    /// # Errors
    ///
    /// Returns `TaskError::NotFound` if `task_id` is unknown.
    pub fn report_progress(
        &self,
        task_id: &str,
        shard_id: &str,
        current: u64,
        estimated: u64,
    ) -> Result<(), TaskError> {
        let mut tasks = self.tasks.lock().expect("task map poisoned");
        let state = tasks.get_mut(task_id).ok_or_else(|| TaskError::NotFound(task_id.to_string()))?;
        state.info.shards.insert(shard_id.to_string(), ShardProgress { current, estimated });
        state.info.recompute_progress();
        Ok(())
    }

    /// Marks a shard complete. If every shard of a still-pending task is
    /// now complete, the task transitions to `Completed`. If the task has
    /// already errored, the shard's completion still bumps `end_ts` but
    /// never flips the status back (spec.md §4.I "subsequent shard
    /// completion still mutates the error task's end time but not its
    /// status").
    ///
    /// # Errors
    ///
    /// Returns `TaskError::NotFound` if `task_id` is unknown.
    pub fn complete_shard(&self, task_id: &str, shard_id: &str) -> Result<(), TaskError> {
        let mut tasks = self.tasks.lock().expect("task map poisoned");
        let state = tasks.get_mut(task_id).ok_or_else(|| TaskError::NotFound(task_id.to_string()))?;
        if let Some(progress) = state.info.shards.get_mut(shard_id) {
            progress.current = progress.estimated.max(progress.current).max(1);
            progress.estimated = progress.current;
        }
        state.info.recompute_progress();

        let all_done = state.info.shards.values().all(|p| p.fraction() >= 1.0);
        match state.info.status {
            TaskStatus::Pending if all_done => {
                state.info.status = TaskStatus::Completed;
                state.info.end_ts = Some(Utc::now());
            }
            TaskStatus::Error => {
                state.info.end_ts = Some(Utc::now());
            }
            _ => {}
        }
        Ok(())
    }

    /// Marks a task as errored, recording the worker's error message and
    /// setting the cancellation flag so sibling shards wind down.
    ///
    /// # Errors
    ///
    /// Returns `TaskError::NotFound` if `task_id` is unknown.
    pub fn fail(&self, task_id: &str, message: impl Into<String>) -> Result<(), TaskError> {
        let mut tasks = self.tasks.lock().expect("task map poisoned");
        let state = tasks.get_mut(task_id).ok_or_else(|| TaskError::NotFound(task_id.to_string()))?;
        state.info.status = TaskStatus::Error;
        state.info.error = Some(message.into());
        state.info.end_ts = Some(Utc::now());
        state.cancel.store(true, Ordering::SeqCst);
        Ok(())
    }

    /// Requests cooperative cancellation: sets the flag and marks the task
    /// `Error` with reason `cancelled` (spec.md §5 "A cancelled task
    /// transitions to error with reason cancelled").
    ///
    /// # Errors
    ///
    /// Returns `TaskError::NotFound` if `task_id` is unknown.
    pub fn stop(&self, task_id: &str) -> Result<(), TaskError> {
        self.fail(task_id, "cancelled")
    }

    /// A snapshot of every task plus the mean of their progress fractions.
    #[must_use]
    pub fn manifest(&self) -> TaskManifest {
        let tasks = self.tasks.lock().expect("task map poisoned");
        let infos: HashMap<String, TaskInfo> = tasks.iter().map(|(id, s)| (id.clone(), s.info.clone())).collect();
        let progress = if infos.is_empty() {
            1.0
        } else {
            infos.values().map(|t| t.progress).sum::<f64>() / infos.len() as f64
        };
        TaskManifest { tasks: infos, progress }
    }

    /// Blocks until every task in `ids` (or, if `None`, every currently
    /// known task) leaves `Pending`. Polls rather than parking on a
    /// condvar, since completions are reported from arbitrary worker
    /// threads via `report_progress`/`complete_shard`/`fail`.
    pub fn wait(&self, ids: Option<&[String]>) {
        loop {
            let done = {
                let tasks = self.tasks.lock().expect("task map poisoned");
                let targets: Vec<&TaskState> = match ids {
                    Some(ids) => ids.iter().filter_map(|id| tasks.get(id)).collect(),
                    None => tasks.values().collect(),
                };
                targets.iter().all(|s| s.info.status != TaskStatus::Pending)
            };
            if done {
                return;
            }
            std::thread::sleep(Duration::from_millis(20));
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn task_completes_when_all_shards_done() {
        let manager = TaskManager::new(1, 1).unwrap();
        let id = manager.start_task("embed", "signal", &["shard-0".to_string(), "shard-1".to_string()]);

        manager.report_progress(&id, "shard-0", 5, 10).unwrap();
        let manifest = manager.manifest();
        assert_eq!(manifest.tasks[&id].status, TaskStatus::Pending);

        manager.complete_shard(&id, "shard-0").unwrap();
        manager.complete_shard(&id, "shard-1").unwrap();
        let manifest = manager.manifest();
        assert_eq!(manifest.tasks[&id].status, TaskStatus::Completed);
        assert!(manifest.tasks[&id].end_ts.is_some());
    }

    #[test]
    fn fail_sets_error_status_and_cancellation_flag() {
        let manager = TaskManager::new(1, 1).unwrap();
        let id = manager.start_task("embed", "signal", &["shard-0".to_string()]);
        let flag = manager.cancellation_flag(&id).unwrap();
        assert!(!flag.load(Ordering::SeqCst));

        manager.fail(&id, "boom").unwrap();
        assert!(flag.load(Ordering::SeqCst));
        let manifest = manager.manifest();
        assert_eq!(manifest.tasks[&id].status, TaskStatus::Error);
        assert_eq!(manifest.tasks[&id].error.as_deref(), Some("boom"));
    }

    #[test]
    fn shard_completion_after_error_bumps_end_ts_not_status() {
        let manager = TaskManager::new(1, 1).unwrap();
        let id = manager.start_task("embed", "signal", &["shard-0".to_string(), "shard-1".to_string()]);
        manager.fail(&id, "boom").unwrap();
        let end_ts_at_failure = manager.manifest().tasks[&id].end_ts;

        std::thread::sleep(Duration::from_millis(5));
        manager.complete_shard(&id, "shard-1").unwrap();

        let manifest = manager.manifest();
        assert_eq!(manifest.tasks[&id].status, TaskStatus::Error);
        assert!(manifest.tasks[&id].end_ts > end_ts_at_failure);
    }

    #[test]
    fn wait_blocks_until_non_pending() {
        let manager = Arc::new(TaskManager::new(2, 1).unwrap());
        let id = manager.start_task("embed", "signal", &["shard-0".to_string()]);

        let bg_manager = manager.clone();
        let bg_id = id.clone();
        manager.spawn_threads(move || {
            std::thread::sleep(Duration::from_millis(10));
            bg_manager.complete_shard(&bg_id, "shard-0").unwrap();
        });

        manager.wait(Some(&[id.clone()]));
        assert_eq!(manager.manifest().tasks[&id].status, TaskStatus::Completed);
    }
}
