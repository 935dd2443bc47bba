//! Task record persistence (spec.md §4.I, §6 "`lilac-db`... used only by
//! `lilac-tasks`"). `TaskRecord` is a plain mirror of `lilac-tasks::TaskInfo`
//! kept independent of that crate's types, so `lilac-tasks` can depend on
//! `lilac-db` without a cycle; the two shapes are kept in sync by the
//! caller's conversion code.

use libsql::params;
use serde_json::Value as JsonValue;

use crate::error::DatabaseError;
use crate::helpers::{get_opt_string, parse_datetime, parse_optional_datetime};
use crate::LilacDb;

#[derive(Debug, Clone, PartialEq)]
pub struct TaskRecord {
    pub id: String,
    pub name: String,
    pub task_type: String,
    /// `"pending"` | `"completed"` | `"error"`.
    pub status: String,
    pub progress: f64,
    /// JSON-encoded `{shard_id: {current, estimated}}` map.
    pub shards: JsonValue,
    pub start_ts: chrono::DateTime<chrono::Utc>,
    pub end_ts: Option<chrono::DateTime<chrono::Utc>>,
    pub error: Option<String>,
}

impl LilacDb {
    /// Inserts a task record, or overwrites it if `record.id` already exists
    /// (a task's persisted snapshot changes every time progress is reported).
    ///
    /// # Errors
    ///
    /// Returns `DatabaseError` on a SQL failure.
    pub async fn upsert_task(&self, record: &TaskRecord) -> Result<(), DatabaseError> {
        self.conn()
            .execute(
                "INSERT INTO tasks (id, name, task_type, status, progress, shards, start_ts, end_ts, error)
                 VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9)
                 ON CONFLICT(id) DO UPDATE SET
                   name = excluded.name,
                   task_type = excluded.task_type,
                   status = excluded.status,
                   progress = excluded.progress,
                   shards = excluded.shards,
                   start_ts = excluded.start_ts,
                   end_ts = excluded.end_ts,
                   error = excluded.error",
                params![
                    record.id.clone(),
                    record.name.clone(),
                    record.task_type.clone(),
                    record.status.clone(),
                    record.progress,
                    record.shards.to_string(),
                    record.start_ts.to_rfc3339(),
                    record.end_ts.map(|ts| ts.to_rfc3339()),
                    record.error.clone(),
                ],
            )
            .await?;
        Ok(())
    }

    /// Loads one task record by id, if present.
    ///
    /// # Errors
    ///
    /// Returns `DatabaseError` on a SQL failure or a malformed stored row.
    pub async fn load_task(&self, id: &str) -> Result<Option<TaskRecord>, DatabaseError> {
        let mut rows = self.conn().query("SELECT id, name, task_type, status, progress, shards, start_ts, end_ts, error FROM tasks WHERE id = ?1", params![id.to_string()]).await?;
        match rows.next().await? {
            Some(row) => Ok(Some(row_to_task(&row)?)),
            None => Ok(None),
        }
    }

    /// Loads every persisted task record, most recently started first.
    ///
    /// # Errors
    ///
    /// See [`Self::load_task`].
    pub async fn load_all_tasks(&self) -> Result<Vec<TaskRecord>, DatabaseError> {
        let mut rows = self.conn().query("SELECT id, name, task_type, status, progress, shards, start_ts, end_ts, error FROM tasks ORDER BY start_ts DESC", params![]).await?;
        let mut records = Vec::new();
        while let Some(row) = rows.next().await? {
            records.push(row_to_task(&row)?);
        }
        Ok(records)
    }

    /// Deletes a task record. A no-op if `id` is unknown.
    ///
    /// # Errors
    ///
    /// Returns `DatabaseError` on a SQL failure.
    pub async fn delete_task(&self, id: &str) -> Result<(), DatabaseError> {
        self.conn().execute("DELETE FROM tasks WHERE id = ?1", params![id.to_string()]).await?;
        Ok(())
    }
}

fn row_to_task(row: &libsql::Row) -> Result<TaskRecord, DatabaseError> {
    let shards_text: String = row.get(5)?;
    let shards = serde_json::from_str(&shards_text).map_err(|e| DatabaseError::InvalidValue {
        column: "shards".to_string(),
        reason: e.to_string(),
    })?;
    Ok(TaskRecord {
        id: row.get(0)?,
        name: row.get(1)?,
        task_type: row.get(2)?,
        status: row.get(3)?,
        progress: row.get(4)?,
        shards,
        start_ts: parse_datetime("start_ts", &row.get::<String>(6)?)?,
        end_ts: parse_optional_datetime("end_ts", get_opt_string(row, 7)?.as_deref())?,
        error: get_opt_string(row, 8)?,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn sample(id: &str) -> TaskRecord {
        TaskRecord {
            id: id.to_string(),
            name: "embed".to_string(),
            task_type: "signal".to_string(),
            status: "pending".to_string(),
            progress: 0.5,
            shards: json!({"shard-0": {"current": 5, "estimated": 10}}),
            start_ts: chrono::Utc::now(),
            end_ts: None,
            error: None,
        }
    }

    #[tokio::test]
    async fn round_trips_a_task_record() {
        let db = LilacDb::open_local(":memory:").await.unwrap();
        let record = sample("t0");
        db.upsert_task(&record).await.unwrap();

        let loaded = db.load_task("t0").await.unwrap().unwrap();
        assert_eq!(loaded.id, "t0");
        assert_eq!(loaded.progress, 0.5);
        assert_eq!(loaded.shards, record.shards);
        assert!(loaded.end_ts.is_none());
    }

    #[tokio::test]
    async fn upsert_overwrites_existing_record() {
        let db = LilacDb::open_local(":memory:").await.unwrap();
        db.upsert_task(&sample("t0")).await.unwrap();

        let mut updated = sample("t0");
        updated.status = "completed".to_string();
        updated.progress = 1.0;
        updated.end_ts = Some(chrono::Utc::now());
        db.upsert_task(&updated).await.unwrap();

        let loaded = db.load_task("t0").await.unwrap().unwrap();
        assert_eq!(loaded.status, "completed");
        assert_eq!(loaded.progress, 1.0);
        assert!(loaded.end_ts.is_some());

        let all = db.load_all_tasks().await.unwrap();
        assert_eq!(all.len(), 1);
    }

    #[tokio::test]
    async fn missing_task_is_none() {
        let db = LilacDb::open_local(":memory:").await.unwrap();
        assert!(db.load_task("missing").await.unwrap().is_none());
    }

    #[tokio::test]
    async fn delete_removes_the_record() {
        let db = LilacDb::open_local(":memory:").await.unwrap();
        db.upsert_task(&sample("t0")).await.unwrap();
        db.delete_task("t0").await.unwrap();
        assert!(db.load_task("t0").await.unwrap().is_none());
    }
}
