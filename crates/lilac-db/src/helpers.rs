//! Row-to-value parsing helpers shared by `tasks` and `concepts`.
//!
//! Isolates the two recurring gotchas of hand-written libSQL row parsing:
//! the dual datetime format (`chrono::to_rfc3339()` vs `SQLite`'s own
//! `datetime('now')` text) and nullable-vs-empty-string TEXT columns.

use chrono::{DateTime, Utc};

use crate::error::DatabaseError;

/// Parses a required TEXT column as `DateTime<Utc>`.
///
/// # Errors
///
/// Returns `DatabaseError::InvalidValue` if the string matches neither RFC
/// 3339 nor `SQLite`'s `"%Y-%m-%d %H:%M:%S"` default format.
pub fn parse_datetime(column: &str, s: &str) -> Result<DateTime<Utc>, DatabaseError> {
    if let Ok(dt) = DateTime::parse_from_rfc3339(s) {
        return Ok(dt.with_timezone(&Utc));
    }
    chrono::NaiveDateTime::parse_from_str(s, "%Y-%m-%d %H:%M:%S")
        .map(|naive| naive.and_utc())
        .map_err(|e| DatabaseError::InvalidValue {
            column: column.to_string(),
            reason: format!("'{s}' is not a valid timestamp: {e}"),
        })
}

/// Parses an optional TEXT column as `Option<DateTime<Utc>>`; `None`/empty
/// string both map to `None`.
///
/// # Errors
///
/// See [`parse_datetime`].
pub fn parse_optional_datetime(column: &str, s: Option<&str>) -> Result<Option<DateTime<Utc>>, DatabaseError> {
    match s {
        Some(s) if !s.is_empty() => Ok(Some(parse_datetime(column, s)?)),
        _ => Ok(None),
    }
}

/// Reads a nullable TEXT column, treating an empty string the same as SQL
/// NULL (`row.get::<String>` errors on NULL; this always goes through
/// `Option<String>`).
///
/// # Errors
///
/// Propagates a column-read error from `libsql`.
pub fn get_opt_string(row: &libsql::Row, idx: i32) -> Result<Option<String>, DatabaseError> {
    match row.get::<Option<String>>(idx)? {
        Some(s) if s.is_empty() => Ok(None),
        other => Ok(other),
    }
}
