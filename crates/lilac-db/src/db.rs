//! `LilacDb`: an embedded libSQL connection, opened once per process and
//! shared by the `tasks`/`concepts` repos.
//!
//! Purely local — no cloud sync, no embedded-replica mode, no
//! retry-on-transient-error wrapper — used so a `TaskManager`'s history and
//! a `ConceptModel`'s labeled examples survive a process restart (spec.md
//! §1 "recoverable").

use libsql::{Builder, Connection};

use crate::error::DatabaseError;

pub struct LilacDb {
    conn: Connection,
}

impl LilacDb {
    /// Opens (creating if absent) a local libSQL database file and runs
    /// migrations. Pass `":memory:"` for a throwaway in-process database.
    ///
    /// # Errors
    ///
    /// Returns `DatabaseError` if the file can't be opened or a migration
    /// fails.
    pub async fn open_local(db_path: &str) -> Result<Self, DatabaseError> {
        let database = if db_path == ":memory:" {
            Builder::new_local(":memory:").build().await?
        } else {
            Builder::new_local(db_path).build().await?
        };
        let conn = database.connect()?;
        let db = Self { conn };
        db.run_migrations().await?;
        Ok(db)
    }

    #[must_use]
    pub const fn conn(&self) -> &Connection {
        &self.conn
    }
}
