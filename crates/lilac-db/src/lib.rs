//! Embedded-SQL persistence for the two record kinds that need to survive
//! a process restart (spec.md §1 "recoverable", §6): task snapshots from
//! `lilac-tasks` and concept/example rows from `lilac-concepts`. Purely
//! local — no cloud sync, no embedded-replica mode, no audit trail, no
//! multi-tenant identity, since none of those have a counterpart here.

pub mod concepts;
pub mod db;
pub mod error;
pub mod helpers;
mod migrations;
pub mod tasks;

pub use concepts::{ConceptRecord, ExampleRecord};
pub use db::LilacDb;
pub use error::DatabaseError;
pub use tasks::TaskRecord;
