//! Repository implementations for the ledger tables
//!
//! Repositories encapsulate SQL and map between database rows and plain
//! column values. They never open or commit transactions; callers pass the
//! connection of the transaction they are working in.
//!
//! # Architecture
//!
//! - Runtime-checked queries with `sqlx::query_as` and `FromRow` rows
//! - One statement set shared by the hotel and restaurant ledgers
//! - Row locks (`FOR UPDATE`) on request for read-modify-write cycles

pub mod ledger;

pub use ledger::{LedgerRepository, LedgerTables};
