//! Test Utilities Crate
//!
//! Provides shared test infrastructure, fixtures, and helpers for the
//! folio ledger test suite.
//!
//! # Modules
//!
//! - `fixtures`: Pre-built directory, menu and money test data
//! - `builders`: Builders for orders and for a fully wired in-memory ledger
//! - `database`: PostgreSQL test containers with the ledger schema applied
//! - `assertions`: Ledger invariant assertions
//! - `generators`: Property-based test data generators

pub mod assertions;
pub mod builders;
pub mod database;
pub mod fixtures;
pub mod generators;

pub use assertions::*;
pub use builders::*;
pub use database::*;
pub use fixtures::*;
pub use generators::*;
