//! Infrastructure Database Layer
//!
//! This crate provides the PostgreSQL infrastructure for the folio ledger,
//! using SQLx.
//!
//! # Architecture
//!
//! The crate follows the repository pattern: [`repositories`] holds the SQL,
//! [`adapters`] implement the billing domain's ports on top of it. Schema
//! migrations are embedded from `migrations/` and applied with
//! [`run_migrations`].
//!
//! # Concurrency
//!
//! Every ledger operation runs in one database transaction. Folios,
//! invoices and payments are locked with `SELECT ... FOR UPDATE` before they
//! are modified, and invoice numbers are allocated under an advisory lock.
//!
//! # Example
//!
//! ```rust,ignore
//! use infra_db::{create_pool, run_migrations, DatabaseConfig, PostgresLedgerStore};
//!
//! let pool = create_pool(&DatabaseConfig::for_url("postgres://localhost/folio_ledger")).await?;
//! run_migrations(&pool).await?;
//! let store = PostgresLedgerStore::new(pool, Currency::INR);
//! ```

pub mod adapters;
pub mod error;
pub mod pool;
pub mod repositories;

pub use adapters::{PgLedgerTransaction, PostgresDirectory, PostgresLedgerStore, PostgresMenuCatalog};
pub use error::DatabaseError;
pub use pool::{create_pool, run_migrations, DatabaseConfig, DatabasePool};
