//! Domain Adapters
//!
//! This module provides adapter implementations for the billing domain's
//! ports, connecting them to the PostgreSQL database layer.
//!
//! # Architecture
//!
//! Each adapter:
//! - Implements one of the domain's port traits
//! - Translates between domain models and database row types
//! - Maps database failures onto `PortError`
//!
//! # Usage
//!
//! ```rust,ignore
//! use infra_db::adapters::{PostgresDirectory, PostgresLedgerStore, PostgresMenuCatalog};
//!
//! let store = PostgresLedgerStore::new(pool.clone(), Currency::INR);
//! let directory = PostgresDirectory::new(pool.clone());
//! let menu = PostgresMenuCatalog::new(pool);
//! ```

pub mod directory;
pub mod ledger;

pub use directory::{PostgresDirectory, PostgresMenuCatalog};
pub use ledger::{PgLedgerTransaction, PostgresLedgerStore};
