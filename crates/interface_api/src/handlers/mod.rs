//! Request handlers
//!
//! Handlers shared by both ledgers read the [`LedgerKind`](domain_billing::LedgerKind)
//! from a request extension set where their routes are mounted.

pub mod folios;
pub mod health;
pub mod invoices;
pub mod payments;
pub mod restaurant;
