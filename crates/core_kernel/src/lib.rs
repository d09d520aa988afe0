//! Core Kernel - Foundational types shared by the folio ledger crates
//!
//! This crate provides the fundamental building blocks used across the workspace:
//! - Money types with precise decimal arithmetic and a single rounding rule
//! - Strongly-typed identifiers for ledger and collaborator entities
//! - Port infrastructure (errors, health checks) for the hexagonal layout

pub mod money;
pub mod identifiers;
pub mod ports;
pub mod error;

pub use money::{Money, Currency, MoneyError, Rate};
pub use identifiers::{
    FolioId, ChargeId, InvoiceId, InvoiceItemId, PaymentId,
    ReservationId, GuestId, RoomId, OrderId, MenuItemId, VariantId,
    UserId, AuditEventId,
};
pub use ports::{
    PortError, DomainPort, HealthCheckable, HealthCheckResult, AdapterHealth,
};
pub use error::CoreError;
