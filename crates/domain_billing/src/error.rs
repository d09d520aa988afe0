//! Ledger errors

use rust_decimal::Decimal;
use serde::Serialize;
use thiserror::Error;

use core_kernel::{FolioId, MoneyError, PortError};

/// Coarse classification of a [`BillingError`], used by outer layers to pick
/// a response status without matching on every variant.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum ErrorKind {
    NotFound,
    InvalidState,
    InvalidInput,
    Conflict,
    Internal,
}

/// Errors that can occur in the ledger
#[derive(Debug, Error)]
pub enum BillingError {
    /// Folio not found
    #[error("Folio not found: {0}")]
    FolioNotFound(String),

    /// Charge not found
    #[error("Charge not found: {0}")]
    ChargeNotFound(String),

    /// Invoice not found
    #[error("Invoice not found: {0}")]
    InvoiceNotFound(String),

    /// Payment not found
    #[error("Payment not found: {0}")]
    PaymentNotFound(String),

    /// A collaborator entity (reservation, guest, room, menu item) is missing
    #[error("{entity} not found: {id}")]
    ReferenceNotFound { entity: &'static str, id: String },

    /// Posting to a folio that is no longer active
    #[error("Folio {0} is closed")]
    FolioClosed(FolioId),

    /// The operation is not allowed in the current state
    #[error("Invalid state: {0}")]
    InvalidState(String),

    /// A monetary amount failed validation
    #[error("Invalid amount: {0}")]
    InvalidAmount(String),

    /// Any other input validation failure
    #[error("Invalid input: {0}")]
    InvalidInput(String),

    /// A payment would take an invoice's paid amount above its total
    #[error("Payment of {attempted} exceeds balance {balance} on invoice {invoice_number}")]
    PaymentExceedsBalance {
        invoice_number: String,
        attempted: Decimal,
        balance: Decimal,
    },

    /// Concurrent modification or uniqueness conflict that was not resolved
    #[error("Conflict: {0}")]
    Conflict(String),

    /// The ledger configuration cannot serve the request
    #[error("Configuration error: {0}")]
    Configuration(String),

    #[error(transparent)]
    Money(#[from] MoneyError),

    #[error("Storage error: {0}")]
    Storage(#[from] PortError),
}

impl BillingError {
    pub fn reference_not_found(entity: &'static str, id: impl std::fmt::Display) -> Self {
        BillingError::ReferenceNotFound {
            entity,
            id: id.to_string(),
        }
    }

    /// Returns the error category used for the outward error contract
    pub fn kind(&self) -> ErrorKind {
        match self {
            BillingError::FolioNotFound(_)
            | BillingError::ChargeNotFound(_)
            | BillingError::InvoiceNotFound(_)
            | BillingError::PaymentNotFound(_)
            | BillingError::ReferenceNotFound { .. } => ErrorKind::NotFound,
            BillingError::FolioClosed(_) | BillingError::InvalidState(_) => ErrorKind::InvalidState,
            BillingError::InvalidAmount(_)
            | BillingError::InvalidInput(_)
            | BillingError::Money(_) => ErrorKind::InvalidInput,
            BillingError::PaymentExceedsBalance { .. } | BillingError::Conflict(_) => {
                ErrorKind::Conflict
            }
            BillingError::Configuration(_) => ErrorKind::Internal,
            BillingError::Storage(port) => match port {
                PortError::NotFound { .. } => ErrorKind::NotFound,
                PortError::Conflict { .. } => ErrorKind::Conflict,
                PortError::Validation { .. } => ErrorKind::InvalidInput,
                _ => ErrorKind::Internal,
            },
        }
    }

    /// True when the failure came from a uniqueness or serialization
    /// conflict in storage and the whole transaction may be retried.
    pub fn is_retryable_conflict(&self) -> bool {
        matches!(self, BillingError::Storage(PortError::Conflict { .. }))
    }
}
