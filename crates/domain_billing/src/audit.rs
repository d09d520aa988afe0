//! Audit trail entries
//!
//! Entries are written explicitly by each mutating operation through its
//! transaction, so a failed audit write aborts the operation with it.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use core_kernel::{AuditEventId, UserId};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AuditAction {
    FolioOpened,
    ChargePosted,
    ChargeReversed,
    InvoiceGenerated,
    PaymentRecorded,
    PaymentRefunded,
    OrderSynced,
    OrderCancelled,
}

impl AuditAction {
    pub fn as_str(&self) -> &'static str {
        match self {
            AuditAction::FolioOpened => "folio_opened",
            AuditAction::ChargePosted => "charge_posted",
            AuditAction::ChargeReversed => "charge_reversed",
            AuditAction::InvoiceGenerated => "invoice_generated",
            AuditAction::PaymentRecorded => "payment_recorded",
            AuditAction::PaymentRefunded => "payment_refunded",
            AuditAction::OrderSynced => "order_synced",
            AuditAction::OrderCancelled => "order_cancelled",
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AuditEntry {
    pub id: AuditEventId,
    pub occurred_at: DateTime<Utc>,
    pub actor: UserId,
    pub action: AuditAction,
    pub entity_type: String,
    pub entity_id: Uuid,
    pub details: serde_json::Value,
}

impl AuditEntry {
    pub fn new(
        actor: UserId,
        action: AuditAction,
        entity_type: impl Into<String>,
        entity_id: impl Into<Uuid>,
    ) -> Self {
        Self {
            id: AuditEventId::new_v7(),
            occurred_at: Utc::now(),
            actor,
            action,
            entity_type: entity_type.into(),
            entity_id: entity_id.into(),
            details: serde_json::Value::Null,
        }
    }

    pub fn with_details(mut self, details: serde_json::Value) -> Self {
        self.details = details;
        self
    }
}
