//! Folio charges
//!
//! A [`FolioCharge`] is an immutable line on a folio. Every producer builds a
//! [`ChargeInput`] and hands it to [`FolioCharge::post`], which is the only
//! place charge-level amounts are computed and rounded. Corrections are new
//! lines: a refund, a discount credit, or a reversal pointing at the charge it
//! cancels.

use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use rust_decimal_macros::dec;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use core_kernel::{ChargeId, FolioId, Money, UserId};

use crate::error::BillingError;
use crate::folio::Folio;
use crate::tax;

/// Type of a charge line
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ChargeType {
    Room,
    Service,
    Amenity,
    Restaurant,
    Minibar,
    Laundry,
    Adjustment,
    /// Price reduction, always non-positive and untaxed
    Discount,
    /// Money returned to the guest, always non-positive and untaxed
    Refund,
    /// Cancels exactly one earlier charge
    Reversal,
}

impl ChargeType {
    /// Discount and refund lines reduce the folio and are never taxed
    pub fn is_credit(&self) -> bool {
        matches!(self, ChargeType::Discount | ChargeType::Refund)
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            ChargeType::Room => "room",
            ChargeType::Service => "service",
            ChargeType::Amenity => "amenity",
            ChargeType::Restaurant => "restaurant",
            ChargeType::Minibar => "minibar",
            ChargeType::Laundry => "laundry",
            ChargeType::Adjustment => "adjustment",
            ChargeType::Discount => "discount",
            ChargeType::Refund => "refund",
            ChargeType::Reversal => "reversal",
        }
    }
}

/// What produced a charge
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SourceType {
    RoomStay,
    RestaurantOrder,
    Service,
    Manual,
}

impl SourceType {
    pub fn as_str(&self) -> &'static str {
        match self {
            SourceType::RoomStay => "room_stay",
            SourceType::RestaurantOrder => "restaurant_order",
            SourceType::Service => "service",
            SourceType::Manual => "manual",
        }
    }
}

/// Indexed provenance of a charge, used to find the charges a producer
/// previously posted for the same room or order
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct ChargeSource {
    pub source_type: SourceType,
    pub source_id: Uuid,
}

impl ChargeSource {
    pub fn new(source_type: SourceType, source_id: impl Into<Uuid>) -> Self {
        Self {
            source_type,
            source_id: source_id.into(),
        }
    }
}

/// Caller-described charge, before amounts are derived
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ChargeInput {
    pub charge_type: ChargeType,
    pub description: String,
    pub unit_price: Decimal,
    pub quantity: Decimal,
    pub discount: Decimal,
    pub is_taxable: bool,
    /// Percentage; the configured standard rate applies when absent
    pub tax_rate: Option<Decimal>,
    pub charge_date: Option<DateTime<Utc>>,
    pub source: Option<ChargeSource>,
    pub details: Option<serde_json::Value>,
}

impl ChargeInput {
    /// Creates a single-quantity charge; credit types start non-taxable
    pub fn new(charge_type: ChargeType, description: impl Into<String>, unit_price: Decimal) -> Self {
        Self {
            charge_type,
            description: description.into(),
            unit_price,
            quantity: Decimal::ONE,
            discount: Decimal::ZERO,
            is_taxable: !charge_type.is_credit(),
            tax_rate: None,
            charge_date: None,
            source: None,
            details: None,
        }
    }

    pub fn with_quantity(mut self, quantity: Decimal) -> Self {
        self.quantity = quantity;
        self
    }

    pub fn with_discount(mut self, discount: Decimal) -> Self {
        self.discount = discount;
        self
    }

    pub fn taxable(mut self, is_taxable: bool) -> Self {
        self.is_taxable = is_taxable;
        self
    }

    pub fn with_tax_rate(mut self, rate_percent: Decimal) -> Self {
        self.tax_rate = Some(rate_percent);
        self
    }

    pub fn on(mut self, charge_date: DateTime<Utc>) -> Self {
        self.charge_date = Some(charge_date);
        self
    }

    pub fn from_source(mut self, source: ChargeSource) -> Self {
        self.source = Some(source);
        self
    }

    pub fn with_details(mut self, details: serde_json::Value) -> Self {
        self.details = Some(details);
        self
    }

    /// `unit_price × quantity − discount`, unrounded
    pub fn gross_amount(&self) -> Decimal {
        self.unit_price * self.quantity - self.discount
    }

    /// Field-level validation, run before anything is written
    pub fn validate(&self) -> Result<(), BillingError> {
        if self.description.trim().is_empty() {
            return Err(BillingError::InvalidInput("charge description is required".into()));
        }
        if self.charge_type == ChargeType::Reversal {
            return Err(BillingError::InvalidInput(
                "reversals are posted by reversing an existing charge".into(),
            ));
        }
        if self.quantity <= Decimal::ZERO {
            return Err(BillingError::InvalidInput(format!(
                "quantity must be positive, got {}",
                self.quantity
            )));
        }
        if self.discount < Decimal::ZERO {
            return Err(BillingError::InvalidAmount(format!(
                "discount must not be negative, got {}",
                self.discount
            )));
        }
        if let Some(rate) = self.tax_rate {
            if rate < Decimal::ZERO || rate > dec!(100) {
                return Err(BillingError::InvalidInput(format!(
                    "tax rate must be between 0 and 100, got {}",
                    rate
                )));
            }
        }

        let amount = self.gross_amount();
        if self.charge_type.is_credit() && amount > Decimal::ZERO {
            return Err(BillingError::InvalidAmount(format!(
                "{} charges must not be positive, got {}",
                self.charge_type.as_str(),
                amount
            )));
        }
        if !self.charge_type.is_credit() && amount < Decimal::ZERO {
            return Err(BillingError::InvalidAmount(format!(
                "{} charges must not be negative, got {}",
                self.charge_type.as_str(),
                amount
            )));
        }
        Ok(())
    }
}

/// A posted charge line
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FolioCharge {
    pub id: ChargeId,
    pub folio_id: FolioId,
    pub charge_type: ChargeType,
    pub description: String,
    pub unit_price: Money,
    pub quantity: Decimal,
    pub discount: Money,
    /// `unit_price × quantity − discount`, rounded
    pub amount: Money,
    /// Percentage
    pub tax_rate: Decimal,
    pub tax_amount: Money,
    pub total_amount: Money,
    pub is_taxable: bool,
    pub charge_date: DateTime<Utc>,
    pub posted_by: UserId,
    pub source: Option<ChargeSource>,
    pub reverses_charge_id: Option<ChargeId>,
    pub details: Option<serde_json::Value>,
    pub created_at: DateTime<Utc>,
}

impl FolioCharge {
    /// Builds a charge line for `folio` from validated input
    ///
    /// # Arguments
    ///
    /// * `folio` - The folio being charged; must be active
    /// * `input` - The caller's charge description
    /// * `standard_rate` - Rate used when the input carries none
    /// * `posted_by` - Acting user
    ///
    /// # Errors
    ///
    /// `FolioClosed` for inactive folios, `InvalidInput`/`InvalidAmount`
    /// when the input fails validation.
    pub fn post(
        folio: &Folio,
        input: ChargeInput,
        standard_rate: Decimal,
        posted_by: UserId,
    ) -> Result<Self, BillingError> {
        folio.ensure_active()?;
        input.validate()?;

        let currency = folio.currency;
        let now = Utc::now();
        let is_taxable = input.is_taxable && !input.charge_type.is_credit();
        let tax_rate = input.tax_rate.unwrap_or(standard_rate);
        let amount = Money::new(input.gross_amount(), currency).round_to_currency();
        let tax_amount = tax::charge_tax(amount, tax_rate, is_taxable);

        Ok(Self {
            id: ChargeId::new_v7(),
            folio_id: folio.id,
            charge_type: input.charge_type,
            description: input.description.trim().to_string(),
            unit_price: Money::new(input.unit_price, currency),
            quantity: input.quantity,
            discount: Money::new(input.discount, currency),
            amount,
            tax_rate,
            tax_amount,
            total_amount: amount.checked_add(&tax_amount)?,
            is_taxable,
            charge_date: input.charge_date.unwrap_or(now),
            posted_by,
            source: input.source,
            reverses_charge_id: None,
            details: input.details,
            created_at: now,
        })
    }

    /// Builds the reversal of this charge
    ///
    /// The reversal negates amount, tax and total exactly and keeps the
    /// original's rate, taxability and source, so the pair nets to zero in
    /// every aggregate.
    pub fn reversal(&self, posted_by: UserId, reason: Option<&str>) -> Result<Self, BillingError> {
        if self.charge_type == ChargeType::Reversal {
            return Err(BillingError::InvalidState(format!(
                "charge {} is itself a reversal",
                self.id
            )));
        }
        let now = Utc::now();
        let description = match reason {
            Some(reason) => format!("Reversal: {} ({})", self.description, reason),
            None => format!("Reversal: {}", self.description),
        };

        Ok(Self {
            id: ChargeId::new_v7(),
            folio_id: self.folio_id,
            charge_type: ChargeType::Reversal,
            description,
            unit_price: -self.amount,
            quantity: Decimal::ONE,
            discount: Money::zero(self.amount.currency()),
            amount: -self.amount,
            tax_rate: self.tax_rate,
            tax_amount: -self.tax_amount,
            total_amount: -self.total_amount,
            is_taxable: self.is_taxable,
            charge_date: now,
            posted_by,
            source: self.source,
            reverses_charge_id: Some(self.id),
            details: self.details.clone(),
            created_at: now,
        })
    }

    pub fn is_reversal(&self) -> bool {
        self.reverses_charge_id.is_some()
    }
}

/// Charges that have not been reversed and are not reversals themselves
pub fn outstanding(charges: &[FolioCharge]) -> Vec<&FolioCharge> {
    let reversed: std::collections::HashSet<ChargeId> =
        charges.iter().filter_map(|c| c.reverses_charge_id).collect();
    charges
        .iter()
        .filter(|c| !c.is_reversal() && !reversed.contains(&c.id))
        .collect()
}
