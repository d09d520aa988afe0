//! Restaurant order pricing and the charges it produces
//!
//! ```text
//! subtotal = Σ (unit price + variant price) × quantity
//! service  = subtotal × service% / 100
//! gst      = (subtotal + service) × tax% / 100
//! total    = subtotal − discount + gst + service + tip
//! ```
//!
//! Every component is rounded to the currency on its own before it is used
//! in the next step.

use rust_decimal::Decimal;
use rust_decimal_macros::dec;
use serde::{Deserialize, Serialize};
use serde_json::json;

use core_kernel::{Currency, GuestId, MenuItemId, Money, OrderId, Rate, ReservationId, VariantId};

use crate::charge::{ChargeInput, ChargeSource, ChargeType, SourceType};
use crate::error::BillingError;

/// Who the order is for
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum GuestType {
    /// Staying guest; the order total also lands on the hotel folio
    HotelGuest,
    /// Restaurant-only guest, billed on the restaurant ledger
    WalkIn,
}

/// Order-level discount
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(tag = "type", content = "value", rename_all = "snake_case")]
pub enum OrderDiscount {
    #[default]
    None,
    /// Percentage of the subtotal
    Percent(Decimal),
    /// Fixed amount
    Flat(Decimal),
}

/// One ordered menu item
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct OrderLine {
    pub menu_item_id: MenuItemId,
    pub variant_id: Option<VariantId>,
    pub quantity: u32,
}

/// An order as handed over by the restaurant subsystem
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RestaurantOrder {
    pub id: OrderId,
    pub guest_type: GuestType,
    pub reservation_id: Option<ReservationId>,
    pub guest_id: Option<GuestId>,
    pub lines: Vec<OrderLine>,
    #[serde(default)]
    pub discount: OrderDiscount,
    #[serde(default)]
    pub service_charge_percent: Decimal,
    /// Percentage; the configured standard rate applies when absent
    pub tax_percent: Option<Decimal>,
    #[serde(default)]
    pub tip: Decimal,
}

impl RestaurantOrder {
    /// Checks the order's own fields; prices are resolved separately
    pub fn validate(&self) -> Result<(), BillingError> {
        if self.lines.is_empty() {
            return Err(BillingError::InvalidInput(format!("order {} has no items", self.id)));
        }
        if let Some(line) = self.lines.iter().find(|l| l.quantity == 0) {
            return Err(BillingError::InvalidInput(format!(
                "menu item {} has zero quantity",
                line.menu_item_id
            )));
        }
        check_percent("service charge", self.service_charge_percent)?;
        if let Some(tax) = self.tax_percent {
            check_percent("tax", tax)?;
        }
        match self.discount {
            OrderDiscount::Percent(p) => check_percent("discount", p)?,
            OrderDiscount::Flat(amount) if amount < Decimal::ZERO => {
                return Err(BillingError::InvalidAmount("discount must not be negative".into()));
            }
            _ => {}
        }
        if self.tip < Decimal::ZERO {
            return Err(BillingError::InvalidAmount("tip must not be negative".into()));
        }
        if self.guest_type == GuestType::HotelGuest && self.reservation_id.is_none() {
            return Err(BillingError::InvalidInput(format!(
                "hotel guest order {} has no reservation",
                self.id
            )));
        }
        Ok(())
    }
}

fn check_percent(what: &str, value: Decimal) -> Result<(), BillingError> {
    if value < Decimal::ZERO || value > dec!(100) {
        return Err(BillingError::InvalidInput(format!(
            "{} percentage must be between 0 and 100, got {}",
            what, value
        )));
    }
    Ok(())
}

/// An order line with catalog prices resolved
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PricedLine {
    pub menu_item_id: MenuItemId,
    pub name: String,
    pub unit_price: Decimal,
    pub variant_price: Decimal,
    pub quantity: u32,
}

impl PricedLine {
    fn line_total(&self) -> Decimal {
        (self.unit_price + self.variant_price) * Decimal::from(self.quantity)
    }
}

/// The priced breakdown of an order
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct OrderPricing {
    pub order_id: OrderId,
    pub subtotal: Money,
    pub discount: Money,
    pub service_charge: Money,
    pub gst: Money,
    pub tip: Money,
    pub total: Money,
    pub tax_percent: Decimal,
    pub lines: Vec<PricedLine>,
}

/// Prices an order from resolved lines
///
/// # Arguments
///
/// * `order` - The order, already validated
/// * `lines` - Resolved prices, one per order line
/// * `tax_percent` - GST rate to apply
/// * `currency` - Ledger currency
pub fn price_order(
    order: &RestaurantOrder,
    lines: Vec<PricedLine>,
    tax_percent: Decimal,
    currency: Currency,
) -> Result<OrderPricing, BillingError> {
    let round = |amount: Decimal| Money::new(amount, currency).round_to_currency();

    let subtotal = round(lines.iter().map(PricedLine::line_total).sum());
    let discount = match order.discount {
        OrderDiscount::None => Money::zero(currency),
        OrderDiscount::Percent(p) => Rate::from_percentage(p).apply(&subtotal).round_to_currency(),
        OrderDiscount::Flat(amount) => round(amount.min(subtotal.amount())),
    };
    let service_charge = Rate::from_percentage(order.service_charge_percent)
        .apply(&subtotal)
        .round_to_currency();
    let gst = Rate::from_percentage(tax_percent)
        .apply(&subtotal.checked_add(&service_charge)?)
        .round_to_currency();
    let tip = round(order.tip);
    let total = subtotal
        .checked_sub(&discount)?
        .checked_add(&gst)?
        .checked_add(&service_charge)?
        .checked_add(&tip)?;

    Ok(OrderPricing {
        order_id: order.id,
        subtotal,
        discount,
        service_charge,
        gst,
        tip,
        total,
        tax_percent,
        lines,
    })
}

impl OrderPricing {
    fn source(&self) -> ChargeSource {
        ChargeSource::new(SourceType::RestaurantOrder, self.order_id)
    }

    fn details(&self) -> serde_json::Value {
        json!({
            "order_id": self.order_id,
            "subtotal": self.subtotal.amount(),
            "discount": self.discount.amount(),
            "service_charge": self.service_charge.amount(),
            "gst": self.gst.amount(),
            "tip": self.tip.amount(),
            "total": self.total.amount(),
        })
    }

    /// Charges for the order's own restaurant folio
    ///
    /// The food line carries subtotal plus service at the order's tax rate,
    /// so the folio's tax equals the order GST and its balance the order total.
    pub fn restaurant_folio_charges(&self) -> Vec<ChargeInput> {
        let mut charges = vec![ChargeInput::new(
            ChargeType::Restaurant,
            format!("Restaurant order {}", self.order_id),
            self.subtotal.amount() + self.service_charge.amount(),
        )
        .with_tax_rate(self.tax_percent)
        .from_source(self.source())
        .with_details(self.details())];

        if self.discount.is_positive() {
            charges.push(
                ChargeInput::new(
                    ChargeType::Discount,
                    format!("Discount on order {}", self.order_id),
                    -self.discount.amount(),
                )
                .with_tax_rate(Decimal::ZERO)
                .from_source(self.source()),
            );
        }
        if self.tip.is_positive() {
            charges.push(
                ChargeInput::new(ChargeType::Service, format!("Tip on order {}", self.order_id), self.tip.amount())
                    .taxable(false)
                    .with_tax_rate(Decimal::ZERO)
                    .from_source(self.source()),
            );
        }
        charges
    }

    /// The single consolidated line for a hotel guest's folio
    ///
    /// GST is already inside the order total, so the line is untaxed.
    pub fn hotel_folio_charges(&self) -> Vec<ChargeInput> {
        if self.total.is_zero() {
            return Vec::new();
        }
        vec![ChargeInput::new(
            ChargeType::Restaurant,
            format!("Restaurant order {}", self.order_id),
            self.total.amount(),
        )
        .taxable(false)
        .with_tax_rate(Decimal::ZERO)
        .from_source(self.source())
        .with_details(self.details())]
    }
}
