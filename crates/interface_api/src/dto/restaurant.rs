//! Restaurant order DTOs
//!
//! Orders arrive in the shape the restaurant subsystem hands them over
//! ([`RestaurantOrder`](domain_billing::RestaurantOrder)); only the posting
//! result is reshaped here.

use rust_decimal::Decimal;
use serde::Serialize;

use core_kernel::OrderId;
use domain_billing::{OrderPosting, OrderPricing};

use super::folios::{ChargeResponse, FolioResponse};

#[derive(Debug, Serialize)]
pub struct PricingResponse {
    pub order_id: OrderId,
    pub subtotal: Decimal,
    pub discount: Decimal,
    pub service_charge: Decimal,
    pub gst: Decimal,
    pub tip: Decimal,
    pub total: Decimal,
    pub tax_percent: Decimal,
}

impl From<OrderPricing> for PricingResponse {
    fn from(pricing: OrderPricing) -> Self {
        Self {
            order_id: pricing.order_id,
            subtotal: pricing.subtotal.amount(),
            discount: pricing.discount.amount(),
            service_charge: pricing.service_charge.amount(),
            gst: pricing.gst.amount(),
            tip: pricing.tip.amount(),
            total: pricing.total.amount(),
            tax_percent: pricing.tax_percent,
        }
    }
}

#[derive(Debug, Serialize)]
pub struct OrderPostingResponse {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub pricing: Option<PricingResponse>,
    pub restaurant_folio: Option<FolioResponse>,
    pub hotel_folio: Option<FolioResponse>,
    pub written: Vec<ChargeResponse>,
}

impl From<OrderPosting> for OrderPostingResponse {
    fn from(posting: OrderPosting) -> Self {
        Self {
            pricing: posting.pricing.map(Into::into),
            restaurant_folio: posting.restaurant_folio.map(Into::into),
            hotel_folio: posting.hotel_folio.map(Into::into),
            written: posting.written.into_iter().map(Into::into).collect(),
        }
    }
}
