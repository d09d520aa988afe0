//! Charge producers
//!
//! Producers derive [`ChargeInput`]s from their own domain (room stays,
//! restaurant orders, manual adjustments). None of them write anything: the
//! service posts what they produce through the one posting path.
//!
//! Producers that own a source (a room, an order) are re-runnable. Their
//! output is compared with what is still outstanding for that source by
//! [`plan_replacement`]; unchanged output is a no-op, changed output reverses
//! the outstanding charges and posts the new ones.

pub mod adjustment;
pub mod restaurant;
pub mod room_stay;

use crate::charge::{outstanding, ChargeInput, FolioCharge};

/// What to write to bring a source's charges in line with a producer's output
#[derive(Debug, Clone, Default)]
pub struct Replacement {
    pub reverse: Vec<FolioCharge>,
    pub post: Vec<ChargeInput>,
}

impl Replacement {
    pub fn is_empty(&self) -> bool {
        self.reverse.is_empty() && self.post.is_empty()
    }
}

/// Plans the writes that replace `existing` (every charge carrying the
/// source, reversals included) with `desired`
pub fn plan_replacement(existing: &[FolioCharge], desired: Vec<ChargeInput>) -> Replacement {
    let open = outstanding(existing);
    let unchanged = open.len() == desired.len()
        && open.iter().zip(desired.iter()).all(|(charge, input)| matches(charge, input));

    if unchanged {
        return Replacement::default();
    }
    Replacement {
        reverse: open.into_iter().cloned().collect(),
        post: desired,
    }
}

fn matches(charge: &FolioCharge, input: &ChargeInput) -> bool {
    let is_taxable = input.is_taxable && !input.charge_type.is_credit();
    charge.charge_type == input.charge_type
        && charge.description == input.description.trim()
        && charge.unit_price.amount() == input.unit_price
        && charge.quantity == input.quantity
        && charge.discount.amount() == input.discount
        && charge.is_taxable == is_taxable
        && input.tax_rate.map_or(false, |rate| rate == charge.tax_rate)
}
