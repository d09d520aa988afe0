//! Totals reconciliation
//!
//! Recomputes a folio's four aggregates from its full charge set and the
//! sum of completed payments for its owner. Pure, so it is idempotent by
//! construction; the service calls it inside the same transaction as the
//! write that triggered it.

use serde::{Deserialize, Serialize};

use core_kernel::{Currency, Money};

use crate::charge::FolioCharge;
use crate::error::BillingError;
use crate::tax;

/// The derived aggregates of a folio
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct FolioTotals {
    /// Sum of charge amounts, before tax
    pub total_charges: Money,
    pub total_tax: Money,
    pub total_payments: Money,
    /// `total_charges + total_tax - total_payments`
    pub balance: Money,
}

/// Recomputes folio totals
///
/// # Arguments
///
/// * `charges` - Every charge on the folio, reversals included
/// * `payments` - Sum of completed payments for the folio's owner
/// * `currency` - Ledger currency
pub fn reconcile(
    charges: &[FolioCharge],
    payments: Money,
    currency: Currency,
) -> Result<FolioTotals, BillingError> {
    let amounts: Vec<Money> = charges.iter().map(|c| c.amount).collect();
    let total_charges = Money::checked_sum(&amounts, currency)?;
    let total_tax = tax::aggregate_tax(charges, currency)?;
    let balance = total_charges
        .checked_add(&total_tax)?
        .checked_sub(&payments)?;

    Ok(FolioTotals {
        total_charges,
        total_tax,
        total_payments: payments,
        balance,
    })
}
