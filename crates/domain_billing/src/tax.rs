//! Tax computation
//!
//! Two figures exist and each has exactly one formula:
//!
//! - a charge's own `tax_amount`, computed and rounded once at posting and
//!   only used for running display;
//! - the tax of a set of charges (folio `total_tax`, invoice `tax_amount`),
//!   computed by [`aggregate_tax`]: taxable amounts are grouped by rate, each
//!   group's base is taxed and rounded, and the group results are summed.
//!
//! Invoice lines receive the aggregate figure split across their taxable
//! charges with [`allocate_line_taxes`], so line taxes always add up to the
//! invoice tax.

use std::collections::{BTreeMap, HashMap};

use rust_decimal::Decimal;

use core_kernel::{ChargeId, Currency, Money, MoneyError, Rate};

use crate::charge::FolioCharge;

/// Tax on one charge amount, rounded to the currency
pub fn charge_tax(amount: Money, rate_percent: Decimal, is_taxable: bool) -> Money {
    if !is_taxable {
        return Money::zero(amount.currency());
    }
    Rate::from_percentage(rate_percent)
        .apply(&amount)
        .round_to_currency()
}

/// Taxable charges sharing one rate
#[derive(Debug, Clone, PartialEq)]
pub struct TaxGroup {
    pub rate_percent: Decimal,
    pub base: Money,
    pub tax: Money,
    pub charge_ids: Vec<ChargeId>,
}

/// Groups the taxable charges by rate, ordered by rate
pub fn tax_groups(charges: &[FolioCharge], currency: Currency) -> Result<Vec<TaxGroup>, MoneyError> {
    let mut by_rate: BTreeMap<Decimal, (Money, Vec<ChargeId>)> = BTreeMap::new();
    for charge in charges.iter().filter(|c| c.is_taxable) {
        let entry = by_rate
            .entry(charge.tax_rate.normalize())
            .or_insert_with(|| (Money::zero(currency), Vec::new()));
        entry.0 = entry.0.checked_add(&charge.amount)?;
        entry.1.push(charge.id);
    }

    Ok(by_rate
        .into_iter()
        .map(|(rate_percent, (base, charge_ids))| TaxGroup {
            rate_percent,
            base,
            tax: charge_tax(base, rate_percent, true),
            charge_ids,
        })
        .collect())
}

/// Tax owed on a set of charges
pub fn aggregate_tax(charges: &[FolioCharge], currency: Currency) -> Result<Money, MoneyError> {
    tax_groups(charges, currency)?
        .iter()
        .try_fold(Money::zero(currency), |acc, group| acc.checked_add(&group.tax))
}

/// Splits each rate group's tax over its charges in proportion to amount
///
/// Untaxed charges are absent from the result. Groups whose base nets to
/// zero (for instance a charge and its reversal) allocate zero to every line.
pub fn allocate_line_taxes(
    charges: &[FolioCharge],
    currency: Currency,
) -> Result<HashMap<ChargeId, Money>, MoneyError> {
    let amounts: HashMap<ChargeId, Money> = charges.iter().map(|c| (c.id, c.amount)).collect();
    let mut allocated = HashMap::new();

    for group in tax_groups(charges, currency)? {
        if group.base.is_zero() || group.tax.is_zero() {
            for id in group.charge_ids {
                allocated.insert(id, Money::zero(currency));
            }
            continue;
        }

        let ratios: Vec<Decimal> = group
            .charge_ids
            .iter()
            .map(|id| amounts.get(id).map(|m| m.amount()).unwrap_or_default())
            .collect();
        let shares = group.tax.allocate_by_ratios(&ratios)?;
        allocated.extend(group.charge_ids.into_iter().zip(shares));
    }

    Ok(allocated)
}
