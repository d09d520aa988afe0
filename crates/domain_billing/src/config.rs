//! Ledger configuration
//!
//! The standard tax rate is not a constant: it comes from a [`TaxRateTable`]
//! keyed by jurisdiction and effective date, injected through
//! [`BillingConfig`] into every posting and invoicing path.

use chrono::NaiveDate;
use rust_decimal::Decimal;
use rust_decimal_macros::dec;
use serde::{Deserialize, Serialize};

use core_kernel::{CoreError, Currency};

use crate::error::BillingError;

/// One row of the tax rate table
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TaxRateEntry {
    /// Jurisdiction code, e.g. "IN"
    pub jurisdiction: String,
    /// First day (inclusive) on which the rate applies
    pub effective_from: NaiveDate,
    /// Rate as a percentage, e.g. 18 for 18%
    pub rate_percent: Decimal,
}

/// Standard tax rates by jurisdiction and effective date
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct TaxRateTable {
    entries: Vec<TaxRateEntry>,
}

impl TaxRateTable {
    pub fn new(entries: Vec<TaxRateEntry>) -> Self {
        Self { entries }
    }

    /// Single-rate table, effective from the given date
    pub fn flat(jurisdiction: impl Into<String>, effective_from: NaiveDate, rate_percent: Decimal) -> Self {
        Self::new(vec![TaxRateEntry {
            jurisdiction: jurisdiction.into(),
            effective_from,
            rate_percent,
        }])
    }

    pub fn entries(&self) -> &[TaxRateEntry] {
        &self.entries
    }

    /// Looks up the rate in force for `jurisdiction` on `date`
    ///
    /// The latest entry whose `effective_from` is on or before `date` wins.
    ///
    /// # Errors
    ///
    /// Returns `BillingError::Configuration` when no entry covers the date.
    pub fn standard_rate(&self, jurisdiction: &str, date: NaiveDate) -> Result<Decimal, BillingError> {
        self.entries
            .iter()
            .filter(|e| e.jurisdiction.eq_ignore_ascii_case(jurisdiction) && e.effective_from <= date)
            .max_by_key(|e| e.effective_from)
            .map(|e| e.rate_percent)
            .ok_or_else(|| {
                BillingError::Configuration(format!(
                    "no tax rate configured for {} on {}",
                    jurisdiction, date
                ))
            })
    }

    fn validate(&self) -> Result<(), CoreError> {
        if self.entries.is_empty() {
            return Err(CoreError::configuration("tax rate table is empty"));
        }
        for entry in &self.entries {
            if entry.rate_percent < Decimal::ZERO || entry.rate_percent > dec!(100) {
                return Err(CoreError::configuration(format!(
                    "tax rate {} for {} is outside 0-100",
                    entry.rate_percent, entry.jurisdiction
                )));
            }
        }
        Ok(())
    }
}

impl Default for TaxRateTable {
    fn default() -> Self {
        // GST went live on 2017-07-01
        let gst_start = NaiveDate::from_ymd_opt(2017, 7, 1).unwrap_or_default();
        Self::flat("IN", gst_start, dec!(18))
    }
}

/// Ledger-wide settings
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct BillingConfig {
    /// The single ledger currency
    pub currency: Currency,
    /// Jurisdiction used for standard rate lookups
    pub jurisdiction: String,
    pub tax_rates: TaxRateTable,
    /// Days between invoice generation and its due date
    pub invoice_due_days: i64,
    /// Attempts at allocating an invoice number before giving up
    pub invoice_number_attempts: u32,
}

impl Default for BillingConfig {
    fn default() -> Self {
        Self {
            currency: Currency::INR,
            jurisdiction: "IN".to_string(),
            tax_rates: TaxRateTable::default(),
            invoice_due_days: 7,
            invoice_number_attempts: 3,
        }
    }
}

impl BillingConfig {
    /// The standard rate for the configured jurisdiction on `date`
    pub fn standard_rate(&self, date: NaiveDate) -> Result<Decimal, BillingError> {
        self.tax_rates.standard_rate(&self.jurisdiction, date)
    }

    /// Checks the configuration once at start-up
    pub fn validate(&self) -> Result<(), CoreError> {
        self.tax_rates.validate()?;
        if self.invoice_due_days < 0 {
            return Err(CoreError::configuration("invoice_due_days must not be negative"));
        }
        if self.invoice_number_attempts == 0 {
            return Err(CoreError::configuration("invoice_number_attempts must be at least 1"));
        }
        Ok(())
    }
}
