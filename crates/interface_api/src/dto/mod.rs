//! Request and response bodies
//!
//! Responses flatten `Money` to its decimal amount; the ledger currency is
//! reported once per folio, invoice or payment.

pub mod folios;
pub mod invoices;
pub mod payments;
pub mod restaurant;

use rust_decimal::Decimal;
use validator::ValidationError;

pub(crate) fn positive_amount(amount: &Decimal) -> Result<(), ValidationError> {
    if amount.is_sign_positive() && !amount.is_zero() {
        Ok(())
    } else {
        let mut error = ValidationError::new("positive_amount");
        error.message = Some("Amount must be greater than zero".into());
        Err(error)
    }
}
