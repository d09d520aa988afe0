//! Ad-hoc service charges and refunds

use rust_decimal::Decimal;

use crate::charge::{ChargeInput, ChargeSource, ChargeType};
use crate::error::BillingError;

/// Checks a caller-described service charge
///
/// Any debit type is accepted; credits go through [`refund`] or a discount.
pub fn service_charge(input: ChargeInput) -> Result<ChargeInput, BillingError> {
    if input.charge_type.is_credit() || input.charge_type == ChargeType::Reversal {
        return Err(BillingError::InvalidInput(format!(
            "{} is not a service charge type",
            input.charge_type.as_str()
        )));
    }
    input.validate()?;
    Ok(input)
}

/// A non-taxable refund line for `amount`, given as a positive figure
pub fn refund(
    amount: Decimal,
    description: impl Into<String>,
    source: Option<ChargeSource>,
) -> Result<ChargeInput, BillingError> {
    if amount <= Decimal::ZERO {
        return Err(BillingError::InvalidAmount(format!(
            "refund amount must be positive, got {}",
            amount
        )));
    }
    let mut input = ChargeInput::new(ChargeType::Refund, description, -amount).taxable(false);
    input.source = source;
    input.validate()?;
    Ok(input)
}

#[cfg(test)]
mod tests {
    use super::*;
    use rust_decimal_macros::dec;

    #[test]
    fn test_refund_is_negative_and_untaxed() {
        let input = refund(dec!(250), "Early checkout", None).unwrap();
        assert_eq!(input.gross_amount(), dec!(-250));
        assert!(!input.is_taxable);
        assert!(refund(dec!(0), "Nothing", None).is_err());
    }

    #[test]
    fn test_service_charge_rejects_credit_types() {
        let discount = ChargeInput::new(ChargeType::Discount, "Loyalty", dec!(-100));
        assert!(matches!(service_charge(discount), Err(BillingError::InvalidInput(_))));

        let laundry = ChargeInput::new(ChargeType::Laundry, "Pressing", dec!(150));
        assert!(service_charge(laundry).is_ok());
    }
}
