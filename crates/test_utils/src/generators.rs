//! Property-Based Test Generators
//!
//! Provides proptest strategies for generating charge and payment inputs
//! that pass the ledger's own validation.

use proptest::prelude::*;
use rust_decimal::Decimal;
use rust_decimal_macros::dec;

use domain_billing::{ChargeInput, ChargeType, PaymentMethod};

/// Strategy for prices with two decimal places, 0.01 to 99 999.99
pub fn price_strategy() -> impl Strategy<Value = Decimal> {
    (1i64..10_000_000i64).prop_map(|minor| Decimal::new(minor, 2))
}

/// Strategy for whole quantities, 1 to 9
pub fn quantity_strategy() -> impl Strategy<Value = Decimal> {
    (1i64..10i64).prop_map(Decimal::from)
}

/// Strategy for the GST slabs a charge can carry
pub fn tax_rate_strategy() -> impl Strategy<Value = Decimal> {
    prop_oneof![
        Just(dec!(0)),
        Just(dec!(5)),
        Just(dec!(12)),
        Just(dec!(18)),
        Just(dec!(28)),
    ]
}

/// Strategy for charge types that add to a folio
pub fn debit_charge_type_strategy() -> impl Strategy<Value = ChargeType> {
    prop_oneof![
        Just(ChargeType::Room),
        Just(ChargeType::Service),
        Just(ChargeType::Amenity),
        Just(ChargeType::Restaurant),
        Just(ChargeType::Minibar),
        Just(ChargeType::Laundry),
    ]
}

pub fn payment_method_strategy() -> impl Strategy<Value = PaymentMethod> {
    prop_oneof![
        Just(PaymentMethod::Cash),
        Just(PaymentMethod::Card),
        Just(PaymentMethod::Upi),
        Just(PaymentMethod::BankTransfer),
        Just(PaymentMethod::Wallet),
    ]
}

/// Strategy for valid taxable debit charge inputs with an explicit rate
pub fn charge_input_strategy() -> impl Strategy<Value = ChargeInput> {
    (
        debit_charge_type_strategy(),
        price_strategy(),
        quantity_strategy(),
        tax_rate_strategy(),
    )
        .prop_map(|(charge_type, unit_price, quantity, rate)| {
            ChargeInput::new(charge_type, format!("{} line", charge_type.as_str()), unit_price)
                .with_quantity(quantity)
                .with_tax_rate(rate)
        })
}

#[cfg(test)]
mod tests {
    use super::*;

    proptest! {
        #[test]
        fn generated_charge_inputs_validate(input in charge_input_strategy()) {
            prop_assert!(input.validate().is_ok());
            prop_assert!(input.gross_amount() > Decimal::ZERO);
        }

        #[test]
        fn generated_prices_have_two_places(price in price_strategy()) {
            prop_assert!(price.scale() <= 2);
            prop_assert!(price > Decimal::ZERO);
        }
    }
}
