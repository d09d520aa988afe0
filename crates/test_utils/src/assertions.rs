//! Custom Test Assertions
//!
//! Provides assertion helpers for ledger invariants that give more
//! meaningful failure messages than plain `assert_eq!`.

use rust_decimal::Decimal;

use core_kernel::Money;
use domain_billing::{Folio, FolioCharge, Invoice};

/// Asserts that a Money value carries exactly `expected`
///
/// # Panics
///
/// Panics if the amounts differ
pub fn assert_money_eq(actual: &Money, expected: Decimal) {
    assert_eq!(
        actual.amount(),
        expected,
        "Money mismatch: actual={} {}, expected={} {}",
        actual.currency().symbol(),
        actual.amount(),
        actual.currency().symbol(),
        expected
    );
}

/// Asserts that a Money value is zero
pub fn assert_money_zero(money: &Money) {
    assert!(
        money.is_zero(),
        "Expected zero money, got {} {}",
        money.currency().symbol(),
        money.amount()
    );
}

/// Asserts `balance == total_charges + total_tax - total_payments`
pub fn assert_folio_balanced(folio: &Folio) {
    let expected =
        folio.total_charges.amount() + folio.total_tax.amount() - folio.total_payments.amount();
    assert_eq!(
        folio.balance.amount(),
        expected,
        "Folio {} out of balance: charges={}, tax={}, payments={}, balance={}",
        folio.id,
        folio.total_charges.amount(),
        folio.total_tax.amount(),
        folio.total_payments.amount(),
        folio.balance.amount()
    );
}

/// Asserts that the folio aggregates are the sums over `charges`
pub fn assert_folio_matches_charges(folio: &Folio, charges: &[FolioCharge]) {
    let amount: Decimal = charges.iter().map(|c| c.amount.amount()).sum();
    let tax: Decimal = charges.iter().map(|c| c.tax_amount.amount()).sum();
    assert_eq!(
        folio.total_charges.amount(),
        amount,
        "Folio {} total_charges does not match its {} charges",
        folio.id,
        charges.len()
    );
    assert_eq!(
        folio.total_tax.amount(),
        tax,
        "Folio {} total_tax does not match its {} charges",
        folio.id,
        charges.len()
    );
    assert_folio_balanced(folio);
}

/// Asserts the invoice's internal arithmetic
///
/// `total == subtotal + tax`, `balance == total - paid`, and the items sum
/// to the header.
pub fn assert_invoice_consistent(invoice: &Invoice) {
    let subtotal = invoice.subtotal.amount();
    let tax = invoice.tax_amount.amount();
    let total = invoice.total_amount.amount();

    assert_eq!(total, subtotal + tax, "Invoice {} total != subtotal + tax", invoice.invoice_number);
    assert_eq!(
        invoice.balance_amount.amount(),
        total - invoice.paid_amount.amount(),
        "Invoice {} balance != total - paid",
        invoice.invoice_number
    );

    let item_amounts: Decimal = invoice.items.iter().map(|i| i.amount.amount()).sum();
    let item_totals: Decimal = invoice.items.iter().map(|i| i.total_price.amount()).sum();
    assert_eq!(item_amounts, subtotal, "Invoice {} items do not sum to subtotal", invoice.invoice_number);
    assert_eq!(item_totals, total, "Invoice {} items do not sum to total", invoice.invoice_number);
}

/// Asserts that `reversal` cancels `original` exactly
pub fn assert_reverses(reversal: &FolioCharge, original: &FolioCharge) {
    assert_eq!(
        reversal.reverses_charge_id,
        Some(original.id),
        "Charge {} does not reverse {}",
        reversal.id,
        original.id
    );
    assert_eq!(reversal.amount.amount(), -original.amount.amount());
    assert_eq!(reversal.tax_amount.amount(), -original.tax_amount.amount());
    assert_eq!(reversal.total_amount.amount(), -original.total_amount.amount());
}
