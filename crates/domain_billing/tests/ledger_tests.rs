//! Ledger Service Tests
//!
//! End-to-end tests of `BillingService` over the in-memory adapters.
//!
//! # Test Organization
//!
//! - `folios` - Opening folios, posting, reversing and reconciling charges
//! - `room_stays` - Room charge production and re-runs
//! - `invoicing` - Invoice generation, numbering and dispatch
//! - `payments` - Settlement, overpayment, refunds and deposits
//! - `restaurant` - Order pricing and the hotel folio bridge
//! - `concurrency` - Parallel postings against one folio
//! - `lock_discipline` - Every write runs under the folio and invoice locks
//! - `invariants` - Property tests of the balance identity

mod common;

use chrono::{Datelike, TimeZone, Utc};
use rust_decimal::Decimal;
use rust_decimal_macros::dec;

use common::Harness;
use core_kernel::{GuestId, OrderId, ReservationId, RoomId};
use domain_billing::ports::mock::{MemoryLedgerStore, RecordingNotifier};
use domain_billing::{
    AuditAction, BillingError, ChargeInput, ChargeType, ErrorKind, FolioOwner, FolioStatus,
    GuestType, InvoiceStatus, LedgerKind, LedgerStore, OrderDiscount, OrderLine, PageRequest,
    PaymentInput, PaymentMethod, PaymentStatus, ReservationSummary, RestaurantOrder, RoomSummary,
};

fn room_charge(amount: Decimal) -> ChargeInput {
    ChargeInput::new(ChargeType::Room, "Room 101 - 1 night", amount)
}

fn transfer_charge(amount: Decimal) -> ChargeInput {
    ChargeInput::new(ChargeType::Service, "Airport transfer", amount).taxable(false)
}

// ============================================================================
// FOLIOS
// ============================================================================

mod folios {
    use super::*;

    #[tokio::test]
    async fn test_create_folio_is_idempotent() {
        let h = Harness::new();
        let (reservation, folio) = h.hotel_stay(dec!(2500), 2).await;

        let again = h
            .service
            .create_folio(reservation.id, reservation.guest_id, h.actor)
            .await
            .unwrap();
        assert_eq!(again.id, folio.id);
        assert_eq!(folio.status, FolioStatus::Active);
        assert!(folio.total_charges.is_zero());

        let opened = h
            .store
            .audit_entries()
            .await
            .into_iter()
            .filter(|e| e.action == AuditAction::FolioOpened)
            .count();
        assert_eq!(opened, 1);
    }

    #[tokio::test]
    async fn test_create_folio_for_unknown_reservation() {
        let h = Harness::new();
        let err = h
            .service
            .create_folio(ReservationId::new(), GuestId::new(), h.actor)
            .await
            .unwrap_err();
        assert!(matches!(err, BillingError::ReferenceNotFound { entity: "Reservation", .. }));
        assert_eq!(err.kind(), ErrorKind::NotFound);
    }

    #[tokio::test]
    async fn test_create_folio_for_another_guest() {
        let h = Harness::new();
        let guest = h.guest("Asha Rao").await;
        let room = h.room("101", dec!(2500)).await;
        let reservation = h.reservation(&guest, &[room], 1).await;

        let err = h
            .service
            .create_folio(reservation.id, GuestId::new(), h.actor)
            .await
            .unwrap_err();
        assert!(matches!(err, BillingError::InvalidInput(_)));
        assert!(h.store.snapshot().await.folios.is_empty());
    }

    /// Room 1000 taxable plus service 500 non-taxable at 18%
    #[tokio::test]
    async fn test_mixed_taxability_totals() {
        let h = Harness::new();
        let (_, folio) = h.hotel_stay(dec!(1000), 1).await;

        h.service
            .post_charge(LedgerKind::Hotel, folio.id, room_charge(dec!(1000)), h.actor)
            .await
            .unwrap();
        let transfer = h
            .service
            .post_charge(LedgerKind::Hotel, folio.id, transfer_charge(dec!(500)), h.actor)
            .await
            .unwrap();
        assert!(transfer.tax_amount.is_zero());

        let detail = h.service.get_folio(LedgerKind::Hotel, folio.id).await.unwrap();
        assert_eq!(detail.charges.len(), 2);
        assert_eq!(detail.folio.total_charges.amount(), dec!(1500));
        assert_eq!(detail.folio.total_tax.amount(), dec!(180));
        assert!(detail.folio.total_payments.is_zero());
        assert_eq!(detail.folio.balance.amount(), dec!(1680));
        assert!(detail.guest.is_some());
        assert!(detail.reservation.is_some());
    }

    #[tokio::test]
    async fn test_invalid_charge_writes_nothing() {
        let h = Harness::new();
        let (_, folio) = h.hotel_stay(dec!(1000), 1).await;

        let blank = ChargeInput::new(ChargeType::Minibar, "   ", dec!(120));
        let err = h
            .service
            .post_charge(LedgerKind::Hotel, folio.id, blank, h.actor)
            .await
            .unwrap_err();
        assert!(matches!(err, BillingError::InvalidInput(_)));

        let negative = ChargeInput::new(ChargeType::Minibar, "Water", dec!(-20));
        let err = h
            .service
            .post_charge(LedgerKind::Hotel, folio.id, negative, h.actor)
            .await
            .unwrap_err();
        assert_eq!(err.kind(), ErrorKind::InvalidInput);

        assert!(h.store.snapshot().await.charges.is_empty());
    }

    #[tokio::test]
    async fn test_post_to_unknown_folio() {
        let h = Harness::new();
        let err = h
            .service
            .post_charge(LedgerKind::Hotel, core_kernel::FolioId::new(), room_charge(dec!(100)), h.actor)
            .await
            .unwrap_err();
        assert!(matches!(err, BillingError::FolioNotFound(_)));
    }

    #[tokio::test]
    async fn test_reverse_charge_restores_balance() {
        let h = Harness::new();
        let (_, folio) = h.hotel_stay(dec!(1000), 1).await;
        let charge = h
            .service
            .post_charge(LedgerKind::Hotel, folio.id, room_charge(dec!(1000)), h.actor)
            .await
            .unwrap();

        let reversal = h
            .service
            .reverse_charge(LedgerKind::Hotel, folio.id, charge.id, Some("Wrong room".into()), h.actor)
            .await
            .unwrap();
        assert_eq!(reversal.charge_type, ChargeType::Reversal);
        assert_eq!(reversal.reverses_charge_id, Some(charge.id));
        assert_eq!(reversal.amount.amount(), dec!(-1000));
        assert_eq!(reversal.tax_amount.amount(), dec!(-180));

        let totals = h.service.recompute_totals(LedgerKind::Hotel, folio.id).await.unwrap();
        assert!(totals.total_charges.is_zero());
        assert!(totals.total_tax.is_zero());
        assert!(totals.balance.is_zero());

        let again = h
            .service
            .reverse_charge(LedgerKind::Hotel, folio.id, charge.id, None, h.actor)
            .await
            .unwrap_err();
        assert!(matches!(again, BillingError::InvalidState(_)));

        let of_reversal = h
            .service
            .reverse_charge(LedgerKind::Hotel, folio.id, reversal.id, None, h.actor)
            .await
            .unwrap_err();
        assert!(matches!(of_reversal, BillingError::InvalidState(_)));
    }

    #[tokio::test]
    async fn test_refund_lowers_balance_untaxed() {
        let h = Harness::new();
        let (_, folio) = h.hotel_stay(dec!(1000), 1).await;
        h.service
            .post_charge(LedgerKind::Hotel, folio.id, room_charge(dec!(1000)), h.actor)
            .await
            .unwrap();

        let refund = h
            .service
            .post_refund(LedgerKind::Hotel, folio.id, dec!(200), "Late check-in goodwill", h.actor)
            .await
            .unwrap();
        assert_eq!(refund.charge_type, ChargeType::Refund);
        assert_eq!(refund.amount.amount(), dec!(-200));
        assert!(!refund.is_taxable);

        let detail = h.service.get_folio(LedgerKind::Hotel, folio.id).await.unwrap();
        assert_eq!(detail.folio.total_charges.amount(), dec!(800));
        assert_eq!(detail.folio.total_tax.amount(), dec!(180));
        assert_eq!(detail.folio.balance.amount(), dec!(980));
    }

    #[tokio::test]
    async fn test_service_charge_rejects_credits() {
        let h = Harness::new();
        let (_, folio) = h.hotel_stay(dec!(1000), 1).await;

        let err = h
            .service
            .post_service_charge(
                LedgerKind::Hotel,
                folio.id,
                ChargeInput::new(ChargeType::Discount, "Loyalty", dec!(-50)),
                h.actor,
            )
            .await
            .unwrap_err();
        assert!(matches!(err, BillingError::InvalidInput(_)));

        let spa = h
            .service
            .post_service_charge(
                LedgerKind::Hotel,
                folio.id,
                ChargeInput::new(ChargeType::Amenity, "Spa session", dec!(1500)),
                h.actor,
            )
            .await
            .unwrap();
        assert_eq!(spa.tax_amount.amount(), dec!(270));
    }

    #[tokio::test]
    async fn test_recompute_totals_is_stable() {
        let h = Harness::new();
        let (_, folio) = h.hotel_stay(dec!(1000), 1).await;
        for _ in 0..3 {
            h.service
                .post_charge(
                    LedgerKind::Hotel,
                    folio.id,
                    ChargeInput::new(ChargeType::Minibar, "Juice", dec!(0.05)),
                    h.actor,
                )
                .await
                .unwrap();
        }

        let first = h.service.recompute_totals(LedgerKind::Hotel, folio.id).await.unwrap();
        let second = h.service.recompute_totals(LedgerKind::Hotel, folio.id).await.unwrap();
        assert_eq!(first, second);
        assert_eq!(first.total_charges.amount(), dec!(0.15));
        assert_eq!(first.total_tax.amount(), dec!(0.03));
    }

    #[tokio::test]
    async fn test_untaxed_charge_needs_no_rate_table_entry() {
        let h = Harness::new();
        let (_, folio) = h.hotel_stay(dec!(1000), 1).await;
        let before_gst = Utc.with_ymd_and_hms(2016, 1, 1, 12, 0, 0).unwrap();

        let explicit = h
            .service
            .post_charge(
                LedgerKind::Hotel,
                folio.id,
                ChargeInput::new(ChargeType::Laundry, "Laundry (old account)", dec!(300))
                    .taxable(false)
                    .with_tax_rate(dec!(0))
                    .on(before_gst),
                h.actor,
            )
            .await
            .unwrap();
        assert!(explicit.tax_amount.is_zero());
        assert_eq!(explicit.charge_date, before_gst);

        let implicit = h
            .service
            .post_charge(
                LedgerKind::Hotel,
                folio.id,
                ChargeInput::new(ChargeType::Service, "Porterage", dec!(200))
                    .taxable(false)
                    .on(before_gst),
                h.actor,
            )
            .await
            .unwrap();
        assert!(implicit.tax_amount.is_zero());

        let taxable = h
            .service
            .post_charge(LedgerKind::Hotel, folio.id, room_charge(dec!(1000)).on(before_gst), h.actor)
            .await
            .unwrap_err();
        assert!(matches!(taxable, BillingError::Configuration(_)));

        let detail = h.service.get_folio(LedgerKind::Hotel, folio.id).await.unwrap();
        assert_eq!(detail.charges.len(), 2);
        assert_eq!(detail.folio.balance.amount(), dec!(500));
    }
}

// ============================================================================
// ROOM STAYS
// ============================================================================

mod room_stays {
    use super::*;

    #[tokio::test]
    async fn test_room_charges_rerun_only_on_change() {
        let h = Harness::new();
        let (reservation, folio) = h.hotel_stay(dec!(2500), 3).await;

        let written = h
            .service
            .post_room_stay_charges(reservation.id, h.actor)
            .await
            .unwrap();
        assert_eq!(written.len(), 1);
        assert_eq!(written[0].quantity, dec!(3));
        assert_eq!(written[0].amount.amount(), dec!(7500));
        assert_eq!(written[0].description, "Room 101 - 3 nights");

        let rerun = h
            .service
            .post_room_stay_charges(reservation.id, h.actor)
            .await
            .unwrap();
        assert!(rerun.is_empty());

        h.directory
            .add_room(RoomSummary {
                id: reservation.room_ids[0],
                room_number: "101".into(),
                nightly_rate: dec!(3000),
            })
            .await;
        let repriced = h
            .service
            .post_room_stay_charges(reservation.id, h.actor)
            .await
            .unwrap();
        assert_eq!(repriced.len(), 2);
        assert_eq!(repriced[0].reverses_charge_id, Some(written[0].id));

        let detail = h.service.get_folio(LedgerKind::Hotel, folio.id).await.unwrap();
        assert_eq!(detail.folio.total_charges.amount(), dec!(9000));
        assert_eq!(detail.folio.total_tax.amount(), dec!(1620));
    }

    #[tokio::test]
    async fn test_unknown_room_fails_before_writing() {
        let h = Harness::new();
        let guest = h.guest("Asha Rao").await;
        let known = h.room("101", dec!(2500)).await;
        let mut reservation = h.reservation(&guest, &[known], 2).await;
        reservation.room_ids.push(RoomId::new());
        h.directory.add_reservation(reservation.clone()).await;
        h.service.create_folio(reservation.id, guest.id, h.actor).await.unwrap();

        let err = h
            .service
            .post_room_stay_charges(reservation.id, h.actor)
            .await
            .unwrap_err();
        assert!(matches!(err, BillingError::ReferenceNotFound { entity: "Room", .. }));
        assert!(h.store.snapshot().await.charges.is_empty());
    }
}

// ============================================================================
// INVOICING
// ============================================================================

mod invoicing {
    use super::*;

    fn year() -> i32 {
        Utc::now().year()
    }

    #[tokio::test]
    async fn test_invoice_freezes_folio() {
        let h = Harness::new();
        let (_, folio) = h.hotel_stay(dec!(1000), 1).await;
        h.service
            .post_charge(LedgerKind::Hotel, folio.id, room_charge(dec!(1000)), h.actor)
            .await
            .unwrap();
        h.service
            .post_charge(LedgerKind::Hotel, folio.id, transfer_charge(dec!(500)), h.actor)
            .await
            .unwrap();

        let invoice = h
            .service
            .generate_invoice(LedgerKind::Hotel, folio.id, h.actor)
            .await
            .unwrap();
        assert_eq!(invoice.invoice_number, format!("INV-{}-000001", year()));
        assert_eq!(invoice.subtotal.amount(), dec!(1500));
        assert_eq!(invoice.tax_amount.amount(), dec!(180));
        assert_eq!(invoice.total_amount.amount(), dec!(1680));
        assert_eq!(invoice.balance_amount.amount(), dec!(1680));
        assert_eq!(invoice.status, InvoiceStatus::Sent);
        assert_eq!(invoice.items.len(), 2);
        let item_tax: Decimal = invoice.items.iter().map(|i| i.tax_amount.amount()).sum();
        assert_eq!(item_tax, dec!(180));

        let detail = h.service.get_folio(LedgerKind::Hotel, folio.id).await.unwrap();
        assert_eq!(detail.folio.status, FolioStatus::Closed);
        assert!(detail.folio.closed_date.is_some());

        let late = h
            .service
            .post_charge(LedgerKind::Hotel, folio.id, room_charge(dec!(100)), h.actor)
            .await
            .unwrap_err();
        assert!(matches!(late, BillingError::FolioClosed(_)));
        assert_eq!(late.kind(), ErrorKind::InvalidState);
    }

    #[tokio::test]
    async fn test_generate_twice_returns_same_invoice() {
        let h = Harness::new();
        let (_, folio) = h.hotel_stay(dec!(1000), 1).await;
        h.service
            .post_charge(LedgerKind::Hotel, folio.id, room_charge(dec!(1000)), h.actor)
            .await
            .unwrap();

        let first = h.service.generate_invoice(LedgerKind::Hotel, folio.id, h.actor).await.unwrap();
        let second = h.service.generate_invoice(LedgerKind::Hotel, folio.id, h.actor).await.unwrap();
        assert_eq!(first.id, second.id);
        assert_eq!(first.invoice_number, second.invoice_number);
        assert_eq!(h.store.snapshot().await.invoices.len(), 1);
    }

    #[tokio::test]
    async fn test_empty_folio_is_not_invoiced() {
        let h = Harness::new();
        let (_, folio) = h.hotel_stay(dec!(1000), 1).await;

        let err = h
            .service
            .generate_invoice(LedgerKind::Hotel, folio.id, h.actor)
            .await
            .unwrap_err();
        assert!(matches!(err, BillingError::InvalidState(_)));

        let detail = h.service.get_folio(LedgerKind::Hotel, folio.id).await.unwrap();
        assert_eq!(detail.folio.status, FolioStatus::Active);
    }

    #[tokio::test]
    async fn test_numbers_are_sequential_per_ledger() {
        let h = Harness::new();
        let (_, first) = h.hotel_stay(dec!(1000), 1).await;
        let (_, second) = h.hotel_stay(dec!(1000), 1).await;
        for folio in [&first, &second] {
            h.service
                .post_charge(LedgerKind::Hotel, folio.id, room_charge(dec!(1000)), h.actor)
                .await
                .unwrap();
        }

        let a = h.service.generate_invoice(LedgerKind::Hotel, first.id, h.actor).await.unwrap();
        let b = h.service.generate_invoice(LedgerKind::Hotel, second.id, h.actor).await.unwrap();
        assert_eq!(a.invoice_number, format!("INV-{}-000001", year()));
        assert_eq!(b.invoice_number, format!("INV-{}-000002", year()));

        let order = OrderId::new();
        let restaurant = h.service.open_restaurant_folio(order, None, h.actor).await.unwrap();
        h.service
            .post_charge(
                LedgerKind::Restaurant,
                restaurant.id,
                ChargeInput::new(ChargeType::Restaurant, "Lunch", dec!(400)),
                h.actor,
            )
            .await
            .unwrap();
        let r = h
            .service
            .generate_invoice(LedgerKind::Restaurant, restaurant.id, h.actor)
            .await
            .unwrap();
        assert_eq!(r.invoice_number, format!("RINV-{}-000001", year()));
    }

    #[tokio::test]
    async fn test_number_collision_is_retried() {
        let h = Harness::with_store(MemoryLedgerStore::default());
        let (_, first) = h.hotel_stay(dec!(1000), 1).await;
        let (_, second) = h.hotel_stay(dec!(1000), 1).await;
        for folio in [&first, &second] {
            h.service
                .post_charge(LedgerKind::Hotel, folio.id, room_charge(dec!(1000)), h.actor)
                .await
                .unwrap();
        }
        h.service.generate_invoice(LedgerKind::Hotel, first.id, h.actor).await.unwrap();

        h.store.inject_stale_sequence_reads(1);
        let invoice = h
            .service
            .generate_invoice(LedgerKind::Hotel, second.id, h.actor)
            .await
            .unwrap();
        assert_eq!(invoice.invoice_number, format!("INV-{}-000002", year()));
    }

    #[tokio::test]
    async fn test_exhausted_retries_roll_back() {
        let h = Harness::new();
        let (_, first) = h.hotel_stay(dec!(1000), 1).await;
        let (_, second) = h.hotel_stay(dec!(1000), 1).await;
        for folio in [&first, &second] {
            h.service
                .post_charge(LedgerKind::Hotel, folio.id, room_charge(dec!(1000)), h.actor)
                .await
                .unwrap();
        }
        h.service.generate_invoice(LedgerKind::Hotel, first.id, h.actor).await.unwrap();

        h.store.inject_stale_sequence_reads(10);
        let err = h
            .service
            .generate_invoice(LedgerKind::Hotel, second.id, h.actor)
            .await
            .unwrap_err();
        assert!(matches!(err, BillingError::Conflict(_)));
        assert_eq!(err.kind(), ErrorKind::Conflict);

        let detail = h.service.get_folio(LedgerKind::Hotel, second.id).await.unwrap();
        assert_eq!(detail.folio.status, FolioStatus::Active);
        assert_eq!(h.store.snapshot().await.invoices.len(), 1);
    }

    #[tokio::test]
    async fn test_dispatch_sends_full_detail() {
        let h = Harness::new();
        let (reservation, folio) = h.hotel_stay(dec!(1000), 1).await;
        h.service
            .post_charge(LedgerKind::Hotel, folio.id, room_charge(dec!(1000)), h.actor)
            .await
            .unwrap();

        let outcome = h
            .service
            .generate_and_dispatch_invoice(LedgerKind::Hotel, folio.id, h.actor)
            .await
            .unwrap();
        assert!(outcome.delivered());
        assert_eq!(outcome.detail.reservation.as_ref().map(|r| r.id), Some(reservation.id));
        assert!(outcome.detail.guest.is_some());
        assert_eq!(h.notifier.sent().await, vec![outcome.detail.invoice.id]);
    }

    #[tokio::test]
    async fn test_notifier_failure_keeps_invoice() {
        let h = Harness::with_notifier(RecordingNotifier::failing("mail relay"));
        let (_, folio) = h.hotel_stay(dec!(1000), 1).await;
        h.service
            .post_charge(LedgerKind::Hotel, folio.id, room_charge(dec!(1000)), h.actor)
            .await
            .unwrap();

        let outcome = h
            .service
            .generate_and_dispatch_invoice(LedgerKind::Hotel, folio.id, h.actor)
            .await
            .unwrap();
        assert!(!outcome.delivered());
        assert!(outcome.notification_error.is_some());

        let stored = h
            .service
            .get_invoice_details(LedgerKind::Hotel, outcome.detail.invoice.id)
            .await
            .unwrap();
        assert_eq!(stored.invoice.total_amount.amount(), dec!(1180));
    }
}

// ============================================================================
// PAYMENTS
// ============================================================================

mod payments {
    use super::*;
    use domain_billing::Invoice;

    async fn invoiced_stay(h: &Harness, room: Decimal) -> (ReservationId, Invoice) {
        let (reservation, folio) = h.hotel_stay(room, 1).await;
        h.service
            .post_charge(LedgerKind::Hotel, folio.id, room_charge(room), h.actor)
            .await
            .unwrap();
        let invoice = h
            .service
            .generate_invoice(LedgerKind::Hotel, folio.id, h.actor)
            .await
            .unwrap();
        (reservation.id, invoice)
    }

    #[tokio::test]
    async fn test_full_settlement() {
        let h = Harness::new();
        let (reservation_id, invoice) = invoiced_stay(&h, dec!(1000)).await;

        let payment = h
            .service
            .record_payment(
                LedgerKind::Hotel,
                Some(invoice.id),
                PaymentInput::new(dec!(1180), PaymentMethod::Card),
                h.actor,
            )
            .await
            .unwrap();
        assert_eq!(payment.status, PaymentStatus::Completed);
        assert!(payment.reference_number.starts_with("PAY-"));

        let detail = h.service.get_invoice_details(LedgerKind::Hotel, invoice.id).await.unwrap();
        assert_eq!(detail.invoice.status, InvoiceStatus::Paid);
        assert!(detail.invoice.balance_amount.is_zero());
        assert_eq!(detail.payments.len(), 1);

        let folio = h.service.get_folio_by_reservation(reservation_id).await.unwrap();
        assert_eq!(folio.folio.total_payments.amount(), dec!(1180));
        assert!(folio.folio.balance.is_zero());

        let actions: Vec<AuditAction> = h.store.audit_entries().await.iter().map(|e| e.action).collect();
        assert!(actions.contains(&AuditAction::InvoiceGenerated));
        assert!(actions.contains(&AuditAction::PaymentRecorded));
    }

    #[tokio::test]
    async fn test_overpayment_is_rejected_without_writes() {
        let h = Harness::new();
        let (_, invoice) = invoiced_stay(&h, dec!(1000)).await;

        h.service
            .record_payment(
                LedgerKind::Hotel,
                Some(invoice.id),
                PaymentInput::new(dec!(1000), PaymentMethod::Cash),
                h.actor,
            )
            .await
            .unwrap();
        let partial = h.service.get_invoice_details(LedgerKind::Hotel, invoice.id).await.unwrap();
        assert_eq!(partial.invoice.status, InvoiceStatus::PartiallyPaid);

        let err = h
            .service
            .record_payment(
                LedgerKind::Hotel,
                Some(invoice.id),
                PaymentInput::new(dec!(500), PaymentMethod::Cash),
                h.actor,
            )
            .await
            .unwrap_err();
        assert!(matches!(err, BillingError::PaymentExceedsBalance { .. }));
        assert_eq!(err.kind(), ErrorKind::Conflict);

        let after = h.service.get_invoice_details(LedgerKind::Hotel, invoice.id).await.unwrap();
        assert_eq!(after.invoice.paid_amount.amount(), dec!(1000));
        assert_eq!(after.payments.len(), 1);
    }

    #[tokio::test]
    async fn test_non_positive_amount_is_rejected() {
        let h = Harness::new();
        let (_, invoice) = invoiced_stay(&h, dec!(1000)).await;

        for amount in [dec!(0), dec!(-10), dec!(0.001)] {
            let err = h
                .service
                .record_payment(
                    LedgerKind::Hotel,
                    Some(invoice.id),
                    PaymentInput::new(amount, PaymentMethod::Upi),
                    h.actor,
                )
                .await
                .unwrap_err();
            assert!(matches!(err, BillingError::InvalidAmount(_)), "{}", amount);
        }
        assert!(h.store.snapshot().await.payments.is_empty());
    }

    #[tokio::test]
    async fn test_duplicate_reference_conflicts() {
        let h = Harness::new();
        let (_, invoice) = invoiced_stay(&h, dec!(1000)).await;
        let input = PaymentInput::new(dec!(100), PaymentMethod::Card).with_reference("RCPT-9");

        h.service
            .record_payment(LedgerKind::Hotel, Some(invoice.id), input.clone(), h.actor)
            .await
            .unwrap();
        let err = h
            .service
            .record_payment(LedgerKind::Hotel, Some(invoice.id), input, h.actor)
            .await
            .unwrap_err();
        assert_eq!(err.kind(), ErrorKind::Conflict);

        let detail = h.service.get_invoice_details(LedgerKind::Hotel, invoice.id).await.unwrap();
        assert_eq!(detail.invoice.paid_amount.amount(), dec!(100));
    }

    #[tokio::test]
    async fn test_refund_restores_invoice_and_folio() {
        let h = Harness::new();
        let (reservation_id, invoice) = invoiced_stay(&h, dec!(1000)).await;
        let payment = h
            .service
            .record_payment(
                LedgerKind::Hotel,
                Some(invoice.id),
                PaymentInput::new(dec!(1180), PaymentMethod::Card),
                h.actor,
            )
            .await
            .unwrap();

        let refunded = h
            .service
            .refund_payment(LedgerKind::Hotel, payment.id, h.actor)
            .await
            .unwrap();
        assert_eq!(refunded.status, PaymentStatus::Refunded);

        let detail = h.service.get_invoice_details(LedgerKind::Hotel, invoice.id).await.unwrap();
        assert!(detail.invoice.paid_amount.is_zero());
        assert_eq!(detail.invoice.balance_amount.amount(), dec!(1180));
        assert_eq!(detail.invoice.status, InvoiceStatus::Sent);

        let folio = h.service.get_folio_by_reservation(reservation_id).await.unwrap();
        assert_eq!(folio.folio.balance.amount(), dec!(1180));

        let twice = h
            .service
            .refund_payment(LedgerKind::Hotel, payment.id, h.actor)
            .await
            .unwrap_err();
        assert!(matches!(twice, BillingError::InvalidState(_)));
    }

    #[tokio::test]
    async fn test_deposit_counts_toward_folio() {
        let h = Harness::new();
        let (reservation, folio) = h.hotel_stay(dec!(1000), 1).await;
        h.service
            .post_charge(LedgerKind::Hotel, folio.id, room_charge(dec!(1000)), h.actor)
            .await
            .unwrap();

        let owner = FolioOwner::Reservation(reservation.id);
        let deposit = h
            .service
            .record_payment(
                LedgerKind::Hotel,
                None,
                PaymentInput::new(dec!(500), PaymentMethod::BankTransfer).for_owner(owner),
                h.actor,
            )
            .await
            .unwrap();
        assert!(deposit.invoice_id.is_none());
        assert_eq!(deposit.guest_id, Some(reservation.guest_id));

        let detail = h.service.get_folio(LedgerKind::Hotel, folio.id).await.unwrap();
        assert_eq!(detail.folio.total_payments.amount(), dec!(500));
        assert_eq!(detail.folio.balance.amount(), dec!(680));

        let ownerless = h
            .service
            .record_payment(LedgerKind::Hotel, None, PaymentInput::new(dec!(10), PaymentMethod::Cash), h.actor)
            .await
            .unwrap_err();
        assert!(matches!(ownerless, BillingError::InvalidInput(_)));

        let wrong_ledger = h
            .service
            .record_payment(
                LedgerKind::Hotel,
                None,
                PaymentInput::new(dec!(10), PaymentMethod::Cash)
                    .for_owner(FolioOwner::RestaurantOrder(OrderId::new())),
                h.actor,
            )
            .await
            .unwrap_err();
        assert!(matches!(wrong_ledger, BillingError::InvalidInput(_)));

        let no_folio = h
            .service
            .record_payment(
                LedgerKind::Hotel,
                None,
                PaymentInput::new(dec!(10), PaymentMethod::Cash)
                    .for_owner(FolioOwner::Reservation(ReservationId::new())),
                h.actor,
            )
            .await
            .unwrap_err();
        assert!(matches!(no_folio, BillingError::FolioNotFound(_)));
    }

    #[tokio::test]
    async fn test_payment_history_pages() {
        let h = Harness::new();
        let (reservation, _) = h.hotel_stay(dec!(1000), 1).await;
        let owner = FolioOwner::Reservation(reservation.id);
        for _ in 0..5 {
            h.service
                .record_payment(
                    LedgerKind::Hotel,
                    None,
                    PaymentInput::new(dec!(100), PaymentMethod::Cash).for_owner(owner),
                    h.actor,
                )
                .await
                .unwrap();
        }

        let first = h
            .service
            .get_guest_payment_history(LedgerKind::Hotel, reservation.guest_id, PageRequest::new(1, 2).unwrap())
            .await
            .unwrap();
        assert_eq!(first.items.len(), 2);
        assert_eq!(first.total, 5);
        assert_eq!(first.total_pages, 3);
        assert!(first.items[0].payment_date >= first.items[1].payment_date);

        let last = h
            .service
            .get_guest_payment_history(LedgerKind::Hotel, reservation.guest_id, PageRequest::new(3, 2).unwrap())
            .await
            .unwrap();
        assert_eq!(last.items.len(), 1);

        let invalid = h
            .service
            .get_guest_payment_history(LedgerKind::Hotel, reservation.guest_id, PageRequest { page: 0, limit: 2 })
            .await
            .unwrap_err();
        assert!(matches!(invalid, BillingError::InvalidInput(_)));
    }

    #[tokio::test]
    async fn test_deposit_is_applied_when_invoiced() {
        let h = Harness::new();
        let (reservation, folio) = h.hotel_stay(dec!(1000), 1).await;
        h.service
            .post_charge(LedgerKind::Hotel, folio.id, room_charge(dec!(1000)), h.actor)
            .await
            .unwrap();
        let owner = FolioOwner::Reservation(reservation.id);
        h.service
            .record_payment(
                LedgerKind::Hotel,
                None,
                PaymentInput::new(dec!(500), PaymentMethod::Cash).for_owner(owner),
                h.actor,
            )
            .await
            .unwrap();

        let invoice = h
            .service
            .generate_invoice(LedgerKind::Hotel, folio.id, h.actor)
            .await
            .unwrap();
        assert_eq!(invoice.total_amount.amount(), dec!(1180));
        assert_eq!(invoice.paid_amount.amount(), dec!(500));
        assert_eq!(invoice.balance_amount.amount(), dec!(680));
        assert_eq!(invoice.status, InvoiceStatus::PartiallyPaid);

        let detail = h.service.get_invoice_details(LedgerKind::Hotel, invoice.id).await.unwrap();
        assert_eq!(detail.payments.len(), 1);
        assert_eq!(detail.payments[0].invoice_id, Some(invoice.id));

        let full = h
            .service
            .record_payment(
                LedgerKind::Hotel,
                Some(invoice.id),
                PaymentInput::new(dec!(1180), PaymentMethod::Card),
                h.actor,
            )
            .await
            .unwrap_err();
        assert!(matches!(full, BillingError::PaymentExceedsBalance { .. }));

        h.service
            .record_payment(
                LedgerKind::Hotel,
                Some(invoice.id),
                PaymentInput::new(dec!(680), PaymentMethod::Card),
                h.actor,
            )
            .await
            .unwrap();
        let settled = h.service.get_invoice_details(LedgerKind::Hotel, invoice.id).await.unwrap();
        assert_eq!(settled.invoice.status, InvoiceStatus::Paid);

        let folio = h.service.get_folio(LedgerKind::Hotel, folio.id).await.unwrap();
        assert_eq!(folio.folio.total_payments.amount(), dec!(1180));
        assert!(folio.folio.balance.is_zero());
    }

    #[tokio::test]
    async fn test_refunding_an_applied_deposit_reopens_invoice() {
        let h = Harness::new();
        let (reservation, folio) = h.hotel_stay(dec!(1000), 1).await;
        h.service
            .post_charge(LedgerKind::Hotel, folio.id, room_charge(dec!(1000)), h.actor)
            .await
            .unwrap();
        let deposit = h
            .service
            .record_payment(
                LedgerKind::Hotel,
                None,
                PaymentInput::new(dec!(500), PaymentMethod::Cash)
                    .for_owner(FolioOwner::Reservation(reservation.id)),
                h.actor,
            )
            .await
            .unwrap();
        let invoice = h
            .service
            .generate_invoice(LedgerKind::Hotel, folio.id, h.actor)
            .await
            .unwrap();
        assert_eq!(invoice.paid_amount.amount(), dec!(500));

        h.service
            .refund_payment(LedgerKind::Hotel, deposit.id, h.actor)
            .await
            .unwrap();

        let detail = h.service.get_invoice_details(LedgerKind::Hotel, invoice.id).await.unwrap();
        assert!(detail.invoice.paid_amount.is_zero());
        assert_eq!(detail.invoice.balance_amount.amount(), dec!(1180));
        assert_eq!(detail.invoice.status, InvoiceStatus::Sent);

        let folio = h.service.get_folio(LedgerKind::Hotel, folio.id).await.unwrap();
        assert_eq!(folio.folio.balance.amount(), dec!(1180));
    }

    #[tokio::test]
    async fn test_deposit_after_invoicing_settles_invoice() {
        let h = Harness::new();
        let (reservation_id, invoice) = invoiced_stay(&h, dec!(1000)).await;
        let owner = FolioOwner::Reservation(reservation_id);

        let late = h
            .service
            .record_payment(
                LedgerKind::Hotel,
                None,
                PaymentInput::new(dec!(500), PaymentMethod::Cash).for_owner(owner),
                h.actor,
            )
            .await
            .unwrap();
        assert_eq!(late.invoice_id, Some(invoice.id));

        let detail = h.service.get_invoice_details(LedgerKind::Hotel, invoice.id).await.unwrap();
        assert_eq!(detail.invoice.paid_amount.amount(), dec!(500));
        assert_eq!(detail.invoice.status, InvoiceStatus::PartiallyPaid);

        let too_much = h
            .service
            .record_payment(
                LedgerKind::Hotel,
                None,
                PaymentInput::new(dec!(1000), PaymentMethod::Cash).for_owner(owner),
                h.actor,
            )
            .await
            .unwrap_err();
        assert!(matches!(too_much, BillingError::PaymentExceedsBalance { .. }));
    }

    #[tokio::test]
    async fn test_reference_is_unique_across_ledgers() {
        let h = Harness::new();
        let (_, invoice) = invoiced_stay(&h, dec!(1000)).await;
        h.service
            .record_payment(
                LedgerKind::Hotel,
                Some(invoice.id),
                PaymentInput::new(dec!(100), PaymentMethod::Card).with_reference("RCPT-7"),
                h.actor,
            )
            .await
            .unwrap();

        let order_id = OrderId::new();
        h.service.open_restaurant_folio(order_id, None, h.actor).await.unwrap();
        let err = h
            .service
            .record_payment(
                LedgerKind::Restaurant,
                None,
                PaymentInput::new(dec!(100), PaymentMethod::Card)
                    .with_reference("RCPT-7")
                    .for_owner(FolioOwner::RestaurantOrder(order_id)),
                h.actor,
            )
            .await
            .unwrap_err();
        assert_eq!(err.kind(), ErrorKind::Conflict);

        let payments = h.store.snapshot().await.payments;
        assert_eq!(payments.len(), 1);
        assert!(payments.values().all(|p| p.kind == LedgerKind::Hotel));
    }
}

// ============================================================================
// RESTAURANT
// ============================================================================

mod restaurant {
    use super::*;

    struct Menu {
        paneer: OrderLine,
        naan: OrderLine,
    }

    /// Paneer tikka 250 + "full plate" 50, naan 100
    async fn menu(h: &Harness) -> Menu {
        let paneer = h.menu_item("Paneer tikka", dec!(250)).await;
        let full = h.variant(&paneer, "Full plate", dec!(50)).await;
        let naan = h.menu_item("Butter naan", dec!(100)).await;
        Menu {
            paneer: OrderLine { menu_item_id: paneer.id, variant_id: Some(full.id), quantity: 2 },
            naan: OrderLine { menu_item_id: naan.id, variant_id: None, quantity: 2 },
        }
    }

    fn walk_in(menu: &Menu) -> RestaurantOrder {
        RestaurantOrder {
            id: OrderId::new(),
            guest_type: GuestType::WalkIn,
            reservation_id: None,
            guest_id: None,
            lines: vec![menu.paneer.clone(), menu.naan.clone()],
            discount: OrderDiscount::None,
            service_charge_percent: dec!(5),
            tax_percent: Some(dec!(18)),
            tip: dec!(0),
        }
    }

    #[tokio::test]
    async fn test_walk_in_order_is_billed_on_restaurant_ledger() {
        let h = Harness::new();
        let menu = menu(&h).await;
        let order = walk_in(&menu);

        let posting = h.service.sync_restaurant_order(&order, h.actor).await.unwrap();
        let pricing = posting.pricing.as_ref().unwrap();
        assert_eq!(pricing.subtotal.amount(), dec!(800));
        assert_eq!(pricing.service_charge.amount(), dec!(40));
        assert_eq!(pricing.gst.amount(), dec!(151.20));
        assert_eq!(pricing.total.amount(), dec!(991.20));
        assert!(posting.hotel_folio.is_none());

        let folio = posting.restaurant_folio.unwrap();
        assert_eq!(folio.total_charges.amount(), dec!(840));
        assert_eq!(folio.total_tax.amount(), dec!(151.20));
        assert_eq!(folio.balance.amount(), dec!(991.20));

        let invoice = h.service.bill_restaurant_order(&order, h.actor).await.unwrap();
        assert!(invoice.invoice_number.starts_with("RINV-"));
        assert_eq!(invoice.total_amount.amount(), dec!(991.20));
        assert_eq!(invoice.kind, LedgerKind::Restaurant);
    }

    #[tokio::test]
    async fn test_discount_and_tip_lines() {
        let h = Harness::new();
        let menu = menu(&h).await;
        let mut order = walk_in(&menu);
        order.discount = OrderDiscount::Flat(dec!(100));
        order.tip = dec!(50);

        let posting = h.service.sync_restaurant_order(&order, h.actor).await.unwrap();
        assert_eq!(posting.pricing.as_ref().unwrap().total.amount(), dec!(941.20));
        assert_eq!(posting.written.len(), 3);

        let folio = posting.restaurant_folio.unwrap();
        assert_eq!(folio.total_tax.amount(), dec!(151.20));
        assert_eq!(folio.balance.amount(), dec!(941.20));
    }

    #[tokio::test]
    async fn test_hotel_guest_order_follows_edits_and_cancellation() {
        let h = Harness::new();
        let menu = menu(&h).await;
        let (reservation, hotel_folio) = h.hotel_stay(dec!(1000), 1).await;
        let mut order = walk_in(&menu);
        order.guest_type = GuestType::HotelGuest;
        order.reservation_id = Some(reservation.id);
        order.guest_id = Some(reservation.guest_id);

        let posting = h.service.sync_restaurant_order(&order, h.actor).await.unwrap();
        let hotel = posting.hotel_folio.unwrap();
        assert_eq!(hotel.id, hotel_folio.id);
        assert_eq!(hotel.total_charges.amount(), dec!(991.20));
        assert!(hotel.total_tax.is_zero());
        assert_eq!(hotel.balance.amount(), dec!(991.20));

        let unchanged = h.service.sync_restaurant_order(&order, h.actor).await.unwrap();
        assert!(unchanged.written.is_empty());

        order.lines[1].quantity = 3;
        let edited = h.service.sync_restaurant_order(&order, h.actor).await.unwrap();
        assert_eq!(edited.pricing.as_ref().unwrap().total.amount(), dec!(1115.10));
        assert_eq!(edited.written.len(), 4);
        assert_eq!(edited.hotel_folio.unwrap().balance.amount(), dec!(1115.10));

        let cancelled = h.service.cancel_restaurant_order(&order, h.actor).await.unwrap();
        assert_eq!(cancelled.written.len(), 2);
        assert!(cancelled.hotel_folio.unwrap().balance.is_zero());
        assert!(cancelled.restaurant_folio.unwrap().balance.is_zero());

        let billed = h.service.bill_restaurant_order(&order, h.actor).await.unwrap_err();
        assert!(matches!(billed, BillingError::InvalidState(_)));
    }

    #[tokio::test]
    async fn test_unavailable_item_is_rejected() {
        let h = Harness::new();
        let menu = menu(&h).await;
        let mut item = h.menu_item("Seasonal special", dec!(400)).await;
        item.is_available = false;
        h.menu.add_item(item.clone()).await;

        let mut order = walk_in(&menu);
        order.lines.push(OrderLine { menu_item_id: item.id, variant_id: None, quantity: 1 });

        let err = h.service.sync_restaurant_order(&order, h.actor).await.unwrap_err();
        assert!(matches!(err, BillingError::InvalidInput(_)));
        assert!(h.store.snapshot().await.folios.is_empty());
    }

    #[tokio::test]
    async fn test_variant_of_another_item_is_rejected() {
        let h = Harness::new();
        let menu = menu(&h).await;
        let mut order = walk_in(&menu);
        order.lines[1].variant_id = menu.paneer.variant_id;

        let err = h.service.sync_restaurant_order(&order, h.actor).await.unwrap_err();
        assert!(matches!(err, BillingError::InvalidInput(_)));
    }

    #[tokio::test]
    async fn test_restaurant_folio_projection() {
        let h = Harness::new();
        let menu = menu(&h).await;
        let order = walk_in(&menu);
        h.service.sync_restaurant_order(&order, h.actor).await.unwrap();

        let detail = h.service.get_restaurant_folio(order.id).await.unwrap();
        assert_eq!(detail.folio.owner, FolioOwner::RestaurantOrder(order.id));
        assert_eq!(detail.charges.len(), 1);
        assert!(detail.reservation.is_none());
    }

    fn hotel_order(menu: &Menu, reservation: &ReservationSummary) -> RestaurantOrder {
        RestaurantOrder {
            guest_type: GuestType::HotelGuest,
            reservation_id: Some(reservation.id),
            guest_id: Some(reservation.guest_id),
            ..walk_in(menu)
        }
    }

    #[tokio::test]
    async fn test_cancel_after_retag_clears_hotel_folio() {
        let h = Harness::new();
        let menu = menu(&h).await;
        let (reservation, hotel_folio) = h.hotel_stay(dec!(1000), 1).await;
        let mut order = hotel_order(&menu, &reservation);
        h.service.sync_restaurant_order(&order, h.actor).await.unwrap();

        order.guest_type = GuestType::WalkIn;
        order.reservation_id = None;
        let cancelled = h.service.cancel_restaurant_order(&order, h.actor).await.unwrap();
        assert_eq!(cancelled.written.len(), 2);
        assert!(cancelled.restaurant_folio.unwrap().balance.is_zero());

        let hotel = h.service.get_folio(LedgerKind::Hotel, hotel_folio.id).await.unwrap();
        assert!(hotel.folio.total_charges.is_zero());
        assert!(hotel.folio.balance.is_zero());
    }

    #[tokio::test]
    async fn test_retagged_order_leaves_hotel_folio() {
        let h = Harness::new();
        let menu = menu(&h).await;
        let (reservation, hotel_folio) = h.hotel_stay(dec!(1000), 1).await;
        let mut order = hotel_order(&menu, &reservation);
        h.service.sync_restaurant_order(&order, h.actor).await.unwrap();

        order.guest_type = GuestType::WalkIn;
        order.reservation_id = None;
        let moved = h.service.sync_restaurant_order(&order, h.actor).await.unwrap();
        assert!(moved.hotel_folio.is_none());
        assert_eq!(moved.written.len(), 1);
        assert_eq!(moved.restaurant_folio.unwrap().balance.amount(), dec!(991.20));

        let hotel = h.service.get_folio(LedgerKind::Hotel, hotel_folio.id).await.unwrap();
        assert!(hotel.folio.balance.is_zero());

        h.service.cancel_restaurant_order(&order, h.actor).await.unwrap();
        let hotel = h.service.get_folio(LedgerKind::Hotel, hotel_folio.id).await.unwrap();
        assert!(hotel.folio.balance.is_zero());
        let restaurant = h.service.get_restaurant_folio(order.id).await.unwrap();
        assert!(restaurant.folio.balance.is_zero());
    }

    #[tokio::test]
    async fn test_order_moved_between_stays() {
        let h = Harness::new();
        let menu = menu(&h).await;
        let (first, first_folio) = h.hotel_stay(dec!(1000), 1).await;
        let mut order = hotel_order(&menu, &first);
        h.service.sync_restaurant_order(&order, h.actor).await.unwrap();

        let guest = h.guest("Vikram Shah").await;
        let room = h.room("202", dec!(1500)).await;
        let second = h.reservation(&guest, &[room], 2).await;
        let second_folio = h.service.create_folio(second.id, guest.id, h.actor).await.unwrap();
        order.reservation_id = Some(second.id);
        order.guest_id = Some(guest.id);

        let moved = h.service.sync_restaurant_order(&order, h.actor).await.unwrap();
        assert_eq!(moved.hotel_folio.unwrap().id, second_folio.id);

        let old = h.service.get_folio(LedgerKind::Hotel, first_folio.id).await.unwrap();
        assert!(old.folio.balance.is_zero());
        let new = h.service.get_folio(LedgerKind::Hotel, second_folio.id).await.unwrap();
        assert_eq!(new.folio.balance.amount(), dec!(991.20));
    }

    #[tokio::test]
    async fn test_hotel_order_must_name_the_reservation_guest() {
        let h = Harness::new();
        let menu = menu(&h).await;
        let (reservation, hotel_folio) = h.hotel_stay(dec!(1000), 1).await;

        let mut order = hotel_order(&menu, &reservation);
        order.guest_id = Some(GuestId::new());
        let err = h.service.sync_restaurant_order(&order, h.actor).await.unwrap_err();
        assert!(matches!(err, BillingError::InvalidInput(_)));

        order.guest_id = Some(reservation.guest_id);
        order.reservation_id = Some(ReservationId::new());
        let err = h.service.sync_restaurant_order(&order, h.actor).await.unwrap_err();
        assert_eq!(err.kind(), ErrorKind::NotFound);

        let hotel = h.service.get_folio(LedgerKind::Hotel, hotel_folio.id).await.unwrap();
        assert!(hotel.charges.is_empty());
        let state = h.store.snapshot().await;
        assert_eq!(state.folios.len(), 1);
    }
}

// ============================================================================
// CONCURRENCY
// ============================================================================

mod concurrency {
    use super::*;

    #[tokio::test(flavor = "multi_thread", worker_threads = 4)]
    async fn test_parallel_postings_are_all_counted() {
        let h = Harness::new();
        let (_, folio) = h.hotel_stay(dec!(1000), 1).await;

        let folio_id = folio.id;
        let mut handles = Vec::new();
        for i in 0..16 {
            let service = h.service.clone();
            let actor = h.actor;
            handles.push(tokio::spawn(async move {
                service
                    .post_charge(
                        LedgerKind::Hotel,
                        folio_id,
                        ChargeInput::new(ChargeType::Minibar, format!("Minibar #{}", i), dec!(100)),
                        actor,
                    )
                    .await
            }));
        }
        for handle in handles {
            handle.await.unwrap().unwrap();
        }

        let detail = h.service.get_folio(LedgerKind::Hotel, folio.id).await.unwrap();
        assert_eq!(detail.charges.len(), 16);
        assert_eq!(detail.folio.total_charges.amount(), dec!(1600));
        assert_eq!(detail.folio.total_tax.amount(), dec!(288));
        assert_eq!(detail.folio.balance.amount(), dec!(1888));
    }
}

// ============================================================================
// LOCK DISCIPLINE
// ============================================================================

mod lock_discipline {
    use super::*;
    use crate::common::locking::LockAuditStore;

    fn assert_clean(audit: &LockAuditStore) {
        let violations = audit.violations();
        assert!(violations.is_empty(), "{:#?}", violations);
    }

    #[tokio::test]
    async fn test_folio_writes_hold_the_folio_lock() {
        let (h, audit) = Harness::with_lock_audit();
        let (reservation, folio) = h.hotel_stay(dec!(1000), 2).await;

        let posted = h
            .service
            .post_charge(LedgerKind::Hotel, folio.id, room_charge(dec!(1000)), h.actor)
            .await
            .unwrap();
        h.service
            .post_service_charge(
                LedgerKind::Hotel,
                folio.id,
                ChargeInput::new(ChargeType::Amenity, "Spa", dec!(1500)),
                h.actor,
            )
            .await
            .unwrap();
        h.service
            .post_refund(LedgerKind::Hotel, folio.id, dec!(100), "Late check-in", h.actor)
            .await
            .unwrap();
        h.service
            .reverse_charge(LedgerKind::Hotel, folio.id, posted.id, Some("Duplicate".into()), h.actor)
            .await
            .unwrap();
        h.service.post_room_stay_charges(reservation.id, h.actor).await.unwrap();
        h.service.recompute_totals(LedgerKind::Hotel, folio.id).await.unwrap();
        assert_clean(&audit);
    }

    #[tokio::test]
    async fn test_settlement_locks_invoice_before_folio() {
        let (h, audit) = Harness::with_lock_audit();
        let (reservation, folio) = h.hotel_stay(dec!(1000), 1).await;
        let owner = FolioOwner::Reservation(reservation.id);
        h.service
            .post_charge(LedgerKind::Hotel, folio.id, room_charge(dec!(1000)), h.actor)
            .await
            .unwrap();
        let deposit = h
            .service
            .record_payment(
                LedgerKind::Hotel,
                None,
                PaymentInput::new(dec!(300), PaymentMethod::Cash).for_owner(owner),
                h.actor,
            )
            .await
            .unwrap();

        let invoice = h
            .service
            .generate_invoice(LedgerKind::Hotel, folio.id, h.actor)
            .await
            .unwrap();
        let payment = h
            .service
            .record_payment(
                LedgerKind::Hotel,
                Some(invoice.id),
                PaymentInput::new(dec!(400), PaymentMethod::Card),
                h.actor,
            )
            .await
            .unwrap();
        h.service
            .record_payment(
                LedgerKind::Hotel,
                None,
                PaymentInput::new(dec!(100), PaymentMethod::Upi).for_owner(owner),
                h.actor,
            )
            .await
            .unwrap();
        h.service.refund_payment(LedgerKind::Hotel, payment.id, h.actor).await.unwrap();
        h.service.refund_payment(LedgerKind::Hotel, deposit.id, h.actor).await.unwrap();
        assert_clean(&audit);
    }

    #[tokio::test]
    async fn test_order_bridge_locks_every_folio_it_touches() {
        let (h, audit) = Harness::with_lock_audit();
        let paneer = h.menu_item("Paneer tikka", dec!(250)).await;
        let (reservation, _) = h.hotel_stay(dec!(1000), 1).await;
        let mut order = RestaurantOrder {
            id: OrderId::new(),
            guest_type: GuestType::HotelGuest,
            reservation_id: Some(reservation.id),
            guest_id: Some(reservation.guest_id),
            lines: vec![OrderLine { menu_item_id: paneer.id, variant_id: None, quantity: 2 }],
            discount: OrderDiscount::None,
            service_charge_percent: dec!(0),
            tax_percent: None,
            tip: dec!(0),
        };

        h.service.sync_restaurant_order(&order, h.actor).await.unwrap();
        order.lines[0].quantity = 3;
        h.service.sync_restaurant_order(&order, h.actor).await.unwrap();
        order.guest_type = GuestType::WalkIn;
        order.reservation_id = None;
        h.service.sync_restaurant_order(&order, h.actor).await.unwrap();
        h.service.bill_restaurant_order(&order, h.actor).await.unwrap();

        let cancelled = RestaurantOrder { id: OrderId::new(), ..order.clone() };
        h.service.sync_restaurant_order(&cancelled, h.actor).await.unwrap();
        h.service.cancel_restaurant_order(&cancelled, h.actor).await.unwrap();
        assert_clean(&audit);
    }

    #[tokio::test]
    async fn test_recorder_flags_unlocked_read_modify_write() {
        let store = MemoryLedgerStore::default();
        let audit = LockAuditStore::new(store.clone());
        let h = Harness::with_store(store);
        let (_, folio) = h.hotel_stay(dec!(1000), 1).await;

        let mut tx = audit.begin().await.unwrap();
        let read = tx.folio(LedgerKind::Hotel, folio.id).await.unwrap().unwrap();
        tx.list_charges(LedgerKind::Hotel, folio.id).await.unwrap();
        tx.update_folio(&read).await.unwrap();
        tx.commit().await.unwrap();

        let violations = audit.violations();
        assert_eq!(violations.len(), 2, "{:#?}", violations);
        assert!(violations.iter().any(|v| v.starts_with("update_folio")));
        assert!(violations.iter().any(|v| v.starts_with("list_charges")));
    }
}

// ============================================================================
// INVARIANTS
// ============================================================================

mod invariants {
    use super::*;
    use proptest::prelude::*;

    fn charge_strategy() -> impl Strategy<Value = (i64, bool)> {
        (1i64..500_000, any::<bool>())
    }

    proptest! {
        #![proptest_config(ProptestConfig::with_cases(24))]

        #[test]
        fn balance_identity_holds(charges in prop::collection::vec(charge_strategy(), 1..8), paid_percent in 0u32..=100) {
            let runtime = tokio::runtime::Runtime::new().unwrap();
            runtime.block_on(async {
                let h = Harness::new();
                let (_, folio) = h.hotel_stay(dec!(1000), 1).await;
                for (minor, taxable) in &charges {
                    let input = ChargeInput::new(ChargeType::Service, "Service", Decimal::new(*minor, 2))
                        .taxable(*taxable);
                    h.service.post_charge(LedgerKind::Hotel, folio.id, input, h.actor).await.unwrap();
                }

                let invoice = h.service.generate_invoice(LedgerKind::Hotel, folio.id, h.actor).await.unwrap();
                let item_tax: Decimal = invoice.items.iter().map(|i| i.tax_amount.amount()).sum();
                prop_assert_eq!(item_tax, invoice.tax_amount.amount());

                let pay = (invoice.total_amount.amount() * Decimal::from(paid_percent) / dec!(100)).round_dp(2);
                if pay > Decimal::ZERO {
                    h.service
                        .record_payment(
                            LedgerKind::Hotel,
                            Some(invoice.id),
                            PaymentInput::new(pay, PaymentMethod::Card),
                            h.actor,
                        )
                        .await
                        .unwrap();
                }

                let f = h.service.get_folio(LedgerKind::Hotel, folio.id).await.unwrap().folio;
                prop_assert_eq!(
                    f.balance.amount(),
                    f.total_charges.amount() + f.total_tax.amount() - f.total_payments.amount()
                );
                prop_assert_eq!(f.total_charges.amount() + f.total_tax.amount(), invoice.total_amount.amount());
                Ok(())
            })?;
        }
    }
}
