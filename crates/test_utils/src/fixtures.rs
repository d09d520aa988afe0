//! Pre-built Test Fixtures
//!
//! Provides ready-to-use test data for the records the ledger reads from the
//! reservation and restaurant systems, plus common money values. Names and
//! contact details are generated with `fake`; everything that affects an
//! amount is fixed.

use chrono::{DateTime, Duration, TimeZone, Utc};
use fake::faker::internet::en::SafeEmail;
use fake::faker::name::en::Name;
use fake::faker::phone_number::en::PhoneNumber;
use fake::Fake;
use rust_decimal::Decimal;
use rust_decimal_macros::dec;

use core_kernel::{Currency, GuestId, MenuItemId, Money, ReservationId, RoomId, UserId, VariantId};
use domain_billing::{GuestSummary, MenuItemSummary, ReservationSummary, RoomSummary, VariantSummary};

/// Fixture for Money test data
pub struct MoneyFixtures;

impl MoneyFixtures {
    /// An amount in the ledger's default currency
    pub fn inr(amount: Decimal) -> Money {
        Money::new(amount, Currency::INR)
    }

    pub fn inr_zero() -> Money {
        Money::zero(Currency::INR)
    }

    /// A standard room night
    pub fn room_night() -> Money {
        Money::new(dec!(2500.00), Currency::INR)
    }

    /// A USD amount for currency mismatch tests
    pub fn usd_100() -> Money {
        Money::new(dec!(100.00), Currency::USD)
    }
}

/// Fixture for dates
pub struct TemporalFixtures;

impl TemporalFixtures {
    /// A fixed check-in (10 Mar 2024, 14:00 UTC)
    pub fn check_in() -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2024, 3, 10, 14, 0, 0)
            .single()
            .unwrap_or_else(Utc::now)
    }

    /// Check-out `nights` after [`TemporalFixtures::check_in`]
    pub fn check_out(nights: i64) -> DateTime<Utc> {
        Self::check_in() + Duration::days(nights)
    }
}

/// Fixture for identifiers
pub struct IdFixtures;

impl IdFixtures {
    /// A front-desk user acting on the ledger
    pub fn actor() -> UserId {
        UserId::new()
    }
}

/// Fixture for reservation system records
pub struct DirectoryFixtures;

impl DirectoryFixtures {
    /// A guest with a generated name and contact details
    pub fn guest() -> GuestSummary {
        GuestSummary {
            id: GuestId::new(),
            full_name: Name().fake(),
            email: Some(SafeEmail().fake()),
            phone: Some(PhoneNumber().fake()),
        }
    }

    pub fn named_guest(full_name: &str) -> GuestSummary {
        GuestSummary {
            full_name: full_name.to_string(),
            ..Self::guest()
        }
    }

    pub fn room(room_number: &str, nightly_rate: Decimal) -> RoomSummary {
        RoomSummary {
            id: RoomId::new(),
            room_number: room_number.to_string(),
            nightly_rate,
        }
    }

    /// A reservation of `rooms` for `nights` from the fixed check-in
    pub fn reservation(guest: &GuestSummary, rooms: &[RoomSummary], nights: i64) -> ReservationSummary {
        ReservationSummary {
            id: ReservationId::new(),
            guest_id: guest.id,
            check_in: TemporalFixtures::check_in(),
            check_out: TemporalFixtures::check_out(nights),
            room_ids: rooms.iter().map(|r| r.id).collect(),
        }
    }
}

/// Fixture for restaurant menu records
pub struct MenuFixtures;

impl MenuFixtures {
    pub fn item(name: &str, price: Decimal) -> MenuItemSummary {
        MenuItemSummary {
            id: MenuItemId::new(),
            name: name.to_string(),
            price,
            is_available: true,
        }
    }

    pub fn unavailable_item(name: &str, price: Decimal) -> MenuItemSummary {
        MenuItemSummary {
            is_available: false,
            ..Self::item(name, price)
        }
    }

    pub fn variant(item: &MenuItemSummary, name: &str, price_delta: Decimal) -> VariantSummary {
        VariantSummary {
            id: VariantId::new(),
            menu_item_id: item.id,
            name: name.to_string(),
            price_delta,
        }
    }
}
