//! Shared harness for the ledger integration tests
//!
//! Wires a `BillingService` over the in-memory adapters and seeds the
//! directory and menu with the records a scenario needs.

#![allow(dead_code)]

pub mod locking;

use std::sync::Arc;

use chrono::{Duration, Utc};
use rust_decimal::Decimal;

use core_kernel::{GuestId, MenuItemId, ReservationId, RoomId, UserId, VariantId};
use domain_billing::ports::mock::{MemoryLedgerStore, MockDirectory, MockMenuCatalog, RecordingNotifier};
use domain_billing::{
    BillingConfig, BillingService, Folio, GuestSummary, LedgerStore, MenuItemSummary,
    ReservationSummary, RoomSummary, VariantSummary,
};

use locking::LockAuditStore;

pub struct Harness {
    pub service: Arc<BillingService>,
    pub store: MemoryLedgerStore,
    pub directory: MockDirectory,
    pub menu: MockMenuCatalog,
    pub notifier: RecordingNotifier,
    pub actor: UserId,
}

impl Harness {
    pub fn new() -> Self {
        Self::build(MemoryLedgerStore::default(), RecordingNotifier::new(), BillingConfig::default())
    }

    pub fn with_store(store: MemoryLedgerStore) -> Self {
        Self::build(store, RecordingNotifier::new(), BillingConfig::default())
    }

    pub fn with_notifier(notifier: RecordingNotifier) -> Self {
        Self::build(MemoryLedgerStore::default(), notifier, BillingConfig::default())
    }

    pub fn build(store: MemoryLedgerStore, notifier: RecordingNotifier, config: BillingConfig) -> Self {
        Self::over(Arc::new(store.clone()), store, notifier, config)
    }

    /// A harness whose service runs every transaction through a
    /// [`LockAuditStore`] wrapped around the in-memory store
    pub fn with_lock_audit() -> (Self, LockAuditStore) {
        let store = MemoryLedgerStore::default();
        let audit = LockAuditStore::new(store.clone());
        let harness = Self::over(
            Arc::new(audit.clone()),
            store,
            RecordingNotifier::new(),
            BillingConfig::default(),
        );
        (harness, audit)
    }

    fn over(
        ledger: Arc<dyn LedgerStore>,
        store: MemoryLedgerStore,
        notifier: RecordingNotifier,
        config: BillingConfig,
    ) -> Self {
        let directory = MockDirectory::new();
        let menu = MockMenuCatalog::new();
        let service = BillingService::new(
            ledger,
            Arc::new(directory.clone()),
            Arc::new(menu.clone()),
            Arc::new(notifier.clone()),
            config,
        );
        Self {
            service: Arc::new(service),
            store,
            directory,
            menu,
            notifier,
            actor: UserId::new(),
        }
    }

    pub async fn guest(&self, name: &str) -> GuestSummary {
        let guest = GuestSummary {
            id: GuestId::new(),
            full_name: name.to_string(),
            email: Some(format!("{}@example.com", name.to_lowercase().replace(' ', "."))),
            phone: None,
        };
        self.directory.add_guest(guest.clone()).await;
        guest
    }

    pub async fn room(&self, number: &str, nightly_rate: Decimal) -> RoomSummary {
        let room = RoomSummary {
            id: RoomId::new(),
            room_number: number.to_string(),
            nightly_rate,
        };
        self.directory.add_room(room.clone()).await;
        room
    }

    /// A stay of `nights` nights starting tomorrow afternoon
    pub async fn reservation(&self, guest: &GuestSummary, rooms: &[RoomSummary], nights: i64) -> ReservationSummary {
        let check_in = Utc::now() + Duration::days(1);
        let reservation = ReservationSummary {
            id: ReservationId::new(),
            guest_id: guest.id,
            check_in,
            check_out: check_in + Duration::days(nights),
            room_ids: rooms.iter().map(|r| r.id).collect(),
        };
        self.directory.add_reservation(reservation.clone()).await;
        reservation
    }

    /// A guest, one room at `nightly_rate`, a stay, and its open folio
    pub async fn hotel_stay(&self, nightly_rate: Decimal, nights: i64) -> (ReservationSummary, Folio) {
        let guest = self.guest("Asha Rao").await;
        let room = self.room("101", nightly_rate).await;
        let reservation = self.reservation(&guest, &[room], nights).await;
        let folio = self
            .service
            .create_folio(reservation.id, guest.id, self.actor)
            .await
            .expect("folio opens");
        (reservation, folio)
    }

    pub async fn menu_item(&self, name: &str, price: Decimal) -> MenuItemSummary {
        let item = MenuItemSummary {
            id: MenuItemId::new(),
            name: name.to_string(),
            price,
            is_available: true,
        };
        self.menu.add_item(item.clone()).await;
        item
    }

    pub async fn variant(&self, item: &MenuItemSummary, name: &str, price_delta: Decimal) -> VariantSummary {
        let variant = VariantSummary {
            id: VariantId::new(),
            menu_item_id: item.id,
            name: name.to_string(),
            price_delta,
        };
        self.menu.add_variant(variant.clone()).await;
        variant
    }
}
