//! Test Data Builders
//!
//! Provides builders for restaurant orders and for a fully wired in-memory
//! ledger. Tests specify only what matters to them and take defaults for
//! everything else.

use std::sync::Arc;

use rust_decimal::Decimal;

use core_kernel::{GuestId, MenuItemId, OrderId, ReservationId, UserId, VariantId};
use domain_billing::ports::mock::{MemoryLedgerStore, MockDirectory, MockMenuCatalog, RecordingNotifier};
use domain_billing::{
    BillingConfig, BillingService, Folio, GuestSummary, GuestType, MenuItemSummary, OrderDiscount,
    OrderLine, ReservationSummary, RestaurantOrder, RoomSummary, VariantSummary,
};

use crate::fixtures::{DirectoryFixtures, MenuFixtures};

/// Builder for restaurant orders
pub struct TestOrderBuilder {
    order: RestaurantOrder,
}

impl Default for TestOrderBuilder {
    fn default() -> Self {
        Self::walk_in()
    }
}

impl TestOrderBuilder {
    /// A walk-in order with no lines yet
    pub fn walk_in() -> Self {
        Self {
            order: RestaurantOrder {
                id: OrderId::new(),
                guest_type: GuestType::WalkIn,
                reservation_id: None,
                guest_id: None,
                lines: Vec::new(),
                discount: OrderDiscount::None,
                service_charge_percent: Decimal::ZERO,
                tax_percent: None,
                tip: Decimal::ZERO,
            },
        }
    }

    /// An order charged to a staying guest's reservation
    pub fn hotel_guest(reservation: &ReservationSummary) -> Self {
        let mut builder = Self::walk_in();
        builder.order.guest_type = GuestType::HotelGuest;
        builder.order.reservation_id = Some(reservation.id);
        builder.order.guest_id = Some(reservation.guest_id);
        builder
    }

    pub fn with_id(mut self, id: OrderId) -> Self {
        self.order.id = id;
        self
    }

    pub fn for_guest(mut self, guest_id: GuestId) -> Self {
        self.order.guest_id = Some(guest_id);
        self
    }

    pub fn for_reservation(mut self, reservation_id: ReservationId) -> Self {
        self.order.reservation_id = Some(reservation_id);
        self
    }

    pub fn line(mut self, menu_item_id: MenuItemId, quantity: u32) -> Self {
        self.order.lines.push(OrderLine {
            menu_item_id,
            variant_id: None,
            quantity,
        });
        self
    }

    pub fn variant_line(mut self, menu_item_id: MenuItemId, variant_id: VariantId, quantity: u32) -> Self {
        self.order.lines.push(OrderLine {
            menu_item_id,
            variant_id: Some(variant_id),
            quantity,
        });
        self
    }

    pub fn discount(mut self, discount: OrderDiscount) -> Self {
        self.order.discount = discount;
        self
    }

    pub fn service_charge_percent(mut self, percent: Decimal) -> Self {
        self.order.service_charge_percent = percent;
        self
    }

    pub fn tax_percent(mut self, percent: Decimal) -> Self {
        self.order.tax_percent = Some(percent);
        self
    }

    pub fn tip(mut self, tip: Decimal) -> Self {
        self.order.tip = tip;
        self
    }

    pub fn build(self) -> RestaurantOrder {
        self.order
    }
}

/// A `BillingService` over the in-memory adapters, with handles on each
/// adapter for seeding and inspection
#[derive(Clone)]
pub struct TestLedger {
    pub service: Arc<BillingService>,
    pub store: MemoryLedgerStore,
    pub directory: MockDirectory,
    pub menu: MockMenuCatalog,
    pub notifier: RecordingNotifier,
    pub actor: UserId,
}

impl TestLedger {
    /// A ledger with default configuration
    pub fn new() -> Self {
        TestLedgerBuilder::new().build()
    }

    pub fn builder() -> TestLedgerBuilder {
        TestLedgerBuilder::new()
    }

    pub async fn add_guest(&self, guest: GuestSummary) -> GuestSummary {
        self.directory.add_guest(guest.clone()).await;
        guest
    }

    pub async fn add_room(&self, room: RoomSummary) -> RoomSummary {
        self.directory.add_room(room.clone()).await;
        room
    }

    pub async fn add_menu_item(&self, item: MenuItemSummary) -> MenuItemSummary {
        self.menu.add_item(item.clone()).await;
        item
    }

    pub async fn add_variant(&self, variant: VariantSummary) -> VariantSummary {
        self.menu.add_variant(variant.clone()).await;
        variant
    }

    /// Seeds a guest, `rooms` at `nightly_rate` and a reservation of
    /// `nights` for them
    pub async fn reservation(&self, rooms: usize, nightly_rate: Decimal, nights: i64) -> ReservationSummary {
        let guest = self.add_guest(DirectoryFixtures::guest()).await;
        let mut seeded = Vec::with_capacity(rooms);
        for n in 0..rooms {
            let room = DirectoryFixtures::room(&format!("{}", 101 + n), nightly_rate);
            seeded.push(self.add_room(room).await);
        }
        let reservation = DirectoryFixtures::reservation(&guest, &seeded, nights);
        self.directory.add_reservation(reservation.clone()).await;
        reservation
    }

    /// A seeded reservation with its hotel folio open
    pub async fn open_stay(&self, nightly_rate: Decimal, nights: i64) -> (ReservationSummary, Folio) {
        let reservation = self.reservation(1, nightly_rate, nights).await;
        let folio = self
            .service
            .create_folio(reservation.id, reservation.guest_id, self.actor)
            .await
            .expect("folio opens for a seeded reservation");
        (reservation, folio)
    }

    /// Seeds an available menu item
    pub async fn menu_item(&self, name: &str, price: Decimal) -> MenuItemSummary {
        self.add_menu_item(MenuFixtures::item(name, price)).await
    }
}

impl Default for TestLedger {
    fn default() -> Self {
        Self::new()
    }
}

/// Builder for [`TestLedger`]
pub struct TestLedgerBuilder {
    store: MemoryLedgerStore,
    notifier: RecordingNotifier,
    config: BillingConfig,
}

impl Default for TestLedgerBuilder {
    fn default() -> Self {
        Self::new()
    }
}

impl TestLedgerBuilder {
    pub fn new() -> Self {
        Self {
            store: MemoryLedgerStore::default(),
            notifier: RecordingNotifier::new(),
            config: BillingConfig::default(),
        }
    }

    pub fn store(mut self, store: MemoryLedgerStore) -> Self {
        self.store = store;
        self
    }

    pub fn notifier(mut self, notifier: RecordingNotifier) -> Self {
        self.notifier = notifier;
        self
    }

    pub fn config(mut self, config: BillingConfig) -> Self {
        self.config = config;
        self
    }

    pub fn build(self) -> TestLedger {
        let directory = MockDirectory::new();
        let menu = MockMenuCatalog::new();
        let service = BillingService::new(
            Arc::new(self.store.clone()),
            Arc::new(directory.clone()),
            Arc::new(menu.clone()),
            Arc::new(self.notifier.clone()),
            self.config,
        );
        TestLedger {
            service: Arc::new(service),
            store: self.store,
            directory,
            menu,
            notifier: self.notifier,
            actor: UserId::new(),
        }
    }
}
