//! PostgreSQL Directory and Menu Adapters
//!
//! Read-only views of reservation, guest, room and menu records. The
//! tables belong to the reservation and restaurant systems; the ledger never
//! writes them.

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use sqlx::PgPool;
use tracing::instrument;
use uuid::Uuid;

use core_kernel::{
    AdapterHealth, DomainPort, GuestId, HealthCheckResult, HealthCheckable, MenuItemId, PortError,
    ReservationId, RoomId, VariantId,
};
use domain_billing::{
    Directory, GuestSummary, MenuCatalog, MenuItemSummary, ReservationSummary, RoomSummary,
    VariantSummary,
};

use crate::error::DatabaseError;

#[derive(Debug, sqlx::FromRow)]
struct ReservationRow {
    id: Uuid,
    guest_id: Uuid,
    check_in: DateTime<Utc>,
    check_out: DateTime<Utc>,
}

#[derive(Debug, sqlx::FromRow)]
struct GuestRow {
    id: Uuid,
    full_name: String,
    email: Option<String>,
    phone: Option<String>,
}

#[derive(Debug, sqlx::FromRow)]
struct RoomRow {
    id: Uuid,
    room_number: String,
    nightly_rate: Decimal,
}

#[derive(Debug, sqlx::FromRow)]
struct MenuItemRow {
    id: Uuid,
    name: String,
    price: Decimal,
    is_available: bool,
}

#[derive(Debug, sqlx::FromRow)]
struct VariantRow {
    id: Uuid,
    menu_item_id: Uuid,
    name: String,
    price_delta: Decimal,
}

/// PostgreSQL-backed `Directory`
#[derive(Debug, Clone)]
pub struct PostgresDirectory {
    pool: PgPool,
}

impl PostgresDirectory {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

impl DomainPort for PostgresDirectory {}

#[async_trait]
impl HealthCheckable for PostgresDirectory {
    async fn health_check(&self) -> HealthCheckResult {
        ping(&self.pool, "postgres-directory").await
    }
}

#[async_trait]
impl Directory for PostgresDirectory {
    #[instrument(skip(self), fields(reservation_id = %id))]
    async fn reservation(&self, id: ReservationId) -> Result<ReservationSummary, PortError> {
        let row = sqlx::query_as::<_, ReservationRow>(
            "SELECT id, guest_id, check_in, check_out FROM reservations WHERE id = $1",
        )
        .bind(*id.as_uuid())
        .fetch_optional(&self.pool)
        .await
        .map_err(|e| DatabaseError::from(&e))?
        .ok_or_else(|| PortError::not_found("Reservation", id))?;

        let room_ids = sqlx::query_scalar::<_, Uuid>(
            "SELECT room_id FROM reservation_rooms WHERE reservation_id = $1 ORDER BY room_id",
        )
        .bind(row.id)
        .fetch_all(&self.pool)
        .await
        .map_err(|e| DatabaseError::from(&e))?;

        Ok(ReservationSummary {
            id: ReservationId::from_uuid(row.id),
            guest_id: GuestId::from_uuid(row.guest_id),
            check_in: row.check_in,
            check_out: row.check_out,
            room_ids: room_ids.into_iter().map(RoomId::from_uuid).collect(),
        })
    }

    async fn guest(&self, id: GuestId) -> Result<GuestSummary, PortError> {
        let row = sqlx::query_as::<_, GuestRow>("SELECT id, full_name, email, phone FROM guests WHERE id = $1")
            .bind(*id.as_uuid())
            .fetch_optional(&self.pool)
            .await
            .map_err(|e| DatabaseError::from(&e))?
            .ok_or_else(|| PortError::not_found("Guest", id))?;
        Ok(GuestSummary {
            id: GuestId::from_uuid(row.id),
            full_name: row.full_name,
            email: row.email,
            phone: row.phone,
        })
    }

    async fn room(&self, id: RoomId) -> Result<RoomSummary, PortError> {
        let row = sqlx::query_as::<_, RoomRow>("SELECT id, room_number, nightly_rate FROM rooms WHERE id = $1")
            .bind(*id.as_uuid())
            .fetch_optional(&self.pool)
            .await
            .map_err(|e| DatabaseError::from(&e))?
            .ok_or_else(|| PortError::not_found("Room", id))?;
        Ok(RoomSummary {
            id: RoomId::from_uuid(row.id),
            room_number: row.room_number,
            nightly_rate: row.nightly_rate,
        })
    }
}

/// PostgreSQL-backed `MenuCatalog`
#[derive(Debug, Clone)]
pub struct PostgresMenuCatalog {
    pool: PgPool,
}

impl PostgresMenuCatalog {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

impl DomainPort for PostgresMenuCatalog {}

#[async_trait]
impl HealthCheckable for PostgresMenuCatalog {
    async fn health_check(&self) -> HealthCheckResult {
        ping(&self.pool, "postgres-menu-catalog").await
    }
}

#[async_trait]
impl MenuCatalog for PostgresMenuCatalog {
    async fn menu_item(&self, id: MenuItemId) -> Result<MenuItemSummary, PortError> {
        let row = sqlx::query_as::<_, MenuItemRow>(
            "SELECT id, name, price, is_available FROM menu_items WHERE id = $1",
        )
        .bind(*id.as_uuid())
        .fetch_optional(&self.pool)
        .await
        .map_err(|e| DatabaseError::from(&e))?
        .ok_or_else(|| PortError::not_found("MenuItem", id))?;
        Ok(MenuItemSummary {
            id: MenuItemId::from_uuid(row.id),
            name: row.name,
            price: row.price,
            is_available: row.is_available,
        })
    }

    async fn variant(&self, id: VariantId) -> Result<VariantSummary, PortError> {
        let row = sqlx::query_as::<_, VariantRow>(
            "SELECT id, menu_item_id, name, price_delta FROM menu_item_variants WHERE id = $1",
        )
        .bind(*id.as_uuid())
        .fetch_optional(&self.pool)
        .await
        .map_err(|e| DatabaseError::from(&e))?
        .ok_or_else(|| PortError::not_found("Variant", id))?;
        Ok(VariantSummary {
            id: VariantId::from_uuid(row.id),
            menu_item_id: MenuItemId::from_uuid(row.menu_item_id),
            name: row.name,
            price_delta: row.price_delta,
        })
    }
}

async fn ping(pool: &PgPool, adapter_id: &str) -> HealthCheckResult {
    let start = std::time::Instant::now();
    let result = sqlx::query_scalar::<_, i32>("SELECT 1").fetch_one(pool).await;
    let latency_ms = start.elapsed().as_millis() as u64;

    let (status, message) = match result {
        Ok(_) => (AdapterHealth::Healthy, None),
        Err(e) => (AdapterHealth::Unhealthy, Some(format!("Database error: {}", e))),
    };
    HealthCheckResult {
        adapter_id: adapter_id.to_string(),
        status,
        latency_ms,
        message,
        checked_at: Utc::now(),
    }
}
