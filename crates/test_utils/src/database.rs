//! Database Test Utilities
//!
//! Provides helpers for database testing including testcontainer management
//! and connection pooling for integration tests. Containers get the ledger
//! schema through the same embedded migrations production uses.

use sqlx::PgPool;
use std::sync::Arc;
use testcontainers::{
    core::{IntoContainerPort, WaitFor},
    runners::AsyncRunner,
    ContainerAsync, GenericImage, ImageExt,
};
use tokio::sync::OnceCell;

use domain_billing::{GuestSummary, MenuItemSummary, ReservationSummary, RoomSummary, VariantSummary};
use infra_db::DatabaseConfig;

/// Default PostgreSQL image for testing
const POSTGRES_IMAGE: &str = "postgres";
const POSTGRES_TAG: &str = "16-alpine";
const POSTGRES_USER: &str = "test_user";
const POSTGRES_PASSWORD: &str = "test_password";
const POSTGRES_DB: &str = "folio_ledger_test";

/// Configuration for test database
#[derive(Debug, Clone)]
pub struct TestDatabaseConfig {
    pub user: String,
    pub password: String,
    pub database: String,
    pub host: String,
    pub port: u16,
}

impl Default for TestDatabaseConfig {
    fn default() -> Self {
        Self {
            user: POSTGRES_USER.to_string(),
            password: POSTGRES_PASSWORD.to_string(),
            database: POSTGRES_DB.to_string(),
            host: "localhost".to_string(),
            port: 5432,
        }
    }
}

impl TestDatabaseConfig {
    /// Creates the database connection URL
    pub fn connection_url(&self) -> String {
        format!(
            "postgres://{}:{}@{}:{}/{}",
            self.user, self.password, self.host, self.port, self.database
        )
    }
}

/// A wrapper around a PostgreSQL test container
pub struct TestDatabase {
    _container: ContainerAsync<GenericImage>,
    pub config: TestDatabaseConfig,
    pub pool: PgPool,
}

impl TestDatabase {
    /// Starts a new PostgreSQL container for testing
    ///
    /// # Returns
    ///
    /// A new TestDatabase instance with an initialized schema
    ///
    /// # Errors
    ///
    /// Returns an error if the container fails to start or schema fails to initialize
    pub async fn new() -> Result<Self, Box<dyn std::error::Error + Send + Sync>> {
        // Create and start the container
        let container = GenericImage::new(POSTGRES_IMAGE, POSTGRES_TAG)
            .with_exposed_port(5432.tcp())
            .with_wait_for(WaitFor::message_on_stderr("database system is ready to accept connections"))
            .with_env_var("POSTGRES_USER", POSTGRES_USER)
            .with_env_var("POSTGRES_PASSWORD", POSTGRES_PASSWORD)
            .with_env_var("POSTGRES_DB", POSTGRES_DB)
            .start()
            .await?;

        // Get the mapped port
        let port = container.get_host_port_ipv4(5432).await?;
        let host = container.get_host().await?.to_string();

        let config = TestDatabaseConfig {
            user: POSTGRES_USER.to_string(),
            password: POSTGRES_PASSWORD.to_string(),
            database: POSTGRES_DB.to_string(),
            host,
            port,
        };

        let pool = infra_db::create_pool(&DatabaseConfig {
            max_connections: 5,
            min_connections: 1,
            ..DatabaseConfig::for_url(config.connection_url())
        })
        .await?;

        let test_db = Self {
            _container: container,
            config,
            pool,
        };

        // Initialize schema
        test_db.init_schema().await?;

        Ok(test_db)
    }

    /// Applies the ledger migrations
    async fn init_schema(&self) -> Result<(), Box<dyn std::error::Error + Send + Sync>> {
        infra_db::run_migrations(&self.pool).await?;
        Ok(())
    }

    /// Returns a reference to the connection pool
    pub fn pool(&self) -> &PgPool {
        &self.pool
    }

    /// Clears all data from the database while preserving the schema
    ///
    /// Useful for resetting state between tests
    pub async fn clear_data(&self) -> Result<(), Box<dyn std::error::Error + Send + Sync>> {
        let tables = [
            "billing_audit_log",
            "restaurant_payments",
            "restaurant_invoice_items",
            "restaurant_invoices",
            "restaurant_folio_charges",
            "restaurant_folios",
            "payments",
            "invoice_items",
            "invoices",
            "folio_charges",
            "folios",
            "menu_item_variants",
            "menu_items",
            "reservation_rooms",
            "reservations",
            "rooms",
            "guests",
        ];

        for table in tables {
            sqlx::query(&format!("TRUNCATE TABLE {} CASCADE", table))
                .execute(&self.pool)
                .await?;
        }

        Ok(())
    }
}

/// Global test database for shared integration tests
static SHARED_TEST_DB: OnceCell<Arc<TestDatabase>> = OnceCell::const_new();

/// Gets or creates a shared test database instance
///
/// This function provides a singleton test database that can be shared
/// across multiple tests to reduce container startup overhead.
///
/// # Returns
///
/// An Arc to the shared TestDatabase instance
///
/// # Panics
///
/// Panics if the database fails to initialize
pub async fn get_shared_test_database() -> Arc<TestDatabase> {
    SHARED_TEST_DB
        .get_or_init(|| async {
            Arc::new(
                TestDatabase::new()
                    .await
                    .expect("Failed to create shared test database"),
            )
        })
        .await
        .clone()
}

/// Creates an isolated test database for a single test
///
/// Use this when tests need to modify data and isolation is required
pub async fn create_isolated_test_database() -> Result<TestDatabase, Box<dyn std::error::Error + Send + Sync>> {
    TestDatabase::new().await
}

/// Helper macro for running database tests
#[macro_export]
macro_rules! db_test {
    ($name:ident, $body:expr) => {
        #[tokio::test]
        async fn $name() {
            let db = $crate::database::create_isolated_test_database()
                .await
                .expect("Failed to create test database");
            let pool = db.pool();
            $body
        }
    };
}

/// Seeds the reservation and menu tables the directory adapters read
pub struct DirectorySeeder<'a> {
    pool: &'a PgPool,
}

impl<'a> DirectorySeeder<'a> {
    pub fn new(pool: &'a PgPool) -> Self {
        Self { pool }
    }

    pub async fn guest(&self, guest: &GuestSummary) -> Result<(), sqlx::Error> {
        sqlx::query("INSERT INTO guests (id, full_name, email, phone) VALUES ($1, $2, $3, $4)")
            .bind(*guest.id.as_uuid())
            .bind(&guest.full_name)
            .bind(&guest.email)
            .bind(&guest.phone)
            .execute(self.pool)
            .await?;
        Ok(())
    }

    pub async fn room(&self, room: &RoomSummary) -> Result<(), sqlx::Error> {
        sqlx::query("INSERT INTO rooms (id, room_number, nightly_rate) VALUES ($1, $2, $3)")
            .bind(*room.id.as_uuid())
            .bind(&room.room_number)
            .bind(room.nightly_rate)
            .execute(self.pool)
            .await?;
        Ok(())
    }

    /// Inserts a reservation and its room assignments; guest and rooms must exist
    pub async fn reservation(&self, reservation: &ReservationSummary) -> Result<(), sqlx::Error> {
        sqlx::query("INSERT INTO reservations (id, guest_id, check_in, check_out) VALUES ($1, $2, $3, $4)")
            .bind(*reservation.id.as_uuid())
            .bind(*reservation.guest_id.as_uuid())
            .bind(reservation.check_in)
            .bind(reservation.check_out)
            .execute(self.pool)
            .await?;
        for room_id in &reservation.room_ids {
            sqlx::query("INSERT INTO reservation_rooms (reservation_id, room_id) VALUES ($1, $2)")
                .bind(*reservation.id.as_uuid())
                .bind(*room_id.as_uuid())
                .execute(self.pool)
                .await?;
        }
        Ok(())
    }

    pub async fn menu_item(&self, item: &MenuItemSummary) -> Result<(), sqlx::Error> {
        sqlx::query("INSERT INTO menu_items (id, name, price, is_available) VALUES ($1, $2, $3, $4)")
            .bind(*item.id.as_uuid())
            .bind(&item.name)
            .bind(item.price)
            .bind(item.is_available)
            .execute(self.pool)
            .await?;
        Ok(())
    }

    pub async fn variant(&self, variant: &VariantSummary) -> Result<(), sqlx::Error> {
        sqlx::query(
            "INSERT INTO menu_item_variants (id, menu_item_id, name, price_delta) VALUES ($1, $2, $3, $4)",
        )
        .bind(*variant.id.as_uuid())
        .bind(*variant.menu_item_id.as_uuid())
        .bind(&variant.name)
        .bind(variant.price_delta)
        .execute(self.pool)
        .await?;
        Ok(())
    }
}
