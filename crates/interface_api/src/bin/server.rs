//! Folio Ledger - API Server Binary
//!
//! This binary starts the HTTP API server for the hotel and restaurant
//! ledgers.
//!
//! # Usage
//!
//! ```bash
//! # Run with default configuration
//! cargo run --bin folio-ledger-api
//!
//! # Run with environment variables
//! API__PORT=8080 DATABASE_URL=postgres://... cargo run --bin folio-ledger-api
//! ```
//!
//! # Environment Variables
//!
//! * `API__HOST` - Server host (default: 0.0.0.0)
//! * `API__PORT` - Server port (default: 8080)
//! * `API__JWT_SECRET` - JWT signing secret (required in production)
//! * `API__DATABASE__URL` / `DATABASE_URL` - PostgreSQL connection string
//! * `API__DATABASE__MAX_CONNECTIONS` - Pool size (default: 10)
//! * `API__DATABASE__LOCK_TIMEOUT_MS` - Row lock wait before a request fails (default: 5000)
//! * `API__LOG_LEVEL` - Log level: trace, debug, info, warn, error (default: info)
//! * `API__LOG_JSON` - Emit JSON log lines (default: false)
//! * `API__BILLING__*` - Ledger settings, e.g. `API__BILLING__INVOICE_DUE_DAYS`

use std::net::SocketAddr;
use std::sync::Arc;

use anyhow::Context;
use tokio::net::TcpListener;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

use domain_billing::BillingService;
use infra_db::{
    create_pool, run_migrations, PostgresDirectory, PostgresLedgerStore, PostgresMenuCatalog,
};
use interface_api::{config::ApiConfig, create_router, notifier::TracingInvoiceNotifier};

/// Main entry point for the API server.
///
/// Initializes logging, loads configuration, connects to the database,
/// applies migrations and starts the HTTP server.
#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Load .env file if present (useful for local development)
    dotenvy::dotenv().ok();

    let config = load_config()?;

    init_tracing(&config.log_level, config.log_json);

    tracing::info!(
        host = %config.host,
        port = %config.port,
        currency = config.billing.currency.code(),
        "Starting Folio Ledger API Server"
    );

    tracing::info!("Connecting to database...");
    let pool = create_pool(&config.database)
        .await
        .context("connecting to the database")?;

    tracing::info!("Running database migrations...");
    run_migrations(&pool).await.context("applying migrations")?;

    let billing = BillingService::new(
        Arc::new(PostgresLedgerStore::new(pool.clone(), config.billing.currency)),
        Arc::new(PostgresDirectory::new(pool.clone())),
        Arc::new(PostgresMenuCatalog::new(pool)),
        Arc::new(TracingInvoiceNotifier),
        config.billing.clone(),
    );

    let app = create_router(Arc::new(billing), config.clone());

    let addr: SocketAddr = config
        .server_addr()
        .parse()
        .with_context(|| format!("invalid server address {}", config.server_addr()))?;

    tracing::info!(%addr, "Server listening");

    let listener = TcpListener::bind(addr).await?;
    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    tracing::info!("Server shutdown complete");
    Ok(())
}

/// Loads and validates the configuration.
///
/// `DATABASE_URL` overrides the configured database when set, so the
/// server and the sqlx tooling can share one variable.
fn load_config() -> anyhow::Result<ApiConfig> {
    let mut config = ApiConfig::from_env().context("loading configuration")?;
    if let Ok(url) = std::env::var("DATABASE_URL") {
        config.database.url = url;
    }
    config.validate().context("validating configuration")?;
    Ok(config)
}

/// Initializes the tracing subscriber for structured logging.
///
/// # Arguments
///
/// * `log_level` - The minimum log level to output (trace, debug, info, warn, error)
/// * `json` - Emit one JSON object per line instead of human-readable text
fn init_tracing(log_level: &str, json: bool) {
    let filter = EnvFilter::try_from_default_env()
        .or_else(|_| EnvFilter::try_new(log_level))
        .unwrap_or_else(|_| EnvFilter::new("info"));

    let registry = tracing_subscriber::registry().with(filter);
    if json {
        registry
            .with(tracing_subscriber::fmt::layer().json().with_target(true))
            .init();
    } else {
        registry
            .with(tracing_subscriber::fmt::layer().with_target(true))
            .init();
    }
}

/// Waits for shutdown signal (Ctrl+C or SIGTERM).
///
/// In-flight requests complete before the process exits.
async fn shutdown_signal() {
    let ctrl_c = async {
        tokio::signal::ctrl_c()
            .await
            .expect("Failed to install Ctrl+C handler");
    };

    #[cfg(unix)]
    let terminate = async {
        tokio::signal::unix::signal(tokio::signal::unix::SignalKind::terminate())
            .expect("Failed to install signal handler")
            .recv()
            .await;
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {
            tracing::info!("Received Ctrl+C, initiating graceful shutdown");
        }
        _ = terminate => {
            tracing::info!("Received SIGTERM, initiating graceful shutdown");
        }
    }
}
