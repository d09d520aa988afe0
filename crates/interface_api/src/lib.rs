//! HTTP API Layer
//!
//! This crate provides the REST surface of the folio ledger using Axum.
//!
//! # Architecture
//!
//! - **Handlers**: Thin request handlers over [`BillingService`]
//! - **Middleware**: Authentication and request audit logging
//! - **DTOs**: Request/Response data transfer objects
//! - **Error Handling**: Ledger errors mapped to consistent error responses
//!
//! The hotel ledger's routes live under `/api/v1`, the restaurant ledger's
//! under `/api/v1/restaurant`; both share one set of handlers.
//!
//! # Example
//!
//! ```rust,ignore
//! use interface_api::create_router;
//!
//! let app = create_router(Arc::new(billing), config);
//! axum::serve(listener, app).await?;
//! ```

pub mod auth;
pub mod config;
pub mod dto;
pub mod error;
pub mod handlers;
pub mod middleware;
pub mod notifier;

use std::sync::Arc;

use axum::{
    middleware as axum_middleware,
    routing::{get, post, put},
    Extension, Router,
};
use tower::ServiceBuilder;
use tower_http::cors::{Any, CorsLayer};
use tower_http::trace::TraceLayer;

use domain_billing::{BillingService, LedgerKind};

use crate::config::ApiConfig;
use crate::handlers::{folios, health, invoices, payments, restaurant};
use crate::middleware::{audit_middleware, auth_middleware};

/// Application state shared across handlers
#[derive(Clone)]
pub struct AppState {
    pub billing: Arc<BillingService>,
    pub config: ApiConfig,
}

/// Routes that exist on both ledgers
fn ledger_routes(kind: LedgerKind) -> Router<AppState> {
    Router::new()
        .route("/folios/:id", get(folios::get_folio))
        .route("/folios/:id/charges", post(folios::post_charge))
        .route("/folios/:id/service-charges", post(folios::post_service_charge))
        .route("/folios/:id/refunds", post(folios::post_refund))
        .route(
            "/folios/:id/charges/:charge_id/reversal",
            post(folios::reverse_charge),
        )
        .route("/folios/:id/reconcile", post(folios::reconcile_folio))
        .route("/folios/:id/invoice", post(folios::generate_invoice))
        .route("/folios/:id/invoice/dispatch", post(folios::dispatch_invoice))
        .route("/invoices/:id", get(invoices::get_invoice))
        .route("/invoices/:id/payments", post(invoices::record_payment))
        .route("/payments/:id/refund", post(payments::refund_payment))
        .route("/guests/:id/payments", get(payments::guest_payment_history))
        .layer(Extension(kind))
}

/// Creates the main API router
///
/// # Arguments
///
/// * `billing` - The ledger service the handlers drive
/// * `config` - API configuration
///
/// # Returns
///
/// Configured Axum router with all routes and middleware
pub fn create_router(billing: Arc<BillingService>, config: ApiConfig) -> Router {
    let state = AppState { billing, config };

    // Public routes (no auth required)
    let public_routes = Router::new()
        .route("/health", get(health::health_check))
        .route("/health/ready", get(health::readiness_check));

    // Hotel-only routes, keyed by reservation
    let hotel_routes = Router::new()
        .route("/folios", post(folios::create_folio))
        .route("/reservations/:id/folio", get(folios::get_reservation_folio))
        .route("/reservations/:id/room-charges", post(folios::post_room_charges))
        .route("/reservations/:id/deposits", post(payments::record_deposit))
        .merge(ledger_routes(LedgerKind::Hotel));

    // Restaurant routes, keyed by order
    let restaurant_routes = Router::new()
        .route("/orders/:id", put(restaurant::sync_order))
        .route("/orders/:id/cancel", post(restaurant::cancel_order))
        .route("/orders/:id/bill", post(restaurant::bill_order))
        .route("/orders/:id/folio", get(restaurant::get_order_folio))
        .route("/orders/:id/deposits", post(restaurant::record_order_deposit))
        .merge(ledger_routes(LedgerKind::Restaurant));

    // Protected API routes
    let api_routes = Router::new()
        .merge(hotel_routes)
        .nest("/restaurant", restaurant_routes)
        .layer(axum_middleware::from_fn(audit_middleware))
        .layer(axum_middleware::from_fn_with_state(state.clone(), auth_middleware));

    // Combine all routes
    Router::new()
        .merge(public_routes)
        .nest("/api/v1", api_routes)
        .layer(
            ServiceBuilder::new().layer(TraceLayer::new_for_http()).layer(
                CorsLayer::new()
                    .allow_origin(Any)
                    .allow_methods(Any)
                    .allow_headers(Any),
            ),
        )
        .with_state(state)
}
