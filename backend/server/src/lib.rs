//! Café ordering backend.
//!
//! # Overview
//! - Customers scan a table QR code (or get a cashier card) and browse the menu
//! - The cart lives on the client; the server prices it on `/cart/quote` and again at checkout
//! - Checkout freezes the priced lines into an order and, with no table, hands out a take-away slot
//! - Payment is a simulated QRIS intent the customer "pays" by confirming it
//! - Kitchen and cashier screens poll `/kitchen` and walk orders through their statuses
//! - Admins edit products on top of the bundled catalog
//!
//! Everything is held in memory. Restarting the server drops orders, tables and
//! product edits and reloads the catalog.
//!
//! # Configuration
//!
//! | Variable | Default |
//! |---|---|
//! | `RUST_PORT` | `1111` |
//! | `CAFE_NAME` | `Kopi Senja` |
//! | `TAX_RATE_BPS` | `1000` (10%) |
//! | `CATALOG_URL` | bundled `catalog.json` |
//! | `PAYMENT_TTL_SECS` | `300`, at most one day |
//! | `CAFE_UTC_OFFSET` | `+07:00`, for receipts and the dashboard's day |
//! | `QRIS_MERCHANT_NAME` | `CAFE_NAME` |
//! | `QRIS_MERCHANT_CITY` | `Jakarta` |
//! | `QRIS_MERCHANT_ID` | `/run/secrets/QRIS_MERCHANT_ID`, then env |
//!
//! Logging follows `RUST_LOG`.
//!
//! # Setup
//!
//! ```sh
//! RUST_LOG=info cargo run -p cafe
//! ```
//!
//! Write a sample checkout body and place an order with it.
//! ```sh
//! cargo run -p tester -- checkout.json
//! curl -X POST localhost:1111/orders -H 'content-type: application/json' -d @checkout.json
//! ```
use std::{sync::Arc, time::Duration};

use axum::{
    Router,
    http::{Method, header::CONTENT_TYPE},
    routing::{get, post, put},
};

#[cfg(unix)]
use tokio::signal::unix::{SignalKind, signal};
use tokio::{net::TcpListener, signal::ctrl_c};
use tower_http::{cors::CorsLayer, trace::TraceLayer};
use tracing::{info, warn};
use tracing_subscriber::{EnvFilter, fmt};

pub mod checkout;
pub mod config;
pub mod error;
pub mod routes;
pub mod state;
pub mod utils;

use checkout::{
    advance_order_handler, confirm_payment_handler, create_order_handler,
    dashboard_handler, delete_order_handler, get_order_handler, get_payment_handler,
    kitchen_handler, list_orders_handler, list_payments_handler, open_payment_handler, quote_handler,
    receipt_handler, set_status_handler,
};
use error::AppError;
use routes::{
    create_product_handler, delete_product_handler, delete_table_handler, get_product_handler,
    get_table_handler, health_handler, list_products_handler, list_tables_handler,
    patch_product_handler, reset_product_handler, slug_handler, takeaway_handler,
    update_table_handler, upsert_table_handler,
};
use state::State;

pub fn app(state: Arc<State>) -> Router {
    let cors = CorsLayer::new()
        .allow_methods([
            Method::GET,
            Method::POST,
            Method::PUT,
            Method::DELETE,
            Method::OPTIONS,
        ])
        .allow_headers([CONTENT_TYPE])
        .max_age(Duration::from_secs(60 * 60));

    Router::new()
        .route("/health", get(health_handler))
        .route(
            "/products",
            get(list_products_handler).post(create_product_handler),
        )
        .route(
            "/products/{id}",
            get(get_product_handler)
                .put(patch_product_handler)
                .delete(delete_product_handler),
        )
        .route("/products/{id}/reset", post(reset_product_handler))
        .route(
            "/tables",
            get(list_tables_handler).post(upsert_table_handler),
        )
        .route(
            "/tables/{slug}",
            get(get_table_handler)
                .put(update_table_handler)
                .delete(delete_table_handler),
        )
        .route("/slugs/{slug}", get(slug_handler))
        .route("/takeaway", post(takeaway_handler))
        .route("/cart/quote", post(quote_handler))
        .route(
            "/orders",
            get(list_orders_handler).post(create_order_handler),
        )
        .route(
            "/orders/{id}",
            get(get_order_handler).delete(delete_order_handler),
        )
        .route("/orders/{id}/advance", post(advance_order_handler))
        .route("/orders/{id}/status", put(set_status_handler))
        .route("/orders/{id}/receipt", get(receipt_handler))
        .route(
            "/orders/{id}/payment",
            get(list_payments_handler).post(open_payment_handler),
        )
        .route("/payments/{id}", get(get_payment_handler))
        .route("/payments/{id}/confirm", post(confirm_payment_handler))
        .route("/kitchen", get(kitchen_handler))
        .route("/dashboard", get(dashboard_handler))
        .layer(TraceLayer::new_for_http())
        .layer(cors)
        .with_state(state)
}

pub async fn start_server() -> Result<(), AppError> {
    fmt().with_env_filter(EnvFilter::from_default_env()).init();

    info!("Initializing state...");
    let state = State::new().await?;

    info!("Starting server...");

    let address = format!("0.0.0.0:{}", state.config.port);
    info!("Binding to {address}");

    let listener = TcpListener::bind(&address)
        .await
        .map_err(|e| AppError::InternalError(Box::new(e)))?;
    info!("Server running on {address}");

    axum::serve(listener, app(state))
        .with_graceful_shutdown(shutdown_signal())
        .await
        .map_err(|e| AppError::InternalError(Box::new(e)))?;

    info!("Server shutting down...");
    Ok(())
}

async fn shutdown_signal() {
    let ctrl_c = async {
        match ctrl_c().await {
            Ok(()) => info!("Received Ctrl+C, shutting down"),
            Err(e) => {
                warn!("Failed to install Ctrl+C handler: {e}");
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match signal(SignalKind::terminate()) {
            Ok(mut stream) => {
                stream.recv().await;
                info!("Received terminate signal, shutting down");
            }
            Err(e) => {
                warn!("Failed to install signal handler: {e}");
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {},
        _ = terminate => {},
    }
}
