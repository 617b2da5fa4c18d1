//! Cart quotes, checkout, the kitchen flow and QRIS payments.
use std::sync::Arc;

use axum::{
    Json,
    extract::{Path, Query, State as AxumState},
    http::{StatusCode, header::CONTENT_TYPE},
    response::IntoResponse,
};
use chrono::{NaiveDate, Utc};
use serde::{Deserialize, Serialize};
use till::{
    cart::{CartItem, Quote},
    error::TillError,
    money::format_rupiah,
    order::{Customer, DailySummary, OrderEntry, OrderFilter},
    payment::PaymentIntent,
    receipt::render_receipt,
    table::Slug,
};
use tracing::{info, warn};

use crate::{
    error::AppError,
    state::State,
    utils::{build_cart, non_blank, parse_id, parse_status},
};

type AppState = AxumState<Arc<State>>;

#[derive(Deserialize)]
pub struct CartPayload {
    #[serde(default)]
    items: Vec<CartItem>,
}

pub async fn quote_handler(
    AxumState(state): AppState,
    Json(payload): Json<CartPayload>,
) -> Result<Json<Quote>, AppError> {
    let cart = build_cart(payload.items)?;
    let quote = cart.price(&*state.catalog.read().await, state.config.tax_rate_bps)?;

    Ok(Json(quote))
}

#[derive(Deserialize)]
pub struct CheckoutPayload {
    #[serde(default)]
    table: Option<String>,
    customer: Customer,
    #[serde(default)]
    items: Vec<CartItem>,
    #[serde(default)]
    note: Option<String>,
}

pub async fn create_order_handler(
    AxumState(state): AppState,
    Json(payload): Json<CheckoutPayload>,
) -> Result<impl IntoResponse, AppError> {
    let cart = build_cart(payload.items)?;
    let quote = cart.price(&*state.catalog.read().await, state.config.tax_rate_bps)?;
    payload.customer.validate()?;

    // Every fallible check runs before a take-away slot is taken.
    let table = match non_blank(payload.table) {
        Some(raw) => {
            let slug = Slug::parse(&raw)?;
            if let Some(table) = state.tables.read().await.find(&slug) {
                if !table.active {
                    return Err(TillError::Invalid {
                        field: "table",
                        reason: format!("{} is not taking orders", table.slug),
                    }
                    .into());
                }
            }
            slug
        }
        None => state.takeaway.lock().await.next_slot(),
    };

    let order = state.orders.write().await.place(
        quote,
        &table,
        payload.customer,
        payload.note.as_deref().unwrap_or_default(),
        Utc::now(),
    )?;
    info!(
        "Placed {} for {} totaling {}",
        order.code,
        order.table_label,
        format_rupiah(order.total)
    );

    Ok((StatusCode::CREATED, Json(order)))
}

#[derive(Deserialize)]
pub struct OrdersQuery {
    #[serde(default)]
    status: Option<String>,
    #[serde(default)]
    table: Option<String>,
}

pub async fn list_orders_handler(
    AxumState(state): AppState,
    Query(query): Query<OrdersQuery>,
) -> Result<Json<Vec<OrderEntry>>, AppError> {
    let filter = OrderFilter {
        status: parse_status(query.status.as_deref())?,
        table: non_blank(query.table),
    };

    Ok(Json(state.orders.read().await.list(&filter)?))
}

pub async fn get_order_handler(
    AxumState(state): AppState,
    Path(id): Path<String>,
) -> Result<Json<OrderEntry>, AppError> {
    let id = parse_id(&id)?;

    Ok(Json(state.orders.read().await.get(id)?.clone()))
}

pub async fn delete_order_handler(
    AxumState(state): AppState,
    Path(id): Path<String>,
) -> Result<StatusCode, AppError> {
    let id = parse_id(&id)?;
    let order = state.orders.write().await.remove(id)?;
    info!("Deleted {}", order.code);

    Ok(StatusCode::NO_CONTENT)
}

pub async fn receipt_handler(
    AxumState(state): AppState,
    Path(id): Path<String>,
) -> Result<impl IntoResponse, AppError> {
    let id = parse_id(&id)?;
    let receipt = render_receipt(
        state.orders.read().await.get(id)?,
        &state.config.cafe_name,
        state.config.utc_offset,
    );

    Ok(([(CONTENT_TYPE, "text/plain; charset=utf-8")], receipt))
}

pub async fn advance_order_handler(
    AxumState(state): AppState,
    Path(id): Path<String>,
) -> Result<Json<OrderEntry>, AppError> {
    let id = parse_id(&id)?;
    let order = state.orders.write().await.advance(id, Utc::now())?;
    info!("{} is now {}", order.code, order.status);

    Ok(Json(order))
}

#[derive(Deserialize)]
pub struct StatusPayload {
    status: String,
}

pub async fn set_status_handler(
    AxumState(state): AppState,
    Path(id): Path<String>,
    Json(payload): Json<StatusPayload>,
) -> Result<Json<OrderEntry>, AppError> {
    let id = parse_id(&id)?;
    let status = payload.status.parse()?;
    let order = state
        .orders
        .write()
        .await
        .set_status(id, status, Utc::now())?;
    info!("{} is now {}", order.code, order.status);

    Ok(Json(order))
}

pub async fn kitchen_handler(AxumState(state): AppState) -> Json<Vec<OrderEntry>> {
    Json(state.orders.read().await.kitchen_queue())
}

#[derive(Deserialize)]
pub struct DashboardQuery {
    #[serde(default)]
    date: Option<NaiveDate>,
}

#[derive(Serialize)]
pub struct Dashboard {
    #[serde(flatten)]
    summary: DailySummary,
    paid_revenue_display: String,
    active_orders: usize,
}

pub async fn dashboard_handler(
    AxumState(state): AppState,
    Query(query): Query<DashboardQuery>,
) -> Json<Dashboard> {
    let offset = state.config.utc_offset;
    let date = query
        .date
        .unwrap_or_else(|| Utc::now().with_timezone(&offset).date_naive());
    let orders = state.orders.read().await;
    let summary = orders.summary(date, offset);

    Json(Dashboard {
        paid_revenue_display: format_rupiah(summary.paid_revenue),
        active_orders: orders.kitchen_queue().len(),
        summary,
    })
}

pub async fn open_payment_handler(
    AxumState(state): AppState,
    Path(id): Path<String>,
) -> Result<impl IntoResponse, AppError> {
    let id = parse_id(&id)?;
    let order = state.orders.read().await.get(id)?.clone();
    let intent = state.payments.lock().await.open(&order, Utc::now())?;
    info!(
        "Payment {} open for {} ({})",
        intent.id,
        order.code,
        format_rupiah(intent.amount)
    );

    Ok((StatusCode::CREATED, Json(intent)))
}

/// Every intent opened for an order, oldest first.
pub async fn list_payments_handler(
    AxumState(state): AppState,
    Path(id): Path<String>,
) -> Result<Json<Vec<PaymentIntent>>, AppError> {
    let id = parse_id(&id)?;
    state.orders.read().await.get(id)?;

    Ok(Json(state.payments.lock().await.for_order(id, Utc::now())))
}

pub async fn get_payment_handler(
    AxumState(state): AppState,
    Path(id): Path<String>,
) -> Result<Json<PaymentIntent>, AppError> {
    let id = parse_id(&id)?;

    Ok(Json(state.payments.lock().await.get(id, Utc::now())?))
}

pub async fn confirm_payment_handler(
    AxumState(state): AppState,
    Path(id): Path<String>,
) -> Result<Json<PaymentIntent>, AppError> {
    let id = parse_id(&id)?;
    let now = Utc::now();

    let mut orders = state.orders.write().await;
    let mut payments = state.payments.lock().await;

    let intent = payments.check_payable(id, now)?;
    if let Err(e) = orders.mark_paid(intent.order_id, now) {
        warn!("Payment {id} rejected: {e}");
        return Err(e.into());
    }
    let intent = payments.confirm(id, now)?;
    info!("Payment {} settled {}", intent.id, intent.order_code);

    Ok(Json(intent))
}
