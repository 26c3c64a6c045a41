use axum::{
    extract::{Path, State},
    routing::get,
    Router,
};
use tsorders_core::schemas::{UpdateFakeFlag, UpdateStockFlag};
use tsorders_core::{OrderFlag, OrderView};

use crate::error::AppError;
use crate::extract::ValidJson;
use crate::responses::{rows_value, Envelope};
use crate::state::AppState;

pub fn routes() -> Router<AppState> {
    Router::new()
        .route("/order/{order_id}", get(get_order))
        .route("/orderspending", get(pending).patch(update_stock_flag))
        .route("/orderspending/", get(pending))
        .route("/orderspending/untiltoday", get(pending_until_today))
        .route("/orderspending/delayed", get(pending_delayed))
        .route("/ordersoutofstock", get(out_of_stock).patch(update_fake_flag))
        .route("/ordersoutofstock/", get(out_of_stock))
        .route("/ordersoutofstock/untiltoday", get(out_of_stock_until_today))
        .route("/ordersoutofstock/delayed", get(out_of_stock_delayed))
        .route("/ordersshipfake", get(ship_fake))
}

// ============================================================================
// Handlers
// ============================================================================

async fn get_order(
    State(state): State<AppState>,
    Path(order_id): Path<String>,
) -> Result<Envelope, AppError> {
    tracing::info!(order_id = %order_id, "Fetching order");
    let orders = state.orders.load(&OrderView::ById(order_id)).await?;

    if orders.is_empty() {
        Ok(Envelope::empty(None))
    } else {
        Ok(Envelope::success(rows_value(orders)))
    }
}

async fn listing(state: &AppState, view: OrderView) -> Result<Envelope, AppError> {
    let orders = state.orders.load(&view).await?;
    match view.resource() {
        Some(resource) => Ok(Envelope::listing(orders, resource)),
        None => Ok(Envelope::success(rows_value(orders))),
    }
}

async fn pending(State(state): State<AppState>) -> Result<Envelope, AppError> {
    listing(&state, OrderView::Pending).await
}

async fn pending_until_today(State(state): State<AppState>) -> Result<Envelope, AppError> {
    listing(&state, OrderView::PendingUntilToday).await
}

async fn pending_delayed(State(state): State<AppState>) -> Result<Envelope, AppError> {
    listing(&state, OrderView::PendingDelayed).await
}

async fn out_of_stock(State(state): State<AppState>) -> Result<Envelope, AppError> {
    listing(&state, OrderView::OutOfStock).await
}

async fn out_of_stock_until_today(State(state): State<AppState>) -> Result<Envelope, AppError> {
    listing(&state, OrderView::OutOfStockUntilToday).await
}

async fn out_of_stock_delayed(State(state): State<AppState>) -> Result<Envelope, AppError> {
    listing(&state, OrderView::OutOfStockDelayed).await
}

async fn ship_fake(State(state): State<AppState>) -> Result<Envelope, AppError> {
    listing(&state, OrderView::ShipFake).await
}

async fn update_stock_flag(
    State(state): State<AppState>,
    ValidJson(body): ValidJson<UpdateStockFlag>,
) -> Result<Envelope, AppError> {
    let updated = state
        .orders
        .set_flag(OrderFlag::PendingWithoutStock, body.withoutstock == 1, &body.id_order)
        .await?;
    Ok(Envelope::updated(updated))
}

async fn update_fake_flag(
    State(state): State<AppState>,
    ValidJson(body): ValidJson<UpdateFakeFlag>,
) -> Result<Envelope, AppError> {
    let updated = state
        .orders
        .set_flag(OrderFlag::ShipFake, body.is_fake == 1, &body.id_order)
        .await?;
    Ok(Envelope::updated(updated))
}
