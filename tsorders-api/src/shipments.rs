use axum::{
    extract::{Path, State},
    http::StatusCode,
    routing::get,
    Router,
};
use serde_json::Value;
use tsorders_core::schemas::{DeleteShipment, ShipmentData, UpdateShipment};
use tsorders_core::services::{DequeueOutcome, QueueOutcome};
use tsorders_core::OrderView;

use crate::error::AppError;
use crate::extract::ValidJson;
use crate::responses::{rows_value, Envelope, ALREADY_SHIPPED, ORDER_MISSING};
use crate::state::AppState;

pub fn routes() -> Router<AppState> {
    Router::new()
        .route(
            "/ordersreadytoship",
            get(ready_to_ship)
                .post(queue_shipment)
                .patch(update_shipment)
                .delete(delete_shipment),
        )
        .route("/ordershistory", get(history))
        .route("/ordershistory/", get(history))
        .route("/ordershistory/{filename}", get(history_by_file))
}

async fn ready_to_ship(State(state): State<AppState>) -> Result<Envelope, AppError> {
    let rows = state.orders.load(&OrderView::ReadyToShip).await?;
    Ok(Envelope::success(rows_value(rows)))
}

async fn queue_shipment(
    State(state): State<AppState>,
    ValidJson(shipment): ValidJson<ShipmentData>,
) -> Result<(StatusCode, Envelope), AppError> {
    tracing::info!(order_id = %shipment.id_order, "Creating shipment");

    let envelope = match state.shipments.queue(&shipment).await? {
        QueueOutcome::Queued(rows) => Envelope::inserted(rows, None),
        QueueOutcome::OrderMissing => Envelope::inserted(0, Some(ORDER_MISSING)),
        QueueOutcome::AlreadyShipped => Envelope::inserted(0, Some(ALREADY_SHIPPED)),
    };
    Ok((StatusCode::CREATED, envelope))
}

async fn update_shipment(
    State(state): State<AppState>,
    ValidJson(update): ValidJson<UpdateShipment>,
) -> Result<Envelope, AppError> {
    let updated = state.shipments.update(&update).await?;
    Ok(Envelope::updated(updated))
}

async fn delete_shipment(
    State(state): State<AppState>,
    ValidJson(request): ValidJson<DeleteShipment>,
) -> Result<Envelope, AppError> {
    tracing::info!(order_id = %request.id_order, "Deleting shipment");

    match state.shipments.dequeue(&request).await? {
        DequeueOutcome::Removed(rows) => Ok(Envelope::deleted(rows, None)),
        DequeueOutcome::OrderMissing => Ok(Envelope::deleted(0, Some(ORDER_MISSING))),
    }
}

async fn history(State(state): State<AppState>) -> Result<Envelope, AppError> {
    let rows = state.orders.load(&OrderView::History).await?;
    Ok(Envelope::success(rows_value(rows)))
}

/// The batch is wrapped in an outer array, as the front end expects.
async fn history_by_file(
    State(state): State<AppState>,
    Path(filename): Path<String>,
) -> Result<Envelope, AppError> {
    let rows = state.orders.load(&OrderView::ShipmentsByFile(filename)).await?;
    if rows.is_empty() {
        Ok(Envelope::success(Value::Array(Vec::new())))
    } else {
        Ok(Envelope::success(Value::Array(vec![rows_value(rows)])))
    }
}
