use axum::{extract::State, routing::patch, Router};
use chrono::Local;
use tsorders_core::schemas::RegisterShipment;
use tsorders_core::services::{CarrierOutcome, FileBatchOutcome};
use tsorders_core::ShipmentType;

use crate::error::AppError;
use crate::extract::ValidJson;
use crate::responses::{rows_value, Envelope, ALREADY_SHIPPED};
use crate::state::AppState;

pub fn routes() -> Router<AppState> {
    Router::new().route("/registershipment", patch(register_shipment))
}

/// Either claims all file-bound shipments for a spreadsheet batch, or sends a
/// single order to the carrier web service.
async fn register_shipment(
    State(state): State<AppState>,
    ValidJson(request): ValidJson<RegisterShipment>,
) -> Result<Envelope, AppError> {
    tracing::info!(shipment_type = request.shipment_type.as_str(), "Registering shipment");

    match request.shipment_type {
        ShipmentType::UsingFile => {
            match state.shipments.register_file_batch(Local::now().naive_local()).await? {
                FileBatchOutcome::NothingToShip => Ok(Envelope::empty(None)),
                FileBatchOutcome::Claimed { rows, .. } => Ok(Envelope::success(rows_value(rows))),
            }
        }
        ShipmentType::UsingWs => {
            let order_id = request.id_order.unwrap_or_default();
            match state.shipments.register_with_carrier(&order_id).await? {
                CarrierOutcome::AlreadyShipped => Ok(Envelope::empty(Some(ALREADY_SHIPPED))),
                CarrierOutcome::NothingToShip => Ok(Envelope::empty(None)),
                CarrierOutcome::Submitted(response) => {
                    Ok(Envelope::success(serde_json::to_value(response)?))
                }
            }
        }
    }
}
