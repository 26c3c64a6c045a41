use std::sync::Arc;

use chrono::NaiveDateTime;
use serde_json::Value;

use crate::carrier::{CarrierGateway, CarrierResponse, CarrierShipment};
use crate::grouping::group_orders_with_items;
use crate::models::{shipment_file_name, OrderFlag, OrderView, Row};
use crate::repository::OrderRepository;
use crate::schemas::{DeleteShipment, ShipmentData, UpdateShipment};
use crate::CoreResult;

/// Read side of orders plus the operator flags.
pub struct OrderService {
    repo: Arc<dyn OrderRepository>,
}

impl OrderService {
    pub fn new(repo: Arc<dyn OrderRepository>) -> Self {
        Self { repo }
    }

    /// Rows of a view, folded into orders with items when the view is per-item.
    pub async fn load(&self, view: &OrderView) -> CoreResult<Vec<Row>> {
        let rows = self.repo.fetch_view(view).await?;
        if view.groups_items() {
            Ok(group_orders_with_items(rows))
        } else {
            Ok(rows)
        }
    }

    pub async fn set_flag(&self, flag: OrderFlag, enabled: bool, order_id: &str) -> CoreResult<u64> {
        tracing::info!(order_id, flag = flag.column(), enabled, "Updating order flag");
        self.repo.set_order_flag(flag, enabled, order_id).await
    }
}

#[derive(Debug, PartialEq)]
pub enum QueueOutcome {
    Queued(u64),
    OrderMissing,
    AlreadyShipped,
}

#[derive(Debug, PartialEq)]
pub enum DequeueOutcome {
    Removed(u64),
    OrderMissing,
}

#[derive(Debug, PartialEq)]
pub enum FileBatchOutcome {
    NothingToShip,
    Claimed { file_name: String, rows: Vec<Row> },
}

#[derive(Debug, PartialEq)]
pub enum CarrierOutcome {
    AlreadyShipped,
    NothingToShip,
    Submitted(CarrierResponse),
}

/// Shipment queue and registration workflows.
pub struct ShipmentService {
    repo: Arc<dyn OrderRepository>,
    carrier: Arc<dyn CarrierGateway>,
}

impl ShipmentService {
    pub fn new(repo: Arc<dyn OrderRepository>, carrier: Arc<dyn CarrierGateway>) -> Self {
        Self { repo, carrier }
    }

    pub async fn queue(&self, shipment: &ShipmentData) -> CoreResult<QueueOutcome> {
        if !self.repo.order_exists(&shipment.id_order).await? {
            return Ok(QueueOutcome::OrderMissing);
        }
        if !self.repo.order_not_shipped(&shipment.id_order).await? {
            return Ok(QueueOutcome::AlreadyShipped);
        }

        let inserted = self.repo.queue_shipment(shipment).await?;
        tracing::info!(
            order_id = %shipment.id_order,
            shipment_type = shipment.shipment_type.as_str(),
            "Shipment queued"
        );
        Ok(QueueOutcome::Queued(inserted))
    }

    pub async fn update(&self, update: &UpdateShipment) -> CoreResult<u64> {
        tracing::info!(
            order_id = %update.id_order,
            column = update.column_name.as_str(),
            "Updating queued shipment"
        );
        self.repo.update_queued_shipment(update).await
    }

    pub async fn dequeue(&self, request: &DeleteShipment) -> CoreResult<DequeueOutcome> {
        if !self.repo.order_exists(&request.id_order).await? {
            return Ok(DequeueOutcome::OrderMissing);
        }
        let removed = self.repo.dequeue_shipment(request).await?;
        if removed > 0 {
            tracing::info!(order_id = %request.id_order, "Shipment removed from queue");
        }
        Ok(DequeueOutcome::Removed(removed))
    }

    /// Claims every file-bound shipment for a new spreadsheet batch named after `now`.
    pub async fn register_file_batch(&self, now: NaiveDateTime) -> CoreResult<FileBatchOutcome> {
        let mut rows = self.repo.fetch_view(&OrderView::ForShipmentFile).await?;
        if rows.is_empty() {
            return Ok(FileBatchOutcome::NothingToShip);
        }

        let file_name = shipment_file_name(now);
        for row in rows.iter_mut() {
            row.insert("fileGenerateName".to_string(), Value::String(file_name.clone()));
        }

        self.repo.claim_shipment_file(&file_name).await?;
        tracing::info!(file_name = %file_name, shipments = rows.len(), "File shipment registered");

        Ok(FileBatchOutcome::Claimed { file_name, rows })
    }

    /// Sends one order to the carrier and records the expedition when accepted.
    pub async fn register_with_carrier(&self, order_id: &str) -> CoreResult<CarrierOutcome> {
        if !self.repo.order_not_shipped(order_id).await? {
            return Ok(CarrierOutcome::AlreadyShipped);
        }

        let Some(row) = self.repo.shipment_for_carrier(order_id).await? else {
            return Ok(CarrierOutcome::NothingToShip);
        };
        let shipment = CarrierShipment::from_row(&row)?;

        let response = self.carrier.request_shipment(&shipment).await;
        match response.ack() {
            Some(ack) => {
                self.repo.record_carrier_shipment(order_id, &ack).await?;
                tracing::info!(order_id, expedition = %ack.expedition, "Carrier shipment registered");
            }
            None => {
                tracing::warn!(
                    order_id,
                    code = %response.code,
                    reason = %response.response,
                    "Carrier rejected shipment"
                );
            }
        }

        Ok(CarrierOutcome::Submitted(response))
    }
}
