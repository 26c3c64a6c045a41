use async_trait::async_trait;

use crate::carrier::CarrierAck;
use crate::models::{OrderFlag, OrderView, Row};
use crate::schemas::{DeleteShipment, ShipmentData, UpdateShipment};
use crate::CoreResult;

/// Repository trait for order and shipment data access
#[async_trait]
pub trait OrderRepository: Send + Sync {
    /// Cheap probe used by the health endpoint.
    async fn ping(&self) -> CoreResult<()>;

    async fn fetch_view(&self, view: &OrderView) -> CoreResult<Vec<Row>>;

    async fn order_exists(&self, order_id: &str) -> CoreResult<bool>;

    async fn order_not_shipped(&self, order_id: &str) -> CoreResult<bool>;

    /// Returns the number of updated rows.
    async fn set_order_flag(
        &self,
        flag: OrderFlag,
        enabled: bool,
        order_id: &str,
    ) -> CoreResult<u64>;

    /// Marks the order for its shipment type and inserts the queue entry, atomically.
    async fn queue_shipment(&self, shipment: &ShipmentData) -> CoreResult<u64>;

    /// Edits a queue entry that no file batch has claimed yet.
    async fn update_queued_shipment(&self, update: &UpdateShipment) -> CoreResult<u64>;

    /// Removes the queue entry and, if one was removed, resets the order mark.
    async fn dequeue_shipment(&self, request: &DeleteShipment) -> CoreResult<u64>;

    /// Stamps every file-bound queue entry and its order with the batch name.
    async fn claim_shipment_file(&self, file_name: &str) -> CoreResult<()>;

    async fn shipment_for_carrier(&self, order_id: &str) -> CoreResult<Option<Row>>;

    /// Persists the carrier's expedition data after a successful registration.
    async fn record_carrier_shipment(&self, order_id: &str, ack: &CarrierAck) -> CoreResult<()>;
}
