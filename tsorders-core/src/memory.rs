//! In-process implementations of the repository and carrier traits.
//!
//! The repository imitates the stored procedures closely enough for handler and
//! workflow tests: detail rows carry the flag columns, the queue tracks which
//! batch or carrier registration claimed each entry.

use std::collections::HashSet;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Mutex, MutexGuard};

use async_trait::async_trait;
use chrono::{Local, NaiveDate};
use serde_json::Value;

use crate::carrier::{CarrierAck, CarrierGateway, CarrierReference, CarrierResponse, CarrierShipment, CARRIER_OK};
use crate::grouping::ORDER_KEY;
use crate::models::{OrderFlag, OrderView, Row, ShipmentType};
use crate::repository::OrderRepository;
use crate::schemas::{DeleteShipment, ShipmentData, UpdateShipment};
use crate::{CoreError, CoreResult};

struct QueuedShipment {
    order_id: String,
    shipment_type: ShipmentType,
    row: Row,
    file_name: Option<String>,
    carrier: Option<CarrierAck>,
}

impl QueuedShipment {
    fn is_open(&self) -> bool {
        self.file_name.is_none() && self.carrier.is_none()
    }
}

#[derive(Default)]
struct MemoryState {
    detail_rows: Vec<Row>,
    shipped: HashSet<String>,
    queue: Vec<QueuedShipment>,
}

impl MemoryState {
    fn exists(&self, order_id: &str) -> bool {
        self.detail_rows.iter().any(|row| row_order_id(row) == Some(order_id))
    }

    fn pending_rows<F>(&self, keep: F) -> Vec<Row>
    where
        F: Fn(&Row) -> bool,
    {
        self.detail_rows
            .iter()
            .filter(|row| {
                row_order_id(row).is_some_and(|id| !self.shipped.contains(id)) && keep(row)
            })
            .cloned()
            .collect()
    }
}

#[derive(Default)]
pub struct InMemoryOrderRepository {
    state: Mutex<MemoryState>,
    unavailable: AtomicBool,
}

impl InMemoryOrderRepository {
    pub fn new() -> Self {
        Self::default()
    }

    /// Seeds order detail rows, one per item, as the detail procedures return them.
    pub fn with_rows(rows: Vec<Row>) -> Self {
        let repo = Self::default();
        if let Ok(mut state) = repo.state.lock() {
            state.detail_rows = rows;
        }
        repo
    }

    pub fn mark_shipped(&self, order_id: &str) {
        if let Ok(mut state) = self.state.lock() {
            state.shipped.insert(order_id.to_string());
        }
    }

    /// Makes every call fail as if the database were down.
    pub fn set_unavailable(&self, unavailable: bool) {
        self.unavailable.store(unavailable, Ordering::SeqCst);
    }

    fn state(&self) -> CoreResult<MutexGuard<'_, MemoryState>> {
        if self.unavailable.load(Ordering::SeqCst) {
            return Err(CoreError::StorageError("database unavailable".to_string()));
        }
        self.state
            .lock()
            .map_err(|_| CoreError::StorageError("in-memory state poisoned".to_string()))
    }
}

fn row_order_id(row: &Row) -> Option<&str> {
    row.get(ORDER_KEY).and_then(Value::as_str)
}

fn flag_set(row: &Row, flag: OrderFlag) -> bool {
    match row.get(flag.column()) {
        Some(Value::Bool(b)) => *b,
        Some(Value::Number(n)) => n.as_i64() == Some(1),
        _ => false,
    }
}

fn ship_date(row: &Row) -> Option<NaiveDate> {
    let raw = row.get("latestShipDate")?.as_str()?;
    NaiveDate::parse_from_str(raw.get(..10)?, "%Y-%m-%d").ok()
}

fn due_until(row: &Row, today: NaiveDate) -> bool {
    ship_date(row).is_some_and(|date| date <= today)
}

fn delayed(row: &Row, today: NaiveDate) -> bool {
    ship_date(row).is_some_and(|date| date < today)
}

#[async_trait]
impl OrderRepository for InMemoryOrderRepository {
    async fn ping(&self) -> CoreResult<()> {
        self.state().map(|_| ())
    }

    async fn fetch_view(&self, view: &OrderView) -> CoreResult<Vec<Row>> {
        let state = self.state()?;
        let today = Local::now().date_naive();
        let in_stock = |row: &Row| {
            !flag_set(row, OrderFlag::PendingWithoutStock) && !flag_set(row, OrderFlag::ShipFake)
        };
        let out_of_stock = |row: &Row| flag_set(row, OrderFlag::PendingWithoutStock);

        let rows = match view {
            OrderView::ById(id) => state.pending_rows(|row| row_order_id(row) == Some(id.as_str())),
            OrderView::Pending => state.pending_rows(in_stock),
            OrderView::PendingUntilToday => {
                state.pending_rows(|row| in_stock(row) && due_until(row, today))
            }
            OrderView::PendingDelayed => state.pending_rows(|row| in_stock(row) && delayed(row, today)),
            OrderView::OutOfStock => state.pending_rows(out_of_stock),
            OrderView::OutOfStockUntilToday => {
                state.pending_rows(|row| out_of_stock(row) && due_until(row, today))
            }
            OrderView::OutOfStockDelayed => {
                state.pending_rows(|row| out_of_stock(row) && delayed(row, today))
            }
            OrderView::ShipFake => state.pending_rows(|row| flag_set(row, OrderFlag::ShipFake)),
            OrderView::ReadyToShip => state
                .queue
                .iter()
                .filter(|entry| entry.is_open())
                .map(|entry| entry.row.clone())
                .collect(),
            OrderView::History => state
                .queue
                .iter()
                .filter(|entry| !entry.is_open())
                .map(|entry| entry.row.clone())
                .collect(),
            OrderView::ShipmentsByFile(name) => state
                .queue
                .iter()
                .filter(|entry| entry.file_name.as_deref() == Some(name.as_str()))
                .map(|entry| entry.row.clone())
                .collect(),
            OrderView::ForShipmentFile => state
                .queue
                .iter()
                .filter(|entry| entry.is_open() && entry.shipment_type == ShipmentType::UsingFile)
                .map(|entry| entry.row.clone())
                .collect(),
        };

        Ok(rows)
    }

    async fn order_exists(&self, order_id: &str) -> CoreResult<bool> {
        Ok(self.state()?.exists(order_id))
    }

    async fn order_not_shipped(&self, order_id: &str) -> CoreResult<bool> {
        let state = self.state()?;
        Ok(state.exists(order_id) && !state.shipped.contains(order_id))
    }

    async fn set_order_flag(&self, flag: OrderFlag, enabled: bool, order_id: &str) -> CoreResult<u64> {
        let mut state = self.state()?;
        let mut updated = 0;
        for row in state.detail_rows.iter_mut() {
            if row_order_id(row) == Some(order_id) {
                row.insert(flag.column().to_string(), Value::from(u8::from(enabled)));
                updated += 1;
            }
        }
        Ok(updated)
    }

    async fn queue_shipment(&self, shipment: &ShipmentData) -> CoreResult<u64> {
        let row = match serde_json::to_value(shipment) {
            Ok(Value::Object(map)) => map,
            Ok(_) => Row::new(),
            Err(e) => return Err(CoreError::StorageError(e.to_string())),
        };

        self.state()?.queue.push(QueuedShipment {
            order_id: shipment.id_order.clone(),
            shipment_type: shipment.shipment_type,
            row,
            file_name: None,
            carrier: None,
        });
        Ok(1)
    }

    async fn update_queued_shipment(&self, update: &UpdateShipment) -> CoreResult<u64> {
        let mut state = self.state()?;
        let mut updated = 0;
        for entry in state.queue.iter_mut() {
            if entry.order_id == update.id_order && entry.file_name.is_none() {
                entry.row.insert(
                    update.column_name.as_str().to_string(),
                    Value::String(update.column_value.clone()),
                );
                updated += 1;
            }
        }
        Ok(updated)
    }

    async fn dequeue_shipment(&self, request: &DeleteShipment) -> CoreResult<u64> {
        let mut state = self.state()?;
        let before = state.queue.len();
        state.queue.retain(|entry| entry.order_id != request.id_order);
        Ok((before - state.queue.len()) as u64)
    }

    async fn claim_shipment_file(&self, file_name: &str) -> CoreResult<()> {
        let mut state = self.state()?;
        let mut claimed = Vec::new();
        for entry in state.queue.iter_mut() {
            if entry.is_open() && entry.shipment_type == ShipmentType::UsingFile {
                entry.file_name = Some(file_name.to_string());
                entry.row.insert(
                    "fileGenerateName".to_string(),
                    Value::String(file_name.to_string()),
                );
                claimed.push(entry.order_id.clone());
            }
        }
        state.shipped.extend(claimed);
        Ok(())
    }

    async fn shipment_for_carrier(&self, order_id: &str) -> CoreResult<Option<Row>> {
        let state = self.state()?;
        Ok(state
            .queue
            .iter()
            .find(|entry| {
                entry.order_id == order_id
                    && entry.is_open()
                    && entry.shipment_type == ShipmentType::UsingWs
            })
            .map(|entry| entry.row.clone()))
    }

    async fn record_carrier_shipment(&self, order_id: &str, ack: &CarrierAck) -> CoreResult<()> {
        let mut state = self.state()?;
        for entry in state.queue.iter_mut() {
            if entry.order_id == order_id && entry.is_open() {
                entry.carrier = Some(ack.clone());
            }
        }
        state.shipped.insert(order_id.to_string());
        Ok(())
    }
}

/// Carrier that answers every request with a fixed return code.
pub struct MockCarrier {
    code: String,
    requests: Mutex<Vec<CarrierShipment>>,
}

impl MockCarrier {
    pub fn accepting() -> Self {
        Self::rejecting(CARRIER_OK)
    }

    pub fn rejecting(code: &str) -> Self {
        Self {
            code: code.to_string(),
            requests: Mutex::new(Vec::new()),
        }
    }

    /// Shipments received so far, oldest first.
    pub fn requests(&self) -> Vec<CarrierShipment> {
        self.requests.lock().map(|r| r.clone()).unwrap_or_default()
    }
}

#[async_trait]
impl CarrierGateway for MockCarrier {
    async fn request_shipment(&self, shipment: &CarrierShipment) -> CarrierResponse {
        if let Ok(mut requests) = self.requests.lock() {
            requests.push(shipment.clone());
        }

        let id = &shipment.id_order;
        if self.code != CARRIER_OK {
            return CarrierResponse::failure(&self.code, "rejected by mock", "Error en solicitud GLS", id);
        }

        CarrierResponse {
            uid_exp: Some(format!("uid-{}", id)),
            barcode: Some(format!("bar-{}", id)),
            expedition: Some(format!("exp-{}", id)),
            refs: Some(vec![CarrierReference {
                kind: "C".to_string(),
                value: shipment.ref_c.clone(),
            }]),
            label_base64: Some(String::new()),
            ..CarrierResponse::failure(CARRIER_OK, "", "Envio insertado Ok", id)
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn detail(order_id: &str, ship_date: &str, without_stock: u8) -> Row {
        json!({
            "amazonOrderId": order_id,
            "latestShipDate": ship_date,
            "pendingWithoutStock": without_stock,
            "sku": "S"
        })
        .as_object()
        .cloned()
        .unwrap()
    }

    #[tokio::test]
    async fn test_flag_moves_order_between_views() {
        let repo = InMemoryOrderRepository::with_rows(vec![detail("A", "2030-01-01", 0)]);

        assert_eq!(repo.fetch_view(&OrderView::Pending).await.unwrap().len(), 1);
        assert!(repo.fetch_view(&OrderView::OutOfStock).await.unwrap().is_empty());

        let updated = repo.set_order_flag(OrderFlag::PendingWithoutStock, true, "A").await.unwrap();
        assert_eq!(updated, 1);

        assert!(repo.fetch_view(&OrderView::Pending).await.unwrap().is_empty());
        assert_eq!(repo.fetch_view(&OrderView::OutOfStock).await.unwrap().len(), 1);
    }

    #[tokio::test]
    async fn test_date_views() {
        let repo = InMemoryOrderRepository::with_rows(vec![
            detail("OLD", "2000-01-01 12:00:00", 0),
            detail("FUTURE", "2999-01-01", 0),
        ]);

        let delayed = repo.fetch_view(&OrderView::PendingDelayed).await.unwrap();
        assert_eq!(delayed.len(), 1);
        assert_eq!(delayed[0]["amazonOrderId"], "OLD");

        let until_today = repo.fetch_view(&OrderView::PendingUntilToday).await.unwrap();
        assert_eq!(until_today.len(), 1);
    }

    #[tokio::test]
    async fn test_unavailable_repository_fails() {
        let repo = InMemoryOrderRepository::new();
        repo.set_unavailable(true);
        assert!(matches!(repo.ping().await, Err(CoreError::StorageError(_))));
    }
}
