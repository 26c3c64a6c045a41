use async_trait::async_trait;
use sqlx::MySqlPool;
use tsorders_core::carrier::CarrierAck;
use tsorders_core::repository::OrderRepository;
use tsorders_core::schemas::{DeleteShipment, ShipmentData, UpdateShipment};
use tsorders_core::{CoreError, CoreResult, OrderFlag, OrderView, Row};

use crate::rows::{call_sql, row_to_json};

pub struct StoreOrderRepository {
    pool: MySqlPool,
}

impl StoreOrderRepository {
    pub fn new(pool: MySqlPool) -> Self {
        Self { pool }
    }

    async fn call_rows(&self, procedure: &str, argument: Option<&str>) -> CoreResult<Vec<Row>> {
        let sql = call_sql(procedure, usize::from(argument.is_some()));
        let mut query = sqlx::query(&sql);
        if let Some(argument) = argument {
            query = query.bind(argument);
        }

        let rows = query.fetch_all(&self.pool).await.map_err(storage)?;
        rows.iter()
            .map(|row| row_to_json(row).map_err(storage))
            .collect()
    }
}

fn storage(e: sqlx::Error) -> CoreError {
    tracing::error!(error = %e, "Database error");
    CoreError::StorageError(e.to_string())
}

const INSERT_SHIPMENT: &str = "uSp_insertSelectedshipment";

#[async_trait]
impl OrderRepository for StoreOrderRepository {
    async fn ping(&self) -> CoreResult<()> {
        sqlx::query("SELECT 1 FROM ordersdetail LIMIT 1")
            .fetch_optional(&self.pool)
            .await
            .map_err(storage)?;
        Ok(())
    }

    async fn fetch_view(&self, view: &OrderView) -> CoreResult<Vec<Row>> {
        self.call_rows(view.procedure(), view.argument()).await
    }

    async fn order_exists(&self, order_id: &str) -> CoreResult<bool> {
        let rows = self.call_rows("uSp_isExistOrder", Some(order_id)).await?;
        Ok(!rows.is_empty())
    }

    async fn order_not_shipped(&self, order_id: &str) -> CoreResult<bool> {
        let rows = self.call_rows("uSp_isOrderNotShipped", Some(order_id)).await?;
        Ok(!rows.is_empty())
    }

    async fn set_order_flag(
        &self,
        flag: OrderFlag,
        enabled: bool,
        order_id: &str,
    ) -> CoreResult<u64> {
        let sql = format!("UPDATE ordersdetail SET {} = ? WHERE orderId = ?", flag.column());
        let result = sqlx::query(&sql)
            .bind(u8::from(enabled))
            .bind(order_id)
            .execute(&self.pool)
            .await
            .map_err(storage)?;
        Ok(result.rows_affected())
    }

    async fn queue_shipment(&self, shipment: &ShipmentData) -> CoreResult<u64> {
        let mut tx = self.pool.begin().await.map_err(storage)?;

        sqlx::query(&call_sql(shipment.shipment_type.mark_procedure(), 2))
            .bind(shipment.mark_value())
            .bind(&shipment.id_order)
            .execute(&mut *tx)
            .await
            .map_err(storage)?;

        let result = sqlx::query(&call_sql(INSERT_SHIPMENT, 17))
            .bind(&shipment.servicio)
            .bind(&shipment.horario)
            .bind(&shipment.destinatario)
            .bind(&shipment.direccion)
            .bind(&shipment.pais)
            .bind(&shipment.cp)
            .bind(&shipment.poblacion)
            .bind(&shipment.telefono)
            .bind(&shipment.email)
            .bind(&shipment.departamento)
            .bind(&shipment.contacto)
            .bind(&shipment.observaciones)
            .bind(shipment.bultos)
            .bind(&shipment.movil)
            .bind(&shipment.ref_c)
            .bind(&shipment.id_order)
            .bind(&shipment.process)
            .execute(&mut *tx)
            .await
            .map_err(storage)?;

        tx.commit().await.map_err(storage)?;
        Ok(result.rows_affected())
    }

    async fn update_queued_shipment(&self, update: &UpdateShipment) -> CoreResult<u64> {
        // column names come from a closed enum, never from the request text
        let sql = format!(
            "UPDATE selectedshipment SET {} = ? WHERE idOrder = ? AND fileGenerateName IS NULL",
            update.column_name.as_str()
        );
        let result = sqlx::query(&sql)
            .bind(&update.column_value)
            .bind(&update.id_order)
            .execute(&self.pool)
            .await
            .map_err(storage)?;
        Ok(result.rows_affected())
    }

    async fn dequeue_shipment(&self, request: &DeleteShipment) -> CoreResult<u64> {
        let mut tx = self.pool.begin().await.map_err(storage)?;

        let deleted = sqlx::query("DELETE FROM selectedshipment WHERE idOrder = ?")
            .bind(&request.id_order)
            .execute(&mut *tx)
            .await
            .map_err(storage)?
            .rows_affected();

        if deleted > 0 {
            sqlx::query(&call_sql(request.shipment_type.mark_procedure(), 2))
                .bind(request.reset_value())
                .bind(&request.id_order)
                .execute(&mut *tx)
                .await
                .map_err(storage)?;
        }

        tx.commit().await.map_err(storage)?;
        Ok(deleted)
    }

    async fn claim_shipment_file(&self, file_name: &str) -> CoreResult<()> {
        let mut tx = self.pool.begin().await.map_err(storage)?;

        sqlx::query(&call_sql("uSp_updateShipmentFile", 1))
            .bind(file_name)
            .execute(&mut *tx)
            .await
            .map_err(storage)?;
        sqlx::query(&call_sql("uSp_updateOrdersDetailFile", 0))
            .execute(&mut *tx)
            .await
            .map_err(storage)?;

        tx.commit().await.map_err(storage)
    }

    async fn shipment_for_carrier(&self, order_id: &str) -> CoreResult<Option<Row>> {
        let rows = self
            .call_rows("uSp_getOrdersForShipmentWS", Some(order_id))
            .await?;
        Ok(rows.into_iter().next())
    }

    async fn record_carrier_shipment(&self, order_id: &str, ack: &CarrierAck) -> CoreResult<()> {
        let mut tx = self.pool.begin().await.map_err(storage)?;

        sqlx::query(&call_sql("uSp_updateOrdersDetailWS", 4))
            .bind(order_id)
            .bind(&ack.uid_exp)
            .bind(&ack.expedition)
            .bind(&ack.barcode)
            .execute(&mut *tx)
            .await
            .map_err(storage)?;
        sqlx::query(&call_sql("uSp_updateShipmentWS", 1))
            .bind(order_id)
            .execute(&mut *tx)
            .await
            .map_err(storage)?;
        sqlx::query(&call_sql("uSp_updateOrdersWS", 2))
            .bind(order_id)
            .bind(&ack.expedition)
            .execute(&mut *tx)
            .await
            .map_err(storage)?;

        tx.commit().await.map_err(storage)
    }
}
