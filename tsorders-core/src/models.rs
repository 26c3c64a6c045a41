use chrono::NaiveDateTime;
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

/// One result row of a stored procedure, keyed by column name.
///
/// Procedures return different column sets per view, so rows stay dynamic
/// instead of being mapped onto fixed structs.
pub type Row = Map<String, Value>;

/// How an order leaves the warehouse.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum ShipmentType {
    /// Collected into a bulk spreadsheet batch.
    #[serde(rename = "usingFile")]
    UsingFile,
    /// Registered one by one against the carrier web service.
    #[serde(rename = "usingWS")]
    UsingWs,
}

impl ShipmentType {
    /// Procedure that sets or clears the shipment mark on `ordersdetail`.
    pub fn mark_procedure(self) -> &'static str {
        match self {
            ShipmentType::UsingFile => "uSp_updateMarkShipment",
            ShipmentType::UsingWs => "uSp_updateSelectedShipment",
        }
    }

    pub fn as_str(self) -> &'static str {
        match self {
            ShipmentType::UsingFile => "usingFile",
            ShipmentType::UsingWs => "usingWS",
        }
    }
}

/// Boolean flags an operator can toggle on an order.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum OrderFlag {
    PendingWithoutStock,
    ShipFake,
}

impl OrderFlag {
    pub fn column(self) -> &'static str {
        match self {
            OrderFlag::PendingWithoutStock => "pendingWithoutStock",
            OrderFlag::ShipFake => "isShipFake",
        }
    }
}

/// Every read-only listing the API exposes, each backed by one stored procedure.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum OrderView {
    ById(String),
    Pending,
    PendingUntilToday,
    PendingDelayed,
    OutOfStock,
    OutOfStockUntilToday,
    OutOfStockDelayed,
    ShipFake,
    ReadyToShip,
    History,
    ShipmentsByFile(String),
    ForShipmentFile,
}

impl OrderView {
    pub fn procedure(&self) -> &'static str {
        match self {
            OrderView::ById(_) => "uSp_getOrdersDetailUnshippedByOrderId",
            OrderView::Pending => "uSp_getOrdersDetailUnshipped",
            OrderView::PendingUntilToday => "uSp_getOrdersDetailUnshippedExpireToday",
            OrderView::PendingDelayed => "uSp_getOrdersDetailUnshippedDelayed",
            OrderView::OutOfStock => "uSp_getOrdersDetailUnshippedWithOutStock",
            OrderView::OutOfStockUntilToday => "uSp_getOrdersDetailUnshippedWithOutStockExpireToday",
            OrderView::OutOfStockDelayed => "uSp_getOrdersDetailUnshippedWithOutStockDelayed",
            OrderView::ShipFake => "uSp_getOrdersDetailUnshippedFake",
            OrderView::ReadyToShip => "uSp_getOrdersSelectedShipment",
            OrderView::History => "uSp_getHistoryShipment",
            OrderView::ShipmentsByFile(_) => "uSp_getShipmentsGeneratedByFileName",
            OrderView::ForShipmentFile => "uSp_getOrdersForShipmentFile",
        }
    }

    /// The single procedure argument, if the view takes one.
    pub fn argument(&self) -> Option<&str> {
        match self {
            OrderView::ById(id) => Some(id),
            OrderView::ShipmentsByFile(name) => Some(name),
            _ => None,
        }
    }

    /// Order detail views return one row per item and are folded into orders.
    pub fn groups_items(&self) -> bool {
        matches!(
            self,
            OrderView::ById(_)
                | OrderView::Pending
                | OrderView::PendingUntilToday
                | OrderView::PendingDelayed
                | OrderView::OutOfStock
                | OrderView::OutOfStockUntilToday
                | OrderView::OutOfStockDelayed
                | OrderView::ShipFake
        )
    }

    /// Resource name reported in the response header for list views.
    pub fn resource(&self) -> Option<&'static str> {
        match self {
            OrderView::Pending => Some("orderspending"),
            OrderView::PendingUntilToday => Some("orderspending/untiltoday"),
            OrderView::PendingDelayed => Some("orderspending/delayed"),
            OrderView::OutOfStock => Some("ordersoutofstock"),
            OrderView::OutOfStockUntilToday => Some("ordersoutofstock/untiltoday"),
            OrderView::OutOfStockDelayed => Some("ordersoutofstock/delayed"),
            OrderView::ShipFake => Some("ordersshipfake"),
            _ => None,
        }
    }
}

/// Columns of a queued shipment that may be edited before it is registered.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum ShipmentColumn {
    #[serde(rename = "servicio")]
    Servicio,
    #[serde(rename = "horario")]
    Horario,
    #[serde(rename = "destinatario")]
    Destinatario,
    #[serde(rename = "direccion")]
    Direccion,
    #[serde(rename = "pais")]
    Pais,
    #[serde(rename = "cp")]
    Cp,
    #[serde(rename = "poblacion")]
    Poblacion,
    #[serde(rename = "telefono")]
    Telefono,
    #[serde(rename = "email")]
    Email,
    #[serde(rename = "departamento")]
    Departamento,
    #[serde(rename = "contacto")]
    Contacto,
    #[serde(rename = "observaciones")]
    Observaciones,
    #[serde(rename = "bultos")]
    Bultos,
    #[serde(rename = "movil")]
    Movil,
    #[serde(rename = "refC")]
    RefC,
}

impl ShipmentColumn {
    /// SQL identifier of the column. Only these fixed names are ever interpolated.
    pub fn as_str(self) -> &'static str {
        match self {
            ShipmentColumn::Servicio => "servicio",
            ShipmentColumn::Horario => "horario",
            ShipmentColumn::Destinatario => "destinatario",
            ShipmentColumn::Direccion => "direccion",
            ShipmentColumn::Pais => "pais",
            ShipmentColumn::Cp => "cp",
            ShipmentColumn::Poblacion => "poblacion",
            ShipmentColumn::Telefono => "telefono",
            ShipmentColumn::Email => "email",
            ShipmentColumn::Departamento => "departamento",
            ShipmentColumn::Contacto => "contacto",
            ShipmentColumn::Observaciones => "observaciones",
            ShipmentColumn::Bultos => "bultos",
            ShipmentColumn::Movil => "movil",
            ShipmentColumn::RefC => "refC",
        }
    }
}

/// Name of the spreadsheet batch that claims every file-bound shipment at `now`.
pub fn shipment_file_name(now: NaiveDateTime) -> String {
    format!("Envios_{}.xlsx", now.format("%d%m%Y_%H%M%S"))
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::NaiveDate;

    #[test]
    fn test_shipment_type_wire_names() {
        let file: ShipmentType = serde_json::from_str("\"usingFile\"").unwrap();
        let ws: ShipmentType = serde_json::from_str("\"usingWS\"").unwrap();
        assert_eq!(file, ShipmentType::UsingFile);
        assert_eq!(ws, ShipmentType::UsingWs);
        assert!(serde_json::from_str::<ShipmentType>("\"usingFax\"").is_err());
    }

    #[test]
    fn test_mark_procedure_depends_on_type() {
        assert_eq!(ShipmentType::UsingFile.mark_procedure(), "uSp_updateMarkShipment");
        assert_eq!(ShipmentType::UsingWs.mark_procedure(), "uSp_updateSelectedShipment");
    }

    #[test]
    fn test_views_with_arguments() {
        let view = OrderView::ById("408-1234567-1234567".to_string());
        assert_eq!(view.argument(), Some("408-1234567-1234567"));
        assert!(view.groups_items());
        assert_eq!(view.resource(), None);

        assert_eq!(OrderView::History.argument(), None);
        assert!(!OrderView::History.groups_items());
        assert!(!OrderView::ShipmentsByFile("x.xlsx".into()).groups_items());
    }

    #[test]
    fn test_shipment_column_rejects_unknown_names() {
        let column: ShipmentColumn = serde_json::from_str("\"refC\"").unwrap();
        assert_eq!(column.as_str(), "refC");
        assert!(serde_json::from_str::<ShipmentColumn>("\"idOrder\"").is_err());
        assert!(serde_json::from_str::<ShipmentColumn>("\"cp; DROP TABLE x\"").is_err());
    }

    #[test]
    fn test_shipment_file_name_format() {
        let now = NaiveDate::from_ymd_opt(2025, 3, 7)
            .unwrap()
            .and_hms_opt(9, 5, 2)
            .unwrap();
        assert_eq!(shipment_file_name(now), "Envios_07032025_090502.xlsx");
    }
}
