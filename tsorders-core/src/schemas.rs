//! Request bodies accepted by the API and the rules they must satisfy.
//!
//! Deserialization catches shape errors (missing fields, wrong types, unknown
//! enum values); [`Validate`] adds the length and range rules on top.

use serde::{Deserialize, Deserializer, Serialize};

use crate::models::{ShipmentColumn, ShipmentType};
use crate::{CoreError, CoreResult};

pub trait Validate {
    fn validate(&self) -> CoreResult<()>;
}

#[derive(Debug, Clone, Deserialize)]
pub struct LoginRequest {
    pub username: String,
    pub password: String,
}

impl Validate for LoginRequest {
    fn validate(&self) -> CoreResult<()> {
        min_len("username", &self.username, 3)?;
        min_len("password", &self.password, 4)
    }
}

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UpdateStockFlag {
    pub withoutstock: u8,
    pub id_order: String,
}

impl Validate for UpdateStockFlag {
    fn validate(&self) -> CoreResult<()> {
        binary_flag("withoutstock", self.withoutstock)?;
        min_len("idOrder", &self.id_order, 1)
    }
}

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UpdateFakeFlag {
    pub is_fake: u8,
    pub id_order: String,
}

impl Validate for UpdateFakeFlag {
    fn validate(&self) -> CoreResult<()> {
        binary_flag("isFake", self.is_fake)?;
        min_len("idOrder", &self.id_order, 1)
    }
}

/// Full shipment data for queueing an order.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ShipmentData {
    #[serde(deserialize_with = "string_or_number")]
    pub servicio: String,
    #[serde(deserialize_with = "string_or_number")]
    pub horario: String,
    pub destinatario: String,
    pub direccion: String,
    #[serde(deserialize_with = "string_or_number")]
    pub pais: String,
    pub cp: String,
    pub poblacion: String,
    pub telefono: String,
    pub email: String,
    #[serde(default)]
    pub departamento: String,
    #[serde(default)]
    pub contacto: String,
    #[serde(default)]
    pub observaciones: String,
    pub bultos: i32,
    #[serde(default)]
    pub movil: String,
    #[serde(default)]
    pub ref_c: String,
    pub id_order: String,
    pub process: String,
    pub shipment_type: ShipmentType,
    #[serde(default)]
    pub value: Option<i32>,
}

impl ShipmentData {
    /// Value written to the order's mark when it is queued.
    pub fn mark_value(&self) -> i32 {
        self.value.unwrap_or(1)
    }
}

impl Validate for ShipmentData {
    fn validate(&self) -> CoreResult<()> {
        min_len("destinatario", &self.destinatario, 3)?;
        min_len("direccion", &self.direccion, 3)?;
        min_len("cp", &self.cp, 4)?;
        min_len("poblacion", &self.poblacion, 3)?;
        min_len("telefono", &self.telefono, 1)?;
        min_len("email", &self.email, 1)?;
        if !self.email.contains('@') {
            return Err(CoreError::ValidationError("email must contain @".to_string()));
        }
        if self.bultos < 1 {
            return Err(CoreError::ValidationError("bultos must be at least 1".to_string()));
        }
        min_len("idOrder", &self.id_order, 1)?;
        min_len("process", &self.process, 1)
    }
}

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UpdateShipment {
    pub column_name: ShipmentColumn,
    pub column_value: String,
    pub id_order: String,
}

impl Validate for UpdateShipment {
    fn validate(&self) -> CoreResult<()> {
        min_len("columnValue", &self.column_value, 1)?;
        min_len("idOrder", &self.id_order, 1)
    }
}

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DeleteShipment {
    pub id_order: String,
    pub shipment_type: ShipmentType,
    #[serde(default)]
    pub value: Option<i32>,
}

impl DeleteShipment {
    /// Value the order's mark is reset to once its queue entry is gone.
    pub fn reset_value(&self) -> i32 {
        self.value.unwrap_or(0)
    }
}

impl Validate for DeleteShipment {
    fn validate(&self) -> CoreResult<()> {
        min_len("idOrder", &self.id_order, 1)
    }
}

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RegisterShipment {
    pub shipment_type: ShipmentType,
    #[serde(default)]
    pub id_order: Option<String>,
}

impl Validate for RegisterShipment {
    fn validate(&self) -> CoreResult<()> {
        let has_order = self.id_order.as_deref().is_some_and(|id| !id.is_empty());
        if self.shipment_type == ShipmentType::UsingWs && !has_order {
            return Err(CoreError::ValidationError(
                "idOrder is required for shipmentType=usingWS".to_string(),
            ));
        }
        Ok(())
    }
}

fn min_len(field: &str, value: &str, min: usize) -> CoreResult<()> {
    if value.chars().count() < min {
        return Err(CoreError::ValidationError(format!(
            "{} must be at least {} characters",
            field, min
        )));
    }
    Ok(())
}

fn binary_flag(field: &str, value: u8) -> CoreResult<()> {
    if value > 1 {
        return Err(CoreError::ValidationError(format!("{} must be 0 or 1", field)));
    }
    Ok(())
}

/// Accepts `"12"` as well as `12` and yields the string form.
pub fn string_or_number<'de, D>(deserializer: D) -> Result<String, D::Error>
where
    D: Deserializer<'de>,
{
    #[derive(Deserialize)]
    #[serde(untagged)]
    enum StringOrNumber {
        Text(String),
        Int(i64),
        Float(f64),
    }

    Ok(match StringOrNumber::deserialize(deserializer)? {
        StringOrNumber::Text(s) => s,
        StringOrNumber::Int(n) => n.to_string(),
        StringOrNumber::Float(n) => n.to_string(),
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn shipment_body() -> serde_json::Value {
        json!({
            "servicio": 96,
            "horario": "18",
            "destinatario": "Ana Ruiz",
            "direccion": "Calle Mayor 1",
            "pais": 34,
            "cp": "28001",
            "poblacion": "Madrid",
            "telefono": "600000000",
            "email": "ana@example.com",
            "bultos": 1,
            "idOrder": "408-1234567-1234567",
            "process": "manual",
            "shipmentType": "usingWS"
        })
    }

    #[test]
    fn test_shipment_data_defaults_and_numeric_codes() {
        let data: ShipmentData = serde_json::from_value(shipment_body()).unwrap();

        assert_eq!(data.servicio, "96");
        assert_eq!(data.pais, "34");
        assert_eq!(data.departamento, "");
        assert_eq!(data.ref_c, "");
        assert_eq!(data.mark_value(), 1);
        assert!(data.validate().is_ok());
    }

    #[test]
    fn test_null_mark_values_fall_back_to_defaults() {
        let mut body = shipment_body();
        body["value"] = json!(null);
        let data: ShipmentData = serde_json::from_value(body).unwrap();
        assert_eq!(data.mark_value(), 1);

        let mut body = shipment_body();
        body["value"] = json!(3);
        let data: ShipmentData = serde_json::from_value(body).unwrap();
        assert_eq!(data.mark_value(), 3);

        let req: DeleteShipment = serde_json::from_value(
            json!({"idOrder": "A", "shipmentType": "usingWS", "value": null}),
        )
        .unwrap();
        assert_eq!(req.reset_value(), 0);
    }

    #[test]
    fn test_shipment_data_rules() {
        let mut body = shipment_body();
        body["email"] = json!("not-an-email");
        let data: ShipmentData = serde_json::from_value(body).unwrap();
        assert!(matches!(data.validate(), Err(CoreError::ValidationError(_))));

        let mut body = shipment_body();
        body["cp"] = json!("280");
        let data: ShipmentData = serde_json::from_value(body).unwrap();
        assert!(data.validate().is_err());

        let mut body = shipment_body();
        body["bultos"] = json!(0);
        let data: ShipmentData = serde_json::from_value(body).unwrap();
        assert!(data.validate().is_err());
    }

    #[test]
    fn test_shipment_data_rejects_unknown_shipment_type() {
        let mut body = shipment_body();
        body["shipmentType"] = json!("usingPigeon");
        assert!(serde_json::from_value::<ShipmentData>(body).is_err());
    }

    #[test]
    fn test_flags_must_be_binary() {
        let ok: UpdateStockFlag =
            serde_json::from_value(json!({"withoutstock": 1, "idOrder": "A"})).unwrap();
        assert!(ok.validate().is_ok());

        let bad: UpdateFakeFlag =
            serde_json::from_value(json!({"isFake": 2, "idOrder": "A"})).unwrap();
        assert!(bad.validate().is_err());

        let empty_id: UpdateFakeFlag =
            serde_json::from_value(json!({"isFake": 0, "idOrder": ""})).unwrap();
        assert!(empty_id.validate().is_err());
    }

    #[test]
    fn test_register_requires_order_for_web_service() {
        let ws: RegisterShipment =
            serde_json::from_value(json!({"shipmentType": "usingWS"})).unwrap();
        assert!(ws.validate().is_err());

        let ws: RegisterShipment =
            serde_json::from_value(json!({"shipmentType": "usingWS", "idOrder": ""})).unwrap();
        assert!(ws.validate().is_err());

        let file: RegisterShipment =
            serde_json::from_value(json!({"shipmentType": "usingFile"})).unwrap();
        assert!(file.validate().is_ok());
    }

    #[test]
    fn test_delete_shipment_value_defaults_to_zero() {
        let req: DeleteShipment =
            serde_json::from_value(json!({"idOrder": "A", "shipmentType": "usingFile"})).unwrap();
        assert_eq!(req.reset_value(), 0);
    }

    #[test]
    fn test_login_lengths_count_characters() {
        let req = LoginRequest { username: "ñoñ".into(), password: "abcd".into() };
        assert!(req.validate().is_ok());

        let req = LoginRequest { username: "ab".into(), password: "abcd".into() };
        assert!(req.validate().is_err());
    }
}
