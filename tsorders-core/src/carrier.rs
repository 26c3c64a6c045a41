use async_trait::async_trait;
use serde::{Deserialize, Deserializer, Serialize};
use serde_json::Value;
use tsorders_shared::Masked;

use crate::models::Row;
use crate::{CoreError, CoreResult};

/// Return code the carrier uses for an accepted shipment.
pub const CARRIER_OK: &str = "0";

/// Carrier account and sender details.
#[derive(Debug, Deserialize, Clone)]
pub struct CarrierConfig {
    pub uid_cliente: Masked<String>,
    pub save_ship_url: String,
    #[serde(default)]
    pub portes: String,
    #[serde(default)]
    pub reembolso: String,
    pub sender: SenderConfig,
    #[serde(default = "default_timeout")]
    pub timeout_seconds: u64,
    #[serde(default)]
    pub accept_invalid_certs: bool,
}

fn default_timeout() -> u64 {
    30
}

#[derive(Debug, Deserialize, Clone)]
pub struct SenderConfig {
    pub nombre: String,
    pub direccion: String,
    pub poblacion: String,
    pub pais: String,
    pub cp: String,
}

/// Shipment as returned by the carrier-export procedure.
#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CarrierShipment {
    #[serde(deserialize_with = "lenient_string")]
    pub id_order: String,
    #[serde(default, deserialize_with = "lenient_string")]
    pub servicio: String,
    #[serde(default, deserialize_with = "lenient_string")]
    pub horario: String,
    #[serde(default, deserialize_with = "lenient_number")]
    pub bultos: f64,
    #[serde(default, deserialize_with = "lenient_number")]
    pub peso: f64,
    #[serde(default, deserialize_with = "lenient_string")]
    pub destinatario: String,
    #[serde(default, deserialize_with = "lenient_string")]
    pub direccion: String,
    #[serde(default, deserialize_with = "lenient_string")]
    pub poblacion: String,
    #[serde(default, deserialize_with = "lenient_string")]
    pub pais: String,
    #[serde(default, deserialize_with = "lenient_string")]
    pub cp: String,
    #[serde(default, deserialize_with = "lenient_string")]
    pub telefono: String,
    #[serde(default, deserialize_with = "lenient_string")]
    pub movil: String,
    #[serde(default, deserialize_with = "lenient_string")]
    pub email: String,
    #[serde(default, deserialize_with = "lenient_string")]
    pub departamento: String,
    #[serde(default, deserialize_with = "lenient_string")]
    pub observaciones: String,
    #[serde(default, deserialize_with = "lenient_string")]
    pub ref_c: String,
}

impl CarrierShipment {
    pub fn from_row(row: &Row) -> CoreResult<Self> {
        serde_json::from_value(Value::Object(row.clone()))
            .map_err(|e| CoreError::CarrierError(format!("Malformed shipment row: {}", e)))
    }
}

/// Accepts strings, numbers and NULL; NULL becomes the empty string.
fn lenient_string<'de, D>(deserializer: D) -> Result<String, D::Error>
where
    D: Deserializer<'de>,
{
    Ok(match Value::deserialize(deserializer)? {
        Value::Null => String::new(),
        Value::String(s) => s,
        other => other.to_string(),
    })
}

/// Accepts numbers, numeric strings and NULL; NULL becomes zero.
fn lenient_number<'de, D>(deserializer: D) -> Result<f64, D::Error>
where
    D: Deserializer<'de>,
{
    match Value::deserialize(deserializer)? {
        Value::Null => Ok(0.0),
        Value::Number(n) => Ok(n.as_f64().unwrap_or_default()),
        Value::String(s) => s
            .trim()
            .replace(',', ".")
            .parse()
            .map_err(serde::de::Error::custom),
        other => Err(serde::de::Error::custom(format!("expected a number, got {}", other))),
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct CarrierReference {
    #[serde(rename = "type")]
    pub kind: String,
    pub value: String,
}

/// Outcome of a carrier registration, in the shape the front end consumes.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct CarrierResponse {
    #[serde(rename = "codResponseWS")]
    pub code: String,
    #[serde(rename = "responseWS")]
    pub response: String,
    #[serde(rename = "messageWS")]
    pub message: String,
    #[serde(rename = "idOrder")]
    pub id_order: String,
    #[serde(rename = "uidExp", skip_serializing_if = "Option::is_none")]
    pub uid_exp: Option<String>,
    #[serde(rename = "codBar", skip_serializing_if = "Option::is_none")]
    pub barcode: Option<String>,
    #[serde(rename = "exp", skip_serializing_if = "Option::is_none")]
    pub expedition: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub refs: Option<Vec<CarrierReference>>,
    #[serde(rename = "LabelBase64", skip_serializing_if = "Option::is_none")]
    pub label_base64: Option<String>,
}

impl CarrierResponse {
    pub fn failure(code: &str, response: &str, message: &str, id_order: &str) -> Self {
        Self {
            code: code.to_string(),
            response: response.to_string(),
            message: message.to_string(),
            id_order: id_order.to_string(),
            uid_exp: None,
            barcode: None,
            expedition: None,
            refs: None,
            label_base64: None,
        }
    }

    pub fn is_success(&self) -> bool {
        self.code == CARRIER_OK
    }

    /// Expedition identifiers to persist, present only on success.
    pub fn ack(&self) -> Option<CarrierAck> {
        if !self.is_success() {
            return None;
        }
        Some(CarrierAck {
            uid_exp: self.uid_exp.clone().unwrap_or_default(),
            expedition: self.expedition.clone().unwrap_or_default(),
            barcode: self.barcode.clone().unwrap_or_default(),
        })
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CarrierAck {
    pub uid_exp: String,
    pub expedition: String,
    pub barcode: String,
}

/// A parcel carrier that registers individual shipments.
///
/// Transport and protocol failures are reported inside the response, never as
/// an error, so the operator always sees the carrier's verdict.
#[async_trait]
pub trait CarrierGateway: Send + Sync {
    async fn request_shipment(&self, shipment: &CarrierShipment) -> CarrierResponse;
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_shipment_from_row_tolerates_types_and_nulls() {
        let row = json!({
            "idOrder": "A-1",
            "servicio": 96,
            "horario": 18,
            "bultos": 2,
            "peso": "1,5",
            "destinatario": "Ana Ruiz",
            "movil": null,
            "refC": "A-1"
        });
        let shipment = CarrierShipment::from_row(row.as_object().unwrap()).unwrap();

        assert_eq!(shipment.servicio, "96");
        assert_eq!(shipment.bultos, 2.0);
        assert_eq!(shipment.peso, 1.5);
        assert_eq!(shipment.movil, "");
        assert_eq!(shipment.ref_c, "A-1");
        assert_eq!(shipment.email, "");
    }

    #[test]
    fn test_shipment_from_row_requires_order_id() {
        let row = json!({"servicio": "96"});
        assert!(CarrierShipment::from_row(row.as_object().unwrap()).is_err());
    }

    #[test]
    fn test_failure_serializes_without_success_fields() {
        let response = CarrierResponse::failure("-70", "dup", "Error, El número de pedido ya existe", "A-1");
        let value = serde_json::to_value(&response).unwrap();

        assert_eq!(value["codResponseWS"], "-70");
        assert_eq!(value["idOrder"], "A-1");
        assert!(value.get("codBar").is_none());
        assert!(response.ack().is_none());
    }

    #[test]
    fn test_ack_only_on_success() {
        let mut response = CarrierResponse::failure(CARRIER_OK, "", "Envio insertado Ok", "A-1");
        response.expedition = Some("EXP1".into());
        response.barcode = Some("BAR1".into());

        let ack = response.ack().unwrap();
        assert_eq!(ack.expedition, "EXP1");
        assert_eq!(ack.uid_exp, "");
    }
}
