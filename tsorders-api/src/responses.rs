//! The `{header, payload, message}` envelope every data endpoint answers with.

use axum::response::{IntoResponse, Response};
use axum::Json;
use serde::Serialize;
use serde_json::Value;
use tsorders_core::Row;

pub const ORDER_MISSING: &str = "El pedido no existe";
pub const ALREADY_SHIPPED: &str = "El pedido ya fue enviado";

#[derive(Debug, Default, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct EnvelopeHeader {
    pub status: &'static str,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub content: Option<u8>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub resource: Option<&'static str>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub count: Option<usize>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub inserted_rows: Option<u64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub updated_rows: Option<u64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub deleted_rows: Option<u64>,
}

#[derive(Debug, Serialize)]
pub struct Envelope {
    pub header: EnvelopeHeader,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub payload: Option<Value>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub message: Option<String>,
}

pub fn rows_value(rows: Vec<Row>) -> Value {
    Value::Array(rows.into_iter().map(Value::Object).collect())
}

impl Envelope {
    fn header() -> EnvelopeHeader {
        EnvelopeHeader { status: "ok", ..Default::default() }
    }

    pub fn success(payload: Value) -> Self {
        Self {
            header: EnvelopeHeader { content: Some(1), ..Self::header() },
            payload: Some(payload),
            message: None,
        }
    }

    /// Success for a named listing, with its row count in the header.
    pub fn listing(rows: Vec<Row>, resource: &'static str) -> Self {
        let mut envelope = Self::success(Value::Null);
        envelope.header.resource = Some(resource);
        envelope.header.count = Some(rows.len());
        envelope.payload = Some(rows_value(rows));
        envelope
    }

    pub fn empty(message: Option<&str>) -> Self {
        Self {
            header: EnvelopeHeader { content: Some(0), ..Self::header() },
            payload: Some(Value::Array(Vec::new())),
            message: message.map(str::to_owned),
        }
    }

    pub fn inserted(rows: u64, message: Option<&str>) -> Self {
        Self::mutation(
            EnvelopeHeader { inserted_rows: Some(rows), ..Self::header() },
            rows,
            message,
            "Registro insertado",
            "No se insertó el registro",
        )
    }

    pub fn updated(rows: u64) -> Self {
        Self::mutation(
            EnvelopeHeader { updated_rows: Some(rows), ..Self::header() },
            rows,
            None,
            "Registro actualizado",
            "No se actualizó el registro",
        )
    }

    pub fn deleted(rows: u64, message: Option<&str>) -> Self {
        Self::mutation(
            EnvelopeHeader { deleted_rows: Some(rows), ..Self::header() },
            rows,
            message,
            "Registro eliminado",
            "No se pudo eliminar el registro",
        )
    }

    /// An explicit `message` wins; otherwise the default depends on whether rows changed.
    fn mutation(
        header: EnvelopeHeader,
        rows: u64,
        message: Option<&str>,
        done: &str,
        not_done: &str,
    ) -> Self {
        let message = message.unwrap_or(if rows > 0 { done } else { not_done });
        Self {
            header,
            payload: None,
            message: Some(message.to_owned()),
        }
    }
}

impl IntoResponse for Envelope {
    fn into_response(self) -> Response {
        Json(self).into_response()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_empty_envelope_shape() {
        let value = serde_json::to_value(Envelope::empty(Some(ALREADY_SHIPPED))).unwrap();
        assert_eq!(
            value,
            json!({
                "header": {"status": "ok", "content": 0},
                "payload": [],
                "message": "El pedido ya fue enviado"
            })
        );
    }

    #[test]
    fn test_listing_reports_resource_and_count() {
        let row = json!({"amazonOrderId": "A"}).as_object().cloned().unwrap();
        let value = serde_json::to_value(Envelope::listing(vec![row], "orderspending")).unwrap();

        assert_eq!(value["header"]["resource"], "orderspending");
        assert_eq!(value["header"]["count"], 1);
        assert_eq!(value["header"]["content"], 1);
        assert!(value.get("message").is_none());
    }

    #[test]
    fn test_mutation_messages() {
        let inserted = serde_json::to_value(Envelope::inserted(1, None)).unwrap();
        assert_eq!(inserted, json!({"header": {"status": "ok", "insertedRows": 1}, "message": "Registro insertado"}));

        let not_updated = serde_json::to_value(Envelope::updated(0)).unwrap();
        assert_eq!(not_updated["header"]["updatedRows"], 0);
        assert_eq!(not_updated["message"], "No se actualizó el registro");

        let missing = serde_json::to_value(Envelope::deleted(0, Some(ORDER_MISSING))).unwrap();
        assert_eq!(missing["message"], "El pedido no existe");
        assert!(missing.get("payload").is_none());
    }
}
