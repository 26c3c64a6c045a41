//! Reading of `GrabaServicios` responses.
//!
//! The answer is small, so it is loaded into a minimal element tree and
//! searched by local name, ignoring namespace prefixes.

use quick_xml::events::{BytesStart, Event};
use quick_xml::Reader;
use tsorders_core::carrier::{CarrierReference, CarrierResponse, CARRIER_OK};

use crate::errors::error_message;

/// `messageWS` for requests that never produced a carrier verdict.
pub const REQUEST_FAILED: &str = "Error en solicitud GLS";
pub const SHIPMENT_OK: &str = "Envio insertado Ok";
const UNKNOWN_ERROR: &str = "Error desconocido";

#[derive(Debug, Default)]
struct Element {
    name: String,
    attributes: Vec<(String, String)>,
    text: String,
    children: Vec<Element>,
}

impl Element {
    fn from_start(start: &BytesStart<'_>) -> Result<Self, String> {
        let name = String::from_utf8_lossy(start.local_name().as_ref()).into_owned();
        let mut attributes = Vec::new();
        for attr in start.attributes() {
            let attr = attr.map_err(|e| e.to_string())?;
            let key = String::from_utf8_lossy(attr.key.local_name().as_ref()).into_owned();
            let value = attr.unescape_value().map_err(|e| e.to_string())?.into_owned();
            attributes.push((key, value));
        }
        Ok(Self { name, attributes, ..Default::default() })
    }

    fn attribute(&self, key: &str) -> Option<&str> {
        self.attributes
            .iter()
            .find(|(k, _)| k == key)
            .map(|(_, v)| v.as_str())
    }

    /// First descendant with the given local name, depth first.
    fn find(&self, name: &str) -> Option<&Element> {
        self.children.iter().find_map(|child| {
            if child.name == name {
                Some(child)
            } else {
                child.find(name)
            }
        })
    }

    /// Every `child` element directly under any descendant named `parent`.
    fn find_all<'a>(&'a self, parent: &str, child: &str, found: &mut Vec<&'a Element>) {
        for element in &self.children {
            if element.name == parent {
                found.extend(element.children.iter().filter(|c| c.name == child));
            }
            element.find_all(parent, child, found);
        }
    }
}

fn parse_tree(xml: &str) -> Result<Element, String> {
    let mut reader = Reader::from_str(xml);
    reader.config_mut().trim_text(true);

    // synthetic document node so the root element is searchable too
    let mut stack = vec![Element::default()];
    loop {
        match reader.read_event().map_err(|e| e.to_string())? {
            Event::Start(start) => stack.push(Element::from_start(&start)?),
            Event::Empty(start) => {
                let element = Element::from_start(&start)?;
                if let Some(parent) = stack.last_mut() {
                    parent.children.push(element);
                }
            }
            Event::Text(text) => {
                let text = text.unescape().map_err(|e| e.to_string())?;
                if let Some(current) = stack.last_mut() {
                    current.text.push_str(&text);
                }
            }
            Event::CData(data) => {
                if let Some(current) = stack.last_mut() {
                    current.text.push_str(&String::from_utf8_lossy(&data.into_inner()));
                }
            }
            Event::End(_) => {
                let element = stack.pop().ok_or("unbalanced end tag")?;
                match stack.last_mut() {
                    Some(parent) => parent.children.push(element),
                    None => return Err("unbalanced end tag".to_string()),
                }
            }
            Event::Eof => break,
            _ => {}
        }
    }

    match stack.pop() {
        Some(document) if stack.is_empty() && !document.children.is_empty() => Ok(document),
        Some(_) if !stack.is_empty() => Err("unclosed element at end of document".to_string()),
        _ => Err("no element found".to_string()),
    }
}

/// Turns the raw SOAP answer into the response the front end consumes.
///
/// Never fails: malformed or incomplete documents become a `-1` failure.
pub fn parse_response(xml: &str, order_id: &str) -> CarrierResponse {
    let document = match parse_tree(xml) {
        Ok(document) => document,
        Err(e) => {
            tracing::error!(order_id, error = %e, "Error parsing GLS response");
            return failure(&format!("Error parseando respuesta: {}", e), order_id);
        }
    };

    let Some(result) = document.find("GrabaServiciosResult") else {
        return failure("Respuesta XML inválida", order_id);
    };
    let Some(envio) = result.find("Envio") else {
        return failure("Nodo Envio no encontrado", order_id);
    };
    let Some(resultado) = envio.find("Resultado") else {
        return failure("Nodo Resultado no encontrado", order_id);
    };

    let code = resultado.attribute("return").unwrap_or("-1");
    if code != CARRIER_OK {
        let reason = envio
            .find("Errores")
            .and_then(|errors| errors.children.iter().find(|e| e.name == "Error"))
            .map(|e| e.text.as_str())
            .unwrap_or(UNKNOWN_ERROR);
        let message = error_message(code).unwrap_or(reason);
        return CarrierResponse::failure(code, reason, message, order_id);
    }

    let mut references = Vec::new();
    envio.find_all("Referencias", "Referencia", &mut references);
    let refs = references
        .into_iter()
        .map(|r| CarrierReference {
            kind: r.attribute("tipo").unwrap_or_default().to_string(),
            value: r.text.clone(),
        })
        .collect();

    let mut labels = Vec::new();
    envio.find_all("Etiquetas", "Etiqueta", &mut labels);
    let label = labels.first().map(|l| l.text.clone()).unwrap_or_default();

    let owned = |key: &str| Some(envio.attribute(key).unwrap_or_default().to_string());
    CarrierResponse {
        uid_exp: owned("uid"),
        barcode: owned("codbarras"),
        expedition: owned("codexp"),
        refs: Some(refs),
        label_base64: Some(label),
        ..CarrierResponse::failure(CARRIER_OK, "", SHIPMENT_OK, order_id)
    }
}

/// `-1` response for transport and document-level failures.
pub fn failure(reason: &str, order_id: &str) -> CarrierResponse {
    CarrierResponse::failure("-1", reason, REQUEST_FAILED, order_id)
}
