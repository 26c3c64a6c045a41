use quick_xml::escape::escape;
use tsorders_core::carrier::{CarrierConfig, CarrierShipment};

const SOAP_NS: &str = "http://www.w3.org/2003/05/soap-envelope";
pub const GLS_NS: &str = "http://www.asmred.com/";

/// Renders a parcel count or weight without a trailing `.0`.
fn number(value: f64) -> String {
    if value.fract() == 0.0 {
        format!("{}", value as i64)
    } else {
        value.to_string()
    }
}

/// SOAP 1.2 `GrabaServicios` request for one shipment, dated `date` (`dd/mm/YYYY`).
pub fn build_envelope(config: &CarrierConfig, shipment: &CarrierShipment, date: &str) -> String {
    let sender = &config.sender;

    format!(
        r#"<?xml version="1.0" encoding="utf-8"?>
<soap12:Envelope xmlns:xsi="http://www.w3.org/2001/XMLSchema-instance" xmlns:xsd="http://www.w3.org/2001/XMLSchema" xmlns:soap12="{soap_ns}">
<soap12:Body>
<GrabaServicios xmlns="{gls_ns}">
<docIn>
<Servicios uidcliente="{uid}" xmlns="{gls_ns}">
<Envio>
<Fecha>{date}</Fecha>
<Servicio>{servicio}</Servicio>
<Horario>{horario}</Horario>
<Bultos>{bultos}</Bultos>
<Peso>{peso}</Peso>
<Portes>{portes}</Portes>
<Importes><Reembolso>{reembolso}</Reembolso></Importes>
<Remite>
<Nombre>{s_nombre}</Nombre>
<Direccion>{s_direccion}</Direccion>
<Poblacion>{s_poblacion}</Poblacion>
<Pais>{s_pais}</Pais>
<CP>{s_cp}</CP>
</Remite>
<Destinatario>
<Nombre>{destinatario}</Nombre>
<Direccion>{direccion}</Direccion>
<Poblacion>{poblacion}</Poblacion>
<Pais>{pais}</Pais>
<CP>{cp}</CP>
<Telefono>{telefono}</Telefono>
<Movil>{movil}</Movil>
<Email>{email}</Email>
<Departamento>{departamento}</Departamento>
<Observaciones>{observaciones}</Observaciones>
</Destinatario>
<Referencias><Referencia tipo="C">{ref_c}</Referencia></Referencias>
<DevuelveAdicionales><Etiqueta tipo="PDF"/></DevuelveAdicionales>
</Envio>
</Servicios>
</docIn>
</GrabaServicios>
</soap12:Body>
</soap12:Envelope>"#,
        soap_ns = SOAP_NS,
        gls_ns = GLS_NS,
        uid = escape(config.uid_cliente.expose().as_str()),
        date = escape(date),
        servicio = escape(&shipment.servicio),
        horario = escape(&shipment.horario),
        bultos = number(shipment.bultos),
        peso = number(shipment.peso),
        portes = escape(&config.portes),
        reembolso = escape(&config.reembolso),
        s_nombre = escape(&sender.nombre),
        s_direccion = escape(&sender.direccion),
        s_poblacion = escape(&sender.poblacion),
        s_pais = escape(&sender.pais),
        s_cp = escape(&sender.cp),
        destinatario = escape(&shipment.destinatario),
        direccion = escape(&shipment.direccion),
        poblacion = escape(&shipment.poblacion),
        pais = escape(&shipment.pais),
        cp = escape(&shipment.cp),
        telefono = escape(&shipment.telefono),
        movil = escape(&shipment.movil),
        email = escape(&shipment.email),
        departamento = escape(&shipment.departamento),
        observaciones = escape(&shipment.observaciones),
        ref_c = escape(&shipment.ref_c),
    )
}

#[cfg(test)]
pub(crate) mod tests {
    use super::*;
    use serde_json::json;
    use tsorders_core::carrier::SenderConfig;

    pub(crate) fn config(url: &str) -> CarrierConfig {
        CarrierConfig {
            uid_cliente: "6BAB7A53-3B6D-4D5A-9450-702D2FAC0B11".to_string().into(),
            save_ship_url: url.to_string(),
            portes: "P".to_string(),
            reembolso: "0".to_string(),
            sender: SenderConfig {
                nombre: "Toolstock".to_string(),
                direccion: "Calle Industria 4".to_string(),
                poblacion: "Madrid".to_string(),
                pais: "34".to_string(),
                cp: "28001".to_string(),
            },
            timeout_seconds: 5,
            accept_invalid_certs: false,
        }
    }

    pub(crate) fn shipment() -> CarrierShipment {
        let row = json!({
            "idOrder": "408-1111111-2222222",
            "servicio": "96",
            "horario": "18",
            "bultos": 1,
            "peso": "2,5",
            "destinatario": "Smith & Sons <Ltd>",
            "direccion": "Calle Mayor 1",
            "poblacion": "Madrid",
            "pais": "34",
            "cp": "28013",
            "telefono": "600000000",
            "email": "buyer@example.com",
            "refC": "408-1111111-2222222"
        });
        CarrierShipment::from_row(row.as_object().unwrap()).unwrap()
    }

    #[test]
    fn test_envelope_escapes_interpolated_values() {
        let xml = build_envelope(&config("http://localhost"), &shipment(), "05/02/2025");

        assert!(xml.contains("<Nombre>Smith &amp; Sons &lt;Ltd&gt;</Nombre>"));
        assert!(!xml.contains("Smith & Sons"));
    }

    #[test]
    fn test_envelope_carries_shipment_fields() {
        let xml = build_envelope(&config("http://localhost"), &shipment(), "05/02/2025");

        assert!(xml.contains(r#"uidcliente="6BAB7A53-3B6D-4D5A-9450-702D2FAC0B11""#));
        assert!(xml.contains("<Fecha>05/02/2025</Fecha>"));
        assert!(xml.contains("<Bultos>1</Bultos>"));
        assert!(xml.contains("<Peso>2.5</Peso>"));
        assert!(xml.contains(r#"<Referencia tipo="C">408-1111111-2222222</Referencia>"#));
        assert!(xml.contains("<Remite>\n<Nombre>Toolstock</Nombre>"));
        assert!(xml.contains(r#"<Etiqueta tipo="PDF"/>"#));
    }
}
