/// Operator-facing message for a GLS return code, if the code is known.
pub fn error_message(code: &str) -> Option<&'static str> {
    let message = match code {
        "+38" => "Error, Número de teléfono del destinatario no válido.",
        "36" => "Error, Código postal del destinatario, formato incorrecto.",
        "-1" => "Tiempo de espera expirado.",
        "-3" => "Error, El código de barras del envío ya existe.",
        "-33" => "Cp destino no existe o no es de esa plaza",
        "-48" => "Error, servicio EuroEstandar/EBP: El número de paquetes debe ser siempre 1.",
        "-49" => "Error, servicio EuroEstandar/EBP: El peso debe ser <= 31,5 kgs.",
        "-70" => "Error, El número de pedido ya existe",
        "-99" => "Advertencia, los servicios web están temporalmente fuera de servicio.",
        "-128" => "Error, Nombre del destinatario debe tener al menos tres caracteres.",
        "-129" => "Error, la dirección del destinatario debe tener al menos tres caracteres.",
        "-130" => "Error, La Ciudad del Destinatario debe tener al menos tres caracteres.",
        "-131" => "Error, Consignee Zipcode debe tener al menos cuatro caracteres.",
        _ => return None,
    };
    Some(message)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_known_and_unknown_codes() {
        assert_eq!(error_message("-70"), Some("Error, El número de pedido ya existe"));
        assert!(error_message("+38").is_some());
        assert!(error_message("38").is_none());
        assert!(error_message("-2").is_none());
    }
}
