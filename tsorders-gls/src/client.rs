use std::time::Duration;

use async_trait::async_trait;
use chrono::Local;
use tracing::{error, info};
use tsorders_core::carrier::{CarrierConfig, CarrierGateway, CarrierResponse, CarrierShipment};

use crate::envelope::build_envelope;
use crate::response::{failure, parse_response};

pub struct GlsClient {
    http: reqwest::Client,
    config: CarrierConfig,
}

impl GlsClient {
    pub fn new(config: CarrierConfig) -> Result<Self, reqwest::Error> {
        let http = reqwest::Client::builder()
            .timeout(Duration::from_secs(config.timeout_seconds))
            .danger_accept_invalid_certs(config.accept_invalid_certs)
            .build()?;

        Ok(Self { http, config })
    }

    async fn post(&self, body: String) -> Result<String, reqwest::Error> {
        let response = self
            .http
            .post(&self.config.save_ship_url)
            .header(reqwest::header::CONTENT_TYPE, "text/xml; charset=UTF-8")
            .body(body)
            .send()
            .await?;

        info!(status = %response.status(), "GLS web service answered");
        response.text().await
    }
}

#[async_trait]
impl CarrierGateway for GlsClient {
    async fn request_shipment(&self, shipment: &CarrierShipment) -> CarrierResponse {
        let date = Local::now().format("%d/%m/%Y").to_string();
        let envelope = build_envelope(&self.config, shipment, &date);

        match self.post(envelope).await {
            Ok(body) => parse_response(&body, &shipment.id_order),
            Err(e) => {
                error!(order_id = %shipment.id_order, error = %e, "Error in GLS request");
                failure(&e.to_string(), &shipment.id_order)
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::envelope::tests::{config, shipment};
    use crate::response::tests::accepted_body;
    use crate::response::REQUEST_FAILED;
    use wiremock::matchers::{body_string_contains, header, method, path};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    #[tokio::test]
    async fn test_posts_envelope_and_parses_answer() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/b2b.asmx"))
            .and(header("content-type", "text/xml; charset=UTF-8"))
            .and(body_string_contains("<GrabaServicios xmlns=\"http://www.asmred.com/\">"))
            .respond_with(ResponseTemplate::new(200).set_body_string(accepted_body()))
            .expect(1)
            .mount(&server)
            .await;

        let client = GlsClient::new(config(&format!("{}/b2b.asmx", server.uri()))).unwrap();
        let response = client.request_shipment(&shipment()).await;

        assert!(response.is_success());
        assert_eq!(response.id_order, "408-1111111-2222222");
        assert_eq!(response.expedition.as_deref(), Some("1234567"));
    }

    #[tokio::test]
    async fn test_error_status_body_is_still_parsed() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .respond_with(ResponseTemplate::new(500).set_body_string("<html>oops</html>"))
            .mount(&server)
            .await;

        let client = GlsClient::new(config(&server.uri())).unwrap();
        let response = client.request_shipment(&shipment()).await;

        assert_eq!(response.code, "-1");
        assert_eq!(response.response, "Respuesta XML inválida");
    }

    #[tokio::test]
    async fn test_unreachable_service_is_a_failure_response() {
        let client = GlsClient::new(config("http://127.0.0.1:9/b2b.asmx")).unwrap();
        let response = client.request_shipment(&shipment()).await;

        assert_eq!(response.code, "-1");
        assert_eq!(response.message, REQUEST_FAILED);
        assert!(!response.is_success());
    }
}
