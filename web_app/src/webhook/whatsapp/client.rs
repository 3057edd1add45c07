//! # WhatsApp API Client
//!
//! Sends text messages through the WhatsApp Business Cloud API.

use super::outgoing_schemas::{OutgoingTextMessage, WhatsAppMessageResponse};
use crate::{config::AppConfig, services::MessagingService};
use anyhow::{Context, Result};
use async_trait::async_trait;
use std::sync::Arc;

/// WhatsApp API client for sending messages
#[derive(Clone)]
pub struct WhatsAppClient {
    /// HTTP client for making API requests
    client: reqwest::Client,
    /// Application config, the send endpoint depends on the sending number
    app_config: Arc<AppConfig>,
    /// Authentication token
    auth_token: String,
}

impl WhatsAppClient {
    /// Creates a new WhatsApp client
    pub fn new(client: reqwest::Client, app_config: Arc<AppConfig>) -> Self {
        Self {
            client,
            auth_token: app_config.whatsapp_business_auth.clone(),
            app_config,
        }
    }

    /// Internal method to send any message type to WhatsApp API
    async fn send_message<T: serde::Serialize>(
        &self,
        phone_number_id: &str,
        message: &T,
    ) -> Result<WhatsAppMessageResponse> {
        let response = self
            .client
            .post(self.app_config.whatsapp_send_msg_endpoint(phone_number_id))
            .bearer_auth(&self.auth_token)
            .header("Content-Type", "application/json")
            .json(message)
            .send()
            .await
            .context("Failed to send request to WhatsApp API")?;

        if !response.status().is_success() {
            let status = response.status();
            let body = response
                .text()
                .await
                .unwrap_or_else(|_| "Unable to read response body".to_string());

            anyhow::bail!("WhatsApp API returned error status {}: {}", status, body);
        }

        let whatsapp_response: WhatsAppMessageResponse = response
            .json()
            .await
            .context("Failed to parse WhatsApp API response")?;

        Ok(whatsapp_response)
    }
}

#[async_trait]
impl MessagingService for WhatsAppClient {
    async fn send_text_message(
        &self,
        phone_number_id: &str,
        to: &str,
        body: &str,
    ) -> Result<String> {
        let message = OutgoingTextMessage::new(to.to_string(), body.to_string());
        let response = self.send_message(phone_number_id, &message).await?;

        response
            .messages
            .into_iter()
            .next()
            .map(|sent| sent.id)
            .context("WhatsApp API response has no message id")
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::test_config;
    use ntex::web::{self, App, HttpRequest, HttpResponse, test};

    /// Graph API stand-in: the message id is the requested path
    async fn graph_api(req: HttpRequest) -> HttpResponse {
        let authorized = req
            .headers()
            .get("authorization")
            .and_then(|value| value.to_str().ok())
            == Some("Bearer wa-token");
        if !authorized {
            return HttpResponse::Unauthorized().body("bad token");
        }

        HttpResponse::Ok().json(&serde_json::json!({
            "messaging_product": "whatsapp",
            "contacts": [{"input": "5215550001", "wa_id": "5215550001"}],
            "messages": [{"id": req.path()}]
        }))
    }

    fn client_for(srv: &test::TestServer, auth_token: &str) -> WhatsAppClient {
        let mut app_config = test_config();
        app_config.whatsapp_graph_api_url = format!("http://{}/v22.0", srv.addr());
        app_config.whatsapp_business_auth = auth_token.into();

        WhatsAppClient::new(reqwest::Client::new(), Arc::new(app_config))
    }

    #[ntex::test]
    async fn test_send_text_message_uses_sending_number_endpoint() {
        let srv = test::server(|| App::new().default_service(web::route().to(graph_api)));
        let client = client_for(&srv, "wa-token");

        let id = client
            .send_text_message("tenant-b-number", "5215550001", "hola")
            .await
            .unwrap();

        assert_eq!(id, "/v22.0/tenant-b-number/messages");
    }

    #[ntex::test]
    async fn test_send_text_message_error_status_fails() {
        let srv = test::server(|| App::new().default_service(web::route().to(graph_api)));
        let client = client_for(&srv, "expired");

        let err = client
            .send_text_message("tenant-b-number", "5215550001", "hola")
            .await
            .unwrap_err();

        assert!(err.to_string().contains("401"));
    }
}
