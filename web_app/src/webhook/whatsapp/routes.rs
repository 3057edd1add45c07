//! WhatsApp webhook endpoint handlers
//!
//! This module handles incoming webhook requests from WhatsApp Business API.
//! It implements both the verification endpoint (GET) and the webhook receiver (POST).
//!
//! # Security
//!
//! The POST endpoint verifies the `X-Hub-Signature-256` HMAC over the raw body
//! before the payload is parsed. Unsigned or tampered requests are rejected
//! with 401 and their content is never read.

use super::{handler, schemas, security};
use crate::{
    consts,
    front::{AppState, errors},
    metric,
};
use ntex::{util::Bytes, web};
use serde::Deserialize;

/// Query parameters for webhook verification
#[derive(Debug, Deserialize)]
pub struct VerifyQuery {
    /// The mode parameter, should be "subscribe"
    #[serde(rename = "hub.mode")]
    pub mode: String,
    /// The verification token from WhatsApp
    #[serde(rename = "hub.verify_token")]
    pub verify_token: String,
    /// The challenge string to echo back
    #[serde(rename = "hub.challenge")]
    pub challenge: String,
}

/// Webhook verification endpoint (GET)
///
/// WhatsApp sends a GET request to verify the webhook URL.
/// This endpoint validates the verify token and returns the challenge.
///
/// # Returns
/// - 200 with challenge string if verification succeeds
/// - 401 if verification fails
#[web::get("")]
pub async fn verify(
    query: web::types::Query<VerifyQuery>,
    app_state: web::types::State<AppState>,
) -> Result<impl web::Responder, web::Error> {
    if query.mode != "subscribe" {
        return Err(errors::UserError::Unauthorized.into());
    }

    if query.verify_token != app_state.config.whatsapp_verify_token {
        logfire::warn!("Webhook subscription attempted with an invalid verify token");
        return Err(errors::UserError::Unauthorized.into());
    }

    Ok(web::HttpResponse::Ok()
        .content_type("text/plain")
        .body(query.challenge.clone()))
}

/// Webhook receiver endpoint (POST)
///
/// Receives webhook events from WhatsApp Business API.
/// The body is taken as raw bytes so the signature is checked over exactly
/// what Meta signed.
///
/// # Processing
///
/// Process webhook synchronously.
/// WhatsApp gives us 20 seconds to respond, which should be sufficient.
#[web::post("")]
pub async fn receive(
    req: web::HttpRequest,
    body: Bytes,
    app_state: web::types::State<AppState>,
) -> Result<impl web::Responder, web::Error> {
    let _span = logfire::span!("whatsapp_webhook").entered();

    let signature_header = req
        .headers()
        .get(consts::SIGNATURE_HEADER)
        .and_then(|value| value.to_str().ok());

    if let Err(e) = security::verify_signature(
        signature_header,
        &body,
        &app_state.config.whatsapp_app_secret,
    ) {
        logfire::warn!(
            "Webhook signature rejected: {error}",
            error = e.to_string()
        );
        metric::incr_webhook_statds("rejected");
        return Err(errors::UserError::Unauthorized.into());
    }

    let payload: schemas::WebhookPayload = serde_json::from_slice(&body).map_err(|e| {
        logfire::error!(
            "Failed to parse webhook payload: {error}",
            error = e.to_string()
        );
        errors::UserError::MalformedBody(e.to_string())
    })?;

    let stored = handler::process_webhook(&payload, &app_state.repo).await;
    logfire::debug!("Webhook stored {stored} messages", stored = stored as i64);
    metric::incr_webhook_statds("accepted");

    Ok(web::HttpResponse::Ok().json(&serde_json::json!({"status": "received"})))
}
