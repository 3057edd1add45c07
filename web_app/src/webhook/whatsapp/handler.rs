//! # WhatsApp Webhook Handler
//!
//! Stores the messages of a verified webhook payload in the inbox of the
//! tenant owning the receiving phone number.

use super::schemas::{Message, MessagesValue, Status, WebhookPayload};
use crate::{metric, models, repo};
use anyhow::Result;
use chrono::Utc;

/// Decoded `messages` changes of the payload.
///
/// Other subscribed fields (template updates, account events) are skipped, and
/// so is a `messages` change whose value does not decode.
fn message_values(payload: &WebhookPayload) -> Vec<MessagesValue> {
    payload
        .entry
        .iter()
        .flat_map(|entry| &entry.changes)
        .filter_map(|change| match change.messages_value() {
            Ok(value) => value,
            Err(e) => {
                logfire::warn!(
                    "Skipping undecodable {field} change: {error}",
                    field = change.field.clone(),
                    error = e.to_string()
                );
                metric::incr_webhook_statds("malformed_change");
                None
            }
        })
        .collect()
}

/// Extracts the delivery statuses from the decoded changes
pub fn process_webhook_statuses(values: &[MessagesValue]) -> Vec<&Status> {
    values
        .iter()
        .flat_map(|value| &value.statuses)
        .collect::<Vec<_>>()
}

/// Builds the row stored for an incoming message
fn build_inbound_message(
    tenant_id: i64,
    value: &MessagesValue,
    message: &Message,
) -> models::message::NewInboundMessage {
    let contact_name = value
        .contact_name(&message.from)
        .unwrap_or(&message.from)
        .to_string();

    models::message::NewInboundMessage {
        tenant_id,
        contact_name,
        contact_phone: message.from.clone(),
        business_phone_number_id: value.metadata.phone_number_id.clone(),
        body: message.display_body(),
        sent_at: message.sent_at(Utc::now()),
        external_id: message.id.clone(),
    }
}

/// Stores the messages of one change; returns how many were new
async fn ingest_change(value: &MessagesValue, repo: &repo::ImplAppRepo) -> Result<usize> {
    if value.messages.is_empty() {
        return Ok(0);
    }

    let phone_number_id = &value.metadata.phone_number_id;
    let Some(tenant) = repo.get_tenant_by_phone_number_id(phone_number_id).await? else {
        logfire::warn!(
            "No tenant owns phone number id {phone_number_id}, skipping messages",
            phone_number_id = phone_number_id.to_string()
        );
        metric::incr_webhook_statds("unknown_tenant");
        return Ok(0);
    };

    let mut stored = 0;
    for message in &value.messages {
        let inbound = build_inbound_message(tenant.id, value, message);

        match repo.insert_inbound_message(&inbound).await {
            Ok(Some(_)) => {
                stored += 1;
                metric::incr_message_statds("in");
            }
            Ok(None) => {
                logfire::info!(
                    "Duplicate webhook message {id} ignored",
                    id = message.id.clone()
                );
                metric::incr_webhook_statds("duplicate");
            }
            Err(e) => {
                logfire::error!(
                    "Failed to store message {id}: {error}",
                    id = message.id.clone(),
                    error = e.to_string()
                );
            }
        }
    }

    Ok(stored)
}

/// Handles status updates for sent messages
///
/// Delivery receipts are only traced, the inbox does not track them.
pub fn handle_message_status(status: &Status) {
    logfire::info!(
        "Message {id} to {recipient} is {status}",
        id = status.id.clone(),
        recipient = status.recipient_id.clone(),
        status = status.status.clone()
    );
}

/// Main webhook processor
///
/// Processes the complete webhook payload, handling both messages and statuses.
/// A failing change is logged and does not stop the remaining ones.
///
/// # Returns
///
/// Number of newly stored messages
pub async fn process_webhook(payload: &WebhookPayload, repo: &repo::ImplAppRepo) -> usize {
    let values = message_values(payload);
    let mut stored = 0;

    for value in &values {
        match ingest_change(value, repo).await {
            Ok(count) => stored += count,
            Err(e) => {
                logfire::error!("Failed to handle change: {error}", error = e.to_string());
            }
        }
    }

    for status in process_webhook_statuses(&values) {
        handle_message_status(status);
    }

    stored
}
