//! # WhatsApp Webhook Schemas
//!
//! JSON payload sent by WhatsApp when a webhook event occurs (incoming
//! messages, delivery status updates). Only the fields the inbox stores are
//! modelled, unknown fields are ignored.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Root webhook payload from WhatsApp
#[derive(Debug, Deserialize, Serialize)]
pub struct WebhookPayload {
    /// The object type, typically "whatsapp_business_account"
    pub object: String,
    /// Array of entry objects containing the actual data
    pub entry: Vec<Entry>,
}

/// Entry object containing changes and metadata
#[derive(Debug, Deserialize, Serialize)]
pub struct Entry {
    /// Business Account ID
    pub id: String,
    /// Array of changes that occurred
    #[serde(default)]
    pub changes: Vec<Change>,
}

/// Change object containing the actual webhook data
#[derive(Debug, Deserialize, Serialize)]
pub struct Change {
    /// The field that changed (e.g., "messages", "account_update")
    pub field: String,
    /// Shape depends on `field`, only `messages` values are decoded
    pub value: serde_json::Value,
}

impl Change {
    /// Decodes the value of a `messages` change, other fields give `Ok(None)`
    pub fn messages_value(&self) -> Result<Option<MessagesValue>, serde_json::Error> {
        if self.field != "messages" {
            return Ok(None);
        }

        MessagesValue::deserialize(&self.value).map(Some)
    }
}

/// Value of a `messages` change: received messages, statuses and metadata
#[derive(Debug, Deserialize, Serialize)]
pub struct MessagesValue {
    /// Messaging product (e.g., "whatsapp")
    pub messaging_product: String,
    /// Metadata about the phone number
    pub metadata: Metadata,
    /// Array of contacts (senders)
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub contacts: Vec<Contact>,
    /// Array of messages received
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub messages: Vec<Message>,
    /// Array of statuses (for sent messages)
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub statuses: Vec<Status>,
}

impl MessagesValue {
    /// Profile name of the sender `wa_id`, if WhatsApp included it
    pub fn contact_name(&self, wa_id: &str) -> Option<&str> {
        self.contacts
            .iter()
            .find(|contact| contact.wa_id == wa_id)
            .map(|contact| contact.profile.name.as_str())
    }
}

/// Metadata about the WhatsApp Business phone number
#[derive(Debug, Deserialize, Serialize)]
pub struct Metadata {
    /// Display name of the business phone number
    pub display_phone_number: String,
    /// Phone number ID, identifies the tenant
    pub phone_number_id: String,
}

/// Contact information for the message sender
#[derive(Debug, Deserialize, Serialize)]
pub struct Contact {
    /// Profile information
    pub profile: Profile,
    /// WhatsApp ID (phone number)
    pub wa_id: String,
}

/// Profile information
#[derive(Debug, Deserialize, Serialize)]
pub struct Profile {
    /// Display name of the contact
    pub name: String,
}

/// Message object
#[derive(Debug, Deserialize, Serialize)]
pub struct Message {
    /// Sender's WhatsApp ID (phone number)
    pub from: String,
    /// Message ID
    pub id: String,
    /// Unix timestamp (seconds) of the message, as a string
    pub timestamp: String,
    /// Message type (text, image, video, document, etc.)
    #[serde(rename = "type")]
    pub msg_type: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub text: Option<TextMessage>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub image: Option<MediaMessage>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub video: Option<MediaMessage>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub document: Option<MediaMessage>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub audio: Option<MediaMessage>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub location: Option<LocationMessage>,
}

impl Message {
    /// Text shown in the inbox for this message.
    ///
    /// Media without caption and unsupported types are rendered as `[<type>]`.
    pub fn display_body(&self) -> String {
        let caption = [&self.image, &self.video, &self.document, &self.audio]
            .into_iter()
            .flatten()
            .find_map(|media| media.caption.clone());

        match (&self.text, &self.location) {
            (Some(text), _) => text.body.clone(),
            (None, Some(location)) => location.name.clone().unwrap_or_else(|| {
                format!("[location {}, {}]", location.latitude, location.longitude)
            }),
            (None, None) => caption.unwrap_or_else(|| format!("[{}]", self.msg_type)),
        }
    }

    /// Falls back to `now` when the provider timestamp is not a unix time
    pub fn sent_at(&self, now: DateTime<Utc>) -> DateTime<Utc> {
        self.timestamp
            .parse::<i64>()
            .ok()
            .and_then(|secs| DateTime::from_timestamp(secs, 0))
            .unwrap_or(now)
    }
}

/// Text message content
#[derive(Debug, Deserialize, Serialize)]
pub struct TextMessage {
    /// The text body of the message
    pub body: String,
}

/// Media message content (image, video, document, audio)
#[derive(Debug, Deserialize, Serialize)]
pub struct MediaMessage {
    /// Media ID
    pub id: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub mime_type: Option<String>,
    /// Caption (for image, video, document)
    #[serde(skip_serializing_if = "Option::is_none")]
    pub caption: Option<String>,
}

/// Location message content
#[derive(Debug, Deserialize, Serialize)]
pub struct LocationMessage {
    pub latitude: f64,
    pub longitude: f64,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
}

/// Status update for sent messages
#[derive(Debug, Deserialize, Serialize)]
pub struct Status {
    /// Message ID
    pub id: String,
    /// Status (sent, delivered, read, failed)
    pub status: String,
    /// Timestamp
    pub timestamp: String,
    /// Recipient ID
    pub recipient_id: String,
}
