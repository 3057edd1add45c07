use chrono::{DateTime, Utc};
use derive_more::Display;
use serde::{Deserialize, Serialize};

#[derive(Debug, Display, Clone, Copy, Deserialize, Serialize, PartialEq, Eq, sqlx::Type)]
#[sqlx(type_name = "TEXT", rename_all = "UPPERCASE")]
#[serde(rename_all = "UPPERCASE")]
pub enum MessageDirection {
    #[display("IN")]
    In,
    #[display("OUT")]
    Out,
}

#[derive(Debug, Clone, Serialize, sqlx::FromRow)]
pub struct Message {
    pub id: i64,
    pub conversation_id: i64,
    pub direction: MessageDirection,
    #[serde(rename = "from")]
    pub sender: String,
    #[serde(rename = "to")]
    pub recipient: String,
    pub body: String,
    #[serde(rename = "timestamp")]
    pub sent_at: DateTime<Utc>,
    pub created_at: DateTime<Utc>,
    pub external_id: Option<String>,
}

/// Message sent by an agent to the contact of `conversation_id`
#[derive(Debug, Clone, PartialEq)]
pub struct NewOutboundMessage {
    pub conversation_id: i64,
    pub sender: String,
    pub recipient: String,
    pub body: String,
    pub sent_at: DateTime<Utc>,
    pub external_id: Option<String>,
}

/// Message received from a contact, not yet attached to a conversation
#[derive(Debug, Clone, PartialEq)]
pub struct NewInboundMessage {
    pub tenant_id: i64,
    pub contact_name: String,
    pub contact_phone: String,
    /// Phone number id of the tenant the message was sent to
    pub business_phone_number_id: String,
    pub body: String,
    pub sent_at: DateTime<Utc>,
    pub external_id: String,
}
