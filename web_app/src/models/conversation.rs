use chrono::{DateTime, Utc};
use derive_more::{Display, Error};
use serde::{Deserialize, Serialize};
use std::str::FromStr;

/// Status of a conversation.
///
/// Every status is reachable from every other one, updates only check that
/// the literal is one of the three variants.
#[derive(
    Debug, Display, Clone, Copy, Default, Deserialize, Serialize, PartialEq, Eq, sqlx::Type,
)]
#[sqlx(type_name = "TEXT", rename_all = "UPPERCASE")]
#[serde(rename_all = "UPPERCASE")]
pub enum ConversationStatus {
    #[default]
    #[display("OPEN")]
    Open,
    #[display("PENDING")]
    Pending,
    #[display("CLOSED")]
    Closed,
}

impl ConversationStatus {
    pub const ALL: [ConversationStatus; 3] = [
        ConversationStatus::Open,
        ConversationStatus::Pending,
        ConversationStatus::Closed,
    ];
}

#[derive(Debug, Display, Error, PartialEq)]
#[display("unknown conversation status: {_0}")]
pub struct UnknownStatus(#[error(not(source))] pub String);

impl FromStr for ConversationStatus {
    type Err = UnknownStatus;

    /// Case-sensitive: `"open"` is not a status
    fn from_str(value: &str) -> Result<Self, Self::Err> {
        Self::ALL
            .into_iter()
            .find(|status| status.to_string() == value)
            .ok_or_else(|| UnknownStatus(value.to_string()))
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Contact {
    pub name: String,
    pub phone: String,
}

#[derive(Debug, Clone, Serialize)]
pub struct Conversation {
    pub id: i64,
    pub tenant_id: i64,
    pub status: ConversationStatus,
    pub contact: Option<Contact>,
    pub last_message_at: Option<DateTime<Utc>>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}
