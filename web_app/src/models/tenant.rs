use chrono::{DateTime, Utc};
use serde::Serialize;

/// A business using the inbox, owner of one WhatsApp Business number
#[derive(Debug, Clone, Serialize, sqlx::FromRow)]
pub struct Tenant {
    pub id: i64,
    pub name: String,
    pub whatsapp_phone_number_id: String,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}
