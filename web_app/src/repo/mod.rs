pub mod sqlite;
pub mod sqlite_queries;

use crate::{models, pagination};
use async_trait::async_trait;

/// Filters accepted when listing conversations
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ConversationFilter {
    pub tenant_id: Option<i64>,
    pub status: Option<models::conversation::ConversationStatus>,
}

#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait AppRepo {
    async fn get_tenant(&self, tenant_id: i64) -> anyhow::Result<Option<models::tenant::Tenant>>;

    async fn get_tenant_by_phone_number_id(
        &self,
        phone_number_id: &str,
    ) -> anyhow::Result<Option<models::tenant::Tenant>>;

    async fn get_conversation(
        &self,
        conversation_id: i64,
    ) -> anyhow::Result<Option<models::conversation::Conversation>>;

    /// Conversations by most recent activity, resuming after `page.after`
    async fn list_conversations(
        &self,
        filter: &ConversationFilter,
        page: &pagination::PageRequest,
    ) -> anyhow::Result<Vec<models::conversation::Conversation>>;

    /// Messages in chronological order, resuming after `page.after`
    async fn get_conversation_messages(
        &self,
        conversation_id: i64,
        page: &pagination::PageRequest,
    ) -> anyhow::Result<Vec<models::message::Message>>;

    /// Returns `false` when no conversation has the given id
    async fn update_conversation_status(
        &self,
        conversation_id: i64,
        status: models::conversation::ConversationStatus,
    ) -> anyhow::Result<bool>;

    /// Stores a message received from a contact in the contact's active
    /// conversation, opening one if needed.
    ///
    /// Returns `None` when a message with the same external id already exists.
    async fn insert_inbound_message(
        &self,
        message: &models::message::NewInboundMessage,
    ) -> anyhow::Result<Option<models::message::Message>>;

    async fn insert_outbound_message(
        &self,
        message: &models::message::NewOutboundMessage,
    ) -> anyhow::Result<models::message::Message>;
}

pub type ImplAppRepo = Box<dyn AppRepo>;
