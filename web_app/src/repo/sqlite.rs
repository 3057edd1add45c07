use crate::{models, pagination};
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use sqlx::{FromRow, Row, SqlitePool, sqlite::SqliteRow};

use super::{AppRepo, ConversationFilter, sqlite_queries};

#[derive(Clone)]
pub struct SqlxSqliteRepo {
    pub db_pool: SqlitePool,
}

impl FromRow<'_, SqliteRow> for models::conversation::Conversation {
    fn from_row(row: &SqliteRow) -> sqlx::Result<Self> {
        let contact_name: Option<String> = row.try_get("contact_name")?;
        let contact_phone: Option<String> = row.try_get("contact_phone")?;

        Ok(Self {
            id: row.try_get("id")?,
            tenant_id: row.try_get("tenant_id")?,
            status: row.try_get("status")?,
            contact: contact_name
                .zip(contact_phone)
                .map(|(name, phone)| models::conversation::Contact { name, phone }),
            last_message_at: row.try_get("last_message_at")?,
            created_at: row.try_get("created_at")?,
            updated_at: row.try_get("updated_at")?,
        })
    }
}

fn cursor_parts(page: &pagination::PageRequest) -> (Option<DateTime<Utc>>, i64) {
    page.after
        .map(|cursor| (Some(cursor.timestamp), cursor.id))
        .unwrap_or((None, 0))
}

#[async_trait]
impl AppRepo for SqlxSqliteRepo {
    async fn get_tenant(&self, tenant_id: i64) -> anyhow::Result<Option<models::tenant::Tenant>> {
        Ok(
            sqlx::query_as::<_, models::tenant::Tenant>(sqlite_queries::QUERY_GET_TENANT)
                .bind(tenant_id)
                .fetch_optional(&self.db_pool)
                .await?,
        )
    }

    async fn get_tenant_by_phone_number_id(
        &self,
        phone_number_id: &str,
    ) -> anyhow::Result<Option<models::tenant::Tenant>> {
        Ok(sqlx::query_as::<_, models::tenant::Tenant>(
            sqlite_queries::QUERY_GET_TENANT_BY_PHONE_NUMBER_ID,
        )
        .bind(phone_number_id)
        .fetch_optional(&self.db_pool)
        .await?)
    }

    async fn get_conversation(
        &self,
        conversation_id: i64,
    ) -> anyhow::Result<Option<models::conversation::Conversation>> {
        Ok(sqlx::query_as::<_, models::conversation::Conversation>(
            sqlite_queries::QUERY_GET_CONVERSATION,
        )
        .bind(conversation_id)
        .fetch_optional(&self.db_pool)
        .await?)
    }

    async fn list_conversations(
        &self,
        filter: &ConversationFilter,
        page: &pagination::PageRequest,
    ) -> anyhow::Result<Vec<models::conversation::Conversation>> {
        let (after_updated_at, after_id) = cursor_parts(page);

        Ok(sqlx::query_as::<_, models::conversation::Conversation>(
            sqlite_queries::QUERY_LIST_CONVERSATIONS,
        )
        .bind(filter.tenant_id)
        .bind(filter.status)
        .bind(after_updated_at)
        .bind(after_id)
        .bind(page.fetch_limit())
        .fetch_all(&self.db_pool)
        .await?)
    }

    async fn get_conversation_messages(
        &self,
        conversation_id: i64,
        page: &pagination::PageRequest,
    ) -> anyhow::Result<Vec<models::message::Message>> {
        let (after_sent_at, after_id) = cursor_parts(page);

        Ok(sqlx::query_as::<_, models::message::Message>(
            sqlite_queries::QUERY_GET_CONVERSATION_MESSAGES,
        )
        .bind(conversation_id)
        .bind(after_sent_at)
        .bind(after_id)
        .bind(page.fetch_limit())
        .fetch_all(&self.db_pool)
        .await?)
    }

    async fn update_conversation_status(
        &self,
        conversation_id: i64,
        status: models::conversation::ConversationStatus,
    ) -> anyhow::Result<bool> {
        let result = sqlx::query(sqlite_queries::QUERY_UPDATE_CONVERSATION_STATUS)
            .bind(status)
            .bind(Utc::now())
            .bind(conversation_id)
            .execute(&self.db_pool)
            .await?;

        Ok(result.rows_affected() > 0)
    }

    async fn insert_inbound_message(
        &self,
        message: &models::message::NewInboundMessage,
    ) -> anyhow::Result<Option<models::message::Message>> {
        let now = Utc::now();
        let mut transaction = self.db_pool.begin().await?;

        let contact_id: i64 = sqlx::query_scalar(sqlite_queries::QUERY_UPSERT_CONTACT)
            .bind(message.tenant_id)
            .bind(&message.contact_name)
            .bind(&message.contact_phone)
            .bind(now)
            .fetch_one(&mut *transaction)
            .await?;

        let active_conversation_id: Option<i64> =
            sqlx::query_scalar(sqlite_queries::QUERY_GET_ACTIVE_CONTACT_CONVERSATION)
                .bind(message.tenant_id)
                .bind(contact_id)
                .fetch_optional(&mut *transaction)
                .await?;

        let conversation_id = match active_conversation_id {
            Some(id) => id,
            None => sqlx::query(sqlite_queries::QUERY_INSERT_CONVERSATION)
                .bind(message.tenant_id)
                .bind(contact_id)
                .bind(now)
                .execute(&mut *transaction)
                .await?
                .last_insert_rowid(),
        };

        let stored = sqlx::query_as::<_, models::message::Message>(
            sqlite_queries::QUERY_INSERT_INBOUND_MESSAGE,
        )
        .bind(conversation_id)
        .bind(models::message::MessageDirection::In)
        .bind(&message.contact_phone)
        .bind(&message.business_phone_number_id)
        .bind(&message.body)
        .bind(message.sent_at)
        .bind(now)
        .bind(&message.external_id)
        .fetch_optional(&mut *transaction)
        .await?;

        // Already delivered: dropping the transaction undoes the contact and
        // conversation writes above
        let Some(stored) = stored else {
            return Ok(None);
        };

        sqlx::query(sqlite_queries::QUERY_TOUCH_CONVERSATION_ACTIVITY)
            .bind(conversation_id)
            .bind(message.sent_at)
            .bind(now)
            .execute(&mut *transaction)
            .await?;

        transaction.commit().await?;

        Ok(Some(stored))
    }

    async fn insert_outbound_message(
        &self,
        message: &models::message::NewOutboundMessage,
    ) -> anyhow::Result<models::message::Message> {
        let now = Utc::now();
        let mut transaction = self.db_pool.begin().await?;

        let stored = sqlx::query_as::<_, models::message::Message>(
            sqlite_queries::QUERY_INSERT_MESSAGE,
        )
        .bind(message.conversation_id)
        .bind(models::message::MessageDirection::Out)
        .bind(&message.sender)
        .bind(&message.recipient)
        .bind(&message.body)
        .bind(message.sent_at)
        .bind(now)
        .bind(&message.external_id)
        .fetch_one(&mut *transaction)
        .await?;

        sqlx::query(sqlite_queries::QUERY_TOUCH_CONVERSATION_ACTIVITY)
            .bind(message.conversation_id)
            .bind(message.sent_at)
            .bind(now)
            .execute(&mut *transaction)
            .await?;

        transaction.commit().await?;

        Ok(stored)
    }
}
