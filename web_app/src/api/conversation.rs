//! # Conversation API Module
//!
//! Reading, listing and updating conversations, and sending agent replies.

use crate::{
    metric, models,
    pagination::{Cursor, Page, PageRequest},
    repo, services,
};
use anyhow::Context;
use chrono::Utc;
use serde::Serialize;

/// A conversation with one page of its messages
#[derive(Debug, Serialize)]
pub struct ConversationDetail {
    #[serde(flatten)]
    pub conversation: models::conversation::Conversation,
    pub messages: Vec<models::message::Message>,
    pub next_cursor: Option<String>,
}

/// Result of sending a reply to a conversation
#[derive(Debug)]
pub enum SendMessageOutcome {
    Sent(models::message::Message),
    ConversationNotFound,
    /// The conversation has no contact to deliver to
    MissingContact,
    /// The messaging provider refused or could not be reached
    ProviderFailed(String),
}

/// Retrieves a conversation and the page of messages after `page.after`.
///
/// # Returns
/// * `None` if no conversation has the given id
pub async fn get_conversation_detail(
    conversation_id: i64,
    page: &PageRequest,
    repo: &repo::ImplAppRepo,
) -> anyhow::Result<Option<ConversationDetail>> {
    let Some(conversation) = repo.get_conversation(conversation_id).await? else {
        return Ok(None);
    };

    let rows = repo.get_conversation_messages(conversation_id, page).await?;
    let messages = Page::from_rows(rows, page, |message| {
        Cursor::new(message.sent_at, message.id)
    });

    Ok(Some(ConversationDetail {
        conversation,
        messages: messages.items,
        next_cursor: messages.next_cursor,
    }))
}

/// Lists conversations, most recently updated first
pub async fn list_conversations(
    filter: &repo::ConversationFilter,
    page: &PageRequest,
    repo: &repo::ImplAppRepo,
) -> anyhow::Result<Page<models::conversation::Conversation>> {
    let rows = repo.list_conversations(filter, page).await?;

    Ok(Page::from_rows(rows, page, |conversation| {
        Cursor::new(conversation.updated_at, conversation.id)
    }))
}

/// Sets the status of a conversation.
///
/// Any status can follow any other one, and setting the current status again
/// succeeds. Concurrent updates are last-writer-wins.
///
/// # Returns
/// * `None` if no conversation has the given id, nothing is written then
#[tracing::instrument(skip(repo))]
pub async fn update_status(
    conversation_id: i64,
    status: models::conversation::ConversationStatus,
    repo: &repo::ImplAppRepo,
) -> anyhow::Result<Option<models::conversation::Conversation>> {
    if !repo
        .update_conversation_status(conversation_id, status)
        .await?
    {
        return Ok(None);
    }

    metric::incr_conversation_status_statds(&status.to_string());
    repo.get_conversation(conversation_id).await
}

/// Delivers `text` to the conversation's contact and stores it as an
/// outbound message.
///
/// The message goes out from the number of the tenant owning the
/// conversation. It is stored only once the provider accepted it, its
/// provider id becomes the external id.
#[tracing::instrument(skip(text, repo, messaging_service))]
pub async fn send_message(
    conversation_id: i64,
    text: String,
    repo: &repo::ImplAppRepo,
    messaging_service: &services::ImplMessagingService,
) -> anyhow::Result<SendMessageOutcome> {
    let Some(conversation) = repo.get_conversation(conversation_id).await? else {
        return Ok(SendMessageOutcome::ConversationNotFound);
    };
    let Some(contact) = conversation.contact else {
        return Ok(SendMessageOutcome::MissingContact);
    };
    let tenant = repo
        .get_tenant(conversation.tenant_id)
        .await?
        .with_context(|| format!("tenant {} not found", conversation.tenant_id))?;

    let external_id = match messaging_service
        .send_text_message(&tenant.whatsapp_phone_number_id, &contact.phone, &text)
        .await
    {
        Ok(external_id) => external_id,
        Err(e) => return Ok(SendMessageOutcome::ProviderFailed(e.to_string())),
    };

    let message = repo
        .insert_outbound_message(&models::message::NewOutboundMessage {
            conversation_id,
            sender: tenant.whatsapp_phone_number_id,
            recipient: contact.phone,
            body: text,
            sent_at: Utc::now(),
            external_id: Some(external_id),
        })
        .await?;
    metric::incr_message_statds("out");

    Ok(SendMessageOutcome::Sent(message))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{
        models::{
            conversation::{Contact, Conversation, ConversationStatus},
            message::{Message, MessageDirection},
            tenant::Tenant,
        },
        repo::{AppRepo, MockAppRepo},
        services::{MessagingService, MockMessagingService},
    };
    use mockall::predicate::*;

    fn create_test_conversation(id: i64, contact: Option<Contact>) -> Conversation {
        Conversation {
            id,
            tenant_id: 1,
            status: ConversationStatus::Open,
            contact,
            last_message_at: None,
            created_at: Utc::now(),
            updated_at: Utc::now(),
        }
    }

    fn create_test_message(id: i64, conversation_id: i64) -> Message {
        Message {
            id,
            conversation_id,
            direction: MessageDirection::In,
            sender: "5215550001".into(),
            recipient: "15550000000".into(),
            body: format!("message {id}"),
            sent_at: Utc::now(),
            created_at: Utc::now(),
            external_id: Some(format!("wamid.{id}")),
        }
    }

    fn create_test_tenant(id: i64, phone_number_id: &str) -> Tenant {
        Tenant {
            id,
            name: format!("tenant {id}"),
            whatsapp_phone_number_id: phone_number_id.into(),
            created_at: Utc::now(),
            updated_at: Utc::now(),
        }
    }

    fn ana() -> Option<Contact> {
        Some(Contact {
            name: "Ana".into(),
            phone: "5215550001".into(),
        })
    }

    #[ntex::test]
    async fn test_update_status_unknown_conversation() {
        let mut mock_repo = MockAppRepo::new();
        mock_repo
            .expect_update_conversation_status()
            .with(eq(999), eq(ConversationStatus::Closed))
            .times(1)
            .returning(|_, _| Ok(false));
        mock_repo.expect_get_conversation().never();
        let mock_repo: Box<dyn AppRepo> = Box::new(mock_repo);

        let result = update_status(999, ConversationStatus::Closed, &mock_repo).await;

        assert!(result.is_ok_and(|c| c.is_none()));
    }

    #[ntex::test]
    async fn test_update_status_returns_updated_conversation() {
        let mut mock_repo = MockAppRepo::new();
        mock_repo
            .expect_update_conversation_status()
            .with(eq(42), eq(ConversationStatus::Pending))
            .times(1)
            .returning(|_, _| Ok(true));
        mock_repo
            .expect_get_conversation()
            .with(eq(42))
            .times(1)
            .returning(|id| {
                let mut conversation = create_test_conversation(id, None);
                conversation.status = ConversationStatus::Pending;
                Ok(Some(conversation))
            });
        let mock_repo: Box<dyn AppRepo> = Box::new(mock_repo);

        let result = update_status(42, ConversationStatus::Pending, &mock_repo)
            .await
            .unwrap();

        assert_eq!(result.map(|c| c.status), Some(ConversationStatus::Pending));
    }

    #[ntex::test]
    async fn test_update_status_propagates_persistence_error() {
        let mut mock_repo = MockAppRepo::new();
        mock_repo
            .expect_update_conversation_status()
            .returning(|_, _| Err(anyhow::anyhow!("database is locked")));
        let mock_repo: Box<dyn AppRepo> = Box::new(mock_repo);

        assert!(
            update_status(1, ConversationStatus::Open, &mock_repo)
                .await
                .is_err()
        );
    }

    #[ntex::test]
    async fn test_get_conversation_detail_sets_next_cursor() {
        let page = PageRequest {
            after: None,
            limit: 2,
        };
        let mut mock_repo = MockAppRepo::new();
        mock_repo
            .expect_get_conversation()
            .returning(|id| Ok(Some(create_test_conversation(id, ana()))));
        mock_repo
            .expect_get_conversation_messages()
            .withf(|id, page| *id == 7 && page.fetch_limit() == 3)
            .returning(|id, _| Ok((1..=3).map(|m| create_test_message(m, id)).collect()));
        let mock_repo: Box<dyn AppRepo> = Box::new(mock_repo);

        let detail = get_conversation_detail(7, &page, &mock_repo)
            .await
            .unwrap()
            .unwrap();

        assert_eq!(
            detail.messages.iter().map(|m| m.id).collect::<Vec<_>>(),
            vec![1, 2]
        );
        let next = Cursor::decode(&detail.next_cursor.unwrap()).unwrap();
        assert_eq!(next.id, 2);
    }

    #[ntex::test]
    async fn test_get_conversation_detail_unknown_conversation() {
        let mut mock_repo = MockAppRepo::new();
        mock_repo.expect_get_conversation().returning(|_| Ok(None));
        mock_repo.expect_get_conversation_messages().never();
        let mock_repo: Box<dyn AppRepo> = Box::new(mock_repo);

        let detail = get_conversation_detail(999, &PageRequest::default(), &mock_repo).await;

        assert!(detail.is_ok_and(|d| d.is_none()));
    }

    #[ntex::test]
    async fn test_send_message_goes_out_from_tenant_number() {
        let mut mock_repo = MockAppRepo::new();
        mock_repo.expect_get_conversation().returning(|id| {
            let mut conversation = create_test_conversation(id, ana());
            conversation.tenant_id = 2;
            Ok(Some(conversation))
        });
        mock_repo
            .expect_get_tenant()
            .with(eq(2))
            .times(1)
            .returning(|id| Ok(Some(create_test_tenant(id, "tenant-b-number"))));
        mock_repo
            .expect_insert_outbound_message()
            .withf(|m| {
                m.conversation_id == 3
                    && m.recipient == "5215550001"
                    && m.sender == "tenant-b-number"
                    && m.external_id.as_deref() == Some("wamid.out")
            })
            .times(1)
            .returning(|m| {
                let mut stored = create_test_message(10, m.conversation_id);
                stored.direction = MessageDirection::Out;
                stored.body = m.body.clone();
                Ok(stored)
            });
        let mock_repo: Box<dyn AppRepo> = Box::new(mock_repo);

        let mut mock_messaging = MockMessagingService::new();
        mock_messaging
            .expect_send_text_message()
            .with(eq("tenant-b-number"), eq("5215550001"), eq("hola"))
            .times(1)
            .returning(|_, _, _| Ok("wamid.out".to_string()));
        let mock_messaging: Box<dyn MessagingService> = Box::new(mock_messaging);

        let outcome = send_message(3, "hola".into(), &mock_repo, &mock_messaging)
            .await
            .unwrap();

        assert!(
            matches!(outcome, SendMessageOutcome::Sent(m) if m.body == "hola" && m.direction == MessageDirection::Out)
        );
    }

    #[ntex::test]
    async fn test_send_message_provider_failure_stores_nothing() {
        let mut mock_repo = MockAppRepo::new();
        mock_repo
            .expect_get_conversation()
            .returning(|id| Ok(Some(create_test_conversation(id, ana()))));
        mock_repo
            .expect_get_tenant()
            .returning(|id| Ok(Some(create_test_tenant(id, "tenant-a-number"))));
        mock_repo.expect_insert_outbound_message().never();
        let mock_repo: Box<dyn AppRepo> = Box::new(mock_repo);

        let mut mock_messaging = MockMessagingService::new();
        mock_messaging
            .expect_send_text_message()
            .returning(|_, _, _| Err(anyhow::anyhow!("WhatsApp API returned error status 401")));
        let mock_messaging: Box<dyn MessagingService> = Box::new(mock_messaging);

        let outcome = send_message(3, "hola".into(), &mock_repo, &mock_messaging)
            .await
            .unwrap();

        assert!(matches!(outcome, SendMessageOutcome::ProviderFailed(_)));
    }

    #[ntex::test]
    async fn test_send_message_without_contact() {
        let mut mock_repo = MockAppRepo::new();
        mock_repo
            .expect_get_conversation()
            .returning(|id| Ok(Some(create_test_conversation(id, None))));
        let mock_repo: Box<dyn AppRepo> = Box::new(mock_repo);

        let mut mock_messaging = MockMessagingService::new();
        mock_messaging.expect_send_text_message().never();
        let mock_messaging: Box<dyn MessagingService> = Box::new(mock_messaging);

        let outcome = send_message(3, "hola".into(), &mock_repo, &mock_messaging)
            .await
            .unwrap();

        assert!(matches!(outcome, SendMessageOutcome::MissingContact));
    }

    #[ntex::test]
    async fn test_send_message_without_tenant_is_error() {
        let mut mock_repo = MockAppRepo::new();
        mock_repo
            .expect_get_conversation()
            .returning(|id| Ok(Some(create_test_conversation(id, ana()))));
        mock_repo.expect_get_tenant().returning(|_| Ok(None));
        mock_repo.expect_insert_outbound_message().never();
        let mock_repo: Box<dyn AppRepo> = Box::new(mock_repo);

        let mut mock_messaging = MockMessagingService::new();
        mock_messaging.expect_send_text_message().never();
        let mock_messaging: Box<dyn MessagingService> = Box::new(mock_messaging);

        assert!(
            send_message(3, "hola".into(), &mock_repo, &mock_messaging)
                .await
                .is_err()
        );
    }
}
