//! Demo data for a local inbox.
//!
//! Creates a tenant with a few contacts and one conversation per status,
//! each with a short thread alternating between the contact and the business.

use chrono::{DateTime, TimeDelta, Utc};
use sqlx::SqlitePool;

const QUERY_UPSERT_TENANT: &str = r#"
INSERT INTO tenant(name, whatsapp_phone_number_id, created_at, updated_at)
VALUES($1, $2, $3, $3)
ON CONFLICT(whatsapp_phone_number_id) DO UPDATE SET
    name = excluded.name,
    updated_at = excluded.updated_at
RETURNING id;
"#;

const QUERY_UPSERT_CONTACT: &str = r#"
INSERT INTO contact(tenant_id, name, phone, created_at, updated_at)
VALUES($1, $2, $3, $4, $4)
ON CONFLICT(tenant_id, phone) DO UPDATE SET
    name = excluded.name,
    updated_at = excluded.updated_at
RETURNING id;
"#;

const QUERY_INSERT_CONVERSATION: &str = r#"
INSERT INTO conversation(tenant_id, contact_id, status, last_message_at, created_at, updated_at)
VALUES($1, $2, $3, $4, $5, $4)
RETURNING id;
"#;

const QUERY_INSERT_MESSAGE: &str = r#"
INSERT INTO message(conversation_id, direction, sender, recipient, body, sent_at, created_at)
VALUES($1, $2, $3, $4, $5, $6, $7);
"#;

const CONTACTS: [(&str, &str); 3] = [
    ("Ana López", "5215550001"),
    ("Bruno Díaz", "5215550002"),
    ("Carla Ruiz", "5215550003"),
];

/// Status of each demo conversation, paired with the contacts in order
const STATUSES: [&str; 3] = ["OPEN", "PENDING", "CLOSED"];

const THREAD: [&str; 4] = [
    "Hola, tengo una duda con mi pedido",
    "¡Hola! Claro, ¿me compartes el número de pedido?",
    "Es el 10234",
    "Gracias, ya lo estamos revisando",
];

#[derive(Debug, PartialEq)]
pub struct SeedSummary {
    pub tenant_id: i64,
    pub contacts: usize,
    pub conversations: usize,
    pub messages: usize,
}

/// Seeds the demo tenant owning `phone_number_id`.
///
/// Everything is written in one transaction. Running it again for the same
/// phone number id reuses the tenant and its contacts and adds new threads.
pub async fn seed_demo(
    db_pool: &SqlitePool,
    tenant_name: &str,
    phone_number_id: &str,
) -> anyhow::Result<SeedSummary> {
    let now = Utc::now();
    let mut transaction = db_pool.begin().await?;

    let tenant_id: i64 = sqlx::query_scalar(QUERY_UPSERT_TENANT)
        .bind(tenant_name)
        .bind(phone_number_id)
        .bind(now)
        .fetch_one(&mut *transaction)
        .await?;

    let mut summary = SeedSummary {
        tenant_id,
        contacts: 0,
        conversations: 0,
        messages: 0,
    };

    for (offset, ((name, phone), status)) in CONTACTS.into_iter().zip(STATUSES).enumerate() {
        let contact_id: i64 = sqlx::query_scalar(QUERY_UPSERT_CONTACT)
            .bind(tenant_id)
            .bind(name)
            .bind(phone)
            .bind(now)
            .fetch_one(&mut *transaction)
            .await?;
        summary.contacts += 1;

        let started_at = now - TimeDelta::hours(offset as i64 + 1);
        let sent_at = |n: usize| -> DateTime<Utc> { started_at + TimeDelta::minutes(n as i64) };

        let conversation_id: i64 = sqlx::query_scalar(QUERY_INSERT_CONVERSATION)
            .bind(tenant_id)
            .bind(contact_id)
            .bind(status)
            .bind(sent_at(THREAD.len() - 1))
            .bind(started_at)
            .fetch_one(&mut *transaction)
            .await?;
        summary.conversations += 1;

        for (n, body) in THREAD.into_iter().enumerate() {
            let (direction, sender, recipient) = if n % 2 == 0 {
                ("IN", phone, phone_number_id)
            } else {
                ("OUT", phone_number_id, phone)
            };

            sqlx::query(QUERY_INSERT_MESSAGE)
                .bind(conversation_id)
                .bind(direction)
                .bind(sender)
                .bind(recipient)
                .bind(body)
                .bind(sent_at(n))
                .bind(now)
                .execute(&mut *transaction)
                .await?;
            summary.messages += 1;
        }
    }

    transaction.commit().await?;

    Ok(summary)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::utils;

    #[tokio::test]
    async fn test_seed_demo_creates_one_conversation_per_status() {
        let db_pool = utils::setup_test_db_pool().await;

        let summary = seed_demo(&db_pool, "Demo", "phone-id-1").await.unwrap();

        assert_eq!((summary.contacts, summary.conversations, summary.messages), (3, 3, 12));

        let statuses: Vec<String> =
            sqlx::query_scalar("SELECT status FROM conversation ORDER BY status;")
                .fetch_all(&db_pool)
                .await
                .unwrap();
        assert_eq!(statuses, vec!["CLOSED", "OPEN", "PENDING"]);

        let directions: Vec<String> = sqlx::query_scalar(
            "SELECT direction FROM message WHERE conversation_id = (SELECT MIN(id) FROM conversation) ORDER BY sent_at, id;",
        )
        .fetch_all(&db_pool)
        .await
        .unwrap();
        assert_eq!(directions, vec!["IN", "OUT", "IN", "OUT"]);

        let business_sides: Vec<String> = sqlx::query_scalar(
            "SELECT DISTINCT CASE direction WHEN 'IN' THEN recipient ELSE sender END FROM message;",
        )
        .fetch_all(&db_pool)
        .await
        .unwrap();
        assert_eq!(business_sides, vec!["phone-id-1"]);
    }

    #[tokio::test]
    async fn test_seed_demo_reuses_tenant_and_contacts() {
        let db_pool = utils::setup_test_db_pool().await;

        let first = seed_demo(&db_pool, "Demo", "phone-id-1").await.unwrap();
        let second = seed_demo(&db_pool, "Demo renamed", "phone-id-1").await.unwrap();

        assert_eq!(first.tenant_id, second.tenant_id);

        let (tenants, contacts): (i64, i64) = sqlx::query_as(
            "SELECT (SELECT COUNT(*) FROM tenant), (SELECT COUNT(*) FROM contact);",
        )
        .fetch_one(&db_pool)
        .await
        .unwrap();
        assert_eq!((tenants, contacts), (1, 3));

        let name: String = sqlx::query_scalar("SELECT name FROM tenant;")
            .fetch_one(&db_pool)
            .await
            .unwrap();
        assert_eq!(name, "Demo renamed");
    }
}
