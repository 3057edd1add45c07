//! Conversation endpoints of the inbox API.
//!
//! Every handler requires the `X-API-Key` header, see
//! [`ApiKeyAuth`](middleware::api_key::ApiKeyAuth).

use ntex::{util::Bytes, web};

use crate::{
    api::{self, conversation::SendMessageOutcome},
    front::{
        AppState, errors,
        forms::{self, FieldError, Validate},
        middleware,
    },
};

/// Lists conversations, filtered by tenant and status
#[web::get("")]
async fn list_conversations(
    _: middleware::api_key::ApiKeyAuth,
    query: web::types::Query<forms::conversation::ListConversationsQuery>,
    app_state: web::types::State<AppState>,
) -> Result<impl web::Responder, web::Error> {
    let (filter, page) = query
        .validate()
        .map_err(errors::UserError::ValidationError)?;

    let conversations = api::conversation::list_conversations(&filter, &page, &app_state.repo)
        .await
        .map_err(|e| {
            errors::ServerError::InternalServerError(format!(
                "function list_conversations raised an error: {e}"
            ))
        })?;

    Ok(web::HttpResponse::Ok().json(&conversations))
}

/// Returns a conversation with a page of its messages, oldest first
#[web::get("/{conversation_id}")]
async fn get_conversation(
    _: middleware::api_key::ApiKeyAuth,
    params: web::types::Path<(i64,)>,
    query: web::types::Query<forms::conversation::ConversationPageQuery>,
    app_state: web::types::State<AppState>,
) -> Result<impl web::Responder, web::Error> {
    let conversation_id = params.0;
    let page = query
        .validate()
        .map_err(errors::UserError::ValidationError)?;

    let detail = api::conversation::get_conversation_detail(conversation_id, &page, &app_state.repo)
        .await
        .map_err(|e| {
            errors::ServerError::InternalServerError(format!(
                "function get_conversation_detail raised an error: {e}"
            ))
        })?
        .ok_or(errors::UserError::UrlNotFound)?;

    Ok(web::HttpResponse::Ok().json(&detail))
}

/// Sets the status of a conversation
#[web::patch("/{conversation_id}/status")]
async fn update_conversation_status(
    _: middleware::api_key::ApiKeyAuth,
    params: web::types::Path<(i64,)>,
    body: Bytes,
    app_state: web::types::State<AppState>,
) -> Result<impl web::Responder, web::Error> {
    let conversation_id = params.0;
    let status = forms::parse_json::<forms::conversation::UpdateStatusForm>(&body)?;

    let conversation = api::conversation::update_status(conversation_id, status, &app_state.repo)
        .await
        .map_err(|e| {
            errors::ServerError::InternalServerError(format!(
                "function update_status raised an error: {e}"
            ))
        })?
        .ok_or(errors::UserError::UrlNotFound)?;

    logfire::info!(
        "Conversation {id} set to {status}",
        id = conversation_id,
        status = status.to_string()
    );

    Ok(web::HttpResponse::Ok().json(&conversation))
}

/// Sends a text reply to the contact of a conversation
#[web::post("/{conversation_id}/messages")]
async fn send_message(
    _: middleware::api_key::ApiKeyAuth,
    params: web::types::Path<(i64,)>,
    body: Bytes,
    app_state: web::types::State<AppState>,
) -> Result<impl web::Responder, web::Error> {
    let conversation_id = params.0;
    let text = forms::parse_json::<forms::conversation::SendMessageForm>(&body)?;

    let outcome = api::conversation::send_message(
        conversation_id,
        text,
        &app_state.repo,
        &app_state.messaging_service,
    )
    .await
    .map_err(|e| {
        errors::ServerError::InternalServerError(format!(
            "function send_message raised an error: {e}"
        ))
    })?;

    match outcome {
        SendMessageOutcome::Sent(message) => Ok(web::HttpResponse::Created().json(&message)),
        SendMessageOutcome::ConversationNotFound => Err(errors::UserError::UrlNotFound.into()),
        SendMessageOutcome::MissingContact => {
            Err(errors::UserError::ValidationError(vec![FieldError::new(
                "conversation",
                "has no contact to deliver to",
            )])
            .into())
        }
        SendMessageOutcome::ProviderFailed(reason) => {
            Err(errors::ServerError::ExternalServiceError(reason).into())
        }
    }
}

#[cfg(test)]
mod tests {
    use crate::{
        consts,
        front::{
            routes,
            tests::{test_app_state, test_app_state_with},
        },
        models::{conversation::ConversationStatus, message::NewInboundMessage},
        repo::{
            AppRepo,
            sqlite::tests::{insert_conversation, insert_tenant},
        },
        services::MockMessagingService,
    };
    use chrono::Utc;
    use mockall::predicate::{always, eq};
    use ntex::{
        http::{Method, StatusCode},
        web::{App, test},
    };
    use serde_json::Value;
    use sqlx::SqlitePool;

    const API_KEY: &str = "test-api-key";

    async fn stored_status(db_pool: &SqlitePool, id: i64) -> Option<String> {
        sqlx::query_scalar("SELECT status FROM conversation WHERE id = $1;")
            .bind(id)
            .fetch_optional(db_pool)
            .await
            .unwrap()
    }

    fn patch_status(id: i64, body: &str) -> ntex::http::Request {
        test::TestRequest::with_uri(&format!("/conversations/{id}/status"))
            .method(Method::PATCH)
            .header(consts::API_KEY_HEADER, API_KEY)
            .header("content-type", "application/json")
            .set_payload(body.to_string())
            .to_request()
    }

    #[ntex::test]
    async fn test_patch_status_then_get_returns_new_status() {
        let (app_state, db_pool) = test_app_state().await;
        let tenant_id = insert_tenant(&db_pool, "p1").await;
        insert_conversation(&db_pool, 42, tenant_id, ConversationStatus::Open).await;
        let app =
            test::init_service(App::new().state(app_state).configure(routes::conversations)).await;

        let patched = test::call_service(&app, patch_status(42, r#"{"status":"PENDING"}"#)).await;
        assert_eq!(patched.status(), StatusCode::OK);
        let body: Value = serde_json::from_slice(&test::read_body(patched).await).unwrap();
        assert_eq!(body["status"], "PENDING");

        let fetched = test::call_service(
            &app,
            test::TestRequest::with_uri("/conversations/42")
                .header(consts::API_KEY_HEADER, API_KEY)
                .to_request(),
        )
        .await;
        assert_eq!(fetched.status(), StatusCode::OK);
        let body: Value = serde_json::from_slice(&test::read_body(fetched).await).unwrap();
        assert_eq!(body["id"], 42);
        assert_eq!(body["status"], "PENDING");
        assert_eq!(body["messages"], serde_json::json!([]));
    }

    #[ntex::test]
    async fn test_patch_unknown_conversation_is_not_found() {
        let (app_state, db_pool) = test_app_state().await;
        let app =
            test::init_service(App::new().state(app_state).configure(routes::conversations)).await;

        let resp = test::call_service(&app, patch_status(999, r#"{"status":"CLOSED"}"#)).await;

        assert_eq!(resp.status(), StatusCode::NOT_FOUND);
        assert_eq!(stored_status(&db_pool, 999).await, None);
    }

    #[ntex::test]
    async fn test_patch_invalid_status_leaves_conversation_unchanged() {
        let (app_state, db_pool) = test_app_state().await;
        let tenant_id = insert_tenant(&db_pool, "p1").await;
        insert_conversation(&db_pool, 7, tenant_id, ConversationStatus::Open).await;
        let app =
            test::init_service(App::new().state(app_state).configure(routes::conversations)).await;

        let resp = test::call_service(&app, patch_status(7, r#"{"status":"ARCHIVED"}"#)).await;
        assert_eq!(resp.status(), StatusCode::BAD_REQUEST);
        let body: Value = serde_json::from_slice(&test::read_body(resp).await).unwrap();
        assert_eq!(body["details"][0]["field"], "status");

        let malformed = test::call_service(&app, patch_status(7, "{status")).await;
        assert_eq!(malformed.status(), StatusCode::BAD_REQUEST);
        let body: Value = serde_json::from_slice(&test::read_body(malformed).await).unwrap();
        assert_eq!(body["details"][0]["field"], "body");

        assert_eq!(stored_status(&db_pool, 7).await.as_deref(), Some("OPEN"));
    }

    #[ntex::test]
    async fn test_patch_current_status_is_accepted() {
        let (app_state, db_pool) = test_app_state().await;
        let tenant_id = insert_tenant(&db_pool, "p1").await;
        insert_conversation(&db_pool, 5, tenant_id, ConversationStatus::Closed).await;
        let app =
            test::init_service(App::new().state(app_state).configure(routes::conversations)).await;

        let resp = test::call_service(&app, patch_status(5, r#"{"status":"CLOSED"}"#)).await;

        assert_eq!(resp.status(), StatusCode::OK);
        assert_eq!(stored_status(&db_pool, 5).await.as_deref(), Some("CLOSED"));
    }

    #[ntex::test]
    async fn test_missing_or_wrong_api_key_is_unauthorized() {
        let (app_state, db_pool) = test_app_state().await;
        let tenant_id = insert_tenant(&db_pool, "p1").await;
        insert_conversation(&db_pool, 42, tenant_id, ConversationStatus::Open).await;
        let app =
            test::init_service(App::new().state(app_state).configure(routes::conversations)).await;

        let missing = test::call_service(
            &app,
            test::TestRequest::with_uri("/conversations/42/status")
                .method(Method::PATCH)
                .set_payload(r#"{"status":"CLOSED"}"#)
                .to_request(),
        )
        .await;
        let wrong = test::call_service(
            &app,
            test::TestRequest::with_uri("/conversations")
                .header(consts::API_KEY_HEADER, "not-the-key")
                .to_request(),
        )
        .await;

        assert_eq!(missing.status(), StatusCode::UNAUTHORIZED);
        assert_eq!(wrong.status(), StatusCode::UNAUTHORIZED);
        assert_eq!(stored_status(&db_pool, 42).await.as_deref(), Some("OPEN"));
    }

    #[ntex::test]
    async fn test_list_conversations_by_status() {
        let (app_state, db_pool) = test_app_state().await;
        let tenant_id = insert_tenant(&db_pool, "p1").await;
        insert_conversation(&db_pool, 1, tenant_id, ConversationStatus::Open).await;
        insert_conversation(&db_pool, 2, tenant_id, ConversationStatus::Closed).await;
        let app =
            test::init_service(App::new().state(app_state).configure(routes::conversations)).await;

        let resp = test::call_service(
            &app,
            test::TestRequest::with_uri("/conversations?status=CLOSED&limit=10")
                .header(consts::API_KEY_HEADER, API_KEY)
                .to_request(),
        )
        .await;
        assert_eq!(resp.status(), StatusCode::OK);
        let body: Value = serde_json::from_slice(&test::read_body(resp).await).unwrap();
        assert_eq!(body["items"].as_array().map(Vec::len), Some(1));
        assert_eq!(body["items"][0]["id"], 2);
        assert_eq!(body["next_cursor"], Value::Null);

        let invalid = test::call_service(
            &app,
            test::TestRequest::with_uri("/conversations?limit=0")
                .header(consts::API_KEY_HEADER, API_KEY)
                .to_request(),
        )
        .await;
        assert_eq!(invalid.status(), StatusCode::BAD_REQUEST);
    }

    #[ntex::test]
    async fn test_send_message_is_delivered_and_stored() {
        let mut messaging = MockMessagingService::new();
        messaging
            .expect_send_text_message()
            .with(eq("p1"), eq("5215550001"), always())
            .times(1)
            .returning(|_, _, _| Ok("wamid.out".to_string()));

        let (app_state, db_pool) = test_app_state_with(Box::new(messaging)).await;
        let tenant_id = insert_tenant(&db_pool, "p1").await;
        let inbound = app_state
            .repo
            .insert_inbound_message(&NewInboundMessage {
                tenant_id,
                contact_name: "Ana".into(),
                contact_phone: "5215550001".into(),
                business_phone_number_id: "p1".into(),
                body: "Hola".into(),
                sent_at: Utc::now(),
                external_id: "wamid.in".into(),
            })
            .await
            .unwrap()
            .unwrap();
        let app =
            test::init_service(App::new().state(app_state).configure(routes::conversations)).await;

        let resp = test::call_service(
            &app,
            test::TestRequest::with_uri(&format!(
                "/conversations/{}/messages",
                inbound.conversation_id
            ))
            .method(Method::POST)
            .header(consts::API_KEY_HEADER, API_KEY)
            .set_payload(r#"{"text":"¿En qué te ayudo?"}"#)
            .to_request(),
        )
        .await;
        assert_eq!(resp.status(), StatusCode::CREATED);
        let body: Value = serde_json::from_slice(&test::read_body(resp).await).unwrap();
        assert_eq!(body["direction"], "OUT");
        assert_eq!(body["from"], "p1");
        assert_eq!(body["to"], "5215550001");
        assert_eq!(body["external_id"], "wamid.out");

        let stored: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM message;")
            .fetch_one(&db_pool)
            .await
            .unwrap();
        assert_eq!(stored, 2);
    }

    #[ntex::test]
    async fn test_send_message_provider_failure_is_bad_gateway() {
        let mut messaging = MockMessagingService::new();
        messaging
            .expect_send_text_message()
            .returning(|_, _, _| Err(anyhow::anyhow!("connection refused")));

        let (app_state, db_pool) = test_app_state_with(Box::new(messaging)).await;
        let tenant_id = insert_tenant(&db_pool, "p1").await;
        let inbound = app_state
            .repo
            .insert_inbound_message(&NewInboundMessage {
                tenant_id,
                contact_name: "Ana".into(),
                contact_phone: "5215550001".into(),
                business_phone_number_id: "p1".into(),
                body: "Hola".into(),
                sent_at: Utc::now(),
                external_id: "wamid.in".into(),
            })
            .await
            .unwrap()
            .unwrap();
        let app =
            test::init_service(App::new().state(app_state).configure(routes::conversations)).await;

        let resp = test::call_service(
            &app,
            test::TestRequest::with_uri(&format!(
                "/conversations/{}/messages",
                inbound.conversation_id
            ))
            .method(Method::POST)
            .header(consts::API_KEY_HEADER, API_KEY)
            .set_payload(r#"{"text":"hola"}"#)
            .to_request(),
        )
        .await;

        assert_eq!(resp.status(), StatusCode::BAD_GATEWAY);
        let stored: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM message;")
            .fetch_one(&db_pool)
            .await
            .unwrap();
        assert_eq!(stored, 1);
    }
}
