//! Route configuration of the inbox API.
//!
//! Routes are grouped by functionality into scopes, each configured by one
//! function passed to `App::configure`.

use super::{conversation, proxy, server};
use ntex::web;

/// Configures the conversation routes.
///
/// All routes require the `X-API-Key` header.
///
/// # Routes
/// - `GET /conversations` - List conversations (`tenant_id`, `status`, `cursor`, `limit`)
/// - `GET /conversations/{conversation_id}` - Conversation with a page of messages
/// - `PATCH /conversations/{conversation_id}/status` - Set the conversation status
/// - `POST /conversations/{conversation_id}/messages` - Send a reply to the contact
pub fn conversations(cfg: &mut web::ServiceConfig) {
    cfg.service(web::scope("/conversations").service((
        conversation::list_conversations,
        conversation::get_conversation,
        conversation::update_conversation_status,
        conversation::send_message,
    )));
}

/// Configures the frontend proxy.
///
/// # Routes
/// - `* /proxy/{tail}*` - Forwarded to the inbox API with the API key added
pub fn proxy(cfg: &mut web::ServiceConfig) {
    cfg.service(
        web::resource("/proxy/{tail}*").route(
            web::route()
                .guard(
                    web::guard::Any(web::guard::Get())
                        .or(web::guard::Post())
                        .or(web::guard::Patch())
                        .or(web::guard::Put())
                        .or(web::guard::Delete()),
                )
                .to(proxy::forward),
        ),
    );
}

/// Configures routes not tied to a resource.
///
/// # Routes
/// - `GET /health` - Liveness check
pub fn server(cfg: &mut web::ServiceConfig) {
    cfg.service(server::health);
}
