pub mod conversation;
pub mod errors;
pub mod forms;
pub mod middleware;
pub mod proxy;
pub mod routes;
pub mod server;

use crate::{config::AppConfig, repo, services};
use std::sync::Arc;

pub struct AppState {
    pub config: Arc<AppConfig>,
    pub repo: repo::ImplAppRepo,
    pub messaging_service: services::ImplMessagingService,
    /// Client used by the proxy to reach the inbox API
    pub http_client: reqwest::Client,
}
