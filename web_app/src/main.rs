#![recursion_limit = "256"]
//! # Inbox API
//!
//! Main entry point of the multi-tenant WhatsApp inbox backend.
//! Loads the configuration, connects the database and serves the
//! conversation API, the WhatsApp webhook and the frontend proxy.

pub mod api;
pub mod config;
pub mod consts;
pub mod front;
pub mod logger;
pub mod metric;
pub mod models;
pub mod pagination;
pub mod repo;
pub mod services;
pub mod utils;
pub mod webhook;

use anyhow::Context;
use config::AppConfig;
use ntex::web;
use ntex_cors::Cors;
use openssl::ssl::{SslAcceptor, SslFiletype, SslMethod};
use std::sync::Arc;

#[ntex::main]
async fn main() -> anyhow::Result<()> {
    // Initialize configuration, a missing secret stops here
    let app_config = Arc::new(AppConfig::load().context("invalid configuration")?);

    // Initialize logging and metrics
    let shutdown_handler = logger::setup_logfire(&app_config)?;

    // Initialize database connection pool
    let sqlite_repo = repo::sqlite::SqlxSqliteRepo {
        db_pool: utils::setup_sqlite_db_pool(&app_config)
            .await
            .context("failed to connect to the database")?,
    };

    // Outbound HTTP: WhatsApp Cloud API and the proxy upstream
    let http_client = reqwest::Client::new();
    let whatsapp_client =
        webhook::whatsapp::client::WhatsAppClient::new(http_client.clone(), app_config.clone());

    logfire::info!(
        "Starting inbox api on {host}:{port}",
        host = app_config.web_server_host.clone(),
        port = i64::from(app_config.web_server_port)
    );

    // Configure and start the web server
    configure_and_run_server(app_config, sqlite_repo, whatsapp_client, http_client).await?;

    shutdown_handler.shutdown()?;

    Ok(())
}

/// Configures SSL acceptor for production environments
fn setup_ssl_acceptor(app_config: &AppConfig) -> anyhow::Result<openssl::ssl::SslAcceptorBuilder> {
    let mut ssl_acceptor = SslAcceptor::mozilla_intermediate(SslMethod::tls_server())
        .map_err(|e| anyhow::anyhow!("Failed to create SSL acceptor: {}", e))?;

    ssl_acceptor
        .set_private_key_file(&app_config.private_key_path, SslFiletype::PEM)
        .map_err(|e| {
            anyhow::anyhow!(
                "Failed to load private key from {}: {}",
                app_config.private_key_path,
                e
            )
        })?;

    ssl_acceptor
        .set_certificate_file(&app_config.certificate_path, SslFiletype::PEM)
        .map_err(|e| {
            anyhow::anyhow!(
                "Failed to load certificate from {}: {}",
                app_config.certificate_path,
                e
            )
        })?;

    Ok(ssl_acceptor)
}

/// Creates application state from the provided services
fn create_app_state(
    app_config: Arc<AppConfig>,
    sqlite_repo: repo::sqlite::SqlxSqliteRepo,
    whatsapp_client: webhook::whatsapp::client::WhatsAppClient,
    http_client: reqwest::Client,
) -> front::AppState {
    front::AppState {
        config: app_config,
        repo: Box::new(sqlite_repo),
        messaging_service: Box::new(whatsapp_client),
        http_client,
    }
}

/// Configures and starts the web server with appropriate SSL settings
async fn configure_and_run_server(
    app_config: Arc<AppConfig>,
    sqlite_repo: repo::sqlite::SqlxSqliteRepo,
    whatsapp_client: webhook::whatsapp::client::WhatsAppClient,
    http_client: reqwest::Client,
) -> anyhow::Result<()> {
    let server_addr = (
        app_config.web_server_host.clone(),
        app_config.web_server_port,
    );
    let state_config = app_config.clone();

    let server = web::server(move || {
        web::App::new()
            .wrap(
                Cors::new()
                    .allowed_methods(vec!["GET", "HEAD", "POST", "OPTIONS", "PUT", "PATCH", "DELETE"])
                    .allowed_origin(&state_config.frontend_origin)
                    .finish(),
            )
            .wrap(web::middleware::Logger::default())
            .wrap(web::middleware::Compress::default())
            .state(create_app_state(
                state_config.clone(),
                sqlite_repo.clone(),
                whatsapp_client.clone(),
                http_client.clone(),
            ))
            .configure(front::routes::server)
            .configure(front::routes::conversations)
            .configure(front::routes::proxy)
            .configure(webhook::routes::whatsapp)
            .default_service(web::route().to(front::server::serve_not_found))
    });

    let bound_server = if app_config.is_prod() {
        let ssl_acceptor = setup_ssl_acceptor(&app_config)?;
        server.bind_openssl(server_addr, ssl_acceptor)?
    } else {
        server.bind(server_addr)?
    };

    bound_server
        .run()
        .await
        .map_err(|e| anyhow::anyhow!("Server error: {}", e))
}
