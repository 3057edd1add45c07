//! Application configuration management with security considerations.
//!
//! Every value is read once from the environment at startup through
//! [`AppConfig::load`] and then handed to the components that need it.
//! Missing or empty required values abort the process before the server
//! binds, so a misconfigured deployment never accepts a request.
//!
//! # Security Notes
//! - Sensitive fields are clearly marked and should never be logged
//! - Production environments should use secure secret management systems

use anyhow::bail;
use envconfig::Envconfig;

/// Application configuration with security-aware field management.
///
/// # Security Requirements
/// - All `SENSITIVE` fields must be stored securely (encrypted at rest)
/// - Never log or expose sensitive values
#[derive(Envconfig, Clone)]
pub struct AppConfig {
    /// Environment name to deploy the app (NON-SENSITIVE)
    /// Values: "local", "dev", "staging", "prod"
    #[envconfig(from = "ENV", default = "local")]
    pub env: String,

    /// Database host value (NON-SENSITIVE)
    /// Example: "sqlite:data/inbox.db"
    #[envconfig(from = "DB_HOST")]
    pub db_host: String,

    /// 🔒 SENSITIVE: Database password to encrypt SQLite data (prod only)
    #[envconfig(from = "DB_PASS_ENCRYPT", default = "")]
    pub db_pass_encrypt: String,

    /// Host address for web server binding (NON-SENSITIVE)
    #[envconfig(from = "WEB_SERVER_HOST", default = "0.0.0.0")]
    pub web_server_host: String,

    /// Port for web server binding (NON-SENSITIVE)
    #[envconfig(from = "WEB_SERVER_PORT", default = "8080")]
    pub web_server_port: u16,

    /// Path to SSL private key file (SENSITIVE PATH), used in prod
    #[envconfig(from = "PRIVATE_KEY_PATH", default = "server.key")]
    pub private_key_path: String,

    /// Path to SSL certificate file (NON-SENSITIVE), used in prod
    #[envconfig(from = "CERTIFICATE_PATH", default = "server.crt")]
    pub certificate_path: String,

    /// Origin of the inbox frontend allowed by CORS (NON-SENSITIVE)
    #[envconfig(from = "FRONTEND_ORIGIN", default = "http://localhost:3000")]
    pub frontend_origin: String,

    /// 🔒 SENSITIVE: Meta app secret used to sign webhook payloads
    #[envconfig(from = "WHATSAPP_APP_SECRET")]
    pub whatsapp_app_secret: String,

    /// 🔒 SENSITIVE: Token echoed back by Meta on webhook subscription
    #[envconfig(from = "WHATSAPP_VERIFY_TOKEN")]
    pub whatsapp_verify_token: String,

    /// Graph API base the send endpoint is built on (NON-SENSITIVE)
    #[envconfig(
        from = "WHATSAPP_GRAPH_API_URL",
        default = "https://graph.facebook.com/v22.0"
    )]
    pub whatsapp_graph_api_url: String,

    /// 🔒 SENSITIVE: WhatsApp Business authentication token
    #[envconfig(from = "WHATSAPP_BUSINESS_AUTH")]
    pub whatsapp_business_auth: String,

    /// Base URL of the inbox API the proxy forwards to (NON-SENSITIVE)
    /// Example: "http://127.0.0.1:8080"
    #[envconfig(from = "API_BASE_URL")]
    pub api_base_url: String,

    /// 🔒 SENSITIVE: Key required on `/conversations` and injected by the proxy
    #[envconfig(from = "API_KEY")]
    pub api_key: String,

    /// 🔒 SENSITIVE: Logfire write token, logs stay local when absent
    #[envconfig(from = "LOGFIRE_TOKEN")]
    pub logfire_token: Option<String>,
}

impl AppConfig {
    /// Reads the configuration from the process environment and validates it
    pub fn load() -> anyhow::Result<Self> {
        let app_config = Self::init_from_env()?;
        app_config.validate()?;

        Ok(app_config)
    }

    /// Rejects required secrets that are present but empty
    pub fn validate(&self) -> anyhow::Result<()> {
        let required = [
            ("DB_HOST", &self.db_host),
            ("WHATSAPP_APP_SECRET", &self.whatsapp_app_secret),
            ("WHATSAPP_VERIFY_TOKEN", &self.whatsapp_verify_token),
            ("WHATSAPP_GRAPH_API_URL", &self.whatsapp_graph_api_url),
            ("WHATSAPP_BUSINESS_AUTH", &self.whatsapp_business_auth),
            ("API_BASE_URL", &self.api_base_url),
            ("API_KEY", &self.api_key),
        ];

        for (name, value) in required {
            if value.trim().is_empty() {
                bail!("environment variable {name} must not be empty");
            }
        }

        if self.is_prod() && self.db_pass_encrypt.is_empty() {
            bail!("environment variable DB_PASS_ENCRYPT is required in prod");
        }

        Ok(())
    }

    /// Checks if running in production environment
    pub fn is_prod(&self) -> bool {
        self.env.to_lowercase() == "prod"
    }

    /// Send endpoint of the business number `phone_number_id`
    pub fn whatsapp_send_msg_endpoint(&self, phone_number_id: &str) -> String {
        format!(
            "{base}/{phone_number_id}/messages",
            base = self.whatsapp_graph_api_url.trim_end_matches('/')
        )
    }

    /// Joins the proxied path and query onto [`AppConfig::api_base_url`]
    pub fn api_url(&self, path: &str, query: &str) -> String {
        let base = self.api_base_url.trim_end_matches('/');
        let path = path.trim_start_matches('/');

        if query.is_empty() {
            return format!("{base}/{path}");
        }
        format!("{base}/{path}?{query}")
    }
}

#[cfg(test)]
pub(crate) fn test_config() -> AppConfig {
    AppConfig {
        env: "local".into(),
        db_host: "sqlite::memory:".into(),
        db_pass_encrypt: String::new(),
        web_server_host: "127.0.0.1".into(),
        web_server_port: 8080,
        private_key_path: "server.key".into(),
        certificate_path: "server.crt".into(),
        frontend_origin: "http://localhost:3000".into(),
        whatsapp_app_secret: "abc123".into(),
        whatsapp_verify_token: "verify-me".into(),
        whatsapp_graph_api_url: "https://graph.facebook.com/v22.0".into(),
        whatsapp_business_auth: "wa-token".into(),
        api_base_url: "http://127.0.0.1:8080/".into(),
        api_key: "test-api-key".into(),
        logfire_token: None,
    }
}
