use envconfig::Envconfig;

/// Subset of the inbox api configuration needed to reach the database
#[derive(Envconfig, Clone)]
pub struct AppConfig {
    #[envconfig(from = "ENV", default = "local")]
    pub env: String,
    #[envconfig(from = "DB_HOST")]
    pub db_host: String,
    #[envconfig(from = "DB_PASS_ENCRYPT", default = "")]
    pub db_pass_encrypt: String,
}

impl AppConfig {
    pub fn is_prod(&self) -> bool {
        self.env.to_lowercase() == "prod"
    }
}
