use clap::{Args, Parser, Subcommand};
use envconfig::Envconfig;

use crate::{config, seed, utils};

#[derive(Args, Debug, Clone)]
pub struct RunMigrationsArgs {
    /// Migration file name, relative to the migrations directory
    #[arg(short, long)]
    file: String,
    #[arg(short, long, default_value = "../migrations")]
    dir: String,
}

#[derive(Args, Debug, Clone)]
pub struct SeedDemoArgs {
    #[arg(long, default_value = "Demo Store")]
    tenant_name: String,
    /// WhatsApp phone number id the demo tenant receives messages on
    #[arg(long, default_value = "demo-phone-number-id")]
    phone_number_id: String,
}

#[derive(Subcommand, Clone, Debug)]
pub enum Action {
    /// Runs a migration file against the configured database
    RunMigrations(RunMigrationsArgs),
    /// Inserts a demo tenant with contacts and conversations
    SeedDemo(SeedDemoArgs),
}

/// Maintenance tasks of the inbox database
#[derive(Parser, Debug)]
#[command(version, about, long_about = None)]
pub struct AppArgs {
    #[command(subcommand)]
    pub action: Action,
}

impl AppArgs {
    pub async fn run(&self) -> anyhow::Result<()> {
        let app_config = config::AppConfig::init_from_env()?;
        let db_pool = utils::setup_sqlite_db_pool(&app_config).await?;

        match &self.action {
            Action::RunMigrations(RunMigrationsArgs { file, dir }) => {
                utils::run_migrations(&db_pool, dir, file).await?;
                log::info!("migration {file} applied");
            }
            Action::SeedDemo(SeedDemoArgs {
                tenant_name,
                phone_number_id,
            }) => {
                let summary = seed::seed_demo(&db_pool, tenant_name, phone_number_id).await?;
                log::info!(
                    "tenant {} seeded: {} contacts, {} conversations, {} messages",
                    summary.tenant_id,
                    summary.contacts,
                    summary.conversations,
                    summary.messages
                );
            }
        }

        Ok(())
    }
}
