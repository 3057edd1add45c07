pub mod action;
pub mod config;
pub mod logger;
pub mod seed;
pub mod utils;

use clap::Parser;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    logger::setup_simple_logger()?;
    let args = action::AppArgs::parse();

    args.run().await
}
