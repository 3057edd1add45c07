use crate::config::AppConfig;
use logfire::config::{MetricsOptions, SendToLogfire};

/// Installs the logfire tracing pipeline.
///
/// Spans and metrics are exported only when `LOGFIRE_TOKEN` is configured,
/// otherwise they are printed to the console.
pub fn setup_logfire(app_config: &AppConfig) -> anyhow::Result<logfire::ShutdownHandler> {
    let builder = logfire::configure()
        .install_panic_handler()
        .with_metrics(Some(MetricsOptions::default()));

    let builder = match &app_config.logfire_token {
        Some(token) => builder
            .send_to_logfire(SendToLogfire::Yes)
            .with_token(token),
        None => builder.send_to_logfire(SendToLogfire::No),
    };

    Ok(builder.finish()?)
}
