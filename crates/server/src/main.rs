use anyhow::Context;
use server::{AppState, routes};
use services::services::config::NotificationConfig;
use tracing::info;

const DEFAULT_HOST: &str = "127.0.0.1";
const DEFAULT_PORT: u16 = 3001;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    dotenvy::dotenv().ok();
    utils::logging::init();

    let config = NotificationConfig::from_env().context("invalid notification settings")?;
    info!(
        default_endpoint = config.default_endpoint.is_some(),
        company_endpoints = config.company_endpoints.len(),
        max_attempts = config.retry_policy.max_attempts(),
        "Loaded notification settings"
    );
    let state = AppState::from_config(&config)?;

    let host = std::env::var("HOST").unwrap_or_else(|_| DEFAULT_HOST.to_string());
    let port = match std::env::var("PORT") {
        Ok(port) => port
            .trim()
            .parse::<u16>()
            .with_context(|| format!("invalid PORT '{port}'"))?,
        Err(_) => DEFAULT_PORT,
    };

    let listener = tokio::net::TcpListener::bind((host.as_str(), port))
        .await
        .with_context(|| format!("failed to bind {host}:{port}"))?;
    info!("Server running on http://{}", listener.local_addr()?);

    axum::serve(listener, routes::router(state)).await?;
    Ok(())
}
