mod config;
mod error;
mod message;
mod routes;
mod slack;
mod state;

use std::sync::Arc;

use tracing_subscriber::EnvFilter;

#[tokio::main]
async fn main() {
    let _ = dotenvy::dotenv();
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .init();

    let config = config::RelayConfig::from_env();
    let chat = slack::SlackClient::new(&config).expect("slack client init failed");
    let state = state::RelayState::new(Arc::new(chat), config.slack_channel_id.clone());

    let app = routes::app(state);
    let port = config.port;
    let listener = tokio::net::TcpListener::bind(format!("0.0.0.0:{port}"))
        .await
        .expect("failed to bind");

    tracing::info!(%port, "postwall relay listening");
    axum::serve(listener, app).await.expect("server failed");
}
