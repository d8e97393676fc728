use anyhow::Result;
use chrono::Utc;
use sitewatch_ai::{OpenAiProvider, RuleTranslator};
use sitewatch_notify::channels::WebhookSink;
use sitewatch_notify::manager::NotificationManager;
use sitewatch_storage::SafetyStore;
use std::net::SocketAddr;
use std::sync::Arc;
use tokio::signal;
use tracing_subscriber::EnvFilter;

use sitewatch_server::app;
use sitewatch_server::config::ServerConfig;
use sitewatch_server::state::AppState;

#[tokio::main]
async fn main() -> Result<()> {
    sitewatch_common::id::init(1, 1);

    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env().add_directive("sitewatch=info".parse()?))
        .init();

    let args: Vec<String> = std::env::args().collect();
    let config_path = args
        .get(1)
        .map(|s| s.as_str())
        .unwrap_or("config/server.toml");
    let config = match ServerConfig::load(config_path) {
        Ok(config) => config,
        Err(e) => {
            tracing::warn!(path = config_path, error = %e, "Config not loaded, using defaults");
            ServerConfig::default()
        }
    };

    std::fs::create_dir_all(&config.data_dir)?;
    let db_url = config.database.connection_url(&config.data_dir);
    let store = Arc::new(SafetyStore::new(&db_url).await?);

    let translator: Option<Arc<dyn RuleTranslator>> =
        if config.ai.enabled && !config.ai.api_key.is_empty() {
            let provider = OpenAiProvider::new(
                config.ai.api_key.clone(),
                config.ai.model.clone(),
                config.ai.base_url.clone(),
                config.ai.timeout_secs,
                config.ai.max_tokens,
                config.ai.temperature,
            )
            .map_err(|e| anyhow::anyhow!("Failed to build translation provider: {e}"))?;
            tracing::info!(model = provider.model_name(), "AI rule translation enabled");
            Some(Arc::new(provider))
        } else {
            None
        };

    let mut notifier = NotificationManager::new();
    for target in &config.notify.webhooks {
        notifier.add_sink(
            Box::new(WebhookSink::new(target.url.clone())),
            target.severity_floor(),
        );
    }
    if !notifier.is_empty() {
        tracing::info!(
            webhooks = config.notify.webhooks.len(),
            "Notification sinks configured"
        );
    }

    let state = AppState {
        store,
        translator,
        notifier: Arc::new(notifier),
        start_time: Utc::now(),
        config: Arc::new(config.clone()),
    };

    let addr = SocketAddr::from(([0, 0, 0, 0], config.http_port));
    let listener = tokio::net::TcpListener::bind(addr).await?;
    tracing::info!(%addr, "HTTP server listening");

    axum::serve(listener, app::build_http_app(state))
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    tracing::info!("Server stopped");
    Ok(())
}

async fn shutdown_signal() {
    if let Err(e) = signal::ctrl_c().await {
        tracing::error!(error = %e, "Failed to listen for shutdown signal");
    }
}
