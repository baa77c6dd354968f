use tracing_subscriber::EnvFilter;

use ask_responder::api;
use ask_responder::config::Config;
use ask_responder::state::AppState;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Initialize tracing
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .init();

    let config = Config::from_env();
    tracing::info!("Environment: {}", config.environment);
    tracing::info!("Search backend: {}", config.search.base_url);
    tracing::info!("LLM provider: {} ({})", config.llm.provider, config.llm.base_url);
    if config.budgets.deadline_ms >= 3000 {
        tracing::warn!(
            "ASK_DEADLINE_MS={} leaves no headroom under the 3s platform deadline",
            config.budgets.deadline_ms
        );
    }

    let state = AppState::new(&config)?;
    let app = api::router(state);

    let listener = tokio::net::TcpListener::bind(&config.bind_addr).await?;
    tracing::info!("Server listening on {}", config.bind_addr);

    axum::serve(listener, app).await?;
    Ok(())
}
