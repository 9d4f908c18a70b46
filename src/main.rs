use tracing_subscriber::EnvFilter;

use site_chat::config::Config;
use site_chat::state::AppState;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Initialize tracing
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .init();

    let config = Config::from_env();
    tracing::info!("Data directory: {}", config.data_dir.display());
    tracing::info!("Content directory: {}", config.content_dir.display());

    let state = AppState::new(config.clone())?;
    tracing::info!("LLM endpoint: {}", state.settings.get().api_url());
    if state.corpus.corpus().is_empty() {
        tracing::info!("No corpus snapshot yet; the first question will trigger a crawl");
    }

    // Admin routes carry no auth of their own; expose them only behind a
    // reverse proxy that restricts /api/admin.
    let app = site_chat::router(state);

    let listener = tokio::net::TcpListener::bind(&config.bind_addr).await?;
    tracing::info!("Server listening on {}", config.bind_addr);

    axum::serve(listener, app).await?;
    Ok(())
}
