//! Contract review API server binary

use std::net::SocketAddr;
use std::sync::Arc;

use anyhow::Result;
use clap::Parser;
use review_api::config::Args;
use review_api::AppState;
use review_engine::GeminiClient;
use tracing::info;
use tracing_subscriber::EnvFilter;

#[tokio::main]
async fn main() -> Result<()> {
    // Load .env file if present
    dotenvy::dotenv().ok();
    let args = Args::parse();

    // Initialize tracing
    let level = if args.verbose { "debug" } else { "info" };
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::from_default_env()
                .add_directive(format!("review_api={level}").parse()?)
                .add_directive(format!("review_engine={level}").parse()?)
                .add_directive(format!("shared_pdf={level}").parse()?)
                .add_directive("tower_http=debug".parse()?),
        )
        .init();

    info!("Initializing contract review API...");
    let config = args.server_config();
    let model = Arc::new(GeminiClient::new(args.gemini()));
    let state = Arc::new(AppState::connect(config, model).await?);
    let _sweeper = state.blobs.spawn_sweeper(state.config.blob_sweep_interval);

    let app = review_api::router(Arc::clone(&state));

    let addr: SocketAddr = format!("{}:{}", state.config.host, state.config.port).parse()?;
    info!("Starting contract review API on http://{}", addr);
    info!("AI timeout: {}ms", state.config.ai_timeout.as_millis());

    let listener = tokio::net::TcpListener::bind(addr).await?;
    axum::serve(listener, app).await?;

    Ok(())
}
