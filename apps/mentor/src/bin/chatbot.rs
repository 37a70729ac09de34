use anyhow::Result;
use tower_http::{cors::CorsLayer, trace::TraceLayer};
use tracing::info;

use mentor::chatbot::config::Config;
use mentor::chatbot::llm_client::MODEL;
use mentor::chatbot::{build_router, AppState};
use mentor::{logging, server};

#[tokio::main]
async fn main() -> Result<()> {
    let config = Config::from_env()?;

    logging::init(env!("CARGO_CRATE_NAME"), &config.rust_log);
    info!("Starting chatbot v{}", env!("CARGO_PKG_VERSION"));
    info!(
        "Using model {MODEL}; context service at {}",
        config.context_service_url
    );

    let port = config.port;
    let app = build_router(AppState::new(config)?)
        .layer(TraceLayer::new_for_http())
        .layer(CorsLayer::permissive());

    server::serve(app, port).await
}
