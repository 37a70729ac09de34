use std::sync::Arc;

use anyhow::Result;
use tower_http::{cors::CorsLayer, trace::TraceLayer};
use tracing::{info, warn};

use mentor::context_service::config::{Config, StoreKind};
use mentor::context_service::db::{create_pool, run_migrations};
use mentor::context_service::store::{ContextStore, MemoryContextStore, PgContextStore};
use mentor::context_service::{build_router, AppState};
use mentor::{logging, server};

#[tokio::main]
async fn main() -> Result<()> {
    let config = Config::from_env()?;

    logging::init(env!("CARGO_CRATE_NAME"), &config.rust_log);
    info!("Starting context service v{}", env!("CARGO_PKG_VERSION"));

    let store: Arc<dyn ContextStore> = match &config.store {
        StoreKind::Postgres {
            database_url,
            max_connections,
        } => {
            let pool = create_pool(database_url, *max_connections).await?;
            run_migrations(&pool).await?;
            Arc::new(PgContextStore::new(pool))
        }
        StoreKind::Memory => {
            warn!("Using in-memory store; contexts and history are lost on restart");
            Arc::new(MemoryContextStore::new())
        }
    };

    let app = build_router(AppState::new(store))
        .layer(TraceLayer::new_for_http())
        .layer(CorsLayer::permissive());

    server::serve(app, config.port).await
}
