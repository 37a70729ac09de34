use axum::{
    routing::{get, post},
    Router,
};

use crate::context_service::handlers;
use crate::context_service::state::AppState;

pub fn build_router(state: AppState) -> Router {
    Router::new()
        .route("/health", get(handlers::health_handler))
        .route(
            "/context/:user_id",
            get(handlers::handle_get_context).post(handlers::handle_upsert_context),
        )
        .route(
            "/chat/:user_id",
            get(handlers::handle_get_history).post(handlers::handle_add_chat_message),
        )
        .route("/stats", get(handlers::handle_stats))
        .with_state(state)
}
