use axum::{
    routing::{get, post},
    Router,
};

use crate::chatbot::handlers;
use crate::chatbot::state::AppState;

pub fn build_router(state: AppState) -> Router {
    Router::new()
        .route("/health", get(handlers::health_handler))
        .route("/ask", post(handlers::handle_ask))
        .route("/history/:user_id", get(handlers::handle_get_history))
        .route("/context/:user_id", get(handlers::handle_get_context))
        .with_state(state)
}
