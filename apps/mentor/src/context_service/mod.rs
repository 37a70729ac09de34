//! Context service: owns per-user context and chat history.

pub mod config;
pub mod db;
pub mod errors;
pub mod handlers;
pub mod routes;
pub mod state;
pub mod store;
pub mod validation;

pub use routes::build_router;
pub use state::AppState;
