//! Chatbot service: answers questions with the LLM using the profile and
//! history held by the Context Service.

pub mod config;
pub mod context_client;
pub mod errors;
pub mod handlers;
pub mod llm_client;
pub mod orchestrator;
pub mod prompts;
pub mod routes;
pub mod state;
pub mod validation;

pub use routes::build_router;
pub use state::AppState;
