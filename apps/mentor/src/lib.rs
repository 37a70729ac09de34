//! Learning-assistant chatbot split across two HTTP services.
//!
//! - [`context_service`] owns user context and chat history in PostgreSQL.
//! - [`chatbot`] answers questions by reading context, calling the LLM and
//!   writing the exchange back through the context service.

pub mod chatbot;
pub mod config;
pub mod context_service;
pub mod logging;
pub mod models;
pub mod server;
pub mod validation;
