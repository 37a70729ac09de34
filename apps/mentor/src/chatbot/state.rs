use std::sync::Arc;

use anyhow::Result;

use crate::chatbot::config::Config;
use crate::chatbot::context_client::ContextClient;
use crate::chatbot::llm_client::LlmClient;

/// Shared application state, cloned into every Axum handler.
#[derive(Clone)]
pub struct AppState {
    pub llm: LlmClient,
    pub context: ContextClient,
    pub config: Arc<Config>,
}

impl AppState {
    pub fn new(config: Config) -> Result<Self> {
        let llm = LlmClient::new(
            config.openai_api_key.clone(),
            &config.openai_base_url,
            config.llm_timeout,
        )?;
        let context = ContextClient::new(&config.context_service_url, config.context_timeout)?;
        Ok(Self {
            llm,
            context,
            config: Arc::new(config),
        })
    }
}
