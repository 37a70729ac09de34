use std::fmt;
use std::time::Duration;

use anyhow::{bail, Context, Result};
use reqwest::Url;

use crate::config::{optional, parse_or, require};

/// Chatbot service configuration loaded from environment variables.
#[derive(Clone)]
pub struct Config {
    pub openai_api_key: String,
    pub openai_base_url: String,
    pub context_service_url: String,
    pub llm_timeout: Duration,
    pub context_timeout: Duration,
    /// Number of past exchanges replayed into the prompt.
    pub history_prompt_limit: u32,
    pub port: u16,
    pub rust_log: String,
}

impl fmt::Debug for Config {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Config")
            .field("openai_api_key", &"<redacted>")
            .field("openai_base_url", &self.openai_base_url)
            .field("context_service_url", &self.context_service_url)
            .field("llm_timeout", &self.llm_timeout)
            .field("context_timeout", &self.context_timeout)
            .field("history_prompt_limit", &self.history_prompt_limit)
            .field("port", &self.port)
            .field("rust_log", &self.rust_log)
            .finish()
    }
}

impl Config {
    pub fn from_env() -> Result<Self> {
        dotenvy::dotenv().ok(); // load .env if present; ignore if missing
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    pub fn from_lookup<F>(lookup: F) -> Result<Self>
    where
        F: Fn(&str) -> Option<String>,
    {
        let openai_base_url = optional(&lookup, "OPENAI_BASE_URL", "https://api.openai.com/v1");
        check_http_url("OPENAI_BASE_URL", &openai_base_url)?;
        let context_service_url =
            optional(&lookup, "CONTEXT_SERVICE_URL", "http://localhost:8001");
        check_http_url("CONTEXT_SERVICE_URL", &context_service_url)?;

        Ok(Config {
            openai_api_key: require(&lookup, "OPENAI_API_KEY")?,
            openai_base_url,
            context_service_url,
            llm_timeout: timeout_secs(&lookup, "LLM_TIMEOUT_SECS", 30)?,
            context_timeout: timeout_secs(&lookup, "CONTEXT_TIMEOUT_SECS", 10)?,
            history_prompt_limit: parse_or(&lookup, "HISTORY_PROMPT_LIMIT", 10)?,
            port: parse_or(&lookup, "PORT", 8000)?,
            rust_log: optional(&lookup, "RUST_LOG", "info"),
        })
    }
}

fn timeout_secs<F>(lookup: &F, key: &str, default: u64) -> Result<Duration>
where
    F: Fn(&str) -> Option<String>,
{
    let secs: u64 = parse_or(lookup, key, default)?;
    if secs == 0 {
        bail!("{key} must be greater than zero");
    }
    Ok(Duration::from_secs(secs))
}

fn check_http_url(key: &str, raw: &str) -> Result<()> {
    let url = Url::parse(raw).with_context(|| format!("{key} is not a valid URL: '{raw}'"))?;
    if !matches!(url.scheme(), "http" | "https") {
        bail!("{key} must use http or https, got '{raw}'");
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::lookup_from;

    #[test]
    fn test_defaults() {
        let config = Config::from_lookup(lookup_from(&[("OPENAI_API_KEY", "sk-test")])).unwrap();
        assert_eq!(config.openai_base_url, "https://api.openai.com/v1");
        assert_eq!(config.context_service_url, "http://localhost:8001");
        assert_eq!(config.llm_timeout, Duration::from_secs(30));
        assert_eq!(config.context_timeout, Duration::from_secs(10));
        assert_eq!(config.history_prompt_limit, 10);
        assert_eq!(config.port, 8000);
    }

    #[test]
    fn test_api_key_is_required() {
        let err = Config::from_lookup(lookup_from(&[])).unwrap_err();
        assert!(err.to_string().contains("OPENAI_API_KEY"));
    }

    #[test]
    fn test_zero_timeout_is_rejected() {
        let err = Config::from_lookup(lookup_from(&[
            ("OPENAI_API_KEY", "sk-test"),
            ("LLM_TIMEOUT_SECS", "0"),
        ]))
        .unwrap_err();
        assert!(err.to_string().contains("LLM_TIMEOUT_SECS"));
    }

    #[test]
    fn test_context_url_must_be_http() {
        assert!(Config::from_lookup(lookup_from(&[
            ("OPENAI_API_KEY", "sk-test"),
            ("CONTEXT_SERVICE_URL", "ftp://context"),
        ]))
        .is_err());
    }

    #[test]
    fn test_debug_hides_api_key() {
        let config = Config::from_lookup(lookup_from(&[("OPENAI_API_KEY", "sk-secret")])).unwrap();
        assert!(!format!("{config:?}").contains("sk-secret"));
    }
}
