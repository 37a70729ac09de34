use anyhow::{bail, Result};

use crate::config::{optional, parse_or, require};

/// Which backend holds contexts and chat history.
#[derive(Debug, Clone, PartialEq)]
pub enum StoreKind {
    Postgres {
        database_url: String,
        max_connections: u32,
    },
    /// In-process store; contents are lost on restart.
    Memory,
}

/// Context service configuration loaded from environment variables.
#[derive(Debug, Clone)]
pub struct Config {
    pub store: StoreKind,
    pub port: u16,
    pub rust_log: String,
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
        let store = match optional(&lookup, "CONTEXT_STORE", "postgres").as_str() {
            "postgres" => StoreKind::Postgres {
                database_url: require(&lookup, "DATABASE_URL")?,
                max_connections: parse_or(&lookup, "DB_MAX_CONNECTIONS", 10)?,
            },
            "memory" => StoreKind::Memory,
            other => bail!("CONTEXT_STORE must be 'postgres' or 'memory', got '{other}'"),
        };

        if let StoreKind::Postgres {
            max_connections: 0, ..
        } = store
        {
            bail!("DB_MAX_CONNECTIONS must be greater than zero");
        }

        Ok(Config {
            store,
            port: parse_or(&lookup, "PORT", 8001)?,
            rust_log: optional(&lookup, "RUST_LOG", "info"),
        })
    }
}
