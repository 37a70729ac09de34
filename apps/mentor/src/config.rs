//! Environment lookup helpers shared by both service configs.
//!
//! Each service parses its settings through a lookup function rather than
//! reading `std::env` directly, so parsing can be exercised in tests.

use std::str::FromStr;

use anyhow::{bail, Context, Result};

pub(crate) fn require<F>(lookup: &F, key: &str) -> Result<String>
where
    F: Fn(&str) -> Option<String>,
{
    match lookup(key) {
        Some(value) if !value.trim().is_empty() => Ok(value),
        _ => bail!("Required environment variable '{key}' is not set"),
    }
}

pub(crate) fn optional<F>(lookup: &F, key: &str, default: &str) -> String
where
    F: Fn(&str) -> Option<String>,
{
    lookup(key)
        .filter(|v| !v.trim().is_empty())
        .unwrap_or_else(|| default.to_string())
}

pub(crate) fn parse_or<F, T>(lookup: &F, key: &str, default: T) -> Result<T>
where
    F: Fn(&str) -> Option<String>,
    T: FromStr,
    T::Err: std::error::Error + Send + Sync + 'static,
{
    match lookup(key).filter(|v| !v.trim().is_empty()) {
        Some(raw) => raw
            .trim()
            .parse::<T>()
            .with_context(|| format!("{key} has an invalid value: '{raw}'")),
        None => Ok(default),
    }
}

#[cfg(test)]
pub(crate) fn lookup_from(pairs: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> {
    let vars: std::collections::HashMap<String, String> = pairs
        .iter()
        .map(|(k, v)| (k.to_string(), v.to_string()))
        .collect();
    move |key| vars.get(key).cloned()
}
