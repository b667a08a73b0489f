use std::{net::SocketAddr, time::Duration};

use anyhow::{bail, Context};
use catalog_core::constants::{DEFAULT_LOCALE, DEFAULT_PAGE_SIZE, MAX_PAGE_SIZE};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LogFormat {
    Text,
    Json,
}

pub struct Config {
    pub listen_addr: SocketAddr,
    pub db_path: String,
    pub cors_allow: Vec<String>,
    pub request_timeout: Duration,
    /// Locales registered at startup.
    pub locales: Vec<String>,
    /// Page size used when a list request has no `limit`.
    pub page_size: u32,
    /// Bearer tokens accepted on the taxon routes.
    pub api_tokens: Vec<String>,
    pub log_format: LogFormat,
}

fn split_list(raw: &str) -> Vec<String> {
    raw.split(',')
        .map(|s| s.trim().to_string())
        .filter(|s| !s.is_empty())
        .collect()
}

impl Config {
    /// Reads `CATALOG_*` variables, loading a `.env` file first when present.
    pub fn from_env() -> anyhow::Result<Self> {
        dotenvy::dotenv().ok();
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Builds the configuration from any key lookup.
    pub fn from_lookup<F>(lookup: F) -> anyhow::Result<Self>
    where
        F: Fn(&str) -> Option<String>,
    {
        let var = |key: &str| lookup(key).filter(|v| !v.trim().is_empty());

        let listen_addr: SocketAddr = var("CATALOG_LISTEN_ADDR")
            .unwrap_or_else(|| "0.0.0.0:8080".to_string())
            .parse()
            .context("Invalid CATALOG_LISTEN_ADDR")?;
        let db_path = var("CATALOG_DB_PATH").unwrap_or_else(|| "./db/catalog.db".into());
        let cors_allow =
            split_list(&var("CATALOG_CORS_ALLOW_ORIGINS").unwrap_or_else(|| "*".into()));
        let timeout_ms: u64 = var("CATALOG_REQUEST_TIMEOUT_MS")
            .unwrap_or_else(|| "30000".into())
            .parse()
            .context("Invalid CATALOG_REQUEST_TIMEOUT_MS")?;

        let locales =
            split_list(&var("CATALOG_LOCALES").unwrap_or_else(|| DEFAULT_LOCALE.into()));
        if locales.is_empty() {
            bail!("CATALOG_LOCALES must name at least one locale");
        }

        let page_size: u32 = match var("CATALOG_PAGE_SIZE") {
            Some(raw) => raw.parse().context("Invalid CATALOG_PAGE_SIZE")?,
            None => DEFAULT_PAGE_SIZE,
        };
        if !(1..=MAX_PAGE_SIZE).contains(&page_size) {
            bail!("CATALOG_PAGE_SIZE must be between 1 and {MAX_PAGE_SIZE}");
        }

        let api_tokens = var("CATALOG_API_TOKENS")
            .map(|raw| split_list(&raw))
            .unwrap_or_default();

        let log_format = match var("CATALOG_LOG_FORMAT").as_deref() {
            None => LogFormat::Text,
            Some(f) if f.eq_ignore_ascii_case("text") => LogFormat::Text,
            Some(f) if f.eq_ignore_ascii_case("json") => LogFormat::Json,
            Some(other) => bail!("Invalid CATALOG_LOG_FORMAT '{other}', expected text or json"),
        };

        Ok(Self {
            listen_addr,
            db_path,
            cors_allow,
            request_timeout: Duration::from_millis(timeout_ms),
            locales,
            page_size,
            api_tokens,
            log_format,
        })
    }
}
