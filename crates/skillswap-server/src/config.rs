use std::net::SocketAddr;
use std::path::PathBuf;

use anyhow::{Context, Result};

#[derive(Debug, Clone, PartialEq)]
pub struct Config {
    pub db_path: PathBuf,
    pub host: String,
    pub port: u16,
    pub cors_permissive: bool,
}

impl Config {
    /// Load from the process environment. Call after `dotenvy::dotenv()`.
    pub fn from_env() -> Result<Self> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Result<Self> {
        let db_path: PathBuf = lookup("SKILLSWAP_DB_PATH")
            .unwrap_or_else(|| "skillswap.db".into())
            .into();
        let host = lookup("SKILLSWAP_HOST").unwrap_or_else(|| "0.0.0.0".into());
        let port: u16 = lookup("SKILLSWAP_PORT")
            .unwrap_or_else(|| "3000".into())
            .parse()
            .context("SKILLSWAP_PORT must be a number between 0 and 65535")?;
        let cors_permissive = match lookup("SKILLSWAP_CORS_PERMISSIVE").as_deref() {
            None => true,
            Some("1" | "true" | "yes") => true,
            Some("0" | "false" | "no") => false,
            Some(other) => anyhow::bail!(
                "SKILLSWAP_CORS_PERMISSIVE: expected true/false, got '{}'",
                other
            ),
        };

        Ok(Self {
            db_path,
            host,
            port,
            cors_permissive,
        })
    }

    pub fn addr(&self) -> Result<SocketAddr> {
        format!("{}:{}", self.host, self.port)
            .parse()
            .with_context(|| format!("invalid listen address {}:{}", self.host, self.port))
    }
}
