use std::net::SocketAddr;
use std::path::PathBuf;

use anyhow::{Context, Result};

const DEFAULT_HOST: &str = "0.0.0.0";
const DEFAULT_PORT: &str = "3000";
const DEFAULT_DB_PATH: &str = "postbox.db";

#[derive(Debug, Clone)]
pub struct Config {
    pub addr: SocketAddr,
    pub db_path: PathBuf,
}

impl Config {
    pub fn from_env() -> Result<Self> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Builds the config from any key lookup, falling back to defaults for
    /// unset keys.
    pub fn from_lookup<F>(lookup: F) -> Result<Self>
    where
        F: Fn(&str) -> Option<String>,
    {
        let host = lookup("POSTBOX_HOST").unwrap_or_else(|| DEFAULT_HOST.into());
        let port: u16 = lookup("POSTBOX_PORT")
            .unwrap_or_else(|| DEFAULT_PORT.into())
            .parse()
            .context("POSTBOX_PORT must be a port number")?;
        let db_path = lookup("POSTBOX_DB_PATH").unwrap_or_else(|| DEFAULT_DB_PATH.into());

        let addr: SocketAddr = format!("{}:{}", host, port)
            .parse()
            .with_context(|| format!("invalid POSTBOX_HOST '{}'", host))?;

        Ok(Self {
            addr,
            db_path: PathBuf::from(db_path),
        })
    }
}
