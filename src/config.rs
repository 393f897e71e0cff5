use serde::Deserialize;
use anyhow::{Context, Result};
use dotenvy::dotenv;
use std::net::SocketAddr;

fn default_max_file_size() -> usize {
    // 10 MB in bytes
    10 * 1024 * 1024
}

fn default_addr() -> SocketAddr {
    SocketAddr::from(([127, 0, 0, 1], 3000))
}

#[derive(Debug, Clone, Deserialize)]
pub struct Config {
    pub addr: SocketAddr,
    pub max_file_size: usize,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            addr: default_addr(),
            max_file_size: default_max_file_size(),
        }
    }
}

impl Config {
    pub fn new() -> Result<Self> {
        // Load .env file first
        dotenv().ok();

        Self::from_lookup(|key| std::env::var(key).ok())
    }

    fn from_lookup<F>(lookup: F) -> Result<Self>
    where
        F: Fn(&str) -> Option<String>,
    {
        let addr = match lookup("PROFILER_ADDR") {
            Some(raw) => raw
                .parse::<SocketAddr>()
                .with_context(|| format!("Invalid PROFILER_ADDR: {}", raw))?,
            None => default_addr(),
        };

        let max_file_size = match lookup("MAX_FILE_SIZE") {
            Some(raw) => raw
                .parse::<usize>()
                .with_context(|| format!("Invalid MAX_FILE_SIZE: {}", raw))?,
            None => default_max_file_size(),
        };

        if max_file_size == 0 {
            anyhow::bail!("MAX_FILE_SIZE must be greater than zero");
        }

        Ok(Config { addr, max_file_size })
    }
}

pub fn load_config() -> Result<Config> {
    let config = Config::new()?;
    tracing::info!(
        "Loaded configuration: addr={}, max_file_size={} bytes",
        config.addr,
        config.max_file_size
    );
    Ok(config)
}
