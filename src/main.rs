use anyhow::Result;
use parking_lot::RwLock;
use std::sync::Arc;

mod config;
mod error;
mod logging;
mod routes;
mod services;
pub mod models;

use error::AppError;
use models::Table;

#[tokio::main]
async fn main() -> Result<()> {
    // Initialize logging
    logging::init_logging()?;

    // Load configuration
    let config = config::load_config()?;
    let addr = config.addr;

    // Build our application state
    let state = Arc::new(AppState::new(config));

    let app = routes::router(state);

    tracing::info!("listening on {}", addr);

    let listener = tokio::net::TcpListener::bind(addr).await?;
    axum::serve(listener, app).await?;

    Ok(())
}

/// Application state: the configuration plus the one currently loaded table.
/// An upload swaps the whole table; readers take an `Arc` snapshot and
/// compute without holding the lock.
pub struct AppState {
    config: config::Config,
    current: RwLock<Option<Arc<Table>>>,
}

impl AppState {
    fn new(config: config::Config) -> Self {
        Self {
            config,
            current: RwLock::new(None),
        }
    }

    pub fn replace_table(&self, table: Table) -> Arc<Table> {
        let table = Arc::new(table);
        *self.current.write() = Some(table.clone());
        tracing::debug!("Replaced current table");
        table
    }

    pub fn max_file_size(&self) -> usize {
        self.config.max_file_size
    }

    pub fn snapshot(&self) -> Result<Arc<Table>, AppError> {
        self.current.read().clone().ok_or(AppError::NoTable)
    }
}
