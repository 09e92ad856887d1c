//! Server state - wires the services together

use crate::accounts::AccountService;
use crate::catalog::CatalogService;
use crate::core::Config;
use crate::orders::{OrderEngine, OrderStorage};
use shared::{AppError, AppResult};
use std::path::Path;
use std::sync::Arc;
use tokio_util::sync::CancellationToken;

/// Shared handles to every service, created once at startup
///
/// This is what an HTTP layer (or an embedding test) holds. Each service
/// owns its own database file under `config.data_dir`.
pub struct ServerState {
    pub config: Config,
    pub accounts: Arc<AccountService>,
    pub catalog: Arc<CatalogService>,
    pub engine: Arc<OrderEngine>,
    shutdown: CancellationToken,
}

impl ServerState {
    /// Open all databases and wire the services
    ///
    /// Must be called from within a tokio runtime (the order engine's
    /// expiry scheduler spawns onto it).
    pub fn init(config: Config) -> AppResult<Self> {
        std::fs::create_dir_all(&config.data_dir)
            .map_err(|e| AppError::internal(format!("failed to create data dir: {e}")))?;
        let dir = Path::new(&config.data_dir);

        let accounts = Arc::new(AccountService::open(dir.join("accounts.redb"))?);
        let catalog = Arc::new(CatalogService::open(
            dir.join("catalog.redb"),
            accounts.clone(),
        )?);
        let storage = OrderStorage::open(dir.join("orders.redb"))?;

        let shutdown = CancellationToken::new();
        let engine = OrderEngine::new(
            storage,
            accounts.clone(),
            catalog.clone(),
            config.order_ttl,
            shutdown.child_token(),
        );

        // Orders left pending by a previous run get a fresh expiry timer
        engine.rearm_pending()?;

        tracing::info!(data_dir = %config.data_dir, "Server state initialized");
        Ok(Self {
            config,
            accounts,
            catalog,
            engine,
            shutdown,
        })
    }

    /// Stop background work (outstanding expiry timers)
    pub fn shutdown(&self) {
        self.shutdown.cancel();
    }
}
