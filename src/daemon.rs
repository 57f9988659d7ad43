//! Background daemon mode.
//!
//! This module provides the [`Daemon`] struct that orchestrates long-running
//! wallet operations: the HTTP API server and the periodic history sync
//! worker, with the cipher executor shared between them.
//!
//! # Architecture
//!
//! The daemon coordinates three components:
//!
//! 1. **API Server**: Serves HTTP endpoints for wallet operations
//! 2. **History Sync Worker**: Periodically pulls new ledger transactions
//! 3. **Cipher Executor**: Serializes key encryption onto its worker thread
//!
//! All components listen for shutdown signals and terminate gracefully. The
//! executor is shut down after the server and the sync worker have stopped,
//! so cipher work accepted before the signal still settles.
//!
//! # Usage Example
//!
//! ```ignore
//! use walletd::config::load_configuration;
//! use walletd::daemon::Daemon;
//! use std::path::Path;
//!
//! # async fn example() -> Result<(), anyhow::Error> {
//! let config = load_configuration(Path::new("config/config.toml"))?;
//! Daemon::new(config).run().await?;
//! # Ok(())
//! # }
//! ```

use std::time::Duration;

use anyhow::anyhow;
use log::{error, info};
use tokio::{signal, sync::broadcast};

use crate::{api, config::WalletdConfig, db, tasks::history_sync::HistorySyncWorker};

/// Daemon for running the wallet service in continuous background mode.
pub struct Daemon {
    config: WalletdConfig,
}

impl Daemon {
    pub fn new(config: WalletdConfig) -> Self {
        Self { config }
    }

    /// Runs the daemon until a shutdown signal is received.
    ///
    /// Blocks until Ctrl+C is pressed or a fatal startup error occurs.
    ///
    /// # Errors
    ///
    /// Fails when the database cannot be opened, the vault secret is unset,
    /// the ledger base URL is invalid, the API port cannot be bound, or a
    /// task panics during shutdown.
    pub async fn run(&self) -> Result<(), anyhow::Error> {
        info!("Daemon started. Press Ctrl+C to stop.");

        let (shutdown_tx, _) = broadcast::channel(1);

        let db_pool = db::init_db(&self.config.database.file)?;
        let executor = self.config.vault.executor()?;
        let ledger = self.config.ledger.client()?;

        let sync_worker = HistorySyncWorker::new(
            db_pool.clone(),
            ledger.clone(),
            Duration::from_secs(self.config.daemon.sync_interval_secs),
        );
        let sync_handle = sync_worker.run(shutdown_tx.subscribe());

        let router = api::create_router(db_pool, executor.clone(), ledger);
        let addr = format!("0.0.0.0:{}", self.config.daemon.api_port);
        let listener = tokio::net::TcpListener::bind(&addr)
            .await
            .map_err(|e| anyhow!("Failed to bind API server to {}: {}", addr, e))?;

        info!(address = &*addr; "API server listening");

        let mut shutdown_rx_api = shutdown_tx.subscribe();
        let api_server_handle = tokio::spawn(async move {
            axum::serve(listener, router)
                .with_graceful_shutdown(async move {
                    shutdown_rx_api.recv().await.ok();
                })
                .await
                .unwrap();
        });

        signal::ctrl_c()
            .await
            .map_err(|e| anyhow!("Failed to listen for ctrl_c: {}", e))?;
        info!("Received shutdown signal, stopping all tasks...");

        if shutdown_tx.send(()).is_err() {
            error!("Failed to send shutdown signal. All tasks may not have received it.");
        }

        let join_res = tokio::try_join!(api_server_handle, sync_handle)
            .map_err(|e| anyhow!("A task panicked during shutdown: {}", e))?;
        let (_api_res, _sync_res) = join_res;

        // Last, so transforms accepted before the signal still settle.
        executor.shutdown().await;

        info!("Daemon stopped gracefully.");
        Ok(())
    }
}
