use std::time::Duration;

use log::{error, info};
use tokio::{sync::broadcast, task::JoinHandle, time::interval};

use crate::db::SqlitePool;
use crate::ledger::LedgerClient;
use crate::wallet;

/// Periodically pulls every wallet's ledger history into the local database.
///
/// The first pass runs immediately on startup, then once per interval. A
/// failing wallet is logged and skipped so the remaining wallets still sync.
pub struct HistorySyncWorker {
    db_pool: SqlitePool,
    ledger: LedgerClient,
    sync_interval: Duration,
}

impl HistorySyncWorker {
    pub fn new(db_pool: SqlitePool, ledger: LedgerClient, sync_interval: Duration) -> Self {
        Self {
            db_pool,
            ledger,
            sync_interval,
        }
    }

    pub fn run(self, mut shutdown_rx: broadcast::Receiver<()>) -> JoinHandle<()> {
        tokio::spawn(async move {
            info!(interval_secs = self.sync_interval.as_secs(); "History sync task started");

            let mut interval = interval(self.sync_interval);

            loop {
                tokio::select! {
                    _ = interval.tick() => {
                        if let Err(e) = self.sync_all().await {
                            error!(error:% = e; "History sync pass failed");
                        }
                    }
                    _ = shutdown_rx.recv() => {
                        info!("History sync task received shutdown signal. Exiting gracefully.");
                        break;
                    }
                }
            }

            info!("History sync task has shut down.");
        })
    }

    async fn sync_all(&self) -> Result<(), wallet::WalletError> {
        let wallets = wallet::list_wallets(&self.db_pool).await?;

        for w in wallets {
            match wallet::sync_wallet_row_history(&self.db_pool, &self.ledger, &w).await {
                Ok(report) if report.inserted > 0 => {
                    info!(name = w.name.as_str(), inserted = report.inserted; "Synced wallet history");
                },
                Ok(_) => {},
                Err(e) => {
                    // One failing wallet must not block the others.
                    error!(name = w.name.as_str(), error:% = e; "Wallet history sync failed");
                },
            }
        }

        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use serde_json::json;
    use wiremock::matchers::{method, path, query_param};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    use super::*;
    use crate::db::{self, test_utils::test_pool};

    fn ledger_for(server: &MockServer) -> LedgerClient {
        LedgerClient::with_config(server.uri().parse().unwrap(), 0, Duration::from_secs(2)).unwrap()
    }

    fn seed_wallet(pool: &SqlitePool, name: &str, account_id: &str) -> String {
        let conn = pool.get().unwrap();
        db::insert_wallet(&conn, name, &format!("pk-{name}"), "encrypted", account_id).unwrap()
    }

    #[tokio::test]
    async fn one_failing_wallet_does_not_block_the_others() {
        let server = MockServer::start().await;
        let (_dir, pool) = test_pool();

        let broken_id = seed_wallet(&pool, "broken", "acct-broken");
        let healthy_id = seed_wallet(&pool, "healthy", "acct-healthy");

        Mock::given(method("GET"))
            .and(path("/api/v1/accounts/acct-broken/transactions"))
            .respond_with(ResponseTemplate::new(500).set_body_string("ledger exploded"))
            .mount(&server)
            .await;

        Mock::given(method("GET"))
            .and(path("/api/v1/accounts/acct-healthy/transactions"))
            .and(query_param("limit", "0"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({
                "total_transactions": 1,
                "transactions": [],
            })))
            .mount(&server)
            .await;

        Mock::given(method("GET"))
            .and(path("/api/v1/accounts/acct-healthy/transactions"))
            .and(query_param("limit", "100"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({
                "total_transactions": 1,
                "transactions": [{
                    "index": 0,
                    "from_account": "acct-other",
                    "to_account": "acct-healthy",
                    "amount": 75,
                    "occurred_at": "2026-06-01T08:30:00Z",
                }],
            })))
            .mount(&server)
            .await;

        let worker = HistorySyncWorker::new(pool.clone(), ledger_for(&server), Duration::from_secs(3600));
        worker.sync_all().await.unwrap();

        let conn = pool.get().unwrap();
        assert_eq!(db::count_transactions(&conn, &healthy_id).unwrap(), 1);
        assert_eq!(db::count_transactions(&conn, &broken_id).unwrap(), 0);
    }

    #[tokio::test]
    async fn stops_on_shutdown_signal() {
        let server = MockServer::start().await;
        let (_dir, pool) = test_pool();

        let (shutdown_tx, _) = broadcast::channel(1);
        let worker = HistorySyncWorker::new(pool, ledger_for(&server), Duration::from_secs(3600));
        let handle = worker.run(shutdown_tx.subscribe());

        shutdown_tx.send(()).unwrap();

        tokio::time::timeout(Duration::from_secs(5), handle)
            .await
            .expect("worker did not stop after shutdown")
            .unwrap();
    }
}
