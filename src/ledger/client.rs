use std::time::Duration;

use log::debug;
use serde::de::DeserializeOwned;
use url::Url;

use super::error::LedgerError;
use super::types::{BalanceResponse, TransactionsResponse};

const DEFAULT_TIMEOUT_SECS: u64 = 30;
const DEFAULT_MAX_RETRIES: u32 = 3;

/// Client for the remote ledger's REST API with exponential-backoff retry
/// on transient failures.
#[derive(Clone)]
pub struct LedgerClient {
    base_url: Url,
    client: reqwest_middleware::ClientWithMiddleware,
}

impl LedgerClient {
    pub fn new(base_url: Url) -> Result<Self, anyhow::Error> {
        Self::with_config(base_url, DEFAULT_MAX_RETRIES, Duration::from_secs(DEFAULT_TIMEOUT_SECS))
    }

    pub fn with_config(base_url: Url, max_retries: u32, timeout: Duration) -> Result<Self, anyhow::Error> {
        let retry_policy = reqwest_retry::policies::ExponentialBackoff::builder().build_with_max_retries(max_retries);

        let inner_client = reqwest::Client::builder().timeout(timeout).build()?;

        let client = reqwest_middleware::ClientBuilder::new(inner_client)
            .with(reqwest_retry::RetryTransientMiddleware::new_with_policy(retry_policy))
            .build();

        Ok(Self { base_url, client })
    }

    pub fn base_url(&self) -> &Url {
        &self.base_url
    }

    /// Current balance for a ledger account, in micro-units.
    pub async fn account_balance(&self, account_id: &str) -> Result<i64, LedgerError> {
        let response: BalanceResponse = self.get(&format!("api/v1/accounts/{account_id}/balance")).await?;

        Ok(response.balance)
    }

    /// One page of an account's transactions, oldest first.
    pub async fn account_transactions(
        &self,
        account_id: &str,
        offset: u64,
        limit: u64,
    ) -> Result<TransactionsResponse, LedgerError> {
        self.get(&format!(
            "api/v1/accounts/{account_id}/transactions?offset={offset}&limit={limit}"
        ))
        .await
    }

    /// Total number of transactions the ledger holds for the account,
    /// via a `limit=0` probe.
    pub async fn total_transactions(&self, account_id: &str) -> Result<u64, LedgerError> {
        let response = self.account_transactions(account_id, 0, 0).await?;

        Ok(response.total_transactions)
    }

    async fn get<T: DeserializeOwned>(&self, path: &str) -> Result<T, LedgerError> {
        let url = self.base_url.join(path)?;
        debug!(url:% = url; "Ledger request");

        let resp = self.client.get(url).send().await?;

        if !resp.status().is_success() {
            let status = resp.status();
            let body = resp
                .text()
                .await
                .unwrap_or_else(|_| "Failed to read response body".into());
            return Err(LedgerError::ServerError { status, body });
        }

        Ok(resp.json().await?)
    }
}
