use std::{path::PathBuf, sync::Arc, time::Duration};

use anyhow::{Result, bail};
use serde::{Deserialize, Serialize};
use url::Url;

use crate::cipher::{CipherExecutor, ExecutorConfig, XChaChaCipher};
use crate::ledger::LedgerClient;

/// Top-level configuration, deserialized from `config.toml` plus
/// `WALLETD_*` environment overrides.
#[derive(Debug, Clone, Default, Deserialize, Serialize)]
#[serde(default)]
pub struct WalletdConfig {
    pub vault: VaultConfig,
    pub ledger: LedgerConfig,
    pub database: DatabaseConfig,
    pub daemon: DaemonConfig,
}

#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct VaultConfig {
    pub secret: String,
    pub idle_timeout_secs: u64,
    pub queue_capacity: usize,
}

impl Default for VaultConfig {
    fn default() -> Self {
        Self {
            secret: String::new(),
            idle_timeout_secs: 30,
            queue_capacity: 64,
        }
    }
}

impl VaultConfig {
    /// Builds the cipher executor for this vault.
    ///
    /// # Errors
    ///
    /// Fails when `secret` is unset, since an empty secret would silently
    /// encrypt every wallet under a well-known key.
    pub fn executor(&self) -> Result<CipherExecutor> {
        if self.secret.is_empty() {
            bail!("vault.secret is not set; add it to the config file or set WALLETD_VAULT__SECRET");
        }
        let config = ExecutorConfig {
            idle_timeout: Duration::from_secs(self.idle_timeout_secs),
            queue_capacity: self.queue_capacity,
        };
        Ok(CipherExecutor::new(Arc::new(XChaChaCipher::new(&self.secret)), config))
    }
}

#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct LedgerConfig {
    pub base_url: String,
    pub request_timeout_secs: u64,
    pub max_retries: u32,
}

impl Default for LedgerConfig {
    fn default() -> Self {
        Self {
            base_url: "http://127.0.0.1:9731".to_string(),
            request_timeout_secs: 10,
            max_retries: 3,
        }
    }
}

impl LedgerConfig {
    pub fn client(&self) -> Result<LedgerClient> {
        let base_url = Url::parse(&self.base_url)?;
        LedgerClient::with_config(
            base_url,
            self.max_retries,
            Duration::from_secs(self.request_timeout_secs),
        )
    }
}

#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct DatabaseConfig {
    pub file: PathBuf,
}

impl Default for DatabaseConfig {
    fn default() -> Self {
        Self {
            file: PathBuf::from("data/walletd.db"),
        }
    }
}

#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct DaemonConfig {
    pub api_port: u16,
    pub sync_interval_secs: u64,
}

impl Default for DaemonConfig {
    fn default() -> Self {
        Self {
            api_port: 9000,
            sync_interval_secs: 60,
        }
    }
}
