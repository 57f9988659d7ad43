//! Wallet domain logic: provisioning, key export, balance and history.

pub mod error;
mod history;
mod provision;

pub use error::{WalletError, WalletResult};
pub use history::{SyncReport, WalletHistoryPage, sync_wallet_history, wallet_balance, wallet_history};
pub use provision::{create_wallet, derive_account_id, export_secret_key, list_wallets, load_wallet};

pub(crate) use history::sync_wallet_row_history;
