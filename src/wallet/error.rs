use thiserror::Error;

use crate::cipher::TransformError;
use crate::db::WalletDbError;
use crate::ledger::LedgerError;

#[derive(Debug, Error)]
pub enum WalletError {
    #[error("Database error: {0}")]
    Database(#[from] WalletDbError),

    #[error("Cipher task failed: {0}")]
    Transform(#[from] TransformError),

    #[error("Ledger request failed: {0}")]
    Ledger(#[from] LedgerError),

    #[error("Wallet '{0}' not found")]
    NotFound(String),

    #[error("Key material error: {0}")]
    Key(String),

    #[error("Blocking task panicked: {0}")]
    Join(#[from] tokio::task::JoinError),
}

// Convenience alias
pub type WalletResult<T> = Result<T, WalletError>;
