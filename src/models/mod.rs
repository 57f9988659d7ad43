//! Data models shared across the wallet service.
//!
//! # Key Types
//!
//! - [`WalletTransaction`] - One ledger transaction as stored locally
//! - [`NewWalletTransaction`] - Insert shape for rows fetched from the ledger
//! - [`TransactionDirection`] - Whether a transaction debits or credits the wallet

use chrono::NaiveDateTime;
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

pub mod transaction_direction;
pub use transaction_direction::TransactionDirection;

/// Database primary key type (SQLite integer).
pub type Id = i64;

/// One ledger transaction as stored in the local history table.
///
/// `ledger_index` is the transaction's position in the remote ledger's
/// per-account history; it is what makes inserts idempotent.
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct WalletTransaction {
    pub id: Id,
    pub wallet_id: String,
    pub ledger_index: i64,
    pub direction: TransactionDirection,
    /// Amount in micro-units.
    pub amount: i64,
    /// Fee in micro-units, as reported by the ledger.
    pub fee: i64,
    pub from_account: String,
    pub to_account: String,
    pub memo: Option<String>,
    #[schema(value_type = String)]
    pub occurred_at: NaiveDateTime,
}

/// Insert shape for a transaction fetched from the remote ledger, before it
/// has a local row id.
#[derive(Debug, Clone)]
pub struct NewWalletTransaction {
    pub ledger_index: i64,
    pub direction: TransactionDirection,
    pub amount: i64,
    pub fee: i64,
    pub from_account: String,
    pub to_account: String,
    pub memo: Option<String>,
    pub occurred_at: NaiveDateTime,
}
