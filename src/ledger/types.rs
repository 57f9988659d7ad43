//! Response types for the ledger's REST API.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Response of `GET /api/v1/accounts/{id}/balance`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BalanceResponse {
    /// Current balance in micro-units.
    pub balance: i64,
}

/// Response of `GET /api/v1/accounts/{id}/transactions`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TransactionsResponse {
    /// Total number of transactions the ledger holds for the account,
    /// independent of the requested page.
    pub total_transactions: u64,

    /// The requested page, oldest first. Empty when `limit=0`.
    #[serde(default)]
    pub transactions: Vec<LedgerTransaction>,
}

/// One transaction as reported by the ledger.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LedgerTransaction {
    /// Position in the account's history, oldest first, starting at 0.
    pub index: i64,

    pub from_account: String,
    pub to_account: String,

    /// Transferred amount in micro-units.
    pub amount: i64,

    /// Fee in micro-units; the ledger omits it for fee-less entries.
    #[serde(default)]
    pub fee: i64,

    #[serde(default)]
    pub memo: Option<String>,

    pub occurred_at: DateTime<Utc>,
}
