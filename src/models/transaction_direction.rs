use serde::{Deserialize, Serialize};
use std::str::FromStr;
use utoipa::ToSchema;

/// Whether a ledger transaction credits or debits the owning wallet,
/// derived from which side of the transfer the wallet's account is on.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, ToSchema)]
#[serde(rename_all = "UPPERCASE")]
pub enum TransactionDirection {
    Credit,
    Debit,
}

impl std::fmt::Display for TransactionDirection {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            TransactionDirection::Credit => write!(f, "CREDIT"),
            TransactionDirection::Debit => write!(f, "DEBIT"),
        }
    }
}

impl FromStr for TransactionDirection {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "CREDIT" => Ok(TransactionDirection::Credit),
            "DEBIT" => Ok(TransactionDirection::Debit),
            _ => Err(format!("Invalid TransactionDirection: {}", s)),
        }
    }
}
