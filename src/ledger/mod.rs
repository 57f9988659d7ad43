//! HTTP access to the remote ledger service.
//!
//! The ledger is the source of truth for account balances and transaction
//! history; this module wraps its REST API with retrying request plumbing.
//!
//! # Components
//!
//! - [`LedgerClient`] - retrying client for the ledger's REST endpoints
//! - [`LedgerError`] - error variants for ledger communication
//! - Response types ([`BalanceResponse`], [`TransactionsResponse`],
//!   [`LedgerTransaction`]) for deserializing ledger replies
//!
//! # Pagination
//!
//! Transaction history is paged with `offset`/`limit` query parameters;
//! every page response carries `total_transactions`, and a `limit=0` request
//! returns just that count with an empty page, which is the cheap way to
//! probe how far the remote history extends.

mod client;
mod error;
mod types;

pub use client::LedgerClient;
pub use error::LedgerError;
pub use types::{BalanceResponse, LedgerTransaction, TransactionsResponse};
