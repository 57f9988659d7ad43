//! Ledger-backed wallet reads: balance, history sync and local pagination.
//!
//! Sync is delta-based. The remote total comes from a `limit=0` probe; only
//! rows past the local count are fetched, and the unique
//! `(wallet_id, ledger_index)` constraint makes replays harmless.

use log::{debug, info, warn};
use serde::Serialize;
use utoipa::ToSchema;

use crate::db::{self, SqlitePool, WalletRow};
use crate::ledger::{LedgerClient, LedgerTransaction};
use crate::log::{mask_amount, mask_string};
use crate::models::{NewWalletTransaction, TransactionDirection, WalletTransaction};
use crate::wallet::error::WalletResult;
use crate::wallet::provision::load_wallet;

/// How many ledger transactions one sync request fetches.
const SYNC_PAGE_SIZE: u64 = 100;

/// Result of one history sync pass.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, ToSchema)]
pub struct SyncReport {
    /// Transactions the ledger holds for the account.
    pub remote_total: u64,
    /// Transactions stored locally before the sync.
    pub local_total: u64,
    /// New rows written by this pass.
    pub inserted: usize,
}

/// One page of local history plus whole-history aggregates.
#[derive(Debug, Clone, Serialize, ToSchema)]
pub struct WalletHistoryPage {
    pub total: u64,
    pub offset: u64,
    pub limit: u64,
    pub total_credits: i64,
    pub total_debits: i64,
    pub net: i64,
    pub max_ledger_index: Option<i64>,
    pub transactions: Vec<WalletTransaction>,
}

/// Current balance for the wallet's ledger account, in micro-units.
pub async fn wallet_balance(db_pool: &SqlitePool, ledger: &LedgerClient, name: &str) -> WalletResult<i64> {
    let wallet = load_wallet(db_pool, name).await?;
    let balance = ledger.account_balance(&wallet.account_id).await?;

    debug!(
        name = name,
        account_id = &*mask_string(&wallet.account_id),
        balance = &*mask_amount(balance);
        "Fetched wallet balance"
    );

    Ok(balance)
}

/// Brings the named wallet's local history up to the ledger's.
pub async fn sync_wallet_history(
    db_pool: &SqlitePool,
    ledger: &LedgerClient,
    name: &str,
) -> WalletResult<SyncReport> {
    let wallet = load_wallet(db_pool, name).await?;
    sync_wallet_row_history(db_pool, ledger, &wallet).await
}

/// Sync for an already-loaded wallet row; the background sync task calls
/// this directly for each wallet it iterates.
pub(crate) async fn sync_wallet_row_history(
    db_pool: &SqlitePool,
    ledger: &LedgerClient,
    wallet: &WalletRow,
) -> WalletResult<SyncReport> {
    let remote_total = ledger.total_transactions(&wallet.account_id).await?;

    let pool = db_pool.clone();
    let wallet_id = wallet.id.clone();
    let local_total = tokio::task::spawn_blocking(move || {
        let conn = pool.get()?;
        db::count_transactions(&conn, &wallet_id)
    })
    .await??;

    if remote_total <= local_total {
        debug!(
            name = wallet.name.as_str(),
            remote_total = remote_total,
            local_total = local_total;
            "Wallet history already up to date"
        );
        return Ok(SyncReport {
            remote_total,
            local_total,
            inserted: 0,
        });
    }

    let mut inserted = 0;
    let mut offset = local_total;
    while offset < remote_total {
        let page = ledger
            .account_transactions(&wallet.account_id, offset, SYNC_PAGE_SIZE)
            .await?;
        if page.transactions.is_empty() {
            // The ledger promised more rows than it returned; stop rather
            // than spin on the same offset.
            warn!(
                name = wallet.name.as_str(),
                offset = offset,
                remote_total = remote_total;
                "Ledger returned an empty page mid-sync"
            );
            break;
        }

        let fetched = page.transactions.len() as u64;
        let records: Vec<NewWalletTransaction> = page
            .transactions
            .into_iter()
            .map(|tx| to_new_transaction(&wallet.account_id, tx))
            .collect();

        let pool = db_pool.clone();
        let wallet_id = wallet.id.clone();
        inserted += tokio::task::spawn_blocking(move || {
            let mut conn = pool.get()?;
            db::insert_transactions(&mut conn, &wallet_id, &records)
        })
        .await??;

        offset += fetched;
    }

    info!(
        name = wallet.name.as_str(),
        remote_total = remote_total,
        local_total = local_total,
        inserted = inserted;
        "Wallet history synced"
    );

    Ok(SyncReport {
        remote_total,
        local_total,
        inserted,
    })
}

/// One page of locally stored history, newest first, with aggregates over
/// the wallet's entire history.
pub async fn wallet_history(
    db_pool: &SqlitePool,
    name: &str,
    offset: u64,
    limit: u64,
) -> WalletResult<WalletHistoryPage> {
    let wallet = load_wallet(db_pool, name).await?;

    let pool = db_pool.clone();
    let wallet_id = wallet.id.clone();
    let (total, aggregates, transactions) = tokio::task::spawn_blocking(move || {
        let conn = pool.get()?;
        let total = db::count_transactions(&conn, &wallet_id)?;
        let aggregates = db::get_transaction_aggregates(&conn, &wallet_id)?;
        let transactions = db::get_transactions_page(&conn, &wallet_id, offset, limit)?;
        Ok::<_, crate::db::WalletDbError>((total, aggregates, transactions))
    })
    .await??;

    let total_credits = aggregates.total_credits.unwrap_or(0);
    let total_debits = aggregates.total_debits.unwrap_or(0);

    Ok(WalletHistoryPage {
        total,
        offset,
        limit,
        total_credits,
        total_debits,
        net: total_credits - total_debits,
        max_ledger_index: aggregates.max_ledger_index,
        transactions,
    })
}

fn to_new_transaction(account_id: &str, tx: LedgerTransaction) -> NewWalletTransaction {
    let direction = if tx.from_account == account_id {
        TransactionDirection::Debit
    } else {
        TransactionDirection::Credit
    };

    NewWalletTransaction {
        ledger_index: tx.index,
        direction,
        amount: tx.amount,
        fee: tx.fee,
        from_account: tx.from_account,
        to_account: tx.to_account,
        memo: tx.memo,
        occurred_at: tx.occurred_at.naive_utc(),
    }
}
