use log::debug;
use rusqlite::{Connection, named_params};
use serde::Deserialize;
use serde_rusqlite::from_rows;

use crate::db::error::{WalletDbError, WalletDbResult};
use crate::models::{NewWalletTransaction, WalletTransaction};

/// Inserts fetched ledger transactions, skipping rows already present
/// (unique `(wallet_id, ledger_index)`). Returns how many rows were new.
pub fn insert_transactions(
    conn: &mut Connection,
    wallet_id: &str,
    records: &[NewWalletTransaction],
) -> WalletDbResult<usize> {
    if records.is_empty() {
        return Ok(0);
    }

    debug!(
        target: "audit",
        wallet_id = wallet_id,
        count = records.len();
        "DB: Inserting ledger transactions"
    );

    let tx = conn.transaction()?;
    let mut inserted = 0;

    {
        let mut stmt = tx.prepare_cached(
            r#"
            INSERT OR IGNORE INTO wallet_transactions (
                wallet_id,
                ledger_index,
                direction,
                amount,
                fee,
                from_account,
                to_account,
                memo,
                occurred_at
            )
            VALUES (
                :wallet_id,
                :ledger_index,
                :direction,
                :amount,
                :fee,
                :from_account,
                :to_account,
                :memo,
                :occurred_at
            )
            "#,
        )?;

        for record in records {
            inserted += stmt.execute(named_params! {
                ":wallet_id": wallet_id,
                ":ledger_index": record.ledger_index,
                ":direction": record.direction.to_string(),
                ":amount": record.amount,
                ":fee": record.fee,
                ":from_account": record.from_account,
                ":to_account": record.to_account,
                ":memo": record.memo,
                ":occurred_at": record.occurred_at,
            })?;
        }
    }

    tx.commit()?;
    Ok(inserted)
}

pub fn count_transactions(conn: &Connection, wallet_id: &str) -> WalletDbResult<u64> {
    let mut stmt = conn.prepare_cached(
        r#"
        SELECT COUNT(*)
        FROM wallet_transactions
        WHERE wallet_id = :wallet_id
        "#,
    )?;

    let count: i64 = stmt.query_row(named_params! { ":wallet_id": wallet_id }, |row| row.get(0))?;

    Ok(count as u64)
}

/// Newest page first: ordered by descending ledger index.
pub fn get_transactions_page(
    conn: &Connection,
    wallet_id: &str,
    offset: u64,
    limit: u64,
) -> WalletDbResult<Vec<WalletTransaction>> {
    let mut stmt = conn.prepare_cached(
        r#"
        SELECT
            id,
            wallet_id,
            ledger_index,
            direction,
            amount,
            fee,
            from_account,
            to_account,
            memo,
            REPLACE(occurred_at, ' ', 'T') as occurred_at
        FROM wallet_transactions
        WHERE wallet_id = :wallet_id
        ORDER BY ledger_index DESC
        LIMIT :limit OFFSET :offset
        "#,
    )?;

    let rows = stmt.query(named_params! {
        ":wallet_id": wallet_id,
        ":limit": limit as i64,
        ":offset": offset as i64,
    })?;
    let results: Vec<WalletTransaction> = from_rows::<WalletTransaction>(rows).collect::<Result<Vec<_>, _>>()?;

    Ok(results)
}

#[derive(Debug, Default, Deserialize)]
pub struct TransactionAggregates {
    pub total_credits: Option<i64>,
    pub total_debits: Option<i64>,
    pub max_ledger_index: Option<i64>,
}

pub fn get_transaction_aggregates(conn: &Connection, wallet_id: &str) -> WalletDbResult<TransactionAggregates> {
    let mut stmt = conn.prepare_cached(
        r#"
        SELECT
          SUM(CASE WHEN direction = 'CREDIT' THEN amount ELSE 0 END) as total_credits,
          SUM(CASE WHEN direction = 'DEBIT' THEN amount ELSE 0 END) as total_debits,
          MAX(ledger_index) as max_ledger_index
        FROM wallet_transactions
        WHERE wallet_id = :wallet_id
        "#,
    )?;

    let rows = stmt.query(named_params! { ":wallet_id": wallet_id })?;
    let result = from_rows::<TransactionAggregates>(rows)
        .next()
        .ok_or_else(|| WalletDbError::Unexpected("Aggregate query returned no rows".to_string()))??;

    Ok(result)
}
