use chrono::NaiveDateTime;
use log::{debug, info};
use rusqlite::{Connection, named_params};
use serde::Deserialize;
use serde_rusqlite::from_rows;
use uuid::Uuid;

use crate::db::error::{WalletDbError, WalletDbResult};
use crate::log::mask_string;

/// One provisioned wallet. The secret key is stored only in its encrypted
/// form, as produced by the cipher executor.
#[derive(Debug, Clone, Deserialize)]
pub struct WalletRow {
    pub id: String,
    pub name: String,
    pub public_key: String,
    pub encrypted_secret_key: String,
    pub account_id: String,
    pub created_at: NaiveDateTime,
}

pub fn insert_wallet(
    conn: &Connection,
    name: &str,
    public_key: &str,
    encrypted_secret_key: &str,
    account_id: &str,
) -> WalletDbResult<String> {
    info!(
        target: "audit",
        name = name,
        public_key = &*mask_string(public_key),
        account_id = &*mask_string(account_id);
        "DB: Creating wallet"
    );

    let id = Uuid::new_v4().to_string();

    let res = conn.execute(
        r#"
        INSERT INTO wallets (
            id,
            name,
            public_key,
            encrypted_secret_key,
            account_id
        )
        VALUES (
            :id,
            :name,
            :public_key,
            :encrypted_secret_key,
            :account_id
        )
        "#,
        named_params! {
            ":id": id,
            ":name": name,
            ":public_key": public_key,
            ":encrypted_secret_key": encrypted_secret_key,
            ":account_id": account_id,
        },
    );

    match res {
        Ok(_) => Ok(id),
        Err(e) => {
            if let rusqlite::Error::SqliteFailure(err, _) = &e
                && err.code == rusqlite::ErrorCode::ConstraintViolation
            {
                return Err(WalletDbError::DuplicateEntry(format!(
                    "Wallet '{}' already exists or reuses a public key",
                    name
                )));
            }
            Err(WalletDbError::Rusqlite(e))
        },
    }
}

pub fn get_wallet_by_name(conn: &Connection, name: &str) -> WalletDbResult<Option<WalletRow>> {
    let mut stmt = conn.prepare_cached(
        r#"
        SELECT
            id,
            name,
            public_key,
            encrypted_secret_key,
            account_id,
            REPLACE(created_at, ' ', 'T') as created_at
        FROM wallets
        WHERE name = :name
        "#,
    )?;

    let rows = stmt.query(named_params! { ":name": name })?;
    let row = from_rows::<WalletRow>(rows).next().transpose()?;

    Ok(row)
}

pub fn get_wallets(conn: &Connection) -> WalletDbResult<Vec<WalletRow>> {
    debug!("DB: Fetching all wallets");

    let mut stmt = conn.prepare_cached(
        r#"
        SELECT
            id,
            name,
            public_key,
            encrypted_secret_key,
            account_id,
            REPLACE(created_at, ' ', 'T') as created_at
        FROM wallets
        ORDER BY created_at ASC, name ASC
        "#,
    )?;

    let rows = stmt.query([])?;
    let results: Vec<WalletRow> = from_rows::<WalletRow>(rows).collect::<Result<Vec<_>, _>>()?;

    Ok(results)
}
