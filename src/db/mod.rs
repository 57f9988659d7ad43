use std::path::Path;

use include_dir::{Dir, include_dir};
use log::info;
use r2d2_sqlite::SqliteConnectionManager;
use rusqlite_migration::Migrations;

mod error;
pub use error::{WalletDbError, WalletDbResult};

mod wallets;
pub use wallets::{WalletRow, get_wallet_by_name, get_wallets, insert_wallet};

mod transactions;
pub use transactions::{
    TransactionAggregates,
    count_transactions,
    get_transaction_aggregates,
    get_transactions_page,
    insert_transactions,
};

pub type SqlitePool = r2d2::Pool<SqliteConnectionManager>;

static MIGRATIONS_DIR: Dir<'static> = include_dir!("$CARGO_MANIFEST_DIR/migrations");

/// Opens (creating if needed) the wallet database, runs pending migrations
/// and returns the connection pool.
pub fn init_db(db_path: &Path) -> WalletDbResult<SqlitePool> {
    if let Some(parent) = db_path.parent() {
        std::fs::create_dir_all(parent)?;
    }

    let manager = SqliteConnectionManager::file(db_path).with_init(|conn| {
        conn.pragma_update(None, "journal_mode", "WAL")?;
        conn.pragma_update(None, "foreign_keys", "ON")
    });
    let pool = r2d2::Pool::builder().max_size(5).build(manager)?;

    let migrations = Migrations::from_directory(&MIGRATIONS_DIR)?;
    let mut conn = pool.get()?;
    migrations.to_latest(&mut conn)?;

    info!(path:% = db_path.display(); "Database initialized");
    Ok(pool)
}

#[cfg(test)]
pub(crate) mod test_utils {
    use super::*;

    /// Fresh on-disk database in a temp dir; the dir guard must stay alive
    /// for the duration of the test.
    pub(crate) fn test_pool() -> (tempfile::TempDir, SqlitePool) {
        let dir = tempfile::tempdir().unwrap();
        let pool = init_db(&dir.path().join("wallet.db")).unwrap();
        (dir, pool)
    }
}
