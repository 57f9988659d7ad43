//! Wallet provisioning and key export.
//!
//! Key material leaves this module in exactly two shapes: the public key as
//! hex, and the secret key as the opaque blob produced by the cipher
//! executor. The plaintext secret is never written to the database.

use log::{info, warn};
use rand::rngs::OsRng;
use sha2::{Digest, Sha256};
use tari_crypto::keys::{PublicKey, SecretKey};
use tari_crypto::ristretto::{RistrettoPublicKey, RistrettoSecretKey};
use tari_utilities::byte_array::ByteArray;
use tari_utilities::hex::Hex;

use crate::cipher::{CipherExecutor, CipherOp};
use crate::db::{self, SqlitePool, WalletRow};
use crate::log::mask_string;
use crate::wallet::error::{WalletError, WalletResult};

/// Domain separator mixed into every derived account id.
const ACCOUNT_ID_DOMAIN: &[u8] = b"walletd.account_id.v1";

/// Stable ledger account id for a public key: SHA-256 over the domain
/// separator and the raw key bytes, hex encoded.
pub fn derive_account_id(public_key: &RistrettoPublicKey) -> String {
    let mut hasher = Sha256::new();
    hasher.update(ACCOUNT_ID_DOMAIN);
    hasher.update(public_key.as_bytes());
    hex::encode(hasher.finalize())
}

/// Provisions a new wallet under `name`.
///
/// Generates a fresh Ristretto keypair, derives the ledger account id from
/// the public key, encrypts the secret key through the cipher executor and
/// persists the result.
///
/// # Errors
///
/// - [`WalletError::Database`] if `name` or the generated public key is
///   already taken
/// - [`WalletError::Transform`] if the encrypt task fails or is refused
pub async fn create_wallet(
    db_pool: &SqlitePool,
    executor: &CipherExecutor,
    name: &str,
) -> WalletResult<WalletRow> {
    let secret_key = RistrettoSecretKey::random(&mut OsRng);
    let public_key = RistrettoPublicKey::from_secret_key(&secret_key);
    let account_id = derive_account_id(&public_key);

    let encrypted_secret_key = executor.transform(CipherOp::Encrypt, secret_key.to_hex()).await?;

    let pool = db_pool.clone();
    let wallet_name = name.to_string();
    let public_key_hex = public_key.to_hex();
    let row = tokio::task::spawn_blocking(move || {
        let conn = pool.get()?;
        db::insert_wallet(&conn, &wallet_name, &public_key_hex, &encrypted_secret_key, &account_id)?;
        db::get_wallet_by_name(&conn, &wallet_name)
    })
    .await??
    .ok_or_else(|| WalletError::NotFound(name.to_string()))?;

    info!(
        name = name,
        public_key = &*mask_string(&row.public_key),
        account_id = &*mask_string(&row.account_id);
        "Provisioned wallet"
    );

    Ok(row)
}

/// Decrypts and returns the wallet's secret key as hex.
pub async fn export_secret_key(
    db_pool: &SqlitePool,
    executor: &CipherExecutor,
    name: &str,
) -> WalletResult<String> {
    let wallet = load_wallet(db_pool, name).await?;
    let secret_hex = executor.transform(CipherOp::Decrypt, wallet.encrypted_secret_key).await?;

    // A decrypt that succeeds but does not parse means the stored blob was
    // never a secret key.
    RistrettoSecretKey::from_hex(&secret_hex)
        .map_err(|e| WalletError::Key(format!("Decrypted secret is not a valid key: {}", e)))?;

    warn!(target: "audit", name = name; "Secret key exported");

    Ok(secret_hex)
}

pub async fn load_wallet(db_pool: &SqlitePool, name: &str) -> WalletResult<WalletRow> {
    let pool = db_pool.clone();
    let wallet_name = name.to_string();

    tokio::task::spawn_blocking(move || {
        let conn = pool.get()?;
        db::get_wallet_by_name(&conn, &wallet_name)
    })
    .await??
    .ok_or_else(|| WalletError::NotFound(name.to_string()))
}

pub async fn list_wallets(db_pool: &SqlitePool) -> WalletResult<Vec<WalletRow>> {
    let pool = db_pool.clone();

    Ok(tokio::task::spawn_blocking(move || {
        let conn = pool.get()?;
        db::get_wallets(&conn)
    })
    .await??)
}

#[cfg(test)]
mod tests {
    use std::sync::Arc;
    use std::time::Duration;

    use super::*;
    use crate::cipher::{ExecutorConfig, XChaChaCipher};
    use crate::db::WalletDbError;
    use crate::db::test_utils::test_pool;

    fn executor() -> CipherExecutor {
        CipherExecutor::new(
            Arc::new(XChaChaCipher::new("provision-test-secret")),
            ExecutorConfig {
                idle_timeout: Duration::from_secs(5),
                queue_capacity: 8,
            },
        )
    }

    #[tokio::test]
    async fn provisions_a_wallet_and_round_trips_the_secret() {
        let (_dir, pool) = test_pool();
        let executor = executor();

        let row = create_wallet(&pool, &executor, "alpha").await.unwrap();
        assert_eq!(row.name, "alpha");
        assert_eq!(row.public_key.len(), 64);
        assert_eq!(row.account_id.len(), 64);
        assert_ne!(row.encrypted_secret_key, row.public_key);

        let secret_hex = export_secret_key(&pool, &executor, "alpha").await.unwrap();
        let secret = RistrettoSecretKey::from_hex(&secret_hex).unwrap();
        let public_key = RistrettoPublicKey::from_secret_key(&secret);
        assert_eq!(public_key.to_hex(), row.public_key);
        assert_eq!(derive_account_id(&public_key), row.account_id);

        executor.shutdown().await;
    }

    #[tokio::test]
    async fn duplicate_names_are_rejected() {
        let (_dir, pool) = test_pool();
        let executor = executor();

        create_wallet(&pool, &executor, "alpha").await.unwrap();
        let err = create_wallet(&pool, &executor, "alpha").await.unwrap_err();
        assert!(matches!(
            err,
            WalletError::Database(WalletDbError::DuplicateEntry(_))
        ));

        executor.shutdown().await;
    }

    #[tokio::test]
    async fn exporting_an_unknown_wallet_is_not_found() {
        let (_dir, pool) = test_pool();
        let executor = executor();

        let err = export_secret_key(&pool, &executor, "ghost").await.unwrap_err();
        assert!(matches!(err, WalletError::NotFound(name) if name == "ghost"));

        executor.shutdown().await;
    }

    #[tokio::test]
    async fn listed_wallets_carry_distinct_keys_and_accounts() {
        let (_dir, pool) = test_pool();
        let executor = executor();

        create_wallet(&pool, &executor, "alpha").await.unwrap();
        create_wallet(&pool, &executor, "beta").await.unwrap();

        let wallets = list_wallets(&pool).await.unwrap();
        assert_eq!(wallets.len(), 2);
        assert_ne!(wallets[0].public_key, wallets[1].public_key);
        assert_ne!(wallets[0].account_id, wallets[1].account_id);

        executor.shutdown().await;
    }

    #[test]
    fn account_id_derivation_is_deterministic() {
        let secret = RistrettoSecretKey::random(&mut OsRng);
        let public_key = RistrettoPublicKey::from_secret_key(&secret);

        assert_eq!(derive_account_id(&public_key), derive_account_id(&public_key));

        let other = RistrettoPublicKey::from_secret_key(&RistrettoSecretKey::random(&mut OsRng));
        assert_ne!(derive_account_id(&public_key), derive_account_id(&other));
    }
}
