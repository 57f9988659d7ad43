pub mod api;
pub mod cipher;
pub mod cli;
pub mod config;
pub mod daemon;
pub mod db;
pub mod ledger;
pub mod log;
pub mod models;
pub mod tasks;
pub mod wallet;

pub use crate::api::ApiDoc;
pub use crate::cipher::{CipherExecutor, CipherOp, TransformError};
pub use crate::db::init_db;
pub use crate::models::WalletTransaction;
pub use crate::wallet::WalletError;
