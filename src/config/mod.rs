//! Typed configuration with an embedded default file and `WALLETD_*`
//! environment overrides.

mod defaults;
mod loader;

pub use defaults::{DaemonConfig, DatabaseConfig, LedgerConfig, VaultConfig, WalletdConfig};
pub use loader::{get_default_config, load_configuration, write_config_to};
