use clap::{Parser, Subcommand};

#[derive(Parser)]
#[command(name = "walletd")]
#[command(about = "Wallet daemon and CLI", long_about = None)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Create a new wallet: generates a keypair, encrypts the secret key
    /// through the cipher worker and stores the wallet in the database
    CreateWallet {
        #[arg(short, long, help = "Name for the new wallet")]
        name: String,
        #[arg(short, long, help = "Path to the configuration file", default_value = "config/config.toml")]
        config: String,
    },
    /// List all wallets in the database
    ListWallets {
        #[arg(short, long, help = "Path to the configuration file", default_value = "config/config.toml")]
        config: String,
    },
    /// Show the ledger balance for a wallet
    Balance {
        #[arg(short, long, help = "Name of the wallet")]
        name: String,
        #[arg(short, long, help = "Path to the configuration file", default_value = "config/config.toml")]
        config: String,
    },
    /// Show locally synced transaction history for a wallet, newest first
    History {
        #[arg(short, long, help = "Name of the wallet")]
        name: String,
        #[arg(short, long, help = "Number of transactions to skip", default_value_t = 0)]
        offset: u64,
        #[arg(short, long, help = "Maximum number of transactions to show", default_value_t = 50)]
        limit: u64,
        #[arg(short, long, help = "Path to the configuration file", default_value = "config/config.toml")]
        config: String,
    },
    /// Pull new transactions for a wallet from the ledger into the database
    Sync {
        #[arg(short, long, help = "Name of the wallet")]
        name: String,
        #[arg(short, long, help = "Path to the configuration file", default_value = "config/config.toml")]
        config: String,
    },
    /// Decrypt and print a wallet's secret key in hex. The export is
    /// written to the audit log
    ExportKey {
        #[arg(short, long, help = "Name of the wallet")]
        name: String,
        #[arg(short, long, help = "Path to the configuration file", default_value = "config/config.toml")]
        config: String,
    },
    /// Run the daemon: HTTP API server plus periodic history sync
    Daemon {
        #[arg(short, long, help = "Path to the configuration file", default_value = "config/config.toml")]
        config: String,
        #[arg(long, help = "Override the API port from the configuration file")]
        api_port: Option<u16>,
    },
}
