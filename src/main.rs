use std::path::Path;

use clap::Parser;
use num_format::{Locale, ToFormattedString};

use walletd::cli::{Cli, Commands};
use walletd::config::load_configuration;
use walletd::daemon::Daemon;
use walletd::log::init_logging;
use walletd::{db, wallet};

#[tokio::main]
async fn main() -> Result<(), anyhow::Error> {
    init_logging();
    let cli = Cli::parse();

    match cli.command {
        Commands::CreateWallet { name, config } => {
            let config = load_configuration(Path::new(&config))?;
            let db_pool = db::init_db(&config.database.file)?;
            let executor = config.vault.executor()?;

            let wallet = wallet::create_wallet(&db_pool, &executor, &name).await?;
            executor.shutdown().await;

            println!("Created wallet '{}'", wallet.name);
            println!("  public key: {}", wallet.public_key);
            println!("  account id: {}", wallet.account_id);
            Ok(())
        },
        Commands::ListWallets { config } => {
            let config = load_configuration(Path::new(&config))?;
            let db_pool = db::init_db(&config.database.file)?;

            let wallets = wallet::list_wallets(&db_pool).await?;
            if wallets.is_empty() {
                println!("No wallets found.");
            }
            for wallet in wallets {
                println!(
                    "{}  account {}  created {}",
                    wallet.name, wallet.account_id, wallet.created_at
                );
            }
            Ok(())
        },
        Commands::Balance { name, config } => {
            let config = load_configuration(Path::new(&config))?;
            let db_pool = db::init_db(&config.database.file)?;
            let ledger = config.ledger.client()?;

            let balance = wallet::wallet_balance(&db_pool, &ledger, &name).await?;
            println!("Balance for '{}': {}", name, balance.to_formatted_string(&Locale::en));
            Ok(())
        },
        Commands::History {
            name,
            offset,
            limit,
            config,
        } => {
            let config = load_configuration(Path::new(&config))?;
            let db_pool = db::init_db(&config.database.file)?;

            let page = wallet::wallet_history(&db_pool, &name, offset, limit).await?;
            println!(
                "{} transactions for '{}' (showing {} from offset {})",
                page.total,
                name,
                page.transactions.len(),
                page.offset
            );
            for tx in &page.transactions {
                println!(
                    "  #{} {} {} {} -> {} ({})",
                    tx.ledger_index,
                    tx.direction,
                    tx.amount.to_formatted_string(&Locale::en),
                    tx.from_account,
                    tx.to_account,
                    tx.occurred_at
                );
            }
            println!(
                "credits: {}  debits: {}  net: {}",
                page.total_credits.to_formatted_string(&Locale::en),
                page.total_debits.to_formatted_string(&Locale::en),
                page.net.to_formatted_string(&Locale::en)
            );
            Ok(())
        },
        Commands::Sync { name, config } => {
            let config = load_configuration(Path::new(&config))?;
            let db_pool = db::init_db(&config.database.file)?;
            let ledger = config.ledger.client()?;

            let report = wallet::sync_wallet_history(&db_pool, &ledger, &name).await?;
            println!(
                "Synced '{}': {} on the ledger, {} were already local, {} inserted",
                name, report.remote_total, report.local_total, report.inserted
            );
            Ok(())
        },
        Commands::ExportKey { name, config } => {
            let config = load_configuration(Path::new(&config))?;
            let db_pool = db::init_db(&config.database.file)?;
            let executor = config.vault.executor()?;

            let secret_hex = wallet::export_secret_key(&db_pool, &executor, &name).await?;
            executor.shutdown().await;

            // Only the key goes to stdout so the output can be piped.
            println!("{secret_hex}");
            Ok(())
        },
        Commands::Daemon { config, api_port } => {
            let mut config = load_configuration(Path::new(&config))?;
            if let Some(port) = api_port {
                config.daemon.api_port = port;
            }
            Daemon::new(config).run().await
        },
    }
}
