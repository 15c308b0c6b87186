use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use std::fs::File;
use std::io::Write;

use crate::application::LedgerService;
use crate::domain::{format_cents, parse_cents};
use crate::io::Exporter;
use crate::storage::SqliteStore;

/// Cassa - Minimal Account Ledger
#[derive(Parser)]
#[command(name = "cassa")]
#[command(about = "A minimal account ledger with deposits, withdrawals and atomic transfers")]
#[command(version)]
pub struct Cli {
    /// Database file path
    #[arg(short, long, default_value = "cassa.db")]
    pub database: String,

    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Initialize a new database
    Init,

    /// Deposit an amount into an account (creates the account if missing)
    Deposit {
        /// Account id
        account: String,

        /// Amount to deposit (e.g., "50.00" or "50")
        amount: String,
    },

    /// Withdraw an amount from an account
    Withdraw {
        /// Account id
        account: String,

        /// Amount to withdraw (e.g., "50.00" or "50")
        amount: String,
    },

    /// Transfer an amount between two accounts
    Transfer {
        /// Amount to transfer (e.g., "50.00" or "50")
        amount: String,

        /// Origin account id
        #[arg(long)]
        from: String,

        /// Destination account id (created if missing)
        #[arg(long)]
        to: String,
    },

    /// Show balance for one account or all accounts
    Balance {
        /// Account id (omit for all accounts)
        account: Option<String>,
    },

    /// List recorded transactions
    Transactions {
        /// Maximum number of transactions to show
        #[arg(short, long)]
        limit: Option<usize>,
    },

    /// Verify that stored balances match the transaction log
    Check,

    /// Clear every account and transaction
    Reset,

    /// Export data to CSV or JSON
    Export {
        /// What to export: transactions, balances, snapshot
        export_type: String,

        /// Output file (stdout if omitted)
        #[arg(short, long)]
        output: Option<String>,
    },
}

impl Cli {
    pub async fn run(self) -> Result<()> {
        match self.command {
            Commands::Init => {
                LedgerService::init(&self.database).await?;
                println!("Database initialized: {}", self.database);
            }

            Commands::Deposit { account, amount } => {
                let service = LedgerService::connect(&self.database).await?;
                let cents = parse_cents(&amount)
                    .context("Invalid amount format. Use '50.00' or '50'")?;

                let result = service.deposit(&account, cents).await?;
                println!(
                    "Deposited {} into {} (balance {})",
                    format_cents(cents),
                    result.id,
                    format_cents(result.balance)
                );
            }

            Commands::Withdraw { account, amount } => {
                let service = LedgerService::connect(&self.database).await?;
                let cents = parse_cents(&amount)
                    .context("Invalid amount format. Use '50.00' or '50'")?;

                let result = service.withdraw(&account, cents).await?;
                println!(
                    "Withdrew {} from {} (balance {})",
                    format_cents(cents),
                    result.id,
                    format_cents(result.balance)
                );
            }

            Commands::Transfer { amount, from, to } => {
                let service = LedgerService::connect(&self.database).await?;
                let cents = parse_cents(&amount)
                    .context("Invalid amount format. Use '50.00' or '50'")?;

                let outcome = service.transfer(&from, &to, cents).await?;
                println!(
                    "Transferred {} from {} (balance {}) to {} (balance {})",
                    format_cents(cents),
                    outcome.origin.id,
                    format_cents(outcome.origin.balance),
                    outcome.destination.id,
                    format_cents(outcome.destination.balance)
                );
            }

            Commands::Balance { account } => {
                let service = LedgerService::connect(&self.database).await?;
                run_balance_command(&service, account).await?;
            }

            Commands::Transactions { limit } => {
                let service = LedgerService::connect(&self.database).await?;
                run_transactions_command(&service, limit).await?;
            }

            Commands::Check => {
                let service = LedgerService::connect(&self.database).await?;
                run_check_command(&service).await?;
            }

            Commands::Reset => {
                let service = LedgerService::connect(&self.database).await?;
                service.reset().await?;
                println!("Ledger reset: all accounts and transactions cleared");
            }

            Commands::Export {
                export_type,
                output,
            } => {
                let service = LedgerService::connect(&self.database).await?;
                run_export_command(&service, &export_type, output.as_deref()).await?;
            }
        }

        Ok(())
    }
}

async fn run_balance_command(
    service: &LedgerService<SqliteStore>,
    account: Option<String>,
) -> Result<()> {
    match account {
        Some(id) => {
            let account = service.get_balance(&id).await?;
            println!("{}: {}", account.id, format_cents(account.balance));
        }
        None => {
            let accounts = service.accounts().await?;
            if accounts.is_empty() {
                println!("No accounts found.");
                return Ok(());
            }

            println!("{:<20} {:>14}", "ACCOUNT", "BALANCE");
            println!("{}", "-".repeat(35));
            let mut total = 0;
            for account in &accounts {
                println!("{:<20} {:>14}", account.id, format_cents(account.balance));
                total += account.balance;
            }
            println!("{}", "-".repeat(35));
            println!("{:<20} {:>14}", "TOTAL", format_cents(total));
        }
    }
    Ok(())
}

async fn run_transactions_command(
    service: &LedgerService<SqliteStore>,
    limit: Option<usize>,
) -> Result<()> {
    let records = service.transactions().await?;
    if records.is_empty() {
        println!("No transactions recorded.");
        return Ok(());
    }

    let shown = match limit {
        Some(n) if n < records.len() => &records[records.len() - n..],
        _ => &records[..],
    };

    println!(
        "{:<6} {:<10} {:>12} {:<16} {:<16} {}",
        "ID", "TYPE", "AMOUNT", "ORIGIN", "DESTINATION", "TIMESTAMP"
    );
    for record in shown {
        println!(
            "{:<6} {:<10} {:>12} {:<16} {:<16} {}",
            record.id,
            record.kind,
            format_cents(record.amount),
            record.origin.as_deref().unwrap_or("-"),
            record.destination.as_deref().unwrap_or("-"),
            record.timestamp.format("%Y-%m-%d %H:%M:%S")
        );
    }
    Ok(())
}

async fn run_check_command(service: &LedgerService<SqliteStore>) -> Result<()> {
    let report = service.check_integrity().await?;

    println!("Accounts:     {}", report.account_count);
    println!("Transactions: {}", report.transaction_count);

    if report.is_ok() {
        println!("Integrity check passed");
        return Ok(());
    }

    for mismatch in &report.mismatches {
        println!(
            "MISMATCH {}: stored {} but log replays to {}",
            mismatch.account_id,
            format_cents(mismatch.stored),
            format_cents(mismatch.replayed)
        );
    }
    for id in &report.negative_balances {
        println!("NEGATIVE BALANCE {}", id);
    }
    if report.invalid_amounts > 0 {
        println!("{} record(s) with non-positive amounts", report.invalid_amounts);
    }

    anyhow::bail!("Integrity check failed")
}

async fn run_export_command(
    service: &LedgerService<SqliteStore>,
    export_type: &str,
    output: Option<&str>,
) -> Result<()> {
    let exporter = Exporter::new(service);

    let mut writer: Box<dyn Write> = match output {
        Some(path) => Box::new(File::create(path).context("Failed to create output file")?),
        None => Box::new(std::io::stdout()),
    };

    match export_type {
        "transactions" => {
            let count = exporter.export_transactions_csv(&mut writer).await?;
            eprintln!("Exported {} transactions", count);
        }
        "balances" => {
            let count = exporter.export_balances_csv(&mut writer).await?;
            eprintln!("Exported {} balances", count);
        }
        "snapshot" => {
            let snapshot = exporter.export_snapshot_json(&mut writer).await?;
            eprintln!(
                "Exported snapshot: {} accounts, {} transactions",
                snapshot.accounts.len(),
                snapshot.transactions.len()
            );
        }
        other => {
            anyhow::bail!(
                "Unknown export type '{}'. Use: transactions, balances, snapshot",
                other
            );
        }
    }

    Ok(())
}
