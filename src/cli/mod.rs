use anyhow::{Context, Result};
use clap::{Parser, Subcommand, ValueEnum};

use crate::api;
use crate::application::LedgerService;
use crate::config::{
    DEFAULT_DATABASE, DEFAULT_HOST, DEFAULT_PORT, LogConfig, LogFormat, ServerConfig,
};
use crate::domain::{
    AccountId, CURRENCY, DEFAULT_LIMIT, format_cents, format_total_cents, parse_cents,
};
use crate::telemetry;

/// Tally - Account Ledger
#[derive(Parser)]
#[command(name = "tally")]
#[command(about = "An account ledger with atomic deposits, withdrawals and transaction history")]
#[command(version)]
pub struct Cli {
    /// Database file path
    #[arg(short, long, env = "TALLY_DATABASE", default_value = DEFAULT_DATABASE)]
    pub database: String,

    /// Enable verbose output
    #[arg(short, long, global = true)]
    pub verbose: bool,

    /// Log output format
    #[arg(long, value_enum, default_value_t = LogFormat::Text, global = true)]
    pub log_format: LogFormat,

    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Initialize a new database
    Init,

    /// Account management commands
    #[command(subcommand)]
    Account(AccountCommands),

    /// Deposit funds into an account
    Deposit {
        /// Account ID
        account_id: AccountId,

        /// Amount to deposit (e.g., "50.00" or "50")
        amount: String,

        /// Description of the deposit
        #[arg(short, long)]
        description: Option<String>,
    },

    /// Withdraw funds from an account
    Withdraw {
        /// Account ID
        account_id: AccountId,

        /// Amount to withdraw (e.g., "50.00" or "50")
        amount: String,

        /// Description of the withdrawal
        #[arg(short, long)]
        description: Option<String>,
    },

    /// Show the balance of an account
    Balance {
        /// Account ID
        account_id: AccountId,
    },

    /// List an account's recent transactions, newest first
    Transactions {
        /// Account ID
        account_id: AccountId,

        /// Maximum number of transactions to show (1-100)
        #[arg(short, long, default_value_t = DEFAULT_LIMIT, allow_negative_numbers = true)]
        limit: i64,
    },

    /// Verify ledger integrity
    Check,

    /// Export data to CSV or JSON
    Export {
        /// What to export
        #[arg(value_enum)]
        export_type: ExportKind,

        /// Output file (stdout if omitted)
        #[arg(short, long)]
        output: Option<String>,
    },

    /// Run the HTTP server
    Serve {
        /// Address to bind
        #[arg(long, env = "TALLY_HOST", default_value = DEFAULT_HOST)]
        host: String,

        /// Port to listen on
        #[arg(short, long, env = "PORT", default_value_t = DEFAULT_PORT)]
        port: u16,
    },
}

/// Export targets. CSV for the single tables, JSON for the whole ledger.
#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum ExportKind {
    /// Every account as CSV
    Accounts,
    /// Every transaction as CSV
    Transactions,
    /// Accounts and transactions as one JSON document
    Full,
}

#[derive(Subcommand)]
pub enum AccountCommands {
    /// Create a new account
    Create {
        /// Account holder's full name
        name: String,

        /// Unique email address
        email: String,

        /// Opening deposit (e.g., "100.00")
        #[arg(short, long)]
        initial_deposit: Option<String>,
    },

    /// List active accounts, newest first
    List {
        /// Maximum number of accounts to show (1-100)
        #[arg(short, long, default_value_t = DEFAULT_LIMIT, allow_negative_numbers = true)]
        limit: i64,
    },

    /// Show detailed account information
    Show {
        /// Account ID
        account_id: AccountId,
    },

    /// Deactivate an account (deposits and withdrawals are refused afterwards)
    Deactivate {
        /// Account ID
        account_id: AccountId,
    },
}

impl Cli {
    pub async fn run(self) -> Result<()> {
        let long_running = matches!(self.command, Commands::Serve { .. });
        telemetry::init(&LogConfig::for_command(
            self.verbose,
            long_running,
            self.log_format,
        ));

        match self.command {
            Commands::Init => {
                let service = LedgerService::init(&self.database).await?;
                service.close().await;
                println!("Database initialized: {}", self.database);
                Ok(())
            }

            Commands::Serve { host, port } => {
                let service = LedgerService::init(&self.database).await?;
                api::serve(service, &ServerConfig { host, port }).await
            }

            command => {
                let service = LedgerService::connect(&self.database)
                    .await
                    .with_context(|| {
                        format!(
                            "Cannot open database '{}'. Run `tally init` first.",
                            self.database
                        )
                    })?;
                let result = run_command(&service, command).await;
                service.close().await;
                result
            }
        }
    }
}

async fn run_command(service: &LedgerService, command: Commands) -> Result<()> {
    match command {
        Commands::Account(account_cmd) => run_account_command(service, account_cmd).await?,

        Commands::Deposit {
            account_id,
            amount,
            description,
        } => {
            let amount_cents =
                parse_cents(&amount).context("Invalid amount format. Use '50.00' or '50'")?;
            let result = service
                .deposit(account_id, amount_cents, description)
                .await?;
            println!(
                "Deposited {} into account {} (transaction {})",
                format_cents(result.transaction.amount),
                account_id,
                result.transaction.id
            );
            println!("New balance: {} {}", format_cents(result.new_balance), CURRENCY);
        }

        Commands::Withdraw {
            account_id,
            amount,
            description,
        } => {
            let amount_cents =
                parse_cents(&amount).context("Invalid amount format. Use '50.00' or '50'")?;
            let result = service
                .withdraw(account_id, amount_cents, description)
                .await?;
            println!(
                "Withdrew {} from account {} (transaction {})",
                format_cents(result.transaction.amount),
                account_id,
                result.transaction.id
            );
            println!("New balance: {} {}", format_cents(result.new_balance), CURRENCY);
        }

        Commands::Balance { account_id } => {
            let view = service.get_balance(account_id).await?;
            println!(
                "{} <{}>: {} {}{}",
                view.name,
                view.email,
                format_cents(view.balance),
                view.currency,
                if view.is_active { "" } else { " (inactive)" }
            );
        }

        Commands::Transactions { account_id, limit } => {
            run_transactions_command(service, account_id, limit).await?
        }

        Commands::Check => run_check_command(service).await?,

        Commands::Export {
            export_type,
            output,
        } => run_export_command(service, export_type, output.as_deref()).await?,

        Commands::Init | Commands::Serve { .. } => unreachable!("handled before connecting"),
    }

    Ok(())
}

async fn run_account_command(service: &LedgerService, cmd: AccountCommands) -> Result<()> {
    match cmd {
        AccountCommands::Create {
            name,
            email,
            initial_deposit,
        } => {
            let initial_cents = initial_deposit
                .map(|a| parse_cents(&a))
                .transpose()
                .context("Invalid initial deposit format. Use '100.00' or '100'")?
                .unwrap_or(0);

            let account = service.create_account(name, email, initial_cents).await?;
            println!(
                "Created account {}: {} <{}> with balance {} {}",
                account.id,
                account.name,
                account.email,
                format_cents(account.balance),
                CURRENCY
            );
        }

        AccountCommands::List { limit } => {
            let accounts = service.list_accounts(limit).await?;
            if accounts.is_empty() {
                println!("No accounts found.");
            } else {
                println!(
                    "{:<6} {:<20} {:<28} {:>12}",
                    "ID", "NAME", "EMAIL", "BALANCE"
                );
                println!("{}", "-".repeat(69));
                for account in accounts {
                    println!(
                        "{:<6} {:<20} {:<28} {:>12}",
                        account.id,
                        truncate(&account.name, 20),
                        truncate(&account.email, 28),
                        format_cents(account.balance)
                    );
                }
            }
        }

        AccountCommands::Show { account_id } => {
            let account = service.get_account(account_id).await?;
            let history = service.get_transactions(account_id, 1).await?;

            println!("Account: {}", account.id);
            println!("  Name:         {}", account.name);
            println!("  Email:        {}", account.email);
            println!(
                "  Status:       {}",
                if account.is_active { "active" } else { "inactive" }
            );
            println!(
                "  Created:      {}",
                account.created_at.format("%Y-%m-%d %H:%M:%S")
            );
            println!();
            println!(
                "  Balance:      {} {}",
                format_cents(account.balance),
                CURRENCY
            );
            println!("  Transactions: {}", history.total_count);
            if let Some(last) = history.transactions.first() {
                println!(
                    "  Last activity: {}",
                    last.timestamp.format("%Y-%m-%d %H:%M:%S")
                );
            }
        }

        AccountCommands::Deactivate { account_id } => {
            let account = service.deactivate_account(account_id).await?;
            println!("Deactivated account {}: {}", account.id, account.name);
        }
    }
    Ok(())
}

async fn run_transactions_command(
    service: &LedgerService,
    account_id: AccountId,
    limit: i64,
) -> Result<()> {
    let history = service.get_transactions(account_id, limit).await?;

    if history.transactions.is_empty() {
        println!("No transactions found for {}.", history.account_name);
        return Ok(());
    }

    println!(
        "{:<6} {:<20} {:<11} {:>12} {:>14} DESCRIPTION",
        "ID", "DATE", "TYPE", "AMOUNT", "BALANCE AFTER"
    );
    println!("{}", "-".repeat(90));

    for tx in &history.transactions {
        println!(
            "{:<6} {:<20} {:<11} {:>12} {:>14} {}",
            tx.id,
            tx.timestamp.format("%Y-%m-%d %H:%M:%S"),
            tx.transaction_type,
            format_cents(tx.amount),
            format_cents(tx.balance_after),
            truncate(&tx.description, 30)
        );
    }
    println!();
    println!(
        "Showing {} of {} transaction(s) for {}",
        history.transactions.len(),
        history.total_count,
        history.account_name
    );
    Ok(())
}

async fn run_check_command(service: &LedgerService) -> Result<()> {
    println!("Checking ledger integrity...\n");

    let report = service.check_integrity().await?;

    println!(
        "Accounts:     {} ({} active)",
        report.account_count, report.active_account_count
    );
    println!("Transactions: {}", report.transaction_count);
    println!(
        "Total held:   {} {}",
        format_total_cents(report.total_balance),
        CURRENCY
    );
    println!();

    if report.is_healthy() {
        println!("Ledger is consistent.");
    } else {
        println!("Issues found:");
        for issue in &report.issues {
            println!("  - {}", issue);
        }
        anyhow::bail!("Ledger integrity check failed");
    }

    Ok(())
}

async fn run_export_command(
    service: &LedgerService,
    export_type: ExportKind,
    output: Option<&str>,
) -> Result<()> {
    use crate::io::Exporter;
    use std::fs::File;
    use std::io::{Write, stdout};

    let exporter = Exporter::new(service);

    let writer: Box<dyn Write> = match output {
        Some(path) => {
            let file = File::create(path)
                .with_context(|| format!("Failed to create output file: {}", path))?;
            Box::new(file)
        }
        None => Box::new(stdout()),
    };

    match export_type {
        ExportKind::Accounts => {
            let count = exporter.export_accounts_csv(writer).await?;
            if output.is_some() {
                eprintln!("Exported {} accounts", count);
            }
        }
        ExportKind::Transactions => {
            let count = exporter.export_transactions_csv(writer).await?;
            if output.is_some() {
                eprintln!("Exported {} transactions", count);
            }
        }
        ExportKind::Full => {
            let snapshot = exporter.export_full_json(writer).await?;
            if output.is_some() {
                eprintln!(
                    "Exported full ledger: {} accounts, {} transactions",
                    snapshot.accounts.len(),
                    snapshot.transactions.len()
                );
            }
        }
    }

    Ok(())
}

fn truncate(s: &str, max_len: usize) -> String {
    if s.chars().count() <= max_len {
        s.to_string()
    } else {
        let kept: String = s.chars().take(max_len.saturating_sub(3)).collect();
        format!("{}...", kept)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_truncate() {
        assert_eq!(truncate("Ana", 10), "Ana");
        assert_eq!(truncate("Groceries at the market", 10), "Groceri...");
        assert_eq!(truncate("Café crème brûlée", 8), "Café ...");
    }

    #[test]
    fn test_parses_negative_limit() {
        let cli = Cli::try_parse_from(["tally", "transactions", "3", "--limit", "-5"]).unwrap();
        match cli.command {
            Commands::Transactions { account_id, limit } => {
                assert_eq!(account_id, 3);
                assert_eq!(limit, -5);
            }
            _ => panic!("expected transactions command"),
        }
    }

    #[test]
    fn test_export_kind_checked_at_parse_time() {
        let cli = Cli::try_parse_from(["tally", "export", "full", "-o", "ledger.json"]).unwrap();
        match cli.command {
            Commands::Export {
                export_type,
                output,
            } => {
                assert_eq!(export_type, ExportKind::Full);
                assert_eq!(output.as_deref(), Some("ledger.json"));
            }
            _ => panic!("expected export command"),
        }

        assert!(Cli::try_parse_from(["tally", "export", "bogus", "-o", "out.csv"]).is_err());
    }

    #[test]
    fn test_serve_defaults() {
        let cli = Cli::try_parse_from(["tally", "serve", "--port", "7860"]).unwrap();
        match cli.command {
            Commands::Serve { port, .. } => assert_eq!(port, 7860),
            _ => panic!("expected serve command"),
        }
    }
}
