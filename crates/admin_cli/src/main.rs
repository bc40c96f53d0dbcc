use std::error::Error;

use chrono::Utc;
use clap::{Args, Parser, Subcommand};
use engine::{
    Currency, Engine, LoanListFilter, LoanStatus, Money, NewTransactionCmd, TransactionKind,
};
use migration::MigratorTrait;
use sea_orm::{Database, DatabaseConnection};
use uuid::Uuid;

#[derive(Parser, Debug)]
#[command(name = "dompet_admin")]
#[command(about = "Admin utilities for Dompet (bootstrap wallets, repair loans)")]
struct Cli {
    /// Database connection string (also read from `DATABASE_URL`).
    #[arg(long, env = "DATABASE_URL", default_value = "sqlite:./dompet.db?mode=rwc")]
    database_url: String,

    /// Tracing level for the engine.
    #[arg(long, default_value = "warn")]
    log_level: String,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Apply pending migrations and exit.
    Migrate,
    Wallet(Wallet),
    Loans(Loans),
    /// Recompute paid amount and status of one loan, or of every loan.
    Reconcile(ReconcileArgs),
    /// Recompute every wallet balance from its transactions.
    RecomputeBalances,
    /// Print receivable, payable and net position.
    Positions(PositionsArgs),
}

#[derive(Args, Debug)]
struct Wallet {
    #[command(subcommand)]
    command: WalletCommand,
}

#[derive(Subcommand, Debug)]
enum WalletCommand {
    Create(WalletCreateArgs),
}

#[derive(Args, Debug)]
struct WalletCreateArgs {
    #[arg(long)]
    name: String,
    #[arg(long, default_value = "MYR")]
    currency: String,
    /// Opening balance in major units, e.g. `1250.50`.
    #[arg(long)]
    opening: Option<String>,
}

#[derive(Args, Debug)]
struct Loans {
    #[command(subcommand)]
    command: LoansCommand,
}

#[derive(Subcommand, Debug)]
enum LoansCommand {
    List(LoansListArgs),
}

#[derive(Args, Debug)]
struct LoansListArgs {
    /// `active`, `settled` or `bad_debt`.
    #[arg(long)]
    status: Option<String>,
}

#[derive(Args, Debug)]
struct ReconcileArgs {
    /// Loan id; every loan when omitted.
    #[arg(long)]
    loan: Option<Uuid>,
}

#[derive(Args, Debug)]
struct PositionsArgs {
    #[arg(long)]
    currency: Option<String>,
}

async fn connect_db(database_url: &str) -> Result<DatabaseConnection, Box<dyn Error + Send + Sync>> {
    let db = Database::connect(database_url).await?;
    migration::Migrator::up(&db, None).await?;
    tracing::debug!("database ready");
    Ok(db)
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn Error + Send + Sync>> {
    let cli = Cli::parse();

    tracing_subscriber::fmt()
        .with_env_filter(format!("engine={}", cli.log_level))
        .with_writer(std::io::stderr)
        .init();

    let db = connect_db(&cli.database_url).await?;
    let engine = Engine::builder().database(db).build().await?;

    match cli.command {
        Command::Migrate => {
            println!("migrations applied");
        }
        Command::Wallet(Wallet {
            command: WalletCommand::Create(args),
        }) => {
            let currency = Currency::try_from(args.currency.as_str())?;
            let opening = args
                .opening
                .as_deref()
                .map(|raw| Money::parse(raw, currency))
                .transpose()?;

            let wallet = engine.new_wallet(&args.name, currency).await?;
            if let Some(opening) = opening.filter(|m| m.minor() != 0) {
                let kind = if opening.minor() > 0 {
                    TransactionKind::Income
                } else {
                    TransactionKind::Expense
                };
                engine
                    .create_transaction(
                        NewTransactionCmd::new(kind, opening.minor().abs(), wallet.id, Utc::now())
                            .description(format!("opening balance for wallet '{}'", wallet.name)),
                    )
                    .await?;
            }
            println!("created wallet: {} ({})", wallet.name, wallet.id);
        }
        Command::Loans(Loans {
            command: LoansCommand::List(args),
        }) => {
            let filter = LoanListFilter {
                status: args
                    .status
                    .as_deref()
                    .map(LoanStatus::try_from)
                    .transpose()?,
                ..Default::default()
            };
            let today = Utc::now().date_naive();
            for loan in engine.list_loans(&filter).await? {
                println!(
                    "{}  {:<6} {:<20} {:>14} / {:<14} {:>3}%  {}{}",
                    loan.id,
                    loan.kind.as_str(),
                    loan.person,
                    Money::new(loan.paid_amount_minor, loan.currency),
                    Money::new(loan.total_amount_minor, loan.currency),
                    loan.progress_percent(),
                    loan.status.as_str(),
                    if loan.is_overdue(today) { " (overdue)" } else { "" },
                );
            }
        }
        Command::Reconcile(args) => match args.loan {
            Some(loan_id) => {
                let loan = engine.reconcile_loan(loan_id).await?;
                println!(
                    "{}: paid {} status {}",
                    loan.id,
                    Money::new(loan.paid_amount_minor, loan.currency),
                    loan.status.as_str()
                );
            }
            None => {
                let changed = engine.reconcile_all_loans().await?;
                println!("reconciled all loans, {changed} changed");
            }
        },
        Command::RecomputeBalances => {
            let count = engine.recompute_balances().await?;
            println!("recomputed {count} wallet balances");
        }
        Command::Positions(args) => {
            let currency = args
                .currency
                .as_deref()
                .map(Currency::try_from)
                .transpose()?;
            let positions = engine.loan_positions(currency).await?;
            let show = |minor| match currency {
                Some(currency) => Money::new(minor, currency).to_string(),
                None => format!("{minor} (minor units, mixed currencies)"),
            };
            println!("receivable: {}", show(positions.total_receivable_minor));
            println!("payable:    {}", show(positions.total_payable_minor));
            println!("net:        {}", show(positions.net_position_minor));
            println!("loans:      {}", positions.loan_count);
            if positions.integrity_warnings > 0 {
                eprintln!(
                    "warning: {} integrity warnings (skipped rows or net overflow), run `reconcile`",
                    positions.integrity_warnings
                );
            }
        }
    }

    Ok(())
}
