use std::{error::Error, sync::Arc};

use clap::{Args, Parser, Subcommand};
use engine::{ActiveChats, CycleReport, Ledger, LedgerError, Scope, SqliteStore};
use migration::MigratorTrait;
use sea_orm::{Database, DatabaseConnection};

#[derive(Parser, Debug)]
#[command(name = "syft_admin")]
#[command(about = "Operator utilities for the Syft ledger store")]
struct Cli {
    /// Database connection string (also read from `DATABASE_URL`).
    #[arg(long, env = "DATABASE_URL", default_value = "sqlite:./syft.db?mode=rwc")]
    database_url: String,

    /// Print JSON instead of text.
    #[arg(long, global = true)]
    json: bool,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// List every cycle of a user in a chat, oldest first.
    History(ScopeArgs),
    /// Show one cycle with its records.
    Show { cycle_id: String },
    /// Show the active cycle of a user in a chat.
    Status(ScopeArgs),
    /// End the active cycle of a user in a chat.
    End(ScopeArgs),
    /// List the group chats that used the bot.
    Chats,
}

#[derive(Args, Debug)]
struct ScopeArgs {
    /// Chat id, negative for groups.
    #[arg(long, allow_negative_numbers = true)]
    group: i64,
    /// Telegram user id.
    #[arg(long, allow_negative_numbers = true)]
    user: i64,
}

impl ScopeArgs {
    fn scope(&self) -> Scope {
        Scope::new(self.group, self.user)
    }
}

async fn connect_db(
    database_url: &str,
) -> Result<DatabaseConnection, Box<dyn Error + Send + Sync>> {
    let db = Database::connect(database_url).await?;
    migration::Migrator::up(&db, None).await?;
    Ok(db)
}

fn print_summary_line(report: &CycleReport) {
    let cycle = &report.cycle;
    println!(
        "{}  {} .. {}  {:<6}  income {}  expense {}  balance {}  records {}",
        cycle.id,
        cycle.start_time.format("%Y-%m-%d %H:%M"),
        cycle.end_time.format("%Y-%m-%d %H:%M"),
        if cycle.is_active { "active" } else { "ended" },
        report.summary.total_income,
        report.summary.total_expense,
        report.summary.balance,
        cycle.records.len(),
    );
}

fn print_report(report: &CycleReport) {
    print_summary_line(report);
    println!("  opening income {}", report.cycle.opening_income);
    for record in &report.cycle.records {
        println!(
            "  {}  {:>12}  {}",
            record.timestamp.to_rfc3339(),
            record.amount.to_string(),
            record.description
        );
    }
    println!("  days remaining {}", report.summary.days_remaining);
}

fn print_json<T: serde::Serialize + ?Sized>(
    value: &T,
) -> Result<(), Box<dyn Error + Send + Sync>> {
    println!("{}", serde_json::to_string_pretty(value)?);
    Ok(())
}

/// Business errors exit with a message, storage errors bubble up.
fn exit_on_ledger_error(err: LedgerError) -> Box<dyn Error + Send + Sync> {
    match err {
        LedgerError::NoActiveCycle | LedgerError::NotFound(_) | LedgerError::Parse(_) => {
            eprintln!("{err}");
            std::process::exit(1);
        }
        LedgerError::Persistence(_) | LedgerError::InvalidHorizon(_) => err.into(),
    }
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn Error + Send + Sync>> {
    let cli = Cli::parse();

    let db = connect_db(&cli.database_url).await?;
    let store = Arc::new(SqliteStore::new(db));
    let ledger = Ledger::builder().store(store.clone()).build()?;

    match cli.command {
        Command::History(args) => {
            let reports = ledger
                .history_reports(args.scope())
                .await
                .map_err(exit_on_ledger_error)?;
            if cli.json {
                print_json(&reports)?;
            } else if reports.is_empty() {
                println!("no cycles for {}", args.scope());
            } else {
                reports.iter().for_each(print_summary_line);
            }
        }
        Command::Show { cycle_id } => {
            let report = ledger.cycle(&cycle_id).await.map_err(exit_on_ledger_error)?;
            if cli.json {
                print_json(&report)?;
            } else {
                print_report(&report);
            }
        }
        Command::Status(args) => {
            let report = ledger
                .current(args.scope())
                .await
                .map_err(exit_on_ledger_error)?;
            if cli.json {
                print_json(&report)?;
            } else {
                print_report(&report);
            }
        }
        Command::End(args) => {
            let report = ledger
                .end_cycle(args.scope())
                .await
                .map_err(exit_on_ledger_error)?;
            if cli.json {
                print_json(&report)?;
            } else {
                println!("ended cycle:");
                print_report(&report);
            }
        }
        Command::Chats => {
            let chats = ActiveChats::load(store).await?.list().await;
            if cli.json {
                print_json(&chats)?;
            } else {
                chats.iter().for_each(|chat_id| println!("{chat_id}"));
            }
        }
    }

    Ok(())
}
