use std::{error::Error, sync::Arc};

use chrono_tz::Tz;
use engine::{ActiveChats, KvStore, Ledger, MemoryStore, SqliteStore};
use migration::{Migrator, MigratorTrait};
use settings::Database;
use teloxide::types::UserId;

mod settings;

#[tokio::main]
async fn main() -> Result<(), Box<dyn Error + Send + Sync>> {
    let settings = settings::Settings::new()?;
    let mut tasks = tokio::task::JoinSet::new();

    tracing_subscriber::fmt()
        .with_env_filter(format!(
            "syft={level},telegram_bot={level},engine={level},migration={level}",
            level = settings.app.level
        ))
        .init();

    let store = open_store(&settings.database).await?;
    let ledger = Ledger::builder()
        .store(store.clone())
        .horizon_days(settings.ledger.horizon_days)
        .build()?;
    let ledger = Arc::new(ledger);
    let chats = ActiveChats::load(store).await?;

    if let Some(telegram) = settings.telegram {
        let timezone = parse_timezone(telegram.timezone.as_deref())?;
        let ledger = ledger.clone();
        let chats = chats.clone();

        tasks.spawn(async move {
            tracing::info!("Found telegram settings...");
            match telegram_bot::Bot::builder()
                .token(&telegram.token)
                .allowed_users(telegram.allowed_users.into_iter().map(UserId).collect())
                .ledger(ledger)
                .chats(chats)
                .timezone(timezone)
                .build()
            {
                Ok(bot) => bot.run().await,
                Err(err) => tracing::error!("failed to initialize telegram bot: {err}"),
            }
        });
    } else {
        tracing::warn!("No telegram settings found, nothing to run");
    }

    while tasks.join_next().await.is_some() {
        tasks.shutdown().await;
    }

    if let Err(err) = chats.flush().await {
        tracing::error!("failed to persist active chats: {err}");
    }
    tracing::info!("Shut down");

    Ok(())
}

async fn open_store(
    config: &Database,
) -> Result<Arc<dyn KvStore>, Box<dyn Error + Send + Sync>> {
    match config {
        Database::Memory => {
            tracing::warn!("Using an in-memory store, data is lost on exit");
            Ok(Arc::new(MemoryStore::new()))
        }
        Database::Sqlite(path) => {
            let database = sea_orm::Database::connect(format!("sqlite:{path}?mode=rwc")).await?;
            Migrator::up(&database, None).await?;
            tracing::info!(%path, "Opened sqlite store");
            Ok(Arc::new(SqliteStore::new(database)))
        }
    }
}

fn parse_timezone(name: Option<&str>) -> Result<Tz, String> {
    match name {
        None => Ok(chrono_tz::UTC),
        Some(name) => name
            .parse::<Tz>()
            .map_err(|err| format!("invalid timezone {name:?}: {err}")),
    }
}
