//! Telegram bot.
//!
//! A thin transport over the ledger: it maps chat commands onto
//! [`engine::Ledger`] operations and renders the results.

use std::sync::Arc;

use chrono_tz::Tz;
use engine::{ActiveChats, Ledger};
use teloxide::prelude::*;

mod commands;
mod handlers;
mod state;
mod ui;

#[derive(Debug, thiserror::Error)]
pub enum BuildError {
    #[error("telegram token is missing")]
    MissingToken,
    #[error("a ledger is required")]
    MissingLedger,
    #[error("an active chats registry is required")]
    MissingChats,
}

#[derive(Clone)]
pub struct ConfigParameters {
    allowed_users: Option<Vec<UserId>>,
    ledger: Arc<Ledger>,
    chats: ActiveChats,
    sessions: state::SessionStore,
    timezone: Tz,
}

pub struct Bot {
    token: String,
    allowed_users: Option<Vec<UserId>>,
    ledger: Arc<Ledger>,
    chats: ActiveChats,
    timezone: Tz,
}

impl Bot {
    pub fn builder() -> BotBuilder {
        BotBuilder::default()
    }

    /// Runs the dispatcher until ctrl-c.
    pub async fn run(&self) {
        tracing::info!(timezone = %self.timezone, "Starting telegram bot...");

        let bot = teloxide::Bot::new(&self.token);
        if let Err(err) = bot.set_my_commands(commands::bot_commands()).await {
            tracing::warn!("failed to publish the command menu: {err}");
        }

        let parameters = ConfigParameters {
            allowed_users: self.allowed_users.clone(),
            ledger: self.ledger.clone(),
            chats: self.chats.clone(),
            sessions: state::SessionStore::default(),
            timezone: self.timezone,
        };

        let handler = dptree::entry()
            .branch(Update::filter_message().endpoint(handlers::handle_message))
            .branch(Update::filter_callback_query().endpoint(handlers::handle_callback))
            .branch(Update::filter_my_chat_member().endpoint(handlers::handle_membership));

        Dispatcher::builder(bot, handler)
            .dependencies(dptree::deps![parameters])
            .default_handler(|upd| async move {
                tracing::debug!("Unhandled update: {:?}", upd);
            })
            .error_handler(LoggingErrorHandler::with_custom_text(
                "An error has occurred in the dispatcher",
            ))
            .enable_ctrlc_handler()
            .build()
            .dispatch()
            .await;
    }
}

pub struct BotBuilder {
    token: String,
    allowed_users: Option<Vec<UserId>>,
    ledger: Option<Arc<Ledger>>,
    chats: Option<ActiveChats>,
    timezone: Tz,
}

impl Default for BotBuilder {
    fn default() -> Self {
        Self {
            token: String::new(),
            allowed_users: None,
            ledger: None,
            chats: None,
            timezone: chrono_tz::UTC,
        }
    }
}

impl BotBuilder {
    pub fn token(mut self, token: &str) -> BotBuilder {
        self.token = token.to_string();
        self
    }

    /// An empty list lets everybody in.
    pub fn allowed_users(mut self, allowed_users: Vec<UserId>) -> BotBuilder {
        if !allowed_users.is_empty() {
            self.allowed_users = Some(allowed_users);
        }
        self
    }

    pub fn ledger(mut self, ledger: Arc<Ledger>) -> BotBuilder {
        self.ledger = Some(ledger);
        self
    }

    pub fn chats(mut self, chats: ActiveChats) -> BotBuilder {
        self.chats = Some(chats);
        self
    }

    /// Time zone used to display dates.
    pub fn timezone(mut self, timezone: Tz) -> BotBuilder {
        self.timezone = timezone;
        self
    }

    pub fn build(self) -> Result<Bot, BuildError> {
        tracing::info!("Initializing telegram bot...");
        if self.token.trim().is_empty() {
            return Err(BuildError::MissingToken);
        }

        Ok(Bot {
            token: self.token,
            allowed_users: self.allowed_users,
            ledger: self.ledger.ok_or(BuildError::MissingLedger)?,
            chats: self.chats.ok_or(BuildError::MissingChats)?,
            timezone: self.timezone,
        })
    }
}
