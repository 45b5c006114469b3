use engine::{LedgerError, Money, Scope};
use teloxide::{
    prelude::*,
    types::{CallbackQuery, ChatId, ChatMemberUpdated, User},
};

use crate::{
    ConfigParameters,
    commands::{Command, parse_command},
    state::PendingAction,
    ui,
};

pub(crate) async fn handle_message(
    bot: Bot,
    msg: Message,
    cfg: ConfigParameters,
) -> ResponseResult<()> {
    if !is_allowed(&cfg, msg.from.as_ref()) {
        return Ok(());
    }

    let Some(from) = msg.from.as_ref() else {
        return Ok(());
    };
    let Some(text) = msg.text() else {
        return Ok(());
    };
    let chat_id = msg.chat.id;
    let scope = scope_of(chat_id, from);

    // A command always wins over a pending prompt.
    if let Some(command) = parse_command(text) {
        cfg.sessions.clear(scope).await;
        return run_command(&bot, chat_id, scope, &cfg, command).await;
    }

    if let Some(pending) = cfg.sessions.take_pending(scope).await {
        return handle_pending(&bot, chat_id, scope, &cfg, pending, text).await;
    }

    if replies_to_bot(&msg) {
        handle_reply(&bot, chat_id, scope, &cfg, text).await?;
    }

    Ok(())
}

pub(crate) async fn handle_callback(
    bot: Bot,
    q: CallbackQuery,
    cfg: ConfigParameters,
) -> ResponseResult<()> {
    if !is_allowed(&cfg, Some(&q.from)) {
        return Ok(());
    }

    let Some(message) = q.message.as_ref() else {
        return Ok(());
    };
    let chat_id = message.chat().id;

    let _ = bot.answer_callback_query(q.id.clone()).await;

    let Some(data) = q.data.as_deref() else {
        return Ok(());
    };

    if let Some(cycle_id) = data.strip_prefix(ui::VIEW_CYCLE_PREFIX) {
        let scope = scope_of(chat_id, &q.from);
        show_cycle(&bot, chat_id, scope, &cfg, cycle_id).await?;
    } else {
        tracing::debug!(data, "ignoring unknown callback data");
    }

    Ok(())
}

/// Keeps the registry in sync when the bot joins or leaves a group.
pub(crate) async fn handle_membership(
    update: ChatMemberUpdated,
    cfg: ConfigParameters,
) -> ResponseResult<()> {
    if update.chat.is_private() {
        return Ok(());
    }
    let chat_id = update.chat.id.0;

    let result = if update.new_chat_member.is_present() {
        cfg.chats.add(chat_id).await
    } else {
        cfg.chats.remove(chat_id).await
    };
    if let Err(err) = result {
        tracing::error!(chat_id, "failed to update chat registry: {err}");
    }

    Ok(())
}

async fn run_command(
    bot: &Bot,
    chat_id: ChatId,
    scope: Scope,
    cfg: &ConfigParameters,
    command: Command,
) -> ResponseResult<()> {
    match command {
        Command::Start => {
            bot.send_message(chat_id, ui::welcome_text()).await?;
        }
        Command::Help => {
            bot.send_message(chat_id, ui::help_text()).await?;
        }
        Command::AccountingStart => {
            register_chat(cfg, chat_id).await;
            let replaces_active = cfg.ledger.has_active_cycle(scope).await;
            cfg.sessions
                .update(scope, |s| s.pending = Some(PendingAction::Income))
                .await;
            bot.send_message(chat_id, ui::income_prompt(replaces_active))
                .await?;
        }
        Command::AccountingExpense => {
            if !cfg.ledger.has_active_cycle(scope).await {
                bot.send_message(chat_id, ui::NO_ACTIVE_CYCLE).await?;
                return Ok(());
            }
            cfg.sessions
                .update(scope, |s| s.pending = Some(PendingAction::Entry))
                .await;
            bot.send_message(chat_id, ui::entry_prompt()).await?;
        }
        Command::AccountingEnd => {
            let text = match cfg.ledger.end_cycle(scope).await {
                Ok(report) => ui::render_ended(&report, cfg.timezone),
                Err(err) => error_text(&err, scope),
            };
            bot.send_message(chat_id, text).await?;
        }
        Command::AccountingStatus => {
            let text = match cfg.ledger.current(scope).await {
                Ok(report) => ui::render_report(&report, cfg.timezone),
                Err(err) => error_text(&err, scope),
            };
            bot.send_message(chat_id, text).await?;
        }
        Command::AccountingHistory => {
            show_history(bot, chat_id, scope, cfg).await?;
        }
        Command::AccountingView { cycle_id } => match cycle_id {
            Some(cycle_id) => show_cycle(bot, chat_id, scope, cfg, &cycle_id).await?,
            None => {
                bot.send_message(chat_id, ui::VIEW_USAGE).await?;
            }
        },
        Command::Unknown(name) => {
            bot.send_message(chat_id, ui::unknown_command(&name)).await?;
        }
    }

    Ok(())
}

async fn handle_pending(
    bot: &Bot,
    chat_id: ChatId,
    scope: Scope,
    cfg: &ConfigParameters,
    pending: PendingAction,
    text: &str,
) -> ResponseResult<()> {
    match pending {
        PendingAction::Income => {
            let Ok(opening_income) = text.trim().parse::<Money>() else {
                cfg.sessions
                    .update(scope, |s| s.pending = Some(PendingAction::Income))
                    .await;
                bot.send_message(chat_id, ui::INVALID_INCOME).await?;
                return Ok(());
            };

            let text = match cfg.ledger.start_cycle(scope, opening_income).await {
                Ok(cycle) => ui::render_started(&cycle, cfg.timezone),
                Err(err) => error_text(&err, scope),
            };
            bot.send_message(chat_id, text).await?;
        }
        PendingAction::Entry => {
            let text = match cfg.ledger.record_text(scope, text).await {
                Ok(recorded) => ui::render_recorded(&recorded),
                Err(err @ LedgerError::Parse(_)) => {
                    cfg.sessions
                        .update(scope, |s| s.pending = Some(PendingAction::Entry))
                        .await;
                    error_text(&err, scope)
                }
                Err(err) => error_text(&err, scope),
            };
            bot.send_message(chat_id, text).await?;
        }
    }

    Ok(())
}

async fn handle_reply(
    bot: &Bot,
    chat_id: ChatId,
    scope: Scope,
    cfg: &ConfigParameters,
    text: &str,
) -> ResponseResult<()> {
    let text = match cfg.ledger.record_extracted(scope, text).await {
        Ok(Some(recorded)) => ui::render_recorded(&recorded),
        Ok(None) => return Ok(()),
        Err(err) => error_text(&err, scope),
    };
    bot.send_message(chat_id, text).await?;
    Ok(())
}

async fn show_history(
    bot: &Bot,
    chat_id: ChatId,
    scope: Scope,
    cfg: &ConfigParameters,
) -> ResponseResult<()> {
    let reports = match cfg.ledger.history_reports(scope).await {
        Ok(reports) => reports,
        Err(err) => {
            bot.send_message(chat_id, error_text(&err, scope)).await?;
            return Ok(());
        }
    };

    if reports.is_empty() {
        bot.send_message(chat_id, ui::NO_HISTORY).await?;
        return Ok(());
    }

    let (text, keyboard) = ui::render_history(&reports, cfg.timezone);
    bot.send_message(chat_id, text)
        .reply_markup(keyboard)
        .await?;
    Ok(())
}

async fn show_cycle(
    bot: &Bot,
    chat_id: ChatId,
    scope: Scope,
    cfg: &ConfigParameters,
    cycle_id: &str,
) -> ResponseResult<()> {
    let text = match cfg.ledger.cycle(cycle_id).await {
        Ok(report) => ui::render_report(&report, cfg.timezone),
        Err(err) => error_text(&err, scope),
    };
    bot.send_message(chat_id, text).await?;
    Ok(())
}

async fn register_chat(cfg: &ConfigParameters, chat_id: ChatId) {
    if !chat_id.is_group() && !chat_id.is_channel_or_supergroup() {
        return;
    }
    if cfg.chats.contains(chat_id.0).await {
        return;
    }
    if let Err(err) = cfg.chats.add(chat_id.0).await {
        tracing::error!(chat_id = chat_id.0, "failed to register chat: {err}");
    }
}

fn scope_of(chat_id: ChatId, from: &User) -> Scope {
    Scope::new(chat_id.0, from.id.0 as i64)
}

fn replies_to_bot(msg: &Message) -> bool {
    msg.reply_to_message()
        .and_then(|reply| reply.from.as_ref())
        .is_some_and(|author| author.is_bot)
}

fn is_allowed(cfg: &ConfigParameters, from: Option<&User>) -> bool {
    let Some(from) = from else {
        return false;
    };
    match &cfg.allowed_users {
        None => true,
        Some(ids) => ids.contains(&from.id),
    }
}

fn error_text(err: &LedgerError, scope: Scope) -> String {
    if !err.is_recoverable() {
        tracing::error!(%scope, "ledger operation failed: {err}");
        return ui::GENERIC_FAILURE.to_string();
    }
    match err {
        LedgerError::NoActiveCycle => ui::NO_ACTIVE_CYCLE.to_string(),
        LedgerError::NotFound(_) => ui::NOT_FOUND.to_string(),
        _ => err.to_string(),
    }
}
