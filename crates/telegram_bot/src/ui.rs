//! Text and keyboards sent to the chat. Everything here is pure.

use chrono::{DateTime, Utc};
use chrono_tz::Tz;
use engine::{ACCEPTED_FORMATS, Cycle, CycleReport, Money, Recorded, Summary};
use teloxide::types::{InlineKeyboardButton, InlineKeyboardMarkup};

use crate::commands::COMMANDS;

pub(crate) const VIEW_CYCLE_PREFIX: &str = "view_cycle:";

pub(crate) const NO_ACTIVE_CYCLE: &str =
    "No active accounting cycle. Use /accounting_start to begin one.";
pub(crate) const NOT_FOUND: &str = "Record not found.";
pub(crate) const GENERIC_FAILURE: &str = "Something went wrong, please try again later.";
pub(crate) const INVALID_INCOME: &str =
    "That is not a valid amount. Send the opening income as a number, e.g. 1000 or 1250.50";
pub(crate) const VIEW_USAGE: &str = "Usage: /accounting_view <cycle id>";
pub(crate) const NO_HISTORY: &str = "No accounting cycles yet.";

fn date(at: DateTime<Utc>, tz: Tz) -> String {
    at.with_timezone(&tz).format("%Y-%m-%d").to_string()
}

fn record_time(at: DateTime<Utc>, tz: Tz) -> String {
    at.with_timezone(&tz).format("%m-%d %H:%M").to_string()
}

fn signed(amount: Money) -> String {
    if amount.is_positive() {
        format!("+{amount}")
    } else {
        amount.to_string()
    }
}

pub(crate) fn welcome_text() -> String {
    format!(
        "Hi! I keep a short-term ledger for you in this chat.\n\n{}",
        help_text()
    )
}

pub(crate) fn help_text() -> String {
    let mut text = String::from("Commands:\n");
    for spec in COMMANDS.iter().filter(|spec| !spec.alias) {
        text.push_str(&format!("/{} - {}\n", spec.name, spec.description));
    }
    text.push_str("\nReply to one of my messages with amounts to record them directly.");
    text
}

pub(crate) fn unknown_command(name: &str) -> String {
    format!("Unknown command /{name}. See /help.")
}

pub(crate) fn income_prompt(replaces_active: bool) -> String {
    let mut text = String::from("Send the opening income of the new cycle, e.g. 1000");
    if replaces_active {
        text.push_str("\nThe current cycle will be ended first.");
    }
    text
}

pub(crate) fn entry_prompt() -> String {
    let mut text = String::from("Send the entry. Accepted formats:\n");
    for format in ACCEPTED_FORMATS {
        text.push_str(&format!("  {format}\n"));
    }
    text
}

fn summary_lines(summary: &Summary) -> String {
    format!(
        "Income: {}\nExpense: {}\nBalance: {}\nDays remaining: {}",
        summary.total_income, summary.total_expense, summary.balance, summary.days_remaining
    )
}

pub(crate) fn render_started(cycle: &Cycle, tz: Tz) -> String {
    format!(
        "Accounting cycle started.\nOpening income: {}\nPeriod: {} to {}",
        cycle.opening_income,
        date(cycle.start_time, tz),
        date(cycle.end_time, tz)
    )
}

pub(crate) fn render_recorded(recorded: &Recorded) -> String {
    let mut text = String::new();
    for entry in &recorded.entries {
        text.push_str(&format!(
            "Recorded {}: {}\n",
            entry.description,
            signed(entry.amount)
        ));
    }
    text.push('\n');
    text.push_str(&summary_lines(&recorded.summary));
    text
}

pub(crate) fn render_report(report: &CycleReport, tz: Tz) -> String {
    let cycle = &report.cycle;
    let state = if cycle.is_active { "active" } else { "ended" };

    let mut text = format!(
        "Cycle {}\n{} to {} ({state})\nOpening income: {}\n\n",
        cycle.id,
        date(cycle.start_time, tz),
        date(cycle.end_time, tz),
        cycle.opening_income
    );

    if cycle.records.is_empty() {
        text.push_str("No records yet.\n");
    }
    for record in &cycle.records {
        text.push_str(&format!(
            "{}  {}  {}\n",
            record_time(record.timestamp, tz),
            record.description,
            signed(record.amount)
        ));
    }

    text.push('\n');
    text.push_str(&summary_lines(&report.summary));
    text
}

pub(crate) fn render_ended(report: &CycleReport, tz: Tz) -> String {
    format!("Accounting cycle ended.\n\n{}", render_report(report, tz))
}

pub(crate) fn render_history(reports: &[CycleReport], tz: Tz) -> (String, InlineKeyboardMarkup) {
    let mut text = String::from("Your accounting cycles:\n");
    let mut rows: Vec<Vec<InlineKeyboardButton>> = Vec::new();

    for (index, report) in reports.iter().enumerate() {
        let cycle = &report.cycle;
        let marker = if cycle.is_active { " (active)" } else { "" };
        text.push_str(&format!(
            "{}. {} to {}  balance {}{marker}\n",
            index + 1,
            date(cycle.start_time, tz),
            date(cycle.end_time, tz),
            report.summary.balance
        ));
        rows.push(vec![InlineKeyboardButton::callback(
            format!("{}. {}", index + 1, date(cycle.start_time, tz)),
            format!("{VIEW_CYCLE_PREFIX}{}", cycle.id),
        )]);
    }

    (text, InlineKeyboardMarkup::new(rows))
}
