//! Chat commands and their lookup table.

use teloxide::types::BotCommand;

#[derive(Clone, Debug, PartialEq, Eq)]
pub(crate) enum Command {
    Start,
    Help,
    AccountingStart,
    AccountingExpense,
    AccountingEnd,
    AccountingStatus,
    AccountingHistory,
    AccountingView { cycle_id: Option<String> },
    Unknown(String),
}

pub(crate) struct CommandSpec {
    pub name: &'static str,
    pub description: &'static str,
    /// Hidden from `/help` and from the client menu.
    pub alias: bool,
    build: fn(Option<&str>) -> Command,
}

const VIEW_PREFIX: &str = "accounting_view_";

pub(crate) const COMMANDS: &[CommandSpec] = &[
    CommandSpec {
        name: "start",
        description: "Show the welcome message",
        alias: false,
        build: |_| Command::Start,
    },
    CommandSpec {
        name: "help",
        description: "List the available commands",
        alias: false,
        build: |_| Command::Help,
    },
    CommandSpec {
        name: "accounting_start",
        description: "Start a new accounting cycle",
        alias: false,
        build: |_| Command::AccountingStart,
    },
    CommandSpec {
        name: "accounting_expense",
        description: "Record an expense or an income",
        alias: false,
        build: |_| Command::AccountingExpense,
    },
    CommandSpec {
        name: "accounting_record",
        description: "Record an expense or an income",
        alias: true,
        build: |_| Command::AccountingExpense,
    },
    CommandSpec {
        name: "accounting_end",
        description: "End the current cycle",
        alias: false,
        build: |_| Command::AccountingEnd,
    },
    CommandSpec {
        name: "accounting_status",
        description: "Show the current cycle",
        alias: false,
        build: |_| Command::AccountingStatus,
    },
    CommandSpec {
        name: "accounting_history",
        description: "List your past cycles",
        alias: false,
        build: |_| Command::AccountingHistory,
    },
    CommandSpec {
        name: "accounting_view",
        description: "Show a cycle by id",
        alias: false,
        build: |arg| Command::AccountingView {
            cycle_id: arg.map(str::to_string),
        },
    },
];

/// Parses `/name`, `/name@bot` and `/name argument`. Returns `None` when
/// `text` is not a command at all.
pub(crate) fn parse_command(text: &str) -> Option<Command> {
    let trimmed = text.trim();
    let body = trimmed.strip_prefix('/')?;

    let mut parts = body.splitn(2, char::is_whitespace);
    let head = parts.next().unwrap_or_default();
    let arg = parts.next().map(str::trim).filter(|a| !a.is_empty());
    let name = head.split('@').next().unwrap_or_default();

    if let Some(cycle_id) = name.strip_prefix(VIEW_PREFIX).filter(|id| !id.is_empty()) {
        return Some(Command::AccountingView {
            cycle_id: Some(cycle_id.to_string()),
        });
    }

    let command = COMMANDS
        .iter()
        .find(|spec| spec.name == name)
        .map(|spec| (spec.build)(arg))
        .unwrap_or_else(|| Command::Unknown(name.to_string()));
    Some(command)
}

/// Menu shown by Telegram clients.
pub(crate) fn bot_commands() -> Vec<BotCommand> {
    COMMANDS
        .iter()
        .filter(|spec| !spec.alias)
        .map(|spec| BotCommand::new(spec.name, spec.description))
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn plain_text_is_not_a_command() {
        assert_eq!(parse_command("lunch-10"), None);
        assert_eq!(parse_command(""), None);
    }

    #[test]
    fn known_commands_resolve() {
        assert_eq!(
            parse_command("/accounting_start"),
            Some(Command::AccountingStart)
        );
        assert_eq!(parse_command("  /help  "), Some(Command::Help));
        assert_eq!(
            parse_command("/accounting_record"),
            Some(Command::AccountingExpense)
        );
    }

    #[test]
    fn bot_mention_is_stripped() {
        assert_eq!(
            parse_command("/accounting_end@syft_bot"),
            Some(Command::AccountingEnd)
        );
    }

    #[test]
    fn view_accepts_both_forms() {
        let expected = Some(Command::AccountingView {
            cycle_id: Some("abc-123".to_string()),
        });
        assert_eq!(parse_command("/accounting_view abc-123"), expected);
        assert_eq!(parse_command("/accounting_view_abc-123"), expected);
        assert_eq!(parse_command("/accounting_view_abc-123@syft_bot"), expected);
        assert_eq!(
            parse_command("/accounting_view"),
            Some(Command::AccountingView { cycle_id: None })
        );
    }

    #[test]
    fn unknown_commands_are_reported() {
        assert_eq!(
            parse_command("/nope now"),
            Some(Command::Unknown("nope".to_string()))
        );
    }

    #[test]
    fn menu_hides_aliases() {
        let menu = bot_commands();
        assert!(menu.iter().all(|c| c.command != "accounting_record"));
        assert_eq!(menu.len(), COMMANDS.len() - 1);
    }
}
