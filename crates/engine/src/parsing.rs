//! Free-text ledger entry parsing.
//!
//! Two modes are supported:
//!
//! - [`parse_entry`] reads exactly one entry from a prompted reply and fails
//!   with [`ParseError`] when no accepted shape matches;
//! - [`extract_entries`] scans an un-prompted message for every amount it
//!   contains and never fails.
//!
//! Shapes accepted by [`parse_entry`], tried in order:
//!
//! 1. `100 lunch`, `-100 taxi`: leading number, sign taken literally;
//! 2. `lunch-100`, `salary+5000`, `lunch 100`, `groceries-10(not reimbursed)`:
//!    trailing number, `+` is income and anything else is an expense. An
//!    annotation in `()` or `（）` is appended to the description;
//! 3. `100-lunch`: bare split on a single `-`, always an expense.
use std::sync::LazyLock;

use regex::Regex;

use crate::Money;

/// Description used when the text carries no usable description.
pub const UNKNOWN_ITEM: &str = "unknown item";

/// Example inputs shown to the user when parsing fails.
pub const ACCEPTED_FORMATS: &[&str] = &[
    "100 lunch",
    "lunch-100",
    "-100 taxi",
    "lunch -100",
    "salary+5000",
    "groceries-10(not reimbursed)",
    "taxi-50（company paid）",
];

const DESCRIPTION_TRIM: &[char] = &[':', '：', ',', '，', '、', '.'];

// Literal patterns, checked by the tests below.
#[allow(clippy::expect_used)]
static TRAILING_AMOUNT: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(concat!(
        r"^(?P<desc>.*?)",
        r"(?P<sign>[+\-＋－]?)\s*",
        r"(?P<amount>[0-9０-９]+(?:[.．][0-9０-９]+)?)\s*",
        r"(?:[(（](?P<note>[^()（）]*)[)）])?\s*$",
    ))
    .expect("trailing amount pattern")
});

#[allow(clippy::expect_used)]
static NUMBER: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"[+\-]?[0-9]+(?:\.[0-9]+)?").expect("number pattern"));

#[allow(clippy::expect_used)]
static EXPENSE_KEYWORD: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(?i)expense|支出").expect("expense keyword pattern"));

#[allow(clippy::expect_used)]
static INCOME_KEYWORD: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(?i)income|收入").expect("income keyword pattern"));

/// One amount/description pair read from user text.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct ParsedEntry {
    pub amount: Money,
    pub description: String,
}

impl ParsedEntry {
    fn new(amount: Money, description: &str) -> Self {
        Self {
            amount,
            description: describe(description),
        }
    }
}

#[derive(Clone, Debug, PartialEq, Eq, thiserror::Error)]
pub enum ParseError {
    #[error("nothing to record\n{}", formats_help())]
    Empty,
    #[error("could not read an amount and a description\n{}", formats_help())]
    Unrecognized,
}

impl ParseError {
    /// The example inputs a user can retry with.
    pub fn accepted_formats(&self) -> &'static [&'static str] {
        ACCEPTED_FORMATS
    }
}

fn formats_help() -> String {
    let mut help = String::from("Accepted formats:");
    for (i, format) in ACCEPTED_FORMATS.iter().enumerate() {
        help.push_str(&format!("\n{}. {format}", i + 1));
    }
    help
}

fn describe(raw: &str) -> String {
    let trimmed = raw.trim();
    if trimmed.is_empty() {
        UNKNOWN_ITEM.to_string()
    } else {
        trimmed.to_string()
    }
}

/// Applies the expense-biased sign rule: only an explicit `+` means income.
fn signed(sign: &str, magnitude: Money) -> Money {
    match sign {
        "+" | "＋" => magnitude.abs(),
        _ => magnitude.as_expense(),
    }
}

/// Parses one ledger entry out of a prompted reply.
///
/// ```rust
/// use engine::{Money, parse_entry};
///
/// let entry = parse_entry("lunch-10").unwrap();
/// assert_eq!(entry.amount, Money::new(-1000));
/// assert_eq!(entry.description, "lunch");
/// ```
pub fn parse_entry(text: &str) -> Result<ParsedEntry, ParseError> {
    let text = text.trim();
    if text.is_empty() {
        return Err(ParseError::Empty);
    }

    if let Some(entry) = leading_amount(text) {
        tracing::debug!(format = "leading", "parsed ledger entry");
        return Ok(entry);
    }
    if let Some(entry) = trailing_amount(text) {
        tracing::debug!(format = "trailing", "parsed ledger entry");
        return Ok(entry);
    }
    if let Some(entry) = bare_split(text) {
        tracing::debug!(format = "split", "parsed ledger entry");
        return Ok(entry);
    }

    Err(ParseError::Unrecognized)
}

fn leading_amount(text: &str) -> Option<ParsedEntry> {
    let (head, tail) = match text.split_once(char::is_whitespace) {
        Some((head, tail)) => (head, tail),
        None => (text, ""),
    };
    let amount = head.parse::<Money>().ok()?;
    Some(ParsedEntry::new(amount, tail))
}

fn trailing_amount(text: &str) -> Option<ParsedEntry> {
    let caps = TRAILING_AMOUNT.captures(text)?;
    let magnitude = caps["amount"].parse::<Money>().ok()?;
    let amount = signed(&caps["sign"], magnitude);

    let mut description = describe(&caps["desc"]);
    if let Some(note) = caps.name("note").map(|m| m.as_str().trim())
        && !note.is_empty()
    {
        description = format!("{description}({note})");
    }

    Some(ParsedEntry {
        amount,
        description,
    })
}

/// Last resort for a single `-` the other shapes did not take, such as
/// `10-lunch`. Whitespace pairs never get here: the leading and trailing
/// shapes cover them.
fn bare_split(text: &str) -> Option<ParsedEntry> {
    let dashed: Vec<&str> = text.split('-').collect();
    if let [left, right] = dashed.as_slice() {
        if let Ok(amount) = right.trim().parse::<Money>() {
            return Some(ParsedEntry::new(amount.as_expense(), left));
        }
        if let Ok(amount) = left.trim().parse::<Money>() {
            return Some(ParsedEntry::new(amount.as_expense(), right));
        }
    }

    None
}

/// Extracts every amount found in an un-prompted message.
///
/// The message is split on `,`/`，`; every number in a part becomes one entry.
/// A `-` sign or an expense keyword makes it an expense, a `+` sign or an
/// income keyword makes it income, and unmarked numbers are expenses. The
/// description is what is left of the part once the number and the keyword
/// are removed.
pub fn extract_entries(text: &str) -> Vec<ParsedEntry> {
    let mut entries = Vec::new();

    for part in text.split([',', '，']) {
        for found in NUMBER.find_iter(part) {
            let token = found.as_str();
            let Ok(amount) = token.parse::<Money>() else {
                continue;
            };
            let rest = part.replace(token, "");

            let (amount, rest) = if token.starts_with('-') || EXPENSE_KEYWORD.is_match(part) {
                (
                    amount.as_expense(),
                    EXPENSE_KEYWORD.replace_all(&rest, "").into_owned(),
                )
            } else if token.starts_with('+') || INCOME_KEYWORD.is_match(part) {
                (
                    amount.abs(),
                    INCOME_KEYWORD.replace_all(&rest, "").into_owned(),
                )
            } else {
                (amount.as_expense(), rest)
            };

            let description =
                rest.trim_matches(|c: char| c.is_whitespace() || DESCRIPTION_TRIM.contains(&c));
            entries.push(ParsedEntry::new(amount, description));
        }
    }

    entries
}

#[cfg(test)]
mod tests {
    use super::*;

    fn entry(cents: i64, description: &str) -> ParsedEntry {
        ParsedEntry {
            amount: Money::new(cents),
            description: description.to_string(),
        }
    }

    #[test]
    fn leading_number_keeps_literal_sign() {
        assert_eq!(parse_entry("100 lunch").unwrap(), entry(10_000, "lunch"));
        assert_eq!(parse_entry("-100 lunch").unwrap(), entry(-10_000, "lunch"));
        assert_eq!(parse_entry("+12.5 refund").unwrap(), entry(1_250, "refund"));
        assert_eq!(
            parse_entry("  30   coffee with  friends ").unwrap(),
            entry(3_000, "coffee with  friends")
        );
    }

    #[test]
    fn leading_number_without_text_is_unknown_item() {
        assert_eq!(parse_entry("42").unwrap(), entry(4_200, UNKNOWN_ITEM));
        assert_eq!(parse_entry("0 nothing").unwrap(), entry(0, "nothing"));
    }

    #[test]
    fn trailing_minus_is_expense() {
        assert_eq!(parse_entry("lunch-10").unwrap(), entry(-1_000, "lunch"));
        assert_eq!(parse_entry("lunch -100").unwrap(), entry(-10_000, "lunch"));
        assert_eq!(parse_entry("lunch - 7.5").unwrap(), entry(-750, "lunch"));
    }

    #[test]
    fn trailing_plus_is_income() {
        assert_eq!(parse_entry("salary+5000").unwrap(), entry(500_000, "salary"));
        assert_eq!(parse_entry("bonus +20").unwrap(), entry(2_000, "bonus"));
    }

    #[test]
    fn trailing_unsigned_defaults_to_expense() {
        assert_eq!(parse_entry("lunch 25").unwrap(), entry(-2_500, "lunch"));
        assert_eq!(parse_entry("taxi2 15").unwrap(), entry(-1_500, "taxi2"));
    }

    #[test]
    fn annotations_are_appended() {
        assert_eq!(
            parse_entry("shopping-10(not reimbursed)").unwrap(),
            entry(-1_000, "shopping(not reimbursed)")
        );
        assert_eq!(
            parse_entry("taxi-50（company paid）").unwrap(),
            entry(-5_000, "taxi(company paid)")
        );
        assert_eq!(
            parse_entry("+50(bonus)").unwrap(),
            entry(5_000, "unknown item(bonus)")
        );
        assert_eq!(parse_entry("gift-5()").unwrap(), entry(-500, "gift"));
    }

    #[test]
    fn full_width_amounts_are_read() {
        assert_eq!(parse_entry("lunch－５０").unwrap(), entry(-5_000, "lunch"));
        assert_eq!(parse_entry("salary＋５").unwrap(), entry(500, "salary"));
    }

    #[test]
    fn dash_split_puts_amount_first() {
        assert_eq!(parse_entry("10-lunch").unwrap(), entry(-1_000, "lunch"));
        assert_eq!(parse_entry("7.5 - snacks").unwrap(), entry(750, "- snacks"));
    }

    #[test]
    fn whitespace_pairs_use_the_amount_shapes() {
        assert_eq!(parse_entry("10 lunch").unwrap(), entry(1_000, "lunch"));
        assert_eq!(parse_entry("lunch 10").unwrap(), entry(-1_000, "lunch"));
        assert_eq!(parse_entry("lunch +10").unwrap(), entry(1_000, "lunch"));
        assert_eq!(parse_entry("ten lunch"), Err(ParseError::Unrecognized));
    }

    #[test]
    fn unparseable_input_lists_formats() {
        let err = parse_entry("hello world").unwrap_err();
        assert_eq!(err, ParseError::Unrecognized);
        assert_eq!(err.accepted_formats(), ACCEPTED_FORMATS);
        let message = err.to_string();
        assert!(message.contains("salary+5000"));
        assert!(message.contains("groceries-10(not reimbursed)"));
    }

    #[test]
    fn blank_input_is_rejected() {
        assert_eq!(parse_entry("   ").unwrap_err(), ParseError::Empty);
    }

    #[test]
    fn three_decimals_are_not_an_amount() {
        assert_eq!(parse_entry("lunch-12.345"), Err(ParseError::Unrecognized));
    }

    #[test]
    fn extract_finds_every_amount() {
        let entries = extract_entries("lunch -30, salary +200, coffee 5");
        assert_eq!(
            entries,
            vec![
                entry(-3_000, "lunch"),
                entry(20_000, "salary"),
                entry(-500, "coffee"),
            ]
        );
    }

    #[test]
    fn extract_uses_keywords() {
        let entries = extract_entries("income: 300，expense 12.5 books");
        assert_eq!(
            entries,
            vec![entry(30_000, UNKNOWN_ITEM), entry(-1_250, "books")]
        );

        let entries = extract_entries("收入 100");
        assert_eq!(entries, vec![entry(10_000, UNKNOWN_ITEM)]);
    }

    #[test]
    fn extract_without_numbers_is_empty() {
        assert!(extract_entries("see you tomorrow").is_empty());
        assert!(extract_entries("").is_empty());
    }

    #[test]
    fn extract_skips_invalid_amounts() {
        assert_eq!(extract_entries("fuel 1.234"), Vec::new());
    }

    #[test]
    fn patterns_compile() {
        assert!(TRAILING_AMOUNT.is_match("a-1"));
        assert!(NUMBER.is_match("1"));
        assert!(EXPENSE_KEYWORD.is_match("Expense"));
        assert!(INCOME_KEYWORD.is_match("INCOME"));
    }
}
