//! Derived totals of a [`Cycle`]. Nothing here is persisted.

use chrono::{DateTime, Utc};
use serde::Serialize;

use crate::{Cycle, Money};

/// Totals of a cycle at a given instant.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize)]
pub struct Summary {
    /// Opening income plus every positive record.
    pub total_income: Money,
    /// Sum of the magnitudes of the negative records, never negative.
    pub total_expense: Money,
    pub balance: Money,
    /// Whole days left before `end_time`, 0 once it has passed.
    pub days_remaining: i64,
}

impl Summary {
    /// Computes the totals of `cycle` as seen at `now`.
    ///
    /// Records with a zero amount count neither as income nor as expense.
    pub fn compute(cycle: &Cycle, now: DateTime<Utc>) -> Self {
        let income: Money = cycle
            .records
            .iter()
            .filter(|r| r.is_income())
            .map(|r| r.amount)
            .sum();
        let total_expense: Money = cycle
            .records
            .iter()
            .filter(|r| r.is_expense())
            .map(|r| r.amount.abs())
            .sum();

        let total_income = cycle.opening_income + income;
        let days_remaining = if cycle.end_time > now {
            (cycle.end_time - now).num_hours() / 24
        } else {
            0
        };

        Self {
            total_income,
            total_expense,
            balance: total_income - total_expense,
            days_remaining,
        }
    }
}

/// A cycle together with its summary, ready to be rendered.
#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
pub struct CycleReport {
    pub cycle: Cycle,
    pub summary: Summary,
}

impl CycleReport {
    pub fn new(cycle: Cycle, now: DateTime<Utc>) -> Self {
        let summary = Summary::compute(&cycle, now);
        Self { cycle, summary }
    }
}

#[cfg(test)]
mod tests {
    use chrono::Duration;

    use super::*;
    use crate::{Record, Scope};

    fn cycle_with(opening: i64, amounts: &[i64], now: DateTime<Utc>) -> Cycle {
        let mut cycle = Cycle::new(Scope::new(1, 1), Money::new(opening), now, Duration::days(7));
        for amount in amounts {
            cycle.push_record(Record::new(Money::new(*amount), "item", now));
        }
        cycle
    }

    #[test]
    fn totals_split_by_sign() {
        let now = Utc::now();
        let cycle = cycle_with(100_000, &[-5_000, 20_000, 0, -250], now);

        let summary = Summary::compute(&cycle, now);

        assert_eq!(summary.total_income, Money::new(120_000));
        assert_eq!(summary.total_expense, Money::new(5_250));
        assert_eq!(summary.balance, Money::new(114_750));
    }

    #[test]
    fn compute_is_idempotent() {
        let now = Utc::now();
        let cycle = cycle_with(1_000, &[-300, 50], now);
        let before = cycle.clone();

        let first = Summary::compute(&cycle, now);
        let second = Summary::compute(&cycle, now);

        assert_eq!(first, second);
        assert_eq!(cycle, before);
    }

    #[test]
    fn expense_is_never_negative_and_income_never_below_opening() {
        let now = Utc::now();
        let only_expenses = cycle_with(500, &[-1, -2, -3], now);
        let only_income = cycle_with(500, &[1, 2, 3], now);

        let expenses = Summary::compute(&only_expenses, now);
        let income = Summary::compute(&only_income, now);

        assert!(expenses.total_expense >= Money::ZERO);
        assert_eq!(expenses.total_income, Money::new(500));
        assert!(income.total_income >= Money::new(500));
        assert_eq!(income.total_expense, Money::ZERO);
    }

    #[test]
    fn days_remaining_counts_whole_days() {
        let now = Utc::now();
        let cycle = cycle_with(0, &[], now);

        assert_eq!(Summary::compute(&cycle, now).days_remaining, 7);
        assert_eq!(
            Summary::compute(&cycle, now + Duration::minutes(1)).days_remaining,
            6
        );
        assert_eq!(
            Summary::compute(&cycle, now + Duration::days(6) + Duration::hours(23)).days_remaining,
            0
        );
    }

    #[test]
    fn days_remaining_is_zero_after_end() {
        let now = Utc::now();
        let cycle = cycle_with(0, &[], now);

        assert_eq!(
            Summary::compute(&cycle, now + Duration::days(30)).days_remaining,
            0
        );
    }
}
