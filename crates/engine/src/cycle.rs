//! The module contains the `Cycle` aggregate and its `Record`s.

use std::fmt;

use chrono::{DateTime, Duration, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::{Money, parsing::UNKNOWN_ITEM};

/// Default provisional length of a cycle.
pub const DEFAULT_HORIZON_DAYS: i64 = 7;

/// Longest provisional length a ledger accepts.
pub const MAX_HORIZON_DAYS: i64 = 3650;

/// The (group, user) pair a cycle belongs to.
///
/// At most one cycle is active per scope.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct Scope {
    pub group_id: i64,
    pub user_id: i64,
}

impl Scope {
    pub const fn new(group_id: i64, user_id: i64) -> Self {
        Self { group_id, user_id }
    }
}

impl fmt::Display for Scope {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}:{}", self.group_id, self.user_id)
    }
}

/// One ledger entry.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Record {
    /// Positive is income, negative is expense.
    pub amount: Money,
    pub description: String,
    pub timestamp: DateTime<Utc>,
}

impl Record {
    pub fn new(amount: Money, description: &str, timestamp: DateTime<Utc>) -> Self {
        let description = description.trim();
        let description = if description.is_empty() {
            UNKNOWN_ITEM
        } else {
            description
        };
        Self {
            amount,
            description: description.to_string(),
            timestamp,
        }
    }

    pub fn is_income(&self) -> bool {
        self.amount.is_positive()
    }

    pub fn is_expense(&self) -> bool {
        self.amount.is_negative()
    }
}

/// One accounting period for a [`Scope`].
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Cycle {
    /// Stable identifier, generated once at creation.
    pub id: String,
    pub group_id: i64,
    pub user_id: i64,
    pub start_time: DateTime<Utc>,
    /// Provisional until the cycle is ended, then the actual end time.
    pub end_time: DateTime<Utc>,
    pub opening_income: Money,
    /// Chronological, append-only while the cycle is active.
    pub records: Vec<Record>,
    pub is_active: bool,
    pub created_at: DateTime<Utc>,
}

impl Cycle {
    /// A fresh active cycle. The provisional end saturates at the latest
    /// representable instant.
    pub fn new(scope: Scope, opening_income: Money, now: DateTime<Utc>, horizon: Duration) -> Self {
        Self {
            id: Uuid::new_v4().to_string(),
            group_id: scope.group_id,
            user_id: scope.user_id,
            start_time: now,
            end_time: now
                .checked_add_signed(horizon)
                .unwrap_or(DateTime::<Utc>::MAX_UTC),
            opening_income,
            records: Vec::new(),
            is_active: true,
            created_at: now,
        }
    }

    pub fn scope(&self) -> Scope {
        Scope::new(self.group_id, self.user_id)
    }

    pub fn push_record(&mut self, record: Record) {
        self.records.push(record);
    }

    /// Marks the cycle as ended at `now`. Ending is one-way.
    pub fn close(&mut self, now: DateTime<Utc>) {
        self.is_active = false;
        self.end_time = now;
    }
}
