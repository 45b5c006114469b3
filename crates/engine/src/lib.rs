//! Ledger engine: parses free-text entries and keeps one accounting cycle
//! per (group, user) scope.
//!
//! Chat transport and rendering live elsewhere; this crate only returns
//! structured values ([`Cycle`], [`Summary`], [`CycleReport`]) or a
//! [`LedgerError`].

use std::sync::Arc;

use chrono::{Duration, Utc};

pub use chats::ActiveChats;
pub use cycle::{Cycle, DEFAULT_HORIZON_DAYS, MAX_HORIZON_DAYS, Record, Scope};
pub use error::{LedgerError, StoreError};
pub use money::{InvalidMoney, Money};
pub use parsing::{
    ACCEPTED_FORMATS, ParseError, ParsedEntry, UNKNOWN_ITEM, extract_entries, parse_entry,
};
pub use sqlite::SqliteStore;
pub use store::{KvStore, MemoryStore};
pub use summary::{CycleReport, Summary};

use cycle_store::{Active, CycleStore};
use history::HistoryIndex;
use locks::ScopeLocks;

mod chats;
mod cycle;
mod cycle_store;
mod error;
mod history;
mod locks;
mod money;
mod parsing;
mod sqlite;
mod store;
mod summary;

type ResultLedger<T> = Result<T, LedgerError>;

/// Entries appended by one call, with the summary after the append.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Recorded {
    pub entries: Vec<ParsedEntry>,
    pub summary: Summary,
}

/// Owns the lifecycle of the cycles: start, append, end.
///
/// All the mutating operations of a scope run under that scope's lock, so
/// concurrent chat events on the same scope are applied one after the other.
pub struct Ledger {
    cycles: CycleStore,
    history: HistoryIndex,
    locks: ScopeLocks,
    horizon: Duration,
}

impl Ledger {
    /// Return a builder for `Ledger`. Help to build the struct.
    pub fn builder() -> LedgerBuilder {
        LedgerBuilder::default()
    }

    /// Starts a new cycle for `scope`, ending the active one first if any.
    pub async fn start_cycle(&self, scope: Scope, opening_income: Money) -> ResultLedger<Cycle> {
        let _guard = self.locks.acquire(scope).await;
        let now = Utc::now();

        match self.cycles.active(scope).await? {
            Active::Cycle(previous) => {
                let report = self.close(previous, now).await?;
                tracing::info!(
                    %scope,
                    cycle_id = %report.cycle.id,
                    "ended previous cycle before starting a new one"
                );
            }
            Active::Dangling(cycle_id) => {
                tracing::warn!(%scope, %cycle_id, "clearing dangling active cycle pointer");
                self.cycles.clear_active(scope).await?;
            }
            Active::None => {}
        }

        let cycle = Cycle::new(scope, opening_income, now, self.horizon);
        self.cycles.save(&cycle).await?;
        self.cycles.set_active(scope, &cycle.id).await?;
        self.remember(scope, &cycle.id).await;

        tracing::info!(
            %scope,
            cycle_id = %cycle.id,
            opening_income = %cycle.opening_income,
            "started cycle"
        );
        Ok(cycle)
    }

    /// Appends a record to the active cycle of `scope`.
    pub async fn append_record(
        &self,
        scope: Scope,
        amount: Money,
        description: &str,
    ) -> ResultLedger<Summary> {
        let _guard = self.locks.acquire(scope).await;
        let mut cycle = self.active_cycle(scope).await?;
        let now = Utc::now();

        cycle.push_record(Record::new(amount, description, now));
        self.cycles.save(&cycle).await?;

        tracing::debug!(%scope, cycle_id = %cycle.id, %amount, "appended record");
        Ok(Summary::compute(&cycle, now))
    }

    /// Parses `text` with [`parse_entry`] and appends the result.
    pub async fn record_text(&self, scope: Scope, text: &str) -> ResultLedger<Recorded> {
        let entry = parse_entry(text)?;
        let summary = self
            .append_record(scope, entry.amount, &entry.description)
            .await?;
        Ok(Recorded {
            entries: vec![entry],
            summary,
        })
    }

    /// Appends every amount [`extract_entries`] finds in `text`, in one go.
    ///
    /// Returns `None` when the text contains no amount.
    pub async fn record_extracted(
        &self,
        scope: Scope,
        text: &str,
    ) -> ResultLedger<Option<Recorded>> {
        let entries = extract_entries(text);
        if entries.is_empty() {
            return Ok(None);
        }

        let _guard = self.locks.acquire(scope).await;
        let mut cycle = self.active_cycle(scope).await?;
        let now = Utc::now();

        for entry in &entries {
            cycle.push_record(Record::new(entry.amount, &entry.description, now));
        }
        self.cycles.save(&cycle).await?;

        tracing::debug!(%scope, cycle_id = %cycle.id, count = entries.len(), "appended extracted records");
        let summary = Summary::compute(&cycle, now);
        Ok(Some(Recorded { entries, summary }))
    }

    /// Ends the active cycle of `scope` and returns its final state.
    pub async fn end_cycle(&self, scope: Scope) -> ResultLedger<CycleReport> {
        let _guard = self.locks.acquire(scope).await;
        let cycle = self.active_cycle(scope).await?;

        let report = self.close(cycle, Utc::now()).await?;
        tracing::info!(%scope, cycle_id = %report.cycle.id, "ended cycle");
        Ok(report)
    }

    /// Whether `scope` has an active cycle. Never fails: a pointer to a
    /// missing or ended cycle is cleared, and storage failures read as `false`.
    pub async fn has_active_cycle(&self, scope: Scope) -> bool {
        let _guard = self.locks.acquire(scope).await;
        match self.active_cycle(scope).await {
            Ok(_) => true,
            Err(LedgerError::NoActiveCycle) => false,
            Err(err) => {
                tracing::warn!(%scope, "active cycle lookup failed: {err}");
                false
            }
        }
    }

    /// The active cycle of `scope` with its current summary.
    pub async fn current(&self, scope: Scope) -> ResultLedger<CycleReport> {
        let _guard = self.locks.acquire(scope).await;
        let cycle = self.active_cycle(scope).await?;
        Ok(CycleReport::new(cycle, Utc::now()))
    }

    /// Ids of every cycle started in `scope`, oldest first.
    pub async fn history(&self, scope: Scope) -> ResultLedger<Vec<String>> {
        self.history.list(scope).await
    }

    /// Every cycle of `scope` with its summary, oldest first. Ids that no
    /// longer resolve are skipped.
    pub async fn history_reports(&self, scope: Scope) -> ResultLedger<Vec<CycleReport>> {
        let now = Utc::now();
        let mut reports = Vec::new();

        for cycle_id in self.history.list(scope).await? {
            match self.cycles.load(&cycle_id).await? {
                Some(cycle) => reports.push(CycleReport::new(cycle, now)),
                None => tracing::warn!(%scope, %cycle_id, "history references a missing cycle"),
            }
        }

        Ok(reports)
    }

    /// Any cycle by id, active or ended.
    pub async fn cycle(&self, cycle_id: &str) -> ResultLedger<CycleReport> {
        let cycle = self
            .cycles
            .load(cycle_id)
            .await?
            .ok_or_else(|| LedgerError::NotFound(cycle_id.to_string()))?;
        Ok(CycleReport::new(cycle, Utc::now()))
    }

    /// Follows the active pointer; a pointer to a missing or ended cycle is
    /// cleared.
    async fn active_cycle(&self, scope: Scope) -> ResultLedger<Cycle> {
        match self.cycles.active(scope).await? {
            Active::Cycle(cycle) => Ok(cycle),
            Active::Dangling(cycle_id) => {
                tracing::warn!(%scope, %cycle_id, "clearing dangling active cycle pointer");
                self.cycles.clear_active(scope).await?;
                Err(LedgerError::NoActiveCycle)
            }
            Active::None => Err(LedgerError::NoActiveCycle),
        }
    }

    /// Saves the ended cycle before the pointer is cleared, so a failed clear
    /// leaves a pointer that `CycleStore::active` reads as dangling.
    async fn close(
        &self,
        mut cycle: Cycle,
        now: chrono::DateTime<Utc>,
    ) -> ResultLedger<CycleReport> {
        let scope = cycle.scope();
        cycle.close(now);
        self.cycles.save(&cycle).await?;
        self.remember(scope, &cycle.id).await;
        self.cycles.clear_active(scope).await?;
        Ok(CycleReport::new(cycle, now))
    }

    /// The history index is secondary: a failed write is logged, not raised.
    async fn remember(&self, scope: Scope, cycle_id: &str) {
        if let Err(err) = self.history.append_if_absent(scope, cycle_id).await {
            tracing::warn!(%scope, %cycle_id, "failed to update history index: {err}");
        }
    }
}

pub struct LedgerBuilder {
    store: Option<Arc<dyn KvStore>>,
    horizon_days: i64,
}

impl Default for LedgerBuilder {
    fn default() -> Self {
        Self {
            store: None,
            horizon_days: DEFAULT_HORIZON_DAYS,
        }
    }
}

impl LedgerBuilder {
    /// Pass the required store
    pub fn store(mut self, store: Arc<dyn KvStore>) -> LedgerBuilder {
        self.store = Some(store);
        self
    }

    /// Provisional length of new cycles, in days, between 1 and
    /// [`MAX_HORIZON_DAYS`]. Checked by [`build`](Self::build).
    pub fn horizon_days(mut self, days: i64) -> LedgerBuilder {
        self.horizon_days = days;
        self
    }

    /// Construct `Ledger`
    pub fn build(self) -> ResultLedger<Ledger> {
        let store = self
            .store
            .ok_or_else(|| LedgerError::Persistence("missing store".to_string()))?;
        let horizon = Some(self.horizon_days)
            .filter(|days| (1..=MAX_HORIZON_DAYS).contains(days))
            .and_then(Duration::try_days)
            .ok_or(LedgerError::InvalidHorizon(self.horizon_days))?;

        Ok(Ledger {
            cycles: CycleStore::new(store.clone()),
            history: HistoryIndex::new(store),
            locks: ScopeLocks::default(),
            horizon,
        })
    }
}
