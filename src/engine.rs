//! Recomputes derived habit state from the completion log.
//!
//! Nothing here trusts the cached fields on a habit row. Every call reads the
//! distinct completion days, derives the state against the clock's today, and
//! writes the cache back on a best-effort basis.

use time::Date;

use crate::clock::{format_day, Clock};
use crate::domain::derived::{completion_rate, CompletionDaySet, HabitDerivedState};
use crate::store::{CompletionStore, StoreError};

pub struct Calculator<'a> {
    store: &'a dyn CompletionStore,
    clock: &'a dyn Clock,
}

impl<'a> Calculator<'a> {
    pub fn new(store: &'a dyn CompletionStore, clock: &'a dyn Clock) -> Self {
        Self { store, clock }
    }

    pub fn today(&self) -> Date {
        self.clock.today()
    }

    pub fn completion_days(&self, habit_id: &str) -> Result<CompletionDaySet, StoreError> {
        Ok(self
            .store
            .list_distinct_completion_days(habit_id)?
            .into_iter()
            .collect())
    }

    /// Fresh derived state for one habit; the cache write may fail silently.
    pub fn recompute(&self, habit_id: &str) -> Result<HabitDerivedState, StoreError> {
        let days = self.completion_days(habit_id)?;
        Ok(self.settle(habit_id, &days))
    }

    /// Records today's completion unless one already exists.
    pub fn complete_today(&self, habit_id: &str) -> Result<HabitDerivedState, StoreError> {
        let today = self.today();
        let days = self.completion_days(habit_id)?;
        if days.contains(today) {
            tracing::debug!(habit_id, day = %format_day(today), "habit already completed today");
            return Ok(self.settle(habit_id, &days));
        }

        let event_id = self.store.record_completion(habit_id, self.clock.now())?;
        tracing::info!(habit_id, event_id = %event_id, "recorded completion");
        self.recompute(habit_id)
    }

    /// Removes every completion logged today, then recomputes.
    pub fn uncomplete_today(&self, habit_id: &str) -> Result<HabitDerivedState, StoreError> {
        let today = self.today();
        let removed = self.store.remove_completions_on_day(habit_id, today)?;
        tracing::info!(habit_id, removed, day = %format_day(today), "removed completions");
        self.recompute(habit_id)
    }

    /// Streak over the union of completion days of every habit the user owns.
    pub fn user_streak(&self, user_id: &str) -> Result<u32, StoreError> {
        let days: CompletionDaySet = self
            .store
            .list_distinct_completion_days_for_user(user_id)?
            .into_iter()
            .collect();
        Ok(days.streak_through(self.today()))
    }

    pub fn completion_rate(&self, days: &CompletionDaySet, created_on: Date) -> u32 {
        completion_rate(days.len(), created_on, self.today())
    }

    pub fn settle(&self, habit_id: &str, days: &CompletionDaySet) -> HabitDerivedState {
        let state = HabitDerivedState::from_days(days, self.today());
        self.persist_best_effort(habit_id, &state);
        state
    }

    fn persist_best_effort(&self, habit_id: &str, state: &HabitDerivedState) {
        if let Err(err) = self.store.persist_derived_state(habit_id, state) {
            tracing::warn!(
                habit_id,
                error = %err,
                "failed to persist derived habit state; returning computed values"
            );
        }
    }
}
