use std::collections::BTreeSet;

use time::Date;

/// Distinct calendar days on which a habit (or any of a user's habits) has
/// at least one completion event.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct CompletionDaySet {
    days: BTreeSet<Date>,
}

impl CompletionDaySet {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn insert(&mut self, day: Date) -> bool {
        self.days.insert(day)
    }

    pub fn contains(&self, day: Date) -> bool {
        self.days.contains(&day)
    }

    pub fn len(&self) -> usize {
        self.days.len()
    }

    pub fn is_empty(&self) -> bool {
        self.days.is_empty()
    }

    pub fn latest(&self) -> Option<Date> {
        self.days.last().copied()
    }

    /// Days newest first.
    pub fn descending(&self) -> impl Iterator<Item = Date> + '_ {
        self.days.iter().rev().copied()
    }

    /// Consecutive days present in the set, walking backward from `today`.
    ///
    /// The walk stops at the first absent day, `today` included, so a set
    /// without `today` always yields zero no matter how long the run ending
    /// yesterday is.
    pub fn streak_through(&self, today: Date) -> u32 {
        let mut streak = 0;
        let mut cursor = Some(today);
        while let Some(day) = cursor.filter(|day| self.days.contains(day)) {
            streak += 1;
            cursor = day.previous_day();
        }
        streak
    }
}

impl FromIterator<Date> for CompletionDaySet {
    fn from_iter<I: IntoIterator<Item = Date>>(iter: I) -> Self {
        Self {
            days: iter.into_iter().collect(),
        }
    }
}

impl Extend<Date> for CompletionDaySet {
    fn extend<I: IntoIterator<Item = Date>>(&mut self, iter: I) {
        self.days.extend(iter);
    }
}

/// Fields cached on the habit record, always recomputed before being shown.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct HabitDerivedState {
    pub streak: u32,
    pub completed_today: bool,
    pub last_completed_date: Option<Date>,
}

impl HabitDerivedState {
    pub fn from_days(days: &CompletionDaySet, today: Date) -> Self {
        Self {
            streak: days.streak_through(today),
            completed_today: days.contains(today),
            last_completed_date: days.latest(),
        }
    }
}

/// Unique completion days over days since creation (inclusive), as a
/// percentage rounded half up. The denominator never drops below one.
pub fn completion_rate(unique_days: usize, created_on: Date, today: Date) -> u32 {
    let elapsed = (today - created_on).whole_days();
    let denominator = u64::try_from(elapsed.saturating_add(1).max(1)).unwrap_or(1);
    let numerator = 100 * unique_days as u64;
    ((2 * numerator + denominator) / (2 * denominator)) as u32
}
