use serde::Serialize;

use crate::clock::{calendar_day, parse_instant};
use crate::db::HabitRecord;
use crate::engine::Calculator;
use crate::store::StoreError;

#[derive(Debug, Clone, Serialize, PartialEq, Eq)]
pub struct HabitStats {
    pub id: String,
    pub title: String,
    pub streak: u32,
    pub completion_rate: u32,
}

#[derive(Debug, Clone, Serialize, PartialEq, Eq)]
pub struct StatsSummary {
    pub user_streak: u32,
    pub per_habit: Vec<HabitStats>,
}

/// Builds the stats summary for one user's habits, recomputing every habit
/// from its completion log.
pub fn summarize(
    calculator: &Calculator<'_>,
    user_id: &str,
    habits: &[HabitRecord],
) -> Result<StatsSummary, StoreError> {
    if habits.is_empty() {
        return Ok(StatsSummary {
            user_streak: 0,
            per_habit: Vec::new(),
        });
    }

    let mut per_habit = Vec::with_capacity(habits.len());
    for habit in habits {
        let created_on = calendar_day(parse_instant(&habit.created_at)?);
        let days = calculator.completion_days(&habit.id)?;
        let state = calculator.settle(&habit.id, &days);
        per_habit.push(HabitStats {
            id: habit.id.clone(),
            title: habit.title.clone(),
            streak: state.streak,
            completion_rate: calculator.completion_rate(&days, created_on),
        });
    }

    Ok(StatsSummary {
        user_streak: calculator.user_streak(user_id)?,
        per_habit,
    })
}
