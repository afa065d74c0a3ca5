//! Access to the completion log and to the derived-state cache on habit rows.

use rusqlite::Connection;
use time::{Date, OffsetDateTime};

use crate::clock::{calendar_day, format_day, format_instant, parse_day, ClockError};
use crate::db::{self, CompletionEventRecord};
use crate::domain::derived::HabitDerivedState;
use crate::ids::new_event_id;

pub trait CompletionStore {
    /// Appends a completion at `at` and returns the id of the event that
    /// represents that calendar day. A second completion on a day that
    /// already has one is not written; the existing event id is returned.
    fn record_completion(&self, habit_id: &str, at: OffsetDateTime)
        -> Result<String, StoreError>;

    fn remove_completions_on_day(&self, habit_id: &str, day: Date) -> Result<usize, StoreError>;

    /// Distinct completion days, newest first.
    fn list_distinct_completion_days(&self, habit_id: &str) -> Result<Vec<Date>, StoreError>;

    /// Distinct completion days across every habit the user owns, newest first.
    fn list_distinct_completion_days_for_user(
        &self,
        user_id: &str,
    ) -> Result<Vec<Date>, StoreError>;

    fn persist_derived_state(
        &self,
        habit_id: &str,
        state: &HabitDerivedState,
    ) -> Result<(), StoreError>;
}

pub struct SqliteCompletionStore<'a> {
    conn: &'a Connection,
}

impl<'a> SqliteCompletionStore<'a> {
    pub fn new(conn: &'a Connection) -> Self {
        Self { conn }
    }
}

impl CompletionStore for SqliteCompletionStore<'_> {
    fn record_completion(
        &self,
        habit_id: &str,
        at: OffsetDateTime,
    ) -> Result<String, StoreError> {
        let completed_on = format_day(calendar_day(at));
        let event = CompletionEventRecord {
            id: new_event_id(),
            habit_id: habit_id.to_string(),
            occurred_at: format_instant(at),
            completed_on,
        };
        if db::insert_completion(self.conn, &event)? {
            return Ok(event.id);
        }

        tracing::debug!(
            habit_id,
            day = %event.completed_on,
            "completion already recorded for day; keeping existing event"
        );
        db::completion_id_on_day(self.conn, habit_id, &event.completed_on)?.ok_or_else(|| {
            StoreError::MissingCompletion {
                habit_id: habit_id.to_string(),
                day: event.completed_on.clone(),
            }
        })
    }

    fn remove_completions_on_day(&self, habit_id: &str, day: Date) -> Result<usize, StoreError> {
        Ok(db::delete_completions_on_day(
            self.conn,
            habit_id,
            &format_day(day),
        )?)
    }

    fn list_distinct_completion_days(&self, habit_id: &str) -> Result<Vec<Date>, StoreError> {
        parse_days(db::list_completion_days(self.conn, habit_id)?)
    }

    fn list_distinct_completion_days_for_user(
        &self,
        user_id: &str,
    ) -> Result<Vec<Date>, StoreError> {
        parse_days(db::list_completion_days_for_user(self.conn, user_id)?)
    }

    fn persist_derived_state(
        &self,
        habit_id: &str,
        state: &HabitDerivedState,
    ) -> Result<(), StoreError> {
        let last_completed_date = state.last_completed_date.map(format_day);
        db::update_habit_cache(
            self.conn,
            habit_id,
            i64::from(state.streak),
            state.completed_today,
            last_completed_date.as_deref(),
        )?;
        Ok(())
    }
}

fn parse_days(raw: Vec<String>) -> Result<Vec<Date>, StoreError> {
    raw.iter()
        .map(|value| parse_day(value).map_err(StoreError::from))
        .collect()
}

#[derive(Debug, thiserror::Error)]
pub enum StoreError {
    #[error("database error: {0}")]
    Db(#[from] rusqlite::Error),
    #[error("stored date is corrupt: {0}")]
    Corrupt(#[from] ClockError),
    #[error("completion for habit '{habit_id}' on {day} vanished during insert")]
    MissingCompletion { habit_id: String, day: String },
}

#[cfg(test)]
mod tests {
    use super::{CompletionStore, SqliteCompletionStore};
    use crate::db::{self, InsertHabit, UserRecord};
    use crate::domain::derived::HabitDerivedState;
    use rusqlite::Connection;
    use time::macros::{date, datetime};
    use uuid::Uuid;

    fn seeded_connection() -> (String, Connection) {
        let path = std::env::temp_dir()
            .join(format!("habits-store-{}.sqlite", Uuid::now_v7()))
            .display()
            .to_string();
        let conn = db::open_connection(&path).expect("connection should open");
        db::insert_user(
            &conn,
            &UserRecord {
                id: "u-1".to_string(),
                email: "a@example.com".to_string(),
                role: "user".to_string(),
                created_at: "2024-01-01T00:00:00Z".to_string(),
            },
        )
        .expect("user should insert");
        for id in ["hab-1", "hab-2"] {
            db::insert_habit(
                &conn,
                &InsertHabit {
                    id,
                    user_id: "u-1",
                    title: id,
                    description: None,
                    color: None,
                    icon: None,
                    created_at: "2024-01-01T00:00:00Z",
                },
            )
            .expect("habit should insert");
        }
        (path, conn)
    }

    fn cleanup(path: &str) {
        for suffix in ["", "-wal", "-shm"] {
            let _ = std::fs::remove_file(format!("{path}{suffix}"));
        }
    }

    #[test]
    fn recording_twice_on_one_day_returns_same_event() {
        let (path, conn) = seeded_connection();
        let store = SqliteCompletionStore::new(&conn);

        let first = store
            .record_completion("hab-1", datetime!(2024-01-03 08:00 UTC))
            .expect("first record should work");
        let second = store
            .record_completion("hab-1", datetime!(2024-01-03 21:00 UTC))
            .expect("second record should work");
        assert_eq!(first, second);
        assert_eq!(
            store
                .list_distinct_completion_days("hab-1")
                .expect("days should list"),
            vec![date!(2024 - 01 - 03)]
        );

        cleanup(&path);
    }

    #[test]
    fn day_is_taken_from_utc_calendar() {
        let (path, conn) = seeded_connection();
        let store = SqliteCompletionStore::new(&conn);

        store
            .record_completion("hab-1", datetime!(2024-01-03 22:00 -05:00))
            .expect("record should work");
        assert_eq!(
            store
                .list_distinct_completion_days("hab-1")
                .expect("days should list"),
            vec![date!(2024 - 01 - 04)]
        );

        cleanup(&path);
    }

    #[test]
    fn user_days_union_habits_and_removal_is_per_habit() {
        let (path, conn) = seeded_connection();
        let store = SqliteCompletionStore::new(&conn);

        store
            .record_completion("hab-1", datetime!(2024-01-02 08:00 UTC))
            .expect("record should work");
        store
            .record_completion("hab-2", datetime!(2024-01-02 09:00 UTC))
            .expect("record should work");
        store
            .record_completion("hab-2", datetime!(2024-01-03 09:00 UTC))
            .expect("record should work");

        assert_eq!(
            store
                .list_distinct_completion_days_for_user("u-1")
                .expect("user days should list"),
            vec![date!(2024 - 01 - 03), date!(2024 - 01 - 02)]
        );

        let removed = store
            .remove_completions_on_day("hab-2", date!(2024 - 01 - 02))
            .expect("remove should work");
        assert_eq!(removed, 1);
        assert_eq!(
            store
                .list_distinct_completion_days("hab-1")
                .expect("days should list"),
            vec![date!(2024 - 01 - 02)]
        );

        cleanup(&path);
    }

    #[test]
    fn persisted_state_lands_on_habit_row() {
        let (path, conn) = seeded_connection();
        let store = SqliteCompletionStore::new(&conn);

        store
            .persist_derived_state(
                "hab-1",
                &HabitDerivedState {
                    streak: 2,
                    completed_today: true,
                    last_completed_date: Some(date!(2024 - 01 - 03)),
                },
            )
            .expect("persist should work");
        let habit = db::get_habit(&conn, "hab-1")
            .expect("get should work")
            .expect("habit should exist");
        assert_eq!(habit.streak, 2);
        assert!(habit.completed_today);
        assert_eq!(habit.last_completed_date.as_deref(), Some("2024-01-03"));

        store
            .persist_derived_state("hab-1", &HabitDerivedState::default())
            .expect("persist should work");
        let cleared = db::get_habit(&conn, "hab-1")
            .expect("get should work")
            .expect("habit should exist");
        assert_eq!(cleared.last_completed_date, None);

        cleanup(&path);
    }

    #[test]
    fn corrupt_stored_day_surfaces_as_error() {
        let (path, conn) = seeded_connection();
        conn.execute(
            "INSERT INTO habit_logs (id, habit_id, occurred_at, completed_on) \
             VALUES ('e-x', 'hab-1', '2024-01-03T00:00:00Z', 'not-a-day')",
            [],
        )
        .expect("raw insert should work");
        let store = SqliteCompletionStore::new(&conn);
        let err = store
            .list_distinct_completion_days("hab-1")
            .expect_err("corrupt day should fail");
        assert!(err.to_string().contains("corrupt"));

        cleanup(&path);
    }
}
