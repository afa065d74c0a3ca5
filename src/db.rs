use std::time::Duration;

use rusqlite::{params, Connection, DatabaseName, OptionalExtension, Result, Row};
use time::OffsetDateTime;

use crate::clock::format_instant;

pub const CURRENT_SCHEMA_VERSION: i64 = 2;

struct Migration {
    version: i64,
    name: &'static str,
    sql: &'static str,
}

const MIGRATIONS: [Migration; 2] = [
    Migration {
        version: 1,
        name: "baseline_habits_schema_v1",
        sql: r#"
CREATE TABLE IF NOT EXISTS meta (
    key TEXT PRIMARY KEY,
    value TEXT NOT NULL
);

CREATE TABLE IF NOT EXISTS users (
    id TEXT PRIMARY KEY,
    email TEXT NOT NULL UNIQUE,
    role TEXT NOT NULL DEFAULT 'user',
    created_at TEXT NOT NULL
);

CREATE TABLE IF NOT EXISTS habits (
    id TEXT PRIMARY KEY,
    user_id TEXT NOT NULL REFERENCES users(id) ON DELETE CASCADE,
    title TEXT NOT NULL,
    description TEXT,
    color TEXT,
    icon TEXT,
    created_at TEXT NOT NULL,
    last_completed_date TEXT,
    streak INTEGER NOT NULL DEFAULT 0,
    completed_today INTEGER NOT NULL DEFAULT 0
);

CREATE TABLE IF NOT EXISTS habit_logs (
    id TEXT PRIMARY KEY,
    habit_id TEXT NOT NULL REFERENCES habits(id) ON DELETE CASCADE,
    occurred_at TEXT NOT NULL,
    completed_on TEXT NOT NULL
);

CREATE INDEX IF NOT EXISTS idx_habits_user_id ON habits(user_id);
CREATE INDEX IF NOT EXISTS idx_habit_logs_habit_day ON habit_logs(habit_id, completed_on);
"#,
    },
    Migration {
        version: 2,
        name: "completion_day_uniqueness_v1",
        sql: r#"
DELETE FROM habit_logs
WHERE rowid NOT IN (
    SELECT MIN(rowid) FROM habit_logs GROUP BY habit_id, completed_on
);

CREATE UNIQUE INDEX IF NOT EXISTS ux_habit_logs_habit_day
    ON habit_logs(habit_id, completed_on);
"#,
    },
];

pub fn open_connection(path: &str) -> Result<Connection> {
    let mut conn = Connection::open(path)?;
    configure_for_speed(&conn)?;
    apply_migrations(&mut conn)?;
    Ok(conn)
}

fn configure_for_speed(conn: &Connection) -> Result<()> {
    conn.pragma_update(None::<DatabaseName>, "journal_mode", "WAL")?;
    conn.pragma_update(None::<DatabaseName>, "synchronous", "NORMAL")?;
    conn.pragma_update(None::<DatabaseName>, "foreign_keys", "ON")?;
    conn.pragma_update(None::<DatabaseName>, "temp_store", "MEMORY")?;
    conn.pragma_update(None::<DatabaseName>, "busy_timeout", 5000i64)?;
    conn.busy_timeout(Duration::from_millis(5000))?;
    Ok(())
}

fn apply_migrations(conn: &mut Connection) -> Result<()> {
    let tx = conn.transaction()?;
    tx.execute_batch(
        r#"
CREATE TABLE IF NOT EXISTS schema_migrations (
    version INTEGER PRIMARY KEY,
    name TEXT NOT NULL,
    applied_at TEXT NOT NULL
);
"#,
    )?;

    for migration in MIGRATIONS {
        let already_applied: Option<i64> = tx
            .query_row(
                "SELECT version FROM schema_migrations WHERE version = ?1",
                params![migration.version],
                |row| row.get(0),
            )
            .optional()?;

        if already_applied.is_some() {
            continue;
        }

        tx.execute_batch(migration.sql)?;
        tx.execute(
            "INSERT INTO schema_migrations (version, name, applied_at) VALUES (?1, ?2, ?3)",
            params![
                migration.version,
                migration.name,
                format_instant(OffsetDateTime::now_utc())
            ],
        )?;
    }

    tx.execute(
        r#"
INSERT INTO meta (key, value)
VALUES ('schema_version', ?1)
ON CONFLICT(key) DO UPDATE SET value = excluded.value
"#,
        params![CURRENT_SCHEMA_VERSION.to_string()],
    )?;

    tx.commit()
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UserRecord {
    pub id: String,
    pub email: String,
    pub role: String,
    pub created_at: String,
}

pub fn insert_user(conn: &Connection, user: &UserRecord) -> Result<()> {
    conn.execute(
        "INSERT INTO users (id, email, role, created_at) VALUES (?1, ?2, ?3, ?4)",
        params![user.id, user.email, user.role, user.created_at],
    )?;
    Ok(())
}

fn user_from_row(row: &Row<'_>) -> Result<UserRecord> {
    Ok(UserRecord {
        id: row.get(0)?,
        email: row.get(1)?,
        role: row.get(2)?,
        created_at: row.get(3)?,
    })
}

pub fn get_user(conn: &Connection, id: &str) -> Result<Option<UserRecord>> {
    conn.query_row(
        "SELECT id, email, role, created_at FROM users WHERE id = ?1",
        params![id],
        user_from_row,
    )
    .optional()
}

pub fn get_user_by_email(conn: &Connection, email: &str) -> Result<Option<UserRecord>> {
    conn.query_row(
        "SELECT id, email, role, created_at FROM users WHERE email = ?1",
        params![email],
        user_from_row,
    )
    .optional()
}

pub fn list_users(conn: &Connection) -> Result<Vec<UserRecord>> {
    let mut stmt = conn.prepare(
        r#"
SELECT id, email, role, created_at
FROM users
ORDER BY created_at DESC, rowid DESC
"#,
    )?;
    let rows = stmt.query_map([], user_from_row)?;
    rows.collect()
}

/// A habit row, including the cached derived fields. The cached fields are
/// only as fresh as the last recompute that managed to write them.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct HabitRecord {
    pub id: String,
    pub user_id: String,
    pub title: String,
    pub description: Option<String>,
    pub color: Option<String>,
    pub icon: Option<String>,
    pub created_at: String,
    pub last_completed_date: Option<String>,
    pub streak: i64,
    pub completed_today: bool,
}

const HABIT_COLUMNS: &str = "h.id, h.user_id, h.title, h.description, h.color, h.icon, \
     h.created_at, h.last_completed_date, h.streak, h.completed_today";

fn habit_from_row(row: &Row<'_>) -> Result<HabitRecord> {
    Ok(HabitRecord {
        id: row.get(0)?,
        user_id: row.get(1)?,
        title: row.get(2)?,
        description: row.get(3)?,
        color: row.get(4)?,
        icon: row.get(5)?,
        created_at: row.get(6)?,
        last_completed_date: row.get(7)?,
        streak: row.get(8)?,
        completed_today: row.get(9)?,
    })
}

pub struct InsertHabit<'a> {
    pub id: &'a str,
    pub user_id: &'a str,
    pub title: &'a str,
    pub description: Option<&'a str>,
    pub color: Option<&'a str>,
    pub icon: Option<&'a str>,
    pub created_at: &'a str,
}

pub fn insert_habit(conn: &Connection, args: &InsertHabit<'_>) -> Result<()> {
    conn.execute(
        r#"
INSERT INTO habits (id, user_id, title, description, color, icon, created_at)
VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7)
"#,
        params![
            args.id,
            args.user_id,
            args.title,
            args.description,
            args.color,
            args.icon,
            args.created_at
        ],
    )?;
    Ok(())
}

pub fn habit_id_exists(conn: &Connection, id: &str) -> Result<bool> {
    conn.query_row(
        "SELECT EXISTS(SELECT 1 FROM habits WHERE id = ?1)",
        params![id],
        |row| row.get(0),
    )
}

pub fn get_habit(conn: &Connection, id: &str) -> Result<Option<HabitRecord>> {
    conn.query_row(
        &format!("SELECT {HABIT_COLUMNS} FROM habits h WHERE h.id = ?1"),
        params![id],
        habit_from_row,
    )
    .optional()
}

pub fn list_habits_for_user(conn: &Connection, user_id: &str) -> Result<Vec<HabitRecord>> {
    let mut stmt = conn.prepare(&format!(
        "SELECT {HABIT_COLUMNS} FROM habits h WHERE h.user_id = ?1 \
         ORDER BY h.created_at DESC, h.rowid DESC"
    ))?;
    let rows = stmt.query_map(params![user_id], habit_from_row)?;
    rows.collect()
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct OwnedHabitRecord {
    pub habit: HabitRecord,
    pub owner_email: String,
}

pub fn list_all_habits(conn: &Connection) -> Result<Vec<OwnedHabitRecord>> {
    let mut stmt = conn.prepare(&format!(
        "SELECT {HABIT_COLUMNS}, u.email FROM habits h JOIN users u ON u.id = h.user_id \
         ORDER BY h.created_at DESC, h.rowid DESC"
    ))?;
    let rows = stmt.query_map([], |row| {
        Ok(OwnedHabitRecord {
            habit: habit_from_row(row)?,
            owner_email: row.get(10)?,
        })
    })?;
    rows.collect()
}

#[derive(Debug, Clone, Default)]
pub struct HabitFieldsUpdate<'a> {
    pub title: Option<&'a str>,
    pub description: Option<&'a str>,
    pub color: Option<&'a str>,
    pub icon: Option<&'a str>,
}

/// Overwrites only the fields that are present. Returns the number of rows
/// touched (0 when the habit does not exist).
pub fn update_habit_fields(
    conn: &Connection,
    id: &str,
    update: &HabitFieldsUpdate<'_>,
) -> Result<usize> {
    conn.execute(
        r#"
UPDATE habits
SET
    title = COALESCE(?1, title),
    description = COALESCE(?2, description),
    color = COALESCE(?3, color),
    icon = COALESCE(?4, icon)
WHERE id = ?5
"#,
        params![
            update.title,
            update.description,
            update.color,
            update.icon,
            id
        ],
    )
}

pub fn update_habit_cache(
    conn: &Connection,
    id: &str,
    streak: i64,
    completed_today: bool,
    last_completed_date: Option<&str>,
) -> Result<usize> {
    conn.execute(
        r#"
UPDATE habits
SET streak = ?1, completed_today = ?2, last_completed_date = ?3
WHERE id = ?4
"#,
        params![streak, completed_today, last_completed_date, id],
    )
}

pub fn delete_habit(conn: &Connection, id: &str) -> Result<usize> {
    conn.execute("DELETE FROM habits WHERE id = ?1", params![id])
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CompletionEventRecord {
    pub id: String,
    pub habit_id: String,
    pub occurred_at: String,
    pub completed_on: String,
}

/// Appends a completion unless the habit already has one on the same day.
/// Returns whether a row was written.
pub fn insert_completion(conn: &Connection, event: &CompletionEventRecord) -> Result<bool> {
    let inserted = conn.execute(
        r#"
INSERT INTO habit_logs (id, habit_id, occurred_at, completed_on)
VALUES (?1, ?2, ?3, ?4)
ON CONFLICT(habit_id, completed_on) DO NOTHING
"#,
        params![
            event.id,
            event.habit_id,
            event.occurred_at,
            event.completed_on
        ],
    )?;
    Ok(inserted > 0)
}

pub fn completion_id_on_day(
    conn: &Connection,
    habit_id: &str,
    completed_on: &str,
) -> Result<Option<String>> {
    conn.query_row(
        r#"
SELECT id FROM habit_logs
WHERE habit_id = ?1 AND completed_on = ?2
ORDER BY occurred_at ASC
LIMIT 1
"#,
        params![habit_id, completed_on],
        |row| row.get(0),
    )
    .optional()
}

pub fn delete_completions_on_day(
    conn: &Connection,
    habit_id: &str,
    completed_on: &str,
) -> Result<usize> {
    conn.execute(
        "DELETE FROM habit_logs WHERE habit_id = ?1 AND completed_on = ?2",
        params![habit_id, completed_on],
    )
}

pub fn list_completion_days(conn: &Connection, habit_id: &str) -> Result<Vec<String>> {
    let mut stmt = conn.prepare(
        r#"
SELECT DISTINCT completed_on
FROM habit_logs
WHERE habit_id = ?1
ORDER BY completed_on DESC
"#,
    )?;
    let rows = stmt.query_map(params![habit_id], |row| row.get(0))?;
    rows.collect()
}

pub fn list_completion_days_for_user(conn: &Connection, user_id: &str) -> Result<Vec<String>> {
    let mut stmt = conn.prepare(
        r#"
SELECT DISTINCT l.completed_on
FROM habit_logs l
JOIN habits h ON h.id = l.habit_id
WHERE h.user_id = ?1
ORDER BY l.completed_on DESC
"#,
    )?;
    let rows = stmt.query_map(params![user_id], |row| row.get(0))?;
    rows.collect()
}

pub fn list_completion_events(
    conn: &Connection,
    habit_id: &str,
) -> Result<Vec<CompletionEventRecord>> {
    let mut stmt = conn.prepare(
        r#"
SELECT id, habit_id, occurred_at, completed_on
FROM habit_logs
WHERE habit_id = ?1
ORDER BY occurred_at DESC, id DESC
"#,
    )?;
    let rows = stmt.query_map(params![habit_id], |row| {
        Ok(CompletionEventRecord {
            id: row.get(0)?,
            habit_id: row.get(1)?,
            occurred_at: row.get(2)?,
            completed_on: row.get(3)?,
        })
    })?;
    rows.collect()
}
