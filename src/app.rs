use std::str::FromStr;

use rusqlite::Connection;
use serde::Serialize;

use crate::clock::{format_instant, Clock, ClockError};
use crate::config::ConfigError;
use crate::db::{
    self, CompletionEventRecord, HabitFieldsUpdate, HabitRecord, InsertHabit, UserRecord,
};
use crate::domain::derived::HabitDerivedState;
use crate::domain::role::{ParseRoleError, Principal, Role};
use crate::engine::Calculator;
use crate::ids::{generate_habit_id, new_user_id, normalize_habit_id};
use crate::stats::{self, StatsSummary};
use crate::store::{SqliteCompletionStore, StoreError};

mod admin;

pub use admin::AdminHabitView;

pub struct App {
    conn: Connection,
    clock: Box<dyn Clock>,
}

/// A habit row merged with freshly derived state.
#[derive(Debug, Clone, Serialize, PartialEq, Eq)]
pub struct HabitView {
    pub id: String,
    pub user_id: String,
    pub title: String,
    pub description: Option<String>,
    pub color: Option<String>,
    pub icon: Option<String>,
    pub created_at: String,
    pub streak: u32,
    pub completed_today: bool,
    pub last_completed_date: Option<String>,
}

impl HabitView {
    fn merge(record: HabitRecord, state: HabitDerivedState) -> Self {
        Self {
            id: record.id,
            user_id: record.user_id,
            title: record.title,
            description: record.description,
            color: record.color,
            icon: record.icon,
            created_at: record.created_at,
            streak: state.streak,
            completed_today: state.completed_today,
            last_completed_date: state.last_completed_date.map(crate::clock::format_day),
        }
    }
}

#[derive(Debug, Clone, Serialize, PartialEq, Eq)]
pub struct UserView {
    pub id: String,
    pub email: String,
    pub role: String,
    pub created_at: String,
}

#[derive(Debug, Clone, Serialize, PartialEq, Eq)]
pub struct CompletionEventView {
    pub id: String,
    pub habit_id: String,
    pub occurred_at: String,
    pub completed_on: String,
}

#[derive(Debug, Clone, Default)]
pub struct NewHabit {
    pub title: String,
    pub description: Option<String>,
    pub color: Option<String>,
    pub icon: Option<String>,
}

#[derive(Debug, Clone, Default)]
pub struct HabitPatch {
    pub title: Option<String>,
    pub description: Option<String>,
    pub color: Option<String>,
    pub icon: Option<String>,
}

impl HabitPatch {
    fn has_changes(&self) -> bool {
        self.title.is_some()
            || self.description.is_some()
            || self.color.is_some()
            || self.icon.is_some()
    }
}

impl App {
    pub fn open(db_path: &str, clock: Box<dyn Clock>) -> Result<Self, AppError> {
        ensure_parent_dir(db_path)?;
        let conn = db::open_connection(db_path)?;
        Ok(Self { conn, clock })
    }

    fn with_calculator<T>(
        &self,
        run: impl FnOnce(&Calculator<'_>) -> Result<T, StoreError>,
    ) -> Result<T, AppError> {
        let store = SqliteCompletionStore::new(&self.conn);
        let calculator = Calculator::new(&store, self.clock.as_ref());
        Ok(run(&calculator)?)
    }

    pub fn register_user(&self, email: &str, role: &str) -> Result<UserView, AppError> {
        let email = normalize_email(email)?;
        let role = Role::from_str(role)?;
        if db::get_user_by_email(&self.conn, &email)?.is_some() {
            return Err(AppError::Conflict(format!("user '{email}' already exists")));
        }

        let record = UserRecord {
            id: new_user_id(),
            email,
            role: role.as_str().to_string(),
            created_at: format_instant(self.clock.now()),
        };
        db::insert_user(&self.conn, &record)?;
        tracing::info!(user_id = %record.id, role = %role, "registered user");
        Ok(UserView::from(record))
    }

    /// Resolves the caller handed over by the identity layer.
    pub fn authenticate(&self, email: Option<&str>) -> Result<Principal, AppError> {
        let Some(raw) = email.filter(|value| !value.trim().is_empty()) else {
            return Err(AppError::Unauthorized(
                "no user given; pass --user or set HABITS_USER".to_string(),
            ));
        };
        let email = raw.trim().to_ascii_lowercase();
        let user = db::get_user_by_email(&self.conn, &email)?
            .ok_or_else(|| AppError::Unauthorized(format!("unknown user '{email}'")))?;
        let role = Role::from_str(&user.role)?;
        Ok(Principal {
            user_id: user.id,
            email: user.email,
            role,
        })
    }

    pub fn whoami(&self, principal: &Principal) -> Result<UserView, AppError> {
        db::get_user(&self.conn, &principal.user_id)?
            .map(UserView::from)
            .ok_or_else(|| AppError::not_found("user", &principal.user_id))
    }

    pub fn create_habit(
        &self,
        principal: &Principal,
        input: NewHabit,
    ) -> Result<HabitView, AppError> {
        self.insert_habit_for(&principal.user_id, input)
    }

    pub fn get_habit(&self, principal: &Principal, id: &str) -> Result<HabitView, AppError> {
        let habit = self.owned_habit(principal, id)?;
        let state = self.with_calculator(|calculator| calculator.recompute(&habit.id))?;
        Ok(HabitView::merge(habit, state))
    }

    pub fn list_habits(&self, principal: &Principal) -> Result<Vec<HabitView>, AppError> {
        let habits = db::list_habits_for_user(&self.conn, &principal.user_id)?;
        self.with_calculator(|calculator| {
            habits
                .into_iter()
                .map(|habit| -> Result<HabitView, StoreError> {
                    let state = calculator.recompute(&habit.id)?;
                    Ok(HabitView::merge(habit, state))
                })
                .collect()
        })
    }

    pub fn update_habit(
        &self,
        principal: &Principal,
        id: &str,
        patch: HabitPatch,
    ) -> Result<HabitView, AppError> {
        let habit = self.owned_habit(principal, id)?;
        self.apply_patch(&habit.id, patch)
    }

    pub fn delete_habit(&self, principal: &Principal, id: &str) -> Result<String, AppError> {
        let habit = self.owned_habit(principal, id)?;
        db::delete_habit(&self.conn, &habit.id)?;
        tracing::info!(habit_id = %habit.id, "deleted habit");
        Ok(habit.id)
    }

    pub fn complete_today(&self, principal: &Principal, id: &str) -> Result<HabitView, AppError> {
        let habit = self.owned_habit(principal, id)?;
        let state = self.with_calculator(|calculator| calculator.complete_today(&habit.id))?;
        Ok(HabitView::merge(habit, state))
    }

    pub fn uncomplete_today(
        &self,
        principal: &Principal,
        id: &str,
    ) -> Result<HabitView, AppError> {
        let habit = self.owned_habit(principal, id)?;
        let state = self.with_calculator(|calculator| calculator.uncomplete_today(&habit.id))?;
        Ok(HabitView::merge(habit, state))
    }

    pub fn list_logs(
        &self,
        principal: &Principal,
        id: &str,
    ) -> Result<Vec<CompletionEventView>, AppError> {
        let habit = self.owned_habit(principal, id)?;
        Ok(db::list_completion_events(&self.conn, &habit.id)?
            .into_iter()
            .map(CompletionEventView::from)
            .collect())
    }

    pub fn stats(&self, principal: &Principal) -> Result<StatsSummary, AppError> {
        let habits = db::list_habits_for_user(&self.conn, &principal.user_id)?;
        self.with_calculator(|calculator| stats::summarize(calculator, &principal.user_id, &habits))
    }

    fn owned_habit(&self, principal: &Principal, id: &str) -> Result<HabitRecord, AppError> {
        let habit = self.require_habit(id)?;
        if !principal.owns(&habit.user_id) {
            return Err(AppError::Forbidden(format!(
                "habit '{}' belongs to another user",
                habit.id
            )));
        }
        Ok(habit)
    }

    fn require_habit(&self, id: &str) -> Result<HabitRecord, AppError> {
        let id = normalize_habit_id(id);
        db::get_habit(&self.conn, &id)?.ok_or_else(|| AppError::not_found("habit", &id))
    }

    fn insert_habit_for(&self, user_id: &str, input: NewHabit) -> Result<HabitView, AppError> {
        let title = input.title.trim();
        if title.is_empty() {
            return Err(AppError::InvalidArgument("title is required".to_string()));
        }
        let description = input.description.as_deref().and_then(non_empty);
        let color = input.color.as_deref().and_then(non_empty);
        let icon = input.icon.as_deref().and_then(non_empty);

        let id = generate_habit_id(|candidate| {
            db::habit_id_exists(&self.conn, candidate).unwrap_or(true)
        });
        let created_at = format_instant(self.clock.now());
        db::insert_habit(
            &self.conn,
            &InsertHabit {
                id: &id,
                user_id,
                title,
                description,
                color,
                icon,
                created_at: &created_at,
            },
        )?;
        tracing::info!(habit_id = %id, user_id, "created habit");

        let record =
            db::get_habit(&self.conn, &id)?.ok_or_else(|| AppError::not_found("habit", &id))?;
        Ok(HabitView::merge(record, HabitDerivedState::default()))
    }

    fn apply_patch(&self, habit_id: &str, patch: HabitPatch) -> Result<HabitView, AppError> {
        if !patch.has_changes() {
            return Err(AppError::InvalidArgument(
                "update requires at least one field change".to_string(),
            ));
        }
        let title = match patch.title.as_deref() {
            Some(raw) => Some(non_empty(raw).ok_or_else(|| {
                AppError::InvalidArgument("title cannot be empty".to_string())
            })?),
            None => None,
        };

        db::update_habit_fields(
            &self.conn,
            habit_id,
            &HabitFieldsUpdate {
                title,
                description: patch.description.as_deref().and_then(non_empty),
                color: patch.color.as_deref().and_then(non_empty),
                icon: patch.icon.as_deref().and_then(non_empty),
            },
        )?;

        let updated = self.require_habit(habit_id)?;
        let state = self.with_calculator(|calculator| calculator.recompute(&updated.id))?;
        Ok(HabitView::merge(updated, state))
    }
}

fn ensure_parent_dir(path: &str) -> Result<(), AppError> {
    if let Some(parent) = std::path::Path::new(path).parent() {
        std::fs::create_dir_all(parent)?;
    }
    Ok(())
}

fn normalize_email(raw: &str) -> Result<String, AppError> {
    let email = raw.trim().to_ascii_lowercase();
    let valid = email
        .split_once('@')
        .is_some_and(|(local, domain)| !local.is_empty() && !domain.is_empty())
        && !email.chars().any(char::is_whitespace);
    if valid {
        Ok(email)
    } else {
        Err(AppError::InvalidArgument(format!(
            "'{}' is not a valid email address",
            raw.trim()
        )))
    }
}

fn non_empty(raw: &str) -> Option<&str> {
    let trimmed = raw.trim();
    if trimmed.is_empty() {
        None
    } else {
        Some(trimmed)
    }
}

impl From<UserRecord> for UserView {
    fn from(value: UserRecord) -> Self {
        Self {
            id: value.id,
            email: value.email,
            role: value.role,
            created_at: value.created_at,
        }
    }
}

impl From<CompletionEventRecord> for CompletionEventView {
    fn from(value: CompletionEventRecord) -> Self {
        Self {
            id: value.id,
            habit_id: value.habit_id,
            occurred_at: value.occurred_at,
            completed_on: value.completed_on,
        }
    }
}

#[derive(Debug, thiserror::Error)]
pub enum AppError {
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
    #[error("store unavailable: {0}")]
    Store(#[from] StoreError),
    #[error(transparent)]
    Config(#[from] ConfigError),
    #[error("failed to encode output: {0}")]
    Json(#[from] serde_json::Error),
    #[error(transparent)]
    Clock(#[from] ClockError),
    #[error(transparent)]
    Role(#[from] ParseRoleError),
    #[error("{0}")]
    InvalidArgument(String),
    #[error("{kind} '{id}' not found")]
    NotFound { kind: &'static str, id: String },
    #[error("forbidden: {0}")]
    Forbidden(String),
    #[error("unauthorized: {0}")]
    Unauthorized(String),
    #[error("conflict: {0}")]
    Conflict(String),
}

impl AppError {
    fn not_found(kind: &'static str, id: &str) -> Self {
        AppError::NotFound {
            kind,
            id: id.to_string(),
        }
    }
}

impl From<rusqlite::Error> for AppError {
    fn from(value: rusqlite::Error) -> Self {
        AppError::Store(StoreError::Db(value))
    }
}
