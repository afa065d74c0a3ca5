use serde::Serialize;

use super::{App, AppError, HabitPatch, HabitView, NewHabit, UserView};
use crate::clock::parse_day;
use crate::db::{self, HabitRecord, OwnedHabitRecord};
use crate::domain::derived::HabitDerivedState;
use crate::domain::role::Principal;

/// A habit as the admin listing shows it: cached derived fields plus the
/// owner's email.
#[derive(Debug, Clone, Serialize, PartialEq, Eq)]
pub struct AdminHabitView {
    #[serde(flatten)]
    pub habit: HabitView,
    pub owner_email: String,
}

impl App {
    pub fn admin_list_users(&self, principal: &Principal) -> Result<Vec<UserView>, AppError> {
        require_admin(principal)?;
        Ok(db::list_users(&self.conn)?
            .into_iter()
            .map(UserView::from)
            .collect())
    }

    /// Lists every habit from the cached columns. Nothing is recomputed
    /// here, so values may lag behind the log.
    pub fn admin_list_habits(
        &self,
        principal: &Principal,
    ) -> Result<Vec<AdminHabitView>, AppError> {
        require_admin(principal)?;
        db::list_all_habits(&self.conn)?
            .into_iter()
            .map(cached_view)
            .collect()
    }

    /// Creates a habit for `owner`, given as a user id or an email.
    pub fn admin_create_habit(
        &self,
        principal: &Principal,
        owner: &str,
        input: NewHabit,
    ) -> Result<HabitView, AppError> {
        require_admin(principal)?;
        let owner = owner.trim();
        let user = match db::get_user(&self.conn, owner)? {
            Some(user) => Some(user),
            None => db::get_user_by_email(&self.conn, &owner.to_ascii_lowercase())?,
        };
        let user = user.ok_or_else(|| AppError::not_found("user", owner))?;
        tracing::info!(admin = %principal.email, owner = %user.email, "admin creating habit");
        self.insert_habit_for(&user.id, input)
    }

    pub fn admin_update_habit(
        &self,
        principal: &Principal,
        id: &str,
        patch: HabitPatch,
    ) -> Result<HabitView, AppError> {
        require_admin(principal)?;
        let habit = self.require_habit(id)?;
        self.apply_patch(&habit.id, patch)
    }

    pub fn admin_delete_habit(&self, principal: &Principal, id: &str) -> Result<String, AppError> {
        require_admin(principal)?;
        let habit = self.require_habit(id)?;
        db::delete_habit(&self.conn, &habit.id)?;
        tracing::info!(admin = %principal.email, habit_id = %habit.id, "admin deleted habit");
        Ok(habit.id)
    }
}

fn require_admin(principal: &Principal) -> Result<(), AppError> {
    if principal.role.is_admin() {
        Ok(())
    } else {
        Err(AppError::Forbidden(format!(
            "user '{}' is not an admin",
            principal.email
        )))
    }
}

fn cached_view(row: OwnedHabitRecord) -> Result<AdminHabitView, AppError> {
    let state = cached_state(&row.habit)?;
    Ok(AdminHabitView {
        habit: HabitView::merge(row.habit, state),
        owner_email: row.owner_email,
    })
}

fn cached_state(habit: &HabitRecord) -> Result<HabitDerivedState, AppError> {
    let last_completed_date = habit
        .last_completed_date
        .as_deref()
        .map(parse_day)
        .transpose()?;
    Ok(HabitDerivedState {
        streak: u32::try_from(habit.streak.max(0)).unwrap_or(u32::MAX),
        completed_today: habit.completed_today,
        last_completed_date,
    })
}
