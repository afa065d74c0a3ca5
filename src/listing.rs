use crate::app::HabitView;

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct HabitListFilter {
    /// `Some(true)` keeps habits done today, `Some(false)` keeps pending ones.
    pub completed_today: Option<bool>,
    pub query: Option<String>,
}

impl HabitListFilter {
    pub fn is_empty(&self) -> bool {
        self.completed_today.is_none() && normalize_query(self.query.as_deref()).is_none()
    }
}

pub fn apply_filters(habits: Vec<HabitView>, filter: &HabitListFilter) -> Vec<HabitView> {
    if filter.is_empty() {
        return habits;
    }

    let query = normalize_query(filter.query.as_deref());
    habits
        .into_iter()
        .filter(|habit| matches_filter(habit, filter.completed_today, query.as_deref()))
        .collect()
}

fn matches_filter(habit: &HabitView, completed_today: Option<bool>, query: Option<&str>) -> bool {
    if let Some(expected) = completed_today {
        if habit.completed_today != expected {
            return false;
        }
    }

    if let Some(query) = query {
        return matches_query(habit, query);
    }

    true
}

fn matches_query(habit: &HabitView, query: &str) -> bool {
    let description = habit
        .description
        .as_deref()
        .unwrap_or("")
        .to_ascii_lowercase();
    let icon = habit.icon.as_deref().unwrap_or("").to_ascii_lowercase();

    habit.id.to_ascii_lowercase().contains(query)
        || habit.title.to_ascii_lowercase().contains(query)
        || description.contains(query)
        || icon.contains(query)
}

fn normalize_query(raw: Option<&str>) -> Option<String> {
    let trimmed = raw?.trim();
    if trimmed.is_empty() {
        None
    } else {
        Some(trimmed.to_ascii_lowercase())
    }
}

#[cfg(test)]
mod tests {
    use super::{apply_filters, HabitListFilter};
    use crate::app::HabitView;

    fn habit(id: &str, title: &str, completed_today: bool) -> HabitView {
        HabitView {
            id: id.to_string(),
            user_id: "usr-1".to_string(),
            title: title.to_string(),
            description: None,
            color: None,
            icon: None,
            created_at: "2024-01-01T00:00:00Z".to_string(),
            streak: u32::from(completed_today),
            completed_today,
            last_completed_date: None,
        }
    }

    fn ids(habits: &[HabitView]) -> Vec<&str> {
        habits.iter().map(|habit| habit.id.as_str()).collect()
    }

    #[test]
    fn empty_filter_keeps_everything() {
        let habits = vec![habit("hab-a", "Read", true), habit("hab-b", "Run", false)];
        let filtered = apply_filters(habits, &HabitListFilter::default());
        assert_eq!(ids(&filtered), vec!["hab-a", "hab-b"]);
    }

    #[test]
    fn done_and_pending_split_on_completed_today() {
        let habits = vec![habit("hab-a", "Read", true), habit("hab-b", "Run", false)];
        let done = apply_filters(
            habits.clone(),
            &HabitListFilter {
                completed_today: Some(true),
                query: None,
            },
        );
        assert_eq!(ids(&done), vec!["hab-a"]);

        let pending = apply_filters(
            habits,
            &HabitListFilter {
                completed_today: Some(false),
                query: None,
            },
        );
        assert_eq!(ids(&pending), vec!["hab-b"]);
    }

    #[test]
    fn query_matches_title_description_and_id_case_insensitively() {
        let mut described = habit("hab-c", "Stretch", false);
        described.description = Some("Morning YOGA".to_string());
        let habits = vec![
            habit("hab-a", "Read", true),
            habit("hab-b", "Run", false),
            described,
        ];

        let by_title = apply_filters(
            habits.clone(),
            &HabitListFilter {
                completed_today: None,
                query: Some("  rEAd ".to_string()),
            },
        );
        assert_eq!(ids(&by_title), vec!["hab-a"]);

        let by_description = apply_filters(
            habits.clone(),
            &HabitListFilter {
                completed_today: None,
                query: Some("yoga".to_string()),
            },
        );
        assert_eq!(ids(&by_description), vec!["hab-c"]);

        let by_id = apply_filters(
            habits,
            &HabitListFilter {
                completed_today: Some(false),
                query: Some("HAB-B".to_string()),
            },
        );
        assert_eq!(ids(&by_id), vec!["hab-b"]);
    }

    #[test]
    fn blank_query_counts_as_no_filter() {
        let filter = HabitListFilter {
            completed_today: None,
            query: Some("   ".to_string()),
        };
        assert!(filter.is_empty());
    }
}
