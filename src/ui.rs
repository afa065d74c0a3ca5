use std::io::{self, IsTerminal};

use crate::app::{AdminHabitView, CompletionEventView, HabitView, UserView};
use crate::ids::display_id;
use crate::listing::HabitListFilter;
use crate::stats::StatsSummary;

pub fn print_habit_list(habits: &[HabitView], filter: &HabitListFilter) {
    let palette = Palette::auto();
    println!("{}", palette.heading("Habits"));
    if let Some(summary) = filter_summary(filter) {
        println!("{}", palette.dim(&format!("filters: {summary}")));
    }

    if habits.is_empty() {
        println!("{}", palette.dim("no habits matched"));
        return;
    }

    for habit in habits {
        println!("{}", format_habit_row(habit, &palette));
    }
    println!("{}", palette.dim(&format!("{} habit(s)", habits.len())));
}

pub fn print_habit_show(habit: &HabitView) {
    let palette = Palette::auto();
    println!("{}", format_habit_row(habit, &palette));
    if let Some(description) = habit.description.as_deref() {
        println!("  {description}");
    }
    println!(
        "  {} {}",
        palette.dim("last done:"),
        habit.last_completed_date.as_deref().unwrap_or("never")
    );
    if let Some(color) = habit.color.as_deref() {
        println!("  {} {color}", palette.dim("color:"));
    }
    println!("  {} {}", palette.dim("created:"), habit.created_at);
}

pub fn print_logs(habit_id: &str, events: &[CompletionEventView]) {
    let palette = Palette::auto();
    println!("{}", palette.heading(&format!("Log {}", display_id(habit_id))));
    if events.is_empty() {
        println!("{}", palette.dim("no completions yet"));
        return;
    }
    for event in events {
        println!("{} {}", event.completed_on, palette.dim(&event.occurred_at));
    }
}

pub fn print_stats(summary: &StatsSummary) {
    let palette = Palette::auto();
    println!("{}", palette.heading("Stats"));
    println!("user streak: {}", palette.streak(summary.user_streak));
    for entry in &summary.per_habit {
        println!(
            "{} {} {} {}%",
            palette.id(display_id(&entry.id)),
            entry.title,
            palette.streak(entry.streak),
            entry.completion_rate
        );
    }
}

pub fn print_users(users: &[UserView]) {
    let palette = Palette::auto();
    println!("{}", palette.heading("Users"));
    for user in users {
        println!(
            "{} {} {}",
            user.email,
            palette.role(&user.role),
            palette.dim(&user.id)
        );
    }
}

pub fn print_admin_habits(habits: &[AdminHabitView]) {
    let palette = Palette::auto();
    println!("{}", palette.heading("All habits (cached)"));
    if habits.is_empty() {
        println!("{}", palette.dim("no habits"));
        return;
    }
    for row in habits {
        println!(
            "{} {}",
            format_habit_row(&row.habit, &palette),
            palette.dim(&row.owner_email)
        );
    }
}

fn format_habit_row(habit: &HabitView, palette: &Palette) -> String {
    let mut line = format!(
        "{} {} {}",
        palette.id(display_id(&habit.id)),
        palette.check(habit.completed_today),
        habit.title
    );
    if let Some(icon) = habit.icon.as_deref() {
        line.push(' ');
        line.push_str(icon);
    }
    line.push(' ');
    line.push_str(&palette.streak(habit.streak));
    line
}

fn filter_summary(filter: &HabitListFilter) -> Option<String> {
    let mut parts = Vec::new();
    match filter.completed_today {
        Some(true) => parts.push("done".to_string()),
        Some(false) => parts.push("pending".to_string()),
        None => {}
    }
    if let Some(query) = filter.query.as_deref().map(str::trim) {
        if !query.is_empty() {
            parts.push(format!("query={query}"));
        }
    }

    if parts.is_empty() {
        None
    } else {
        Some(parts.join(" "))
    }
}

struct Palette {
    enabled: bool,
}

impl Palette {
    fn auto() -> Self {
        let enabled = std::env::var_os("NO_COLOR").is_none() && io::stdout().is_terminal();
        Self { enabled }
    }

    fn paint(&self, code: &str, text: &str) -> String {
        if self.enabled {
            format!("\x1b[{code}m{text}\x1b[0m")
        } else {
            text.to_string()
        }
    }

    fn heading(&self, text: &str) -> String {
        self.paint("1;36", text)
    }

    fn dim(&self, text: &str) -> String {
        self.paint("2", text)
    }

    fn id(&self, text: &str) -> String {
        self.paint("1;94", text)
    }

    fn check(&self, done: bool) -> String {
        if done {
            self.paint("32", "[x]")
        } else {
            self.paint("37", "[ ]")
        }
    }

    fn streak(&self, streak: u32) -> String {
        let code = if streak == 0 { "2" } else { "33" };
        self.paint(code, &format!("streak {streak}"))
    }

    fn role(&self, role: &str) -> String {
        let code = if role == "admin" { "35" } else { "34" };
        self.paint(code, &format!("[{}]", role.to_ascii_uppercase()))
    }
}
