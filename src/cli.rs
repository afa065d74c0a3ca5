use std::path::PathBuf;

use clap::builder::styling::{AnsiColor, Effects, Styles};
use clap::{Args, CommandFactory, Parser, Subcommand};

pub use crate::cli_ops::*;

fn cli_styles() -> Styles {
    Styles::styled()
        .header(AnsiColor::BrightCyan.on_default() | Effects::BOLD)
        .usage(AnsiColor::BrightYellow.on_default() | Effects::BOLD)
        .literal(AnsiColor::BrightGreen.on_default() | Effects::BOLD)
        .placeholder(AnsiColor::BrightMagenta.on_default())
}

pub fn styled_command() -> clap::Command {
    Cli::command()
}

#[derive(Debug, Parser)]
#[command(name = "habits")]
#[command(bin_name = "habits")]
#[command(version)]
#[command(about = "Track daily habits, streaks, and completion rates")]
#[command(styles = cli_styles())]
pub struct Cli {
    #[arg(
        short = 'd',
        long,
        env = "HABITS_DB_PATH",
        help = "Path to the SQLite database (default .habits/state.sqlite)."
    )]
    pub db: Option<String>,

    #[arg(
        short = 'c',
        long,
        env = "HABITS_CONFIG",
        default_value = crate::config::DEFAULT_CONFIG_PATH,
        help = "Path to the TOML settings file."
    )]
    pub config: PathBuf,

    #[arg(
        short = 'u',
        long,
        env = "HABITS_USER",
        help = "Email of the acting user."
    )]
    pub user: Option<String>,

    #[arg(
        long,
        env = "HABITS_TODAY",
        value_name = "YYYY-MM-DD",
        help = "Pin the reference day instead of reading the system clock."
    )]
    pub today: Option<String>,

    #[arg(
        long,
        env = "HABITS_LOG",
        value_name = "FILTER",
        help = "Log filter directive, for example habits=debug."
    )]
    pub log: Option<String>,

    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Debug, Subcommand)]
pub enum Commands {
    #[command(about = "Register a user.")]
    Register(RegisterArgs),
    #[command(about = "Show the acting user.")]
    Whoami(JsonArgs),
    #[command(about = "Create a new habit.")]
    New(NewArgs),
    #[command(about = "List your habits with fresh streaks.")]
    Ls(ListArgs),
    #[command(about = "Show one habit by id.")]
    Show(ShowArgs),
    #[command(about = "Update habit fields.")]
    Update(UpdateArgs),
    #[command(about = "Delete a habit and its completion log.")]
    Rm(IdArgs),
    #[command(about = "Mark a habit complete for today.")]
    Done(ShowArgs),
    #[command(about = "Remove today's completion for a habit.")]
    Undo(ShowArgs),
    #[command(about = "List raw completion events for a habit.")]
    Logs(ShowArgs),
    #[command(about = "Show streak and completion-rate stats.")]
    Stats(JsonArgs),
    #[command(about = "Administrative commands.")]
    Admin(AdminArgs),
    #[command(about = "Generate or install shell completions.")]
    Completions(CompletionsArgs),
}

#[derive(Debug, Args)]
pub struct RegisterArgs {
    #[arg(help = "Email address of the new user.")]
    pub email: String,

    #[arg(
        short = 'r',
        long,
        default_value = "user",
        help = "Role: user or admin."
    )]
    pub role: String,

    #[arg(long, help = "Render as JSON.")]
    pub json: bool,
}

#[derive(Debug, Args)]
pub struct JsonArgs {
    #[arg(long, help = "Render as JSON.")]
    pub json: bool,
}

#[derive(Debug, Args)]
pub struct IdArgs {
    #[arg(help = "Habit id, with or without the hab- prefix.")]
    pub id: String,
}

#[derive(Debug, Args)]
pub struct ShowArgs {
    #[arg(help = "Habit id, with or without the hab- prefix.")]
    pub id: String,

    #[arg(long, help = "Render as JSON.")]
    pub json: bool,
}

#[derive(Debug, Args)]
pub struct HabitFieldArgs {
    #[arg(short = 'D', long = "desc", help = "Description text.")]
    pub description: Option<String>,

    #[arg(long, help = "Display color, for example #22aa55.")]
    pub color: Option<String>,

    #[arg(long, help = "Icon name or emoji.")]
    pub icon: Option<String>,
}

#[derive(Debug, Args)]
pub struct NewArgs {
    #[arg(help = "Habit title.")]
    pub title: String,

    #[command(flatten)]
    pub fields: HabitFieldArgs,

    #[arg(long, help = "Render as JSON.")]
    pub json: bool,
}

#[derive(Debug, Args)]
pub struct UpdateArgs {
    #[arg(help = "Habit id, with or without the hab- prefix.")]
    pub id: String,

    #[arg(short = 't', long, help = "New title.")]
    pub title: Option<String>,

    #[command(flatten)]
    pub fields: HabitFieldArgs,

    #[arg(long, help = "Render as JSON.")]
    pub json: bool,
}

#[derive(Debug, Args)]
pub struct ListArgs {
    #[arg(long, conflicts_with = "pending", help = "Only habits done today.")]
    pub done: bool,

    #[arg(long, help = "Only habits not yet done today.")]
    pub pending: bool,

    #[arg(
        short = 'q',
        long,
        help = "Case-insensitive text match on id, title, description, icon."
    )]
    pub query: Option<String>,

    #[arg(long, help = "Render as JSON.")]
    pub json: bool,
}

#[derive(Debug, Args)]
pub struct CompletionsArgs {
    #[arg(help = "Shell name (bash, zsh, fish). Auto-detected if omitted.")]
    pub shell: Option<String>,

    #[arg(
        short = 'i',
        long = "install",
        help = "Write completions to the canonical path for the shell."
    )]
    pub install: bool,
}

#[cfg(test)]
#[path = "cli_tests.rs"]
mod tests;
