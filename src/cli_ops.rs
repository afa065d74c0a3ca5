use clap::{Args, Subcommand};

use crate::cli::{HabitFieldArgs, IdArgs, JsonArgs};

#[derive(Debug, Args)]
#[command(
    about = "Admin commands.",
    long_about = "Inspect users and manage any user's habits. Requires the admin role."
)]
pub struct AdminArgs {
    #[command(subcommand)]
    pub command: AdminSubcommands,
}

#[derive(Debug, Subcommand)]
pub enum AdminSubcommands {
    #[command(about = "List every registered user.")]
    Users(JsonArgs),
    #[command(about = "List every habit from cached fields.")]
    Habits(JsonArgs),
    #[command(about = "Create a habit for another user.")]
    New(AdminNewArgs),
    #[command(about = "Update any habit.")]
    Update(AdminUpdateArgs),
    #[command(about = "Delete any habit.")]
    Rm(IdArgs),
}

#[derive(Debug, Args)]
pub struct AdminNewArgs {
    #[arg(help = "Owner email or user id.")]
    pub owner: String,

    #[arg(help = "Habit title.")]
    pub title: String,

    #[command(flatten)]
    pub fields: HabitFieldArgs,

    #[arg(long, help = "Render as JSON.")]
    pub json: bool,
}

#[derive(Debug, Args)]
pub struct AdminUpdateArgs {
    #[arg(help = "Habit id, with or without the hab- prefix.")]
    pub id: String,

    #[arg(short = 't', long, help = "New title.")]
    pub title: Option<String>,

    #[command(flatten)]
    pub fields: HabitFieldArgs,

    #[arg(long, help = "Render as JSON.")]
    pub json: bool,
}
