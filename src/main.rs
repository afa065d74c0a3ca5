mod app;
mod cli;
mod cli_ops;
mod clock;
mod completions;
mod config;
mod db;
mod domain;
mod engine;
mod ids;
mod listing;
mod logging;
mod stats;
mod store;
mod ui;

fn main() {
    if let Err(err) = run() {
        eprintln!("error: {}", err);
        std::process::exit(1);
    }
}

fn print_json(value: &impl serde::Serialize) -> Result<(), app::AppError> {
    println!("{}", serde_json::to_string_pretty(value)?);
    Ok(())
}

fn run() -> Result<(), app::AppError> {
    use clap::Parser;
    use cli::{AdminSubcommands, Commands};

    let cli = cli::Cli::parse();
    if let Commands::Completions(args) = &cli.command {
        return completions::run_completions_command(args.shell.as_deref(), args.install);
    }

    let settings = config::Settings::load(&cli.config)?;
    let resolved = config::ResolvedConfig::resolve(
        cli.db.as_deref(),
        cli.user.as_deref(),
        cli.log.as_deref(),
        &settings,
    );
    logging::init(&resolved.log_filter);
    tracing::debug!(db = %resolved.db_path, "opening habit store");

    let app = app::App::open(&resolved.db_path, reference_clock(cli.today.as_deref())?)?;

    if let Commands::Register(args) = &cli.command {
        let user = app.register_user(&args.email, &args.role)?;
        if args.json {
            print_json(&user)?;
        } else {
            println!("registered {} [{}]", user.email, user.role);
        }
        return Ok(());
    }

    let principal = app.authenticate(resolved.user.as_deref())?;

    match cli.command {
        Commands::Register(_) => unreachable!("register is handled before authentication"),
        Commands::Completions(_) => unreachable!("completions return before the store opens"),
        Commands::Whoami(args) => {
            let user = app.whoami(&principal)?;
            if args.json {
                print_json(&user)?;
            } else {
                println!("{} [{}] {}", user.email, user.role, user.id);
            }
        }
        Commands::New(args) => {
            let habit = app.create_habit(
                &principal,
                app::NewHabit {
                    title: args.title,
                    description: args.fields.description,
                    color: args.fields.color,
                    icon: args.fields.icon,
                },
            )?;
            if args.json {
                print_json(&habit)?;
            } else {
                println!("created {} {}", habit_ref(&habit), habit.title);
            }
        }
        Commands::Ls(args) => {
            let filter = listing::HabitListFilter {
                completed_today: completed_filter(args.done, args.pending),
                query: args.query,
            };
            let habits = listing::apply_filters(app.list_habits(&principal)?, &filter);
            if args.json {
                print_json(&habits)?;
            } else {
                ui::print_habit_list(&habits, &filter);
            }
        }
        Commands::Show(args) => {
            let habit = app.get_habit(&principal, &args.id)?;
            if args.json {
                print_json(&habit)?;
            } else {
                ui::print_habit_show(&habit);
            }
        }
        Commands::Update(args) => {
            let habit = app.update_habit(
                &principal,
                &args.id,
                patch_from(args.title, args.fields),
            )?;
            if args.json {
                print_json(&habit)?;
            } else {
                println!("updated {} {}", habit_ref(&habit), habit.title);
            }
        }
        Commands::Rm(args) => {
            let removed = app.delete_habit(&principal, &args.id)?;
            println!("deleted {}", ids::display_id(&removed));
        }
        Commands::Done(args) => {
            let habit = app.complete_today(&principal, &args.id)?;
            print_transition(&habit, args.json)?;
        }
        Commands::Undo(args) => {
            let habit = app.uncomplete_today(&principal, &args.id)?;
            print_transition(&habit, args.json)?;
        }
        Commands::Logs(args) => {
            let events = app.list_logs(&principal, &args.id)?;
            if args.json {
                print_json(&events)?;
            } else {
                ui::print_logs(&ids::normalize_habit_id(&args.id), &events);
            }
        }
        Commands::Stats(args) => {
            let summary = app.stats(&principal)?;
            if args.json {
                print_json(&summary)?;
            } else {
                ui::print_stats(&summary);
            }
        }
        Commands::Admin(args) => match args.command {
            AdminSubcommands::Users(list_args) => {
                let users = app.admin_list_users(&principal)?;
                if list_args.json {
                    print_json(&users)?;
                } else {
                    ui::print_users(&users);
                }
            }
            AdminSubcommands::Habits(list_args) => {
                let habits = app.admin_list_habits(&principal)?;
                if list_args.json {
                    print_json(&habits)?;
                } else {
                    ui::print_admin_habits(&habits);
                }
            }
            AdminSubcommands::New(new_args) => {
                let habit = app.admin_create_habit(
                    &principal,
                    &new_args.owner,
                    app::NewHabit {
                        title: new_args.title,
                        description: new_args.fields.description,
                        color: new_args.fields.color,
                        icon: new_args.fields.icon,
                    },
                )?;
                if new_args.json {
                    print_json(&habit)?;
                } else {
                    println!("created {} {} for {}", habit_ref(&habit), habit.title, new_args.owner);
                }
            }
            AdminSubcommands::Update(update_args) => {
                let habit = app.admin_update_habit(
                    &principal,
                    &update_args.id,
                    patch_from(update_args.title, update_args.fields),
                )?;
                if update_args.json {
                    print_json(&habit)?;
                } else {
                    println!("updated {} {}", habit_ref(&habit), habit.title);
                }
            }
            AdminSubcommands::Rm(rm_args) => {
                let removed = app.admin_delete_habit(&principal, &rm_args.id)?;
                println!("deleted {}", ids::display_id(&removed));
            }
        },
    }

    Ok(())
}

fn reference_clock(today: Option<&str>) -> Result<Box<dyn clock::Clock>, app::AppError> {
    match today.map(str::trim).filter(|value| !value.is_empty()) {
        Some(raw) => {
            let day = clock::parse_day(raw)?;
            tracing::debug!(day = %raw, "reference day pinned");
            Ok(Box::new(clock::FixedClock::on_day(day)))
        }
        None => Ok(Box::new(clock::SystemClock)),
    }
}

fn completed_filter(done: bool, pending: bool) -> Option<bool> {
    match (done, pending) {
        (true, _) => Some(true),
        (false, true) => Some(false),
        (false, false) => None,
    }
}

fn patch_from(title: Option<String>, fields: cli::HabitFieldArgs) -> app::HabitPatch {
    app::HabitPatch {
        title,
        description: fields.description,
        color: fields.color,
        icon: fields.icon,
    }
}

fn print_transition(habit: &app::HabitView, json: bool) -> Result<(), app::AppError> {
    if json {
        return print_json(habit);
    }
    let mark = if habit.completed_today { "done" } else { "pending" };
    println!(
        "{} {} {} streak={}",
        habit_ref(habit),
        mark,
        habit.title,
        habit.streak
    );
    Ok(())
}

fn habit_ref(habit: &app::HabitView) -> &str {
    ids::display_id(&habit.id)
}
