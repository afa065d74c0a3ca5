use clap::{CommandFactory, Parser};

use super::{AdminSubcommands, Cli, Commands};

fn parse(args: &[&str]) -> Cli {
    Cli::parse_from(args)
}

#[test]
fn command_definition_is_consistent() {
    Cli::command().debug_assert();
}

#[test]
fn global_flags_parse_before_subcommand() {
    let cli = parse(&[
        "habits",
        "--db",
        "/tmp/h.sqlite",
        "--user",
        "me@example.com",
        "--today",
        "2024-01-03",
        "stats",
        "--json",
    ]);
    assert_eq!(cli.db.as_deref(), Some("/tmp/h.sqlite"));
    assert_eq!(cli.user.as_deref(), Some("me@example.com"));
    assert_eq!(cli.today.as_deref(), Some("2024-01-03"));
    match cli.command {
        Commands::Stats(args) => assert!(args.json),
        other => panic!("expected Stats, got {:?}", other),
    }
}

#[test]
fn new_accepts_optional_fields() {
    let cli = parse(&[
        "habits", "new", "Read", "--desc", "20 pages", "--color", "#00aa00", "--icon", "book",
    ]);
    match cli.command {
        Commands::New(args) => {
            assert_eq!(args.title, "Read");
            assert_eq!(args.fields.description.as_deref(), Some("20 pages"));
            assert_eq!(args.fields.color.as_deref(), Some("#00aa00"));
            assert_eq!(args.fields.icon.as_deref(), Some("book"));
            assert!(!args.json);
        }
        other => panic!("expected New, got {:?}", other),
    }
}

#[test]
fn update_short_flags_parse() {
    let cli = parse(&["habits", "update", "1a2b", "-t", "Renamed", "-D", "new desc"]);
    match cli.command {
        Commands::Update(args) => {
            assert_eq!(args.id, "1a2b");
            assert_eq!(args.title.as_deref(), Some("Renamed"));
            assert_eq!(args.fields.description.as_deref(), Some("new desc"));
            assert_eq!(args.fields.color, None);
        }
        other => panic!("expected Update, got {:?}", other),
    }
}

#[test]
fn ls_done_and_pending_conflict() {
    let result = Cli::try_parse_from(["habits", "ls", "--done", "--pending"]);
    assert!(result.is_err());

    let cli = parse(&["habits", "ls", "--pending", "-q", "run"]);
    match cli.command {
        Commands::Ls(args) => {
            assert!(args.pending);
            assert!(!args.done);
            assert_eq!(args.query.as_deref(), Some("run"));
        }
        other => panic!("expected Ls, got {:?}", other),
    }
}

#[test]
fn register_defaults_to_user_role() {
    let cli = parse(&["habits", "register", "me@example.com"]);
    match cli.command {
        Commands::Register(args) => {
            assert_eq!(args.email, "me@example.com");
            assert_eq!(args.role, "user");
        }
        other => panic!("expected Register, got {:?}", other),
    }
}

#[test]
fn admin_subcommands_parse() {
    let cli = parse(&["habits", "admin", "new", "member@example.com", "Assigned"]);
    match cli.command {
        Commands::Admin(args) => match args.command {
            AdminSubcommands::New(new_args) => {
                assert_eq!(new_args.owner, "member@example.com");
                assert_eq!(new_args.title, "Assigned");
            }
            other => panic!("expected admin New, got {:?}", other),
        },
        other => panic!("expected Admin, got {:?}", other),
    }

    let cli = parse(&["habits", "admin", "habits", "--json"]);
    match cli.command {
        Commands::Admin(args) => {
            assert!(matches!(args.command, AdminSubcommands::Habits(ref a) if a.json));
        }
        other => panic!("expected Admin, got {:?}", other),
    }
}

#[test]
fn done_undo_and_logs_take_an_id() {
    for verb in ["done", "undo", "logs", "show"] {
        let cli = parse(&["habits", verb, "hab-1a2b"]);
        let id = match cli.command {
            Commands::Done(args)
            | Commands::Undo(args)
            | Commands::Logs(args)
            | Commands::Show(args) => args.id,
            other => panic!("expected id command, got {:?}", other),
        };
        assert_eq!(id, "hab-1a2b");
    }
}
