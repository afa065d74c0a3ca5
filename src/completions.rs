use std::io::{self, Write};
use std::path::{Path, PathBuf};

use clap_complete::{generate, Shell};

use crate::app::AppError;

const BIN_NAME: &str = "habits";

pub fn generate_completions(shell: Shell, buf: &mut dyn Write) {
    let mut cmd = crate::cli::styled_command();
    generate(shell, &mut cmd, BIN_NAME, buf);
}

/// Where `--install` writes the script, relative to `home`. Only shells with a
/// conventional per-user completion directory are supported.
fn install_path(shell: Shell, home: &Path) -> Option<PathBuf> {
    match shell {
        Shell::Bash => Some(
            home.join(".local/share/bash-completion/completions")
                .join(BIN_NAME),
        ),
        Shell::Zsh => Some(home.join(".config/habits/completions/_habits")),
        Shell::Fish => Some(home.join(".config/fish/completions/habits.fish")),
        _ => None,
    }
}

fn install_into(shell: Shell, home: &Path) -> io::Result<PathBuf> {
    let path = install_path(shell, home).ok_or_else(|| {
        io::Error::new(
            io::ErrorKind::Unsupported,
            format!("no install location for {shell}"),
        )
    })?;
    if let Some(parent) = path.parent() {
        std::fs::create_dir_all(parent)?;
    }
    let mut script = Vec::new();
    generate_completions(shell, &mut script);
    std::fs::write(&path, script)?;

    if shell == Shell::Zsh {
        ensure_zsh_fpath(home, &path)?;
    }
    Ok(path)
}

/// Adds the completion directory to `fpath` in `.zshrc` once.
fn ensure_zsh_fpath(home: &Path, script: &Path) -> io::Result<()> {
    let Some(dir) = script.parent() else {
        return Ok(());
    };
    let line = format!("fpath=(\"{}\" $fpath)", dir.display());
    let zshrc = home.join(".zshrc");
    let existing = match std::fs::read_to_string(&zshrc) {
        Ok(content) => content,
        Err(err) if err.kind() == io::ErrorKind::NotFound => String::new(),
        Err(err) => return Err(err),
    };
    if existing.lines().any(|current| current.trim() == line) {
        return Ok(());
    }

    let mut file = std::fs::OpenOptions::new()
        .create(true)
        .append(true)
        .open(&zshrc)?;
    writeln!(file, "\n# habits completions\n{line}")?;
    Ok(())
}

fn resolve_shell(raw: Option<&str>) -> Result<Shell, AppError> {
    match raw {
        Some(name) => name
            .trim()
            .to_ascii_lowercase()
            .parse::<Shell>()
            .map_err(|_| AppError::InvalidArgument(format!("unknown shell '{name}'"))),
        None => Shell::from_env().ok_or_else(|| {
            AppError::InvalidArgument(
                "unable to detect shell from $SHELL; pass a shell name".to_string(),
            )
        }),
    }
}

pub fn run_completions_command(shell: Option<&str>, install: bool) -> Result<(), AppError> {
    let shell = resolve_shell(shell)?;
    if install {
        let home = std::env::var_os("HOME")
            .map(PathBuf::from)
            .ok_or_else(|| AppError::InvalidArgument("HOME is not set".to_string()))?;
        let path = install_into(shell, &home)?;
        println!("completions installed to {}", path.display());
    } else {
        generate_completions(shell, &mut io::stdout().lock());
    }
    Ok(())
}
