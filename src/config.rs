//! Optional TOML settings file, layered under CLI flags and environment
//! variables.

use std::path::Path;

use serde::Deserialize;

pub const DEFAULT_CONFIG_PATH: &str = ".habits/config.toml";
pub const DEFAULT_DB_PATH: &str = ".habits/state.sqlite";
pub const DEFAULT_LOG_FILTER: &str = "warn";

#[derive(Debug, Clone, Default, Deserialize, PartialEq, Eq)]
#[serde(deny_unknown_fields)]
pub struct Settings {
    #[serde(default)]
    pub db: Option<String>,
    /// Email of the principal used when `--user` is not given.
    #[serde(default)]
    pub user: Option<String>,
    #[serde(default)]
    pub log: Option<String>,
}

impl Settings {
    /// Loads settings from `path`. A missing file yields defaults.
    pub fn load(path: &Path) -> Result<Self, ConfigError> {
        match std::fs::read_to_string(path) {
            Ok(raw) => Self::parse(&raw),
            Err(err) if err.kind() == std::io::ErrorKind::NotFound => Ok(Self::default()),
            Err(source) => Err(ConfigError::Read {
                path: path.display().to_string(),
                source,
            }),
        }
    }

    pub fn parse(raw: &str) -> Result<Self, ConfigError> {
        Ok(toml::from_str(raw)?)
    }
}

/// Values after layering flag > env > file > default. Flags and environment
/// are already merged by clap before they reach here.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ResolvedConfig {
    pub db_path: String,
    pub user: Option<String>,
    pub log_filter: String,
}

impl ResolvedConfig {
    pub fn resolve(
        db: Option<&str>,
        user: Option<&str>,
        log: Option<&str>,
        settings: &Settings,
    ) -> Self {
        Self {
            db_path: pick(db, settings.db.as_deref()).unwrap_or_else(|| DEFAULT_DB_PATH.to_string()),
            user: pick(user, settings.user.as_deref()),
            log_filter: pick(log, settings.log.as_deref())
                .or_else(|| std::env::var("RUST_LOG").ok().filter(|value| !value.trim().is_empty()))
                .unwrap_or_else(|| DEFAULT_LOG_FILTER.to_string()),
        }
    }
}

fn pick(primary: Option<&str>, fallback: Option<&str>) -> Option<String> {
    primary
        .and_then(non_empty)
        .or_else(|| fallback.and_then(non_empty))
        .map(str::to_string)
}

fn non_empty(raw: &str) -> Option<&str> {
    let trimmed = raw.trim();
    if trimmed.is_empty() {
        None
    } else {
        Some(trimmed)
    }
}

#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("failed to read config '{path}': {source}")]
    Read {
        path: String,
        source: std::io::Error,
    },
    #[error("invalid config: {0}")]
    Parse(#[from] toml::de::Error),
}
