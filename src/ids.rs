use sha2::{Digest, Sha256};
use uuid::Uuid;

const HABIT_PREFIX: &str = "hab";

/// Generates a short habit id (`hab-1a2b`), retrying on collision. Falls back
/// to a longer suffix if the short space keeps colliding.
pub fn generate_habit_id<F>(mut exists: F) -> String
where
    F: FnMut(&str) -> bool,
{
    for _ in 0..64 {
        let candidate = format!("{HABIT_PREFIX}-{}", short_hash(&Uuid::now_v7().to_string()));
        if !exists(&candidate) {
            return candidate;
        }
    }

    format!(
        "{HABIT_PREFIX}-{}",
        &Uuid::now_v7().simple().to_string()[..12]
    )
}

fn short_hash(seed: &str) -> String {
    let mut hasher = Sha256::new();
    hasher.update(seed.as_bytes());
    let digest = format!("{:x}", hasher.finalize());
    digest[..4].to_string()
}

pub fn new_user_id() -> String {
    format!("usr-{}", Uuid::now_v7())
}

pub fn new_event_id() -> String {
    Uuid::now_v7().to_string()
}

/// Accepts a habit id with or without its prefix.
pub fn normalize_habit_id(raw: &str) -> String {
    let trimmed = raw.trim().to_ascii_lowercase();
    if trimmed.starts_with(&format!("{HABIT_PREFIX}-")) {
        trimmed
    } else {
        format!("{HABIT_PREFIX}-{trimmed}")
    }
}

pub fn display_id(id: &str) -> &str {
    id.rsplit_once('-').map_or(id, |(_, suffix)| suffix)
}
