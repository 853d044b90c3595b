//! Usage: Timestamped verbatim snapshots of the live config file.
//!
//! A backup strictly precedes the write it protects. Files are named
//! `before_{workingSetId}_{YYYYMMDD_HHMMSS}[_N].json` with content
//! byte-identical to the config at capture time.

use crate::shared::time::{backup_timestamp_now, parse_backup_timestamp};
use chrono::NaiveDateTime;
use serde::Serialize;
use std::path::{Path, PathBuf};

const BACKUP_PREFIX: &str = "before_";
const BACKUP_EXT: &str = "json";

#[derive(Debug, Clone, Serialize)]
pub struct Backup {
    pub id: String,
    pub path: PathBuf,
    /// Capture time as recorded in the id, `YYYY-MM-DD HH:MM:SS`.
    pub created_at: String,
    pub size_bytes: u64,
    pub source_config_path: PathBuf,
    #[serde(skip)]
    created: NaiveDateTime,
    #[serde(skip)]
    collision_seq: u32,
    /// Filesystem mtime, used to order same-second captures.
    #[serde(skip)]
    modified: Option<std::time::SystemTime>,
}

/// Snapshot `config_path` into `backup_dir`. The source must exist; callers
/// skip the backup step on first-run switches where there is nothing to
/// protect. Same-second id collisions get a `_N` suffix.
pub(crate) fn create(
    config_path: &Path,
    backup_dir: &Path,
    working_set_id: &str,
) -> Result<Backup, String> {
    let bytes = std::fs::read(config_path).map_err(|e| {
        format!(
            "BACKUP_ERROR: failed to read {}: {e}",
            config_path.display()
        )
    })?;

    std::fs::create_dir_all(backup_dir).map_err(|e| {
        format!(
            "BACKUP_ERROR: failed to create backup dir {}: {e}",
            backup_dir.display()
        )
    })?;

    let timestamp = backup_timestamp_now();
    let base_id = format!("{BACKUP_PREFIX}{working_set_id}_{timestamp}");

    let mut id = base_id.clone();
    let mut seq = 0u32;
    let mut path = backup_dir.join(format!("{id}.{BACKUP_EXT}"));
    while path.exists() {
        seq += 1;
        id = format!("{base_id}_{seq}");
        path = backup_dir.join(format!("{id}.{BACKUP_EXT}"));
    }

    std::fs::write(&path, &bytes)
        .map_err(|e| format!("BACKUP_ERROR: failed to write {}: {e}", path.display()))?;

    let created = parse_backup_timestamp(&timestamp)
        .ok_or_else(|| format!("BACKUP_ERROR: generated bad timestamp {timestamp}"))?;

    let modified = std::fs::metadata(&path).ok().and_then(|m| m.modified().ok());

    Ok(Backup {
        id,
        path,
        created_at: created.format("%Y-%m-%d %H:%M:%S").to_string(),
        size_bytes: bytes.len() as u64,
        source_config_path: config_path.to_path_buf(),
        created,
        collision_seq: seq,
        modified,
    })
}

/// Split a backup id into (working_set_id, timestamp, collision_seq).
///
/// Working-set ids may themselves contain underscores, so parsing anchors on
/// the trailing tokens: an optional short numeric suffix, then a 6-digit time,
/// then an 8-digit date.
fn parse_backup_id(id: &str) -> Option<(String, NaiveDateTime, u32)> {
    let rest = id.strip_prefix(BACKUP_PREFIX)?;

    let mut tokens: Vec<&str> = rest.split('_').collect();
    if tokens.len() < 3 {
        return None;
    }

    let mut seq = 0u32;
    let last = *tokens.last()?;
    if last.len() <= 3 && last.chars().all(|c| c.is_ascii_digit()) {
        seq = last.parse().ok()?;
        tokens.pop();
        if tokens.len() < 3 {
            return None;
        }
    }

    let time_token = tokens.pop()?;
    let date_token = tokens.pop()?;
    if time_token.len() != 6 || date_token.len() != 8 {
        return None;
    }

    let created = parse_backup_timestamp(&format!("{date_token}_{time_token}"))?;
    if tokens.is_empty() {
        return None;
    }
    Some((tokens.join("_"), created, seq))
}

fn backup_from_entry(backup_dir: &Path, file_name: &str, source_config_path: &Path) -> Option<Backup> {
    let id = file_name.strip_suffix(&format!(".{BACKUP_EXT}"))?;
    let (_working_set_id, created, collision_seq) = parse_backup_id(id)?;
    let path = backup_dir.join(file_name);
    let meta = std::fs::metadata(&path).ok()?;

    Some(Backup {
        id: id.to_string(),
        path,
        created_at: created.format("%Y-%m-%d %H:%M:%S").to_string(),
        size_bytes: meta.len(),
        source_config_path: source_config_path.to_path_buf(),
        created,
        collision_seq,
        modified: meta.modified().ok(),
    })
}

/// List backups newest first. Files that don't match the naming scheme are
/// skipped rather than treated as errors.
pub(crate) fn list(backup_dir: &Path, source_config_path: &Path) -> Result<Vec<Backup>, String> {
    if !backup_dir.exists() {
        return Ok(Vec::new());
    }

    let entries = std::fs::read_dir(backup_dir).map_err(|e| {
        format!(
            "IO_ERROR: failed to read backup dir {}: {e}",
            backup_dir.display()
        )
    })?;

    let mut backups = Vec::new();
    for entry in entries {
        let entry =
            entry.map_err(|e| format!("IO_ERROR: failed to read backup dir entry: {e}"))?;
        let file_name = entry.file_name();
        let Some(file_name) = file_name.to_str() else {
            continue;
        };
        if let Some(backup) = backup_from_entry(backup_dir, file_name, source_config_path) {
            backups.push(backup);
        }
    }

    // Filename timestamps have one-second resolution, so same-second captures
    // fall back to mtime, then the collision suffix.
    backups.sort_by(|a, b| {
        (b.created, b.modified, b.collision_seq, &b.id)
            .cmp(&(a.created, a.modified, a.collision_seq, &a.id))
    });
    Ok(backups)
}

pub(crate) fn find(
    backup_dir: &Path,
    source_config_path: &Path,
    backup_id: &str,
) -> Result<Backup, String> {
    list(backup_dir, source_config_path)?
        .into_iter()
        .find(|b| b.id == backup_id)
        .ok_or_else(|| format!("NOT_FOUND: no backup with id {backup_id}"))
}

/// Copy the backup's bytes back over the live path using the same atomic-write
/// primitive as config writes. Does not itself create a further backup; that
/// is the caller's explicit option.
pub(crate) fn restore(backup: &Backup, config_path: &Path) -> Result<(), String> {
    let bytes = std::fs::read(&backup.path)
        .map_err(|e| format!("IO_ERROR: failed to read {}: {e}", backup.path.display()))?;
    crate::infra::client_config::write_file_atomic(config_path, &bytes)
}
