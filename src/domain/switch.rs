//! Usage: Switch orchestration — backup → write → validate → (commit | rollback).
//!
//! The only mutating paths in the crate. `preview` runs the read/diff steps of
//! the same plan without touching the filesystem beyond the initial read.

use crate::infra::backups;
use crate::infra::client_config::{self, ConfigDocument};
use crate::infra::config_format::ConfigFormat;
use crate::infra::validation;
use crate::shared::error::codes;
use crate::working_sets::WorkingSetRegistry;
use serde::Serialize;
use serde_json::Value;
use std::collections::HashSet;
use std::path::{Path, PathBuf};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum SwitchState {
    Committed,
    RolledBack,
    Failed,
}

#[derive(Debug, Clone, Serialize)]
pub struct SwitchResult {
    pub success: bool,
    pub state: SwitchState,
    pub backup_path: Option<PathBuf>,
    pub added_servers: Vec<String>,
    pub removed_servers: Vec<String>,
    pub error_kind: Option<String>,
    pub error_detail: Option<String>,
    /// Set when neither commit nor rollback left the file in a known-good
    /// state; the operator must inspect (and possibly restore) by hand.
    pub requires_manual_intervention: bool,
}

#[derive(Debug, Clone, Serialize)]
pub struct PreviewResult {
    pub working_set_id: String,
    pub added: Vec<String>,
    pub removed: Vec<String>,
    /// Full key list of the managed map the switch would write.
    pub new_servers: Vec<String>,
}

#[derive(Debug, Clone, Serialize)]
pub struct RestoreResult {
    pub backup_id: String,
    pub restored_to: PathBuf,
    /// Safety snapshot of the overwritten live file, when the caller asked
    /// for one.
    pub pre_restore_backup_path: Option<PathBuf>,
}

fn diff(from_keys: &[String], to_keys: &[String]) -> (Vec<String>, Vec<String>) {
    let from_set: HashSet<&str> = from_keys.iter().map(String::as_str).collect();
    let to_set: HashSet<&str> = to_keys.iter().map(String::as_str).collect();

    let mut added: Vec<String> = to_set
        .difference(&from_set)
        .map(|v| v.to_string())
        .collect();
    let mut removed: Vec<String> = from_set
        .difference(&to_set)
        .map(|v| v.to_string())
        .collect();

    added.sort();
    removed.sort();
    (added, removed)
}

struct SwitchPlan {
    new_doc: ConfigDocument,
    existed: bool,
    added: Vec<String>,
    removed: Vec<String>,
    new_servers: Vec<String>,
}

/// Steps 1–4 of the protocol: read, resolve, merge, diff. Read-only.
fn plan(
    registry: &WorkingSetRegistry,
    format: &dyn ConfigFormat,
    config_path: &Path,
    working_set_id: &str,
) -> Result<SwitchPlan, String> {
    let (doc, existed) = client_config::read_document(config_path)?;

    let ws = registry
        .get(working_set_id)
        .ok_or_else(|| format!("NOT_FOUND: no working set with id {working_set_id}"))?;

    let mut new_managed = ConfigDocument::new();
    for def in registry.resolve(ws)? {
        new_managed.insert(def.name.clone(), format.server_entry(def));
    }

    let owned_key = format.owned_key();
    let old_keys: Vec<String> = doc
        .get(owned_key)
        .and_then(Value::as_object)
        .map(|m| m.keys().cloned().collect())
        .unwrap_or_default();
    let new_keys: Vec<String> = new_managed.keys().cloned().collect();
    let (added, removed) = diff(&old_keys, &new_keys);

    // Replace only the owned key; every foreign top-level key passes through
    // in its original position.
    let mut new_doc = doc;
    new_doc.insert(owned_key.to_string(), Value::Object(new_managed));

    Ok(SwitchPlan {
        new_doc,
        existed,
        added,
        removed,
        new_servers: new_keys,
    })
}

pub(crate) fn preview(
    registry: &WorkingSetRegistry,
    format: &dyn ConfigFormat,
    config_path: &Path,
    working_set_id: &str,
) -> Result<PreviewResult, String> {
    let plan = plan(registry, format, config_path, working_set_id)?;
    Ok(PreviewResult {
        working_set_id: working_set_id.to_string(),
        added: plan.added,
        removed: plan.removed,
        new_servers: plan.new_servers,
    })
}

fn committed(plan: SwitchPlan, backup_path: Option<PathBuf>) -> SwitchResult {
    SwitchResult {
        success: true,
        state: SwitchState::Committed,
        backup_path,
        added_servers: plan.added,
        removed_servers: plan.removed,
        error_kind: None,
        error_detail: None,
        requires_manual_intervention: false,
    }
}

/// Full switch protocol. The caller holds the per-path lock for the whole
/// call; once the backup is taken the operation runs to commit or rollback.
pub(crate) fn switch(
    registry: &WorkingSetRegistry,
    format: &dyn ConfigFormat,
    config_path: &Path,
    backup_dir: &Path,
    working_set_id: &str,
    create_backup: bool,
) -> Result<SwitchResult, String> {
    let plan = plan(registry, format, config_path, working_set_id)?;

    // Never write without a safety net unless the caller opted out. An absent
    // live file has nothing to snapshot (first run); that is not an error.
    let backup = if create_backup && plan.existed {
        Some(backups::create(config_path, backup_dir, working_set_id)?)
    } else {
        None
    };
    let backup_path = backup.as_ref().map(|b| b.path.clone());

    let written = client_config::write_document(config_path, &plan.new_doc)?;

    let violations = validation::check(&written, format);
    if violations.is_empty() {
        tracing::info!(
            working_set = working_set_id,
            client = format.client_name(),
            added = plan.added.len(),
            removed = plan.removed.len(),
            backup = backup.is_some(),
            "switch committed"
        );
        return Ok(committed(plan, backup_path));
    }

    let detail = violations
        .iter()
        .map(|v| format!("{}: {}", v.path, v.message))
        .collect::<Vec<_>>()
        .join("; ");

    let Some(backup) = backup else {
        tracing::error!(
            working_set = working_set_id,
            client = format.client_name(),
            %detail,
            "post-write validation failed and no backup exists; manual fix required"
        );
        return Ok(SwitchResult {
            success: false,
            state: SwitchState::Failed,
            backup_path: None,
            added_servers: plan.added,
            removed_servers: plan.removed,
            error_kind: Some(codes::VALIDATION_ERROR.to_string()),
            error_detail: Some(format!(
                "{detail}; no backup was taken (caller opted out or file was absent), rollback impossible"
            )),
            requires_manual_intervention: true,
        });
    };

    match backups::restore(&backup, config_path) {
        Ok(()) => {
            tracing::warn!(
                working_set = working_set_id,
                client = format.client_name(),
                backup_id = %backup.id,
                %detail,
                "post-write validation failed; rolled back to backup"
            );
            Ok(SwitchResult {
                success: false,
                state: SwitchState::RolledBack,
                backup_path: Some(backup.path),
                added_servers: plan.added,
                removed_servers: plan.removed,
                error_kind: Some(codes::VALIDATION_ERROR.to_string()),
                error_detail: Some(detail),
                requires_manual_intervention: false,
            })
        }
        Err(restore_err) => {
            tracing::error!(
                working_set = working_set_id,
                client = format.client_name(),
                backup_id = %backup.id,
                %detail,
                %restore_err,
                "post-write validation failed AND rollback failed; manual restore required"
            );
            Ok(SwitchResult {
                success: false,
                state: SwitchState::Failed,
                backup_path: Some(backup.path),
                added_servers: plan.added,
                removed_servers: plan.removed,
                error_kind: Some(codes::VALIDATION_ERROR.to_string()),
                error_detail: Some(format!(
                    "validation failed ({detail}); rollback also failed ({restore_err}); restore the backup by hand"
                )),
                requires_manual_intervention: true,
            })
        }
    }
}

/// Restore a backup over the live file. Shares the per-path lock with
/// `switch`, so a manual restore can never race an in-flight switch.
pub(crate) fn restore(
    config_path: &Path,
    backup_dir: &Path,
    backup_id: &str,
    backup_current: bool,
) -> Result<RestoreResult, String> {
    let backup = backups::find(backup_dir, config_path, backup_id)?;

    let pre_restore_backup_path = if backup_current && config_path.exists() {
        Some(backups::create(config_path, backup_dir, "restore")?.path)
    } else {
        None
    };

    backups::restore(&backup, config_path)?;
    tracing::info!(
        backup_id,
        config = %config_path.display(),
        "backup restored over live config"
    );

    Ok(RestoreResult {
        backup_id: backup_id.to_string(),
        restored_to: config_path.to_path_buf(),
        pre_restore_backup_path,
    })
}
