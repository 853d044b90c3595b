//! Usage: `Switchboard` — public facade over the switching engine.
//!
//! One instance per (client config file, backup directory, registry, format).
//! Mutating operations take the per-path lock; read-only queries do not.

use crate::infra::backups::{self, Backup};
use crate::infra::client_config::{self, ConfigDocument};
use crate::infra::config_format::ConfigFormat;
use crate::infra::validation::Violation;
use crate::shared::error::{codes, AppError, AppResult};
use crate::shared::path_locks;
use crate::switch::{self, PreviewResult, RestoreResult, SwitchResult};
use crate::working_sets::{self, WorkingSet, WorkingSetRegistry, WorkingSetSummary};
use serde_json::Value;
use std::path::{Path, PathBuf};

pub struct Switchboard {
    config_path: PathBuf,
    backup_dir: PathBuf,
    registry: WorkingSetRegistry,
    format: Box<dyn ConfigFormat>,
}

impl Switchboard {
    pub fn new(
        config_path: impl Into<PathBuf>,
        backup_dir: impl Into<PathBuf>,
        registry: WorkingSetRegistry,
        format: Box<dyn ConfigFormat>,
    ) -> Self {
        Self {
            config_path: config_path.into(),
            backup_dir: backup_dir.into(),
            registry,
            format,
        }
    }

    pub fn config_path(&self) -> &Path {
        &self.config_path
    }

    pub fn backup_dir(&self) -> &Path {
        &self.backup_dir
    }

    /// Live managed map for `is_current` queries. Listing must stay usable
    /// even when the config is broken, so read failures degrade to an empty
    /// map instead of erroring.
    fn live_managed_map(&self) -> ConfigDocument {
        match client_config::read_document(&self.config_path) {
            Ok((doc, _)) => doc
                .get(self.format.owned_key())
                .and_then(Value::as_object)
                .cloned()
                .unwrap_or_default(),
            Err(err) => {
                tracing::warn!(
                    config = %self.config_path.display(),
                    %err,
                    "could not read live config; treating managed map as empty"
                );
                ConfigDocument::new()
            }
        }
    }

    /// Working sets in registry order, each annotated with `is_current`
    /// (recomputed from the live file on every call, never cached).
    pub fn list_working_sets(&self) -> AppResult<Vec<WorkingSetSummary>> {
        let live = self.live_managed_map();
        Ok(self
            .registry
            .list()
            .iter()
            .map(|ws| working_sets::summarize(ws, &live))
            .collect())
    }

    pub fn get_working_set(&self, id: &str) -> AppResult<&WorkingSet> {
        self.registry
            .get(id)
            .ok_or_else(|| AppError::new(codes::NOT_FOUND, format!("no working set with id {id}")))
    }

    /// Read-only dry run of `switch`: what would be added/removed and the full
    /// managed map the switch would write.
    pub fn preview(&self, id: &str) -> AppResult<PreviewResult> {
        switch::preview(&self.registry, self.format.as_ref(), &self.config_path, id)
            .map_err(Into::into)
    }

    /// Structural check of the working set against the server catalog.
    pub fn validate_working_set(&self, id: &str) -> AppResult<Vec<Violation>> {
        self.registry.validate(id)
    }

    /// Run the backup → write → validate → (commit | rollback) protocol.
    /// Fails fast with `BUSY` when another switch/restore holds this path.
    pub fn switch(&self, id: &str, create_backup: bool) -> AppResult<SwitchResult> {
        path_locks::with_path_lock(&self.config_path, || {
            switch::switch(
                &self.registry,
                self.format.as_ref(),
                &self.config_path,
                &self.backup_dir,
                id,
                create_backup,
            )
        })
        .ok_or_else(|| self.busy())?
        .map_err(Into::into)
    }

    /// Backups for this engine's config file, newest first.
    pub fn list_backups(&self) -> AppResult<Vec<Backup>> {
        backups::list(&self.backup_dir, &self.config_path).map_err(Into::into)
    }

    /// Copy a backup's bytes back over the live config. `backup_current`
    /// snapshots the about-to-be-overwritten file first (under the `restore`
    /// slug); the engine never assumes either default.
    pub fn restore_backup(&self, backup_id: &str, backup_current: bool) -> AppResult<RestoreResult> {
        path_locks::with_path_lock(&self.config_path, || {
            switch::restore(&self.config_path, &self.backup_dir, backup_id, backup_current)
        })
        .ok_or_else(|| self.busy())?
        .map_err(Into::into)
    }

    fn busy(&self) -> AppError {
        AppError::new(
            codes::BUSY,
            format!(
                "another switch or restore is in flight for {}",
                self.config_path.display()
            ),
        )
    }
}
