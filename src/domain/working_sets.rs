//! Usage: Immutable catalog of named working sets and the servers they reference.
//!
//! Loaded once at process start; `is_current` is recomputed from the live
//! managed map on every query rather than cached, so there is no staleness to
//! invalidate.

use crate::infra::client_config::ConfigDocument;
use crate::infra::validation::Violation;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::path::Path;

/// Launch spec for one tool server, resolved from the global catalog by name.
/// Not owned by any single working set.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ServerDefinition {
    pub name: String,
    pub command: String,
    #[serde(default)]
    pub args: Vec<String>,
    #[serde(default)]
    pub env: BTreeMap<String, String>,
    #[serde(default)]
    pub cwd: Option<String>,
}

/// Reference from a working set to a catalog server.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ServerRef {
    pub name: String,
    #[serde(default)]
    pub required: bool,
    #[serde(default)]
    pub description: String,
}

/// Named, curated subset of server definitions representing one operator
/// workflow. Immutable once loaded.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct WorkingSet {
    pub id: String,
    pub name: String,
    #[serde(default)]
    pub description: String,
    #[serde(default)]
    pub icon: String,
    #[serde(default)]
    pub category: String,
    pub servers: Vec<ServerRef>,
}

/// Listing row: a working set plus whether it is currently active.
#[derive(Debug, Clone, Serialize)]
pub struct WorkingSetSummary {
    pub id: String,
    pub name: String,
    pub description: String,
    pub icon: String,
    pub category: String,
    pub server_count: usize,
    pub required_count: usize,
    pub is_current: bool,
}

/// On-disk shape of the static registry file.
#[derive(Debug, Deserialize)]
struct RegistryFile {
    #[serde(default)]
    servers: Vec<ServerDefinition>,
    #[serde(default)]
    working_sets: Vec<WorkingSet>,
}

#[derive(Debug)]
pub struct WorkingSetRegistry {
    working_sets: Vec<WorkingSet>,
    catalog: BTreeMap<String, ServerDefinition>,
}

impl WorkingSetRegistry {
    /// Build the registry, enforcing unique working-set ids and server names.
    pub fn new(
        servers: Vec<ServerDefinition>,
        working_sets: Vec<WorkingSet>,
    ) -> crate::shared::error::AppResult<Self> {
        let mut catalog: BTreeMap<String, ServerDefinition> = BTreeMap::new();
        for server in servers {
            if server.name.trim().is_empty() {
                return Err("REGISTRY_ERROR: server catalog entry has an empty name".into());
            }
            if catalog.insert(server.name.clone(), server).is_some() {
                return Err(
                    "REGISTRY_ERROR: duplicate server name in catalog".to_string().into()
                );
            }
        }

        let mut seen_ids = std::collections::HashSet::new();
        for ws in &working_sets {
            if ws.id.trim().is_empty() {
                return Err("REGISTRY_ERROR: working set has an empty id".into());
            }
            if !seen_ids.insert(ws.id.as_str()) {
                return Err(
                    format!("REGISTRY_ERROR: duplicate working set id {}", ws.id).into(),
                );
            }
        }

        Ok(Self {
            working_sets,
            catalog,
        })
    }

    /// Read the static registry JSON (`{"servers": [...], "working_sets": [...]}`).
    pub fn load(path: &Path) -> crate::shared::error::AppResult<Self> {
        let bytes = std::fs::read(path)
            .map_err(|e| format!("IO_ERROR: failed to read {}: {e}", path.display()))?;
        let file: RegistryFile = serde_json::from_slice(&bytes).map_err(|e| {
            format!(
                "REGISTRY_ERROR: {} is not a valid registry file: {e}",
                path.display()
            )
        })?;
        Self::new(file.servers, file.working_sets)
    }

    pub fn list(&self) -> &[WorkingSet] {
        &self.working_sets
    }

    pub fn get(&self, id: &str) -> Option<&WorkingSet> {
        self.working_sets.iter().find(|ws| ws.id == id)
    }

    pub fn catalog_server(&self, name: &str) -> Option<&ServerDefinition> {
        self.catalog.get(name)
    }

    /// Structural check: every referenced server name must exist in the global
    /// catalog. Never mutates anything.
    pub fn validate(&self, id: &str) -> crate::shared::error::AppResult<Vec<Violation>> {
        let ws = self
            .get(id)
            .ok_or_else(|| format!("NOT_FOUND: no working set with id {id}"))?;

        let mut violations = Vec::new();
        for server_ref in &ws.servers {
            if self.catalog.get(&server_ref.name).is_none() {
                violations.push(Violation::new(
                    format!("working_sets.{id}.servers.{}", server_ref.name),
                    "referenced server is not in the catalog".to_string(),
                ));
            }
        }
        Ok(violations)
    }

    /// Resolve every ref of `ws` to a catalog definition; a missing name is a
    /// registry integrity defect and aborts before anything is written.
    pub(crate) fn resolve<'a>(
        &'a self,
        ws: &'a WorkingSet,
    ) -> Result<Vec<&'a ServerDefinition>, String> {
        let mut resolved = Vec::with_capacity(ws.servers.len());
        for server_ref in &ws.servers {
            let def = self.catalog.get(&server_ref.name).ok_or_else(|| {
                format!(
                    "REGISTRY_ERROR: working set {} references unknown server {}",
                    ws.id, server_ref.name
                )
            })?;
            resolved.push(def);
        }
        Ok(resolved)
    }
}

/// Required-subset policy: a working set is current iff every server it marks
/// `required` is present in the live managed map. Optional servers may coexist
/// without breaking currency, and a set with no required servers is vacuously
/// current.
pub(crate) fn is_current(ws: &WorkingSet, live_managed: &ConfigDocument) -> bool {
    ws.servers
        .iter()
        .filter(|r| r.required)
        .all(|r| live_managed.contains_key(&r.name))
}

pub(crate) fn summarize(ws: &WorkingSet, live_managed: &ConfigDocument) -> WorkingSetSummary {
    WorkingSetSummary {
        id: ws.id.clone(),
        name: ws.name.clone(),
        description: ws.description.clone(),
        icon: ws.icon.clone(),
        category: ws.category.clone(),
        server_count: ws.servers.len(),
        required_count: ws.servers.iter().filter(|r| r.required).count(),
        is_current: is_current(ws, live_managed),
    }
}
