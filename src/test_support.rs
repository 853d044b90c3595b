//! Usage: Public test helpers for integration tests.

use crate::infra::config_format::ConfigFormat;
use crate::working_sets::{ServerDefinition, ServerRef, WorkingSet, WorkingSetRegistry};
use serde_json::{json, Value};
use std::collections::BTreeMap;
use std::path::Path;

pub fn server_definition(name: &str) -> ServerDefinition {
    ServerDefinition {
        name: name.to_string(),
        command: "npx".to_string(),
        args: vec!["-y".to_string(), format!("{name}-mcp-server")],
        env: BTreeMap::new(),
        cwd: None,
    }
}

pub fn server_ref(name: &str, required: bool) -> ServerRef {
    ServerRef {
        name: name.to_string(),
        required,
        description: format!("{name} tooling"),
    }
}

pub fn working_set(id: &str, refs: Vec<ServerRef>) -> WorkingSet {
    WorkingSet {
        id: id.to_string(),
        name: id.to_string(),
        description: String::new(),
        icon: String::new(),
        category: "test".to_string(),
        servers: refs,
    }
}

/// Catalog `{a, b, c, d}` with two working sets:
/// `robotics` requires `{b, c}`, `research` requires `{a, b}` and optionally
/// carries `d`.
pub fn fixture_registry() -> WorkingSetRegistry {
    WorkingSetRegistry::new(
        vec![
            server_definition("a"),
            server_definition("b"),
            server_definition("c"),
            server_definition("d"),
        ],
        vec![
            working_set(
                "robotics",
                vec![server_ref("b", true), server_ref("c", true)],
            ),
            working_set(
                "research",
                vec![
                    server_ref("a", true),
                    server_ref("b", true),
                    server_ref("d", false),
                ],
            ),
        ],
    )
    .expect("fixture registry is well-formed")
}

/// Format whose entries are missing the required `command` field, so every
/// post-write structural check fails. Used to exercise the rollback path.
pub struct BrokenEntryFormat;

impl ConfigFormat for BrokenEntryFormat {
    fn client_name(&self) -> &'static str {
        "broken-entry"
    }

    fn server_entry(&self, server: &ServerDefinition) -> Value {
        json!({ "args": server.args })
    }

    fn default_config_path(&self, home: &Path) -> std::path::PathBuf {
        home.join("broken.json")
    }
}
