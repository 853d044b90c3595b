//! Usage: Per-client config format adapters (owned key + server entry shape).
//!
//! All client-specific knowledge lives behind `ConfigFormat`. Supporting a new
//! desktop client means adding a variant here, not editing the switch
//! coordinator.

use crate::domain::working_sets::ServerDefinition;
use serde_json::{json, Map, Value};
use std::path::{Path, PathBuf};

pub trait ConfigFormat: Send + Sync {
    /// Stable identifier for the client flavor (used in logs and errors).
    fn client_name(&self) -> &'static str;

    /// The single top-level key this engine is authorized to overwrite.
    fn owned_key(&self) -> &'static str {
        "mcpServers"
    }

    /// Render one server definition as the client's launch-spec entry.
    fn server_entry(&self, server: &ServerDefinition) -> Value;

    /// Well-known location of the client's config file under `home`.
    fn default_config_path(&self, home: &Path) -> PathBuf;
}

fn base_entry(server: &ServerDefinition, include_empty_args: bool) -> Value {
    let mut entry = Map::new();
    entry.insert("command".to_string(), json!(server.command));
    if include_empty_args || !server.args.is_empty() {
        entry.insert("args".to_string(), json!(server.args));
    }
    if !server.env.is_empty() {
        entry.insert("env".to_string(), json!(server.env));
    }
    if let Some(cwd) = server.cwd.as_deref() {
        entry.insert("cwd".to_string(), json!(cwd));
    }
    Value::Object(entry)
}

/// Claude Desktop: `claude_desktop_config.json`, `mcpServers` map, entries
/// always carry `args` (the client writes `"args": []` itself).
pub struct ClaudeDesktopFormat;

impl ConfigFormat for ClaudeDesktopFormat {
    fn client_name(&self) -> &'static str {
        "claude-desktop"
    }

    fn server_entry(&self, server: &ServerDefinition) -> Value {
        base_entry(server, true)
    }

    #[cfg(target_os = "macos")]
    fn default_config_path(&self, home: &Path) -> PathBuf {
        home.join("Library")
            .join("Application Support")
            .join("Claude")
            .join("claude_desktop_config.json")
    }

    #[cfg(windows)]
    fn default_config_path(&self, home: &Path) -> PathBuf {
        home.join("AppData")
            .join("Roaming")
            .join("Claude")
            .join("claude_desktop_config.json")
    }

    #[cfg(not(any(target_os = "macos", windows)))]
    fn default_config_path(&self, home: &Path) -> PathBuf {
        home.join(".config")
            .join("Claude")
            .join("claude_desktop_config.json")
    }
}

/// Cursor: `~/.cursor/mcp.json`, `mcpServers` map, empty `args` omitted.
pub struct CursorFormat;

impl ConfigFormat for CursorFormat {
    fn client_name(&self) -> &'static str {
        "cursor"
    }

    fn server_entry(&self, server: &ServerDefinition) -> Value {
        base_entry(server, false)
    }

    fn default_config_path(&self, home: &Path) -> PathBuf {
        home.join(".cursor").join("mcp.json")
    }
}

/// Windsurf: `~/.codeium/windsurf/mcp_config.json`, `mcpServers` map.
pub struct WindsurfFormat;

impl ConfigFormat for WindsurfFormat {
    fn client_name(&self) -> &'static str {
        "windsurf"
    }

    fn server_entry(&self, server: &ServerDefinition) -> Value {
        base_entry(server, true)
    }

    fn default_config_path(&self, home: &Path) -> PathBuf {
        home.join(".codeium").join("windsurf").join("mcp_config.json")
    }
}
