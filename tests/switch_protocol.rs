use mcp_switchboard::test_support::fixture_registry;
use mcp_switchboard::{ClaudeDesktopFormat, SwitchState, Switchboard};
use serde_json::{json, Value};
use std::path::Path;

fn switchboard(dir: &Path) -> Switchboard {
    Switchboard::new(
        dir.join("config.json"),
        dir.join("backups"),
        fixture_registry(),
        Box::new(ClaudeDesktopFormat),
    )
}

fn write_config(path: &Path, value: &Value) {
    let mut bytes = serde_json::to_vec_pretty(value).expect("serialize json");
    bytes.push(b'\n');
    std::fs::write(path, bytes).expect("write config");
}

fn read_config(path: &Path) -> Value {
    let bytes = std::fs::read(path).expect("read config");
    serde_json::from_slice(&bytes).expect("parse config")
}

fn managed_keys(config: &Value) -> Vec<String> {
    config["mcpServers"]
        .as_object()
        .expect("mcpServers object")
        .keys()
        .cloned()
        .collect()
}

#[test]
fn scenario_a_switch_replaces_only_the_managed_section() {
    let dir = tempfile::tempdir().expect("tempdir");
    let board = switchboard(dir.path());

    write_config(
        board.config_path(),
        &json!({
            "theme": "dark",
            "mcpServers": {
                "a": { "command": "npx", "args": ["-y", "a-mcp-server"] },
                "b": { "command": "npx", "args": ["-y", "b-mcp-server"] }
            },
            "telemetry": { "enabled": false, "sample_rate": 0.25 }
        }),
    );

    let result = board.switch("robotics", true).expect("switch robotics");
    assert!(result.success);
    assert_eq!(result.state, SwitchState::Committed);
    assert_eq!(result.added_servers, vec!["c"]);
    assert_eq!(result.removed_servers, vec!["a"]);
    let backup_path = result.backup_path.expect("backup created");
    assert!(backup_path.exists());

    let config = read_config(board.config_path());
    assert_eq!(managed_keys(&config), vec!["b", "c"]);
    assert_eq!(config["theme"], "dark");
    assert_eq!(config["telemetry"], json!({"enabled": false, "sample_rate": 0.25}));

    // Foreign keys keep their original positions around the owned key.
    let top_keys: Vec<&String> = config.as_object().expect("object").keys().collect();
    assert_eq!(top_keys, vec!["theme", "mcpServers", "telemetry"]);
}

#[test]
fn scenario_b_absent_config_is_created_without_a_backup() {
    let dir = tempfile::tempdir().expect("tempdir");
    let board = switchboard(dir.path());
    assert!(!board.config_path().exists());

    let result = board.switch("robotics", true).expect("first-run switch");
    assert!(result.success);
    assert_eq!(result.backup_path, None);
    assert_eq!(result.added_servers, vec!["b", "c"]);
    assert!(result.removed_servers.is_empty());

    let config = read_config(board.config_path());
    assert_eq!(managed_keys(&config), vec!["b", "c"]);
    assert_eq!(config.as_object().expect("object").len(), 1);
    assert!(board.list_backups().expect("list backups").is_empty());
}

#[test]
fn scenario_c_corrupt_config_aborts_without_mutation() {
    let dir = tempfile::tempdir().expect("tempdir");
    let board = switchboard(dir.path());

    let garbage = b"{ \"mcpServers\": { broken";
    std::fs::write(board.config_path(), garbage).expect("write garbage");

    let err = board.switch("robotics", true).expect_err("corrupt config");
    assert_eq!(err.code(), mcp_switchboard::codes::CORRUPT_CONFIG);

    assert_eq!(std::fs::read(board.config_path()).expect("read config"), garbage);
    assert!(board.list_backups().expect("list backups").is_empty());
}

#[test]
fn unknown_working_set_is_not_found_and_touches_nothing() {
    let dir = tempfile::tempdir().expect("tempdir");
    let board = switchboard(dir.path());
    write_config(board.config_path(), &json!({"mcpServers": {}}));
    let before = std::fs::read(board.config_path()).expect("read config");

    let err = board.switch("ghost-set", true).expect_err("unknown set");
    assert_eq!(err.code(), mcp_switchboard::codes::NOT_FOUND);
    assert_eq!(std::fs::read(board.config_path()).expect("read config"), before);
    assert!(board.list_backups().expect("list backups").is_empty());
}

#[test]
fn round_trip_reproduces_managed_section_and_foreign_keys_exactly() {
    let dir = tempfile::tempdir().expect("tempdir");
    let board = switchboard(dir.path());

    write_config(
        board.config_path(),
        &json!({
            "globalShortcut": "Ctrl+Space",
            "mcpServers": { "a": { "command": "npx" } },
            "window": { "width": 1280, "zoom": 1.5 },
            "recent": ["x", "y"]
        }),
    );

    board.switch("robotics", true).expect("switch to robotics");
    let after_first = std::fs::read(board.config_path()).expect("read after first");

    board.switch("research", true).expect("switch to research");
    board.switch("robotics", true).expect("switch back to robotics");
    let after_third = std::fs::read(board.config_path()).expect("read after third");

    // A-B-A lands on the identical document, foreign keys byte-for-byte.
    assert_eq!(after_first, after_third);
}

#[test]
fn switching_to_the_current_set_still_runs_the_full_protocol() {
    let dir = tempfile::tempdir().expect("tempdir");
    let board = switchboard(dir.path());

    board.switch("robotics", true).expect("initial switch");
    let result = board.switch("robotics", true).expect("repeat switch");

    assert!(result.success);
    assert!(result.added_servers.is_empty());
    assert!(result.removed_servers.is_empty());
    assert!(result.backup_path.is_some());
    assert_eq!(board.list_backups().expect("list backups").len(), 1);
}

#[test]
fn preview_is_pure_and_repeatable() {
    let dir = tempfile::tempdir().expect("tempdir");
    let board = switchboard(dir.path());

    write_config(
        board.config_path(),
        &json!({
            "mcpServers": { "a": { "command": "npx" }, "b": { "command": "npx" } },
            "keep": true
        }),
    );
    let before = std::fs::read(board.config_path()).expect("read config");

    for _ in 0..5 {
        let preview = board.preview("robotics").expect("preview");
        assert_eq!(preview.added, vec!["c"]);
        assert_eq!(preview.removed, vec!["a"]);
        assert_eq!(preview.new_servers, vec!["b", "c"]);
    }

    assert_eq!(std::fs::read(board.config_path()).expect("read config"), before);
    assert!(board.list_backups().expect("list backups").is_empty());
    assert!(!board.backup_dir().exists());
}

#[test]
fn opting_out_of_backups_writes_without_a_snapshot() {
    let dir = tempfile::tempdir().expect("tempdir");
    let board = switchboard(dir.path());
    write_config(board.config_path(), &json!({"mcpServers": {"a": {"command": "x"}}}));

    let result = board.switch("robotics", false).expect("switch without backup");
    assert!(result.success);
    assert_eq!(result.backup_path, None);
    assert!(board.list_backups().expect("list backups").is_empty());

    let config = read_config(board.config_path());
    assert_eq!(managed_keys(&config), vec!["b", "c"]);
}

#[test]
fn is_current_tracks_the_live_file_on_every_listing() {
    let dir = tempfile::tempdir().expect("tempdir");
    let board = switchboard(dir.path());

    let current: Vec<bool> = board
        .list_working_sets()
        .expect("list")
        .iter()
        .map(|ws| ws.is_current)
        .collect();
    // No live file: nothing required is present.
    assert_eq!(current, vec![false, false]);

    board.switch("robotics", true).expect("switch robotics");
    let summaries = board.list_working_sets().expect("list");
    assert!(summaries.iter().find(|s| s.id == "robotics").expect("robotics").is_current);
    assert!(!summaries.iter().find(|s| s.id == "research").expect("research").is_current);

    // Someone edits the file out from under us; the next listing sees it.
    write_config(
        board.config_path(),
        &json!({"mcpServers": {"a": {"command": "x"}, "b": {"command": "x"}}}),
    );
    let summaries = board.list_working_sets().expect("list");
    assert!(!summaries.iter().find(|s| s.id == "robotics").expect("robotics").is_current);
    assert!(summaries.iter().find(|s| s.id == "research").expect("research").is_current);
}

#[test]
fn listing_survives_a_corrupt_live_config() {
    let dir = tempfile::tempdir().expect("tempdir");
    let board = switchboard(dir.path());
    std::fs::write(board.config_path(), b"not json at all").expect("write garbage");

    let summaries = board.list_working_sets().expect("list with corrupt config");
    assert!(summaries.iter().all(|s| !s.is_current));
}

#[test]
fn validate_working_set_reports_catalog_violations() {
    let dir = tempfile::tempdir().expect("tempdir");
    let board = switchboard(dir.path());

    assert!(board.validate_working_set("robotics").expect("validate").is_empty());
    let err = board.validate_working_set("ghost-set").expect_err("unknown id");
    assert_eq!(err.code(), mcp_switchboard::codes::NOT_FOUND);
}
