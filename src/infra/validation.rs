//! Usage: Pure structural checker for freshly written config bytes.
//!
//! Structural only: valid JSON, owned key present, every entry carries the
//! minimum launch-spec fields. Never probes or executes a referenced server.

use crate::infra::client_config::json_type_name;
use crate::infra::config_format::ConfigFormat;
use serde::Serialize;
use serde_json::Value;

/// One structural-check finding. `path` points at the offending key in
/// `$.ownedKey.entry.field` notation so an operator can act without logs.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Violation {
    pub path: String,
    pub message: String,
}

impl Violation {
    pub(crate) fn new(path: impl Into<String>, message: impl Into<String>) -> Self {
        Self {
            path: path.into(),
            message: message.into(),
        }
    }
}

/// Check `bytes` against the format's owned-key schema. Empty result = valid.
pub fn check(bytes: &[u8], format: &dyn ConfigFormat) -> Vec<Violation> {
    let root = match serde_json::from_slice::<Value>(bytes) {
        Ok(value) => value,
        Err(e) => {
            return vec![Violation::new("$", format!("not valid JSON: {e}"))];
        }
    };

    let Some(root_obj) = root.as_object() else {
        return vec![Violation::new(
            "$",
            format!("root must be an object, found {}", json_type_name(&root)),
        )];
    };

    let owned_key = format.owned_key();
    let Some(managed) = root_obj.get(owned_key) else {
        return vec![Violation::new(
            format!("$.{owned_key}"),
            "owned key is missing".to_string(),
        )];
    };

    let Some(managed_obj) = managed.as_object() else {
        return vec![Violation::new(
            format!("$.{owned_key}"),
            format!("must be an object, found {}", json_type_name(managed)),
        )];
    };

    let mut violations = Vec::new();
    for (name, entry) in managed_obj {
        let entry_path = format!("$.{owned_key}.{name}");
        let Some(entry_obj) = entry.as_object() else {
            violations.push(Violation::new(
                entry_path,
                format!("entry must be an object, found {}", json_type_name(entry)),
            ));
            continue;
        };

        match entry_obj.get("command") {
            None => violations.push(Violation::new(
                format!("{entry_path}.command"),
                "required field is missing".to_string(),
            )),
            Some(Value::String(cmd)) if cmd.trim().is_empty() => violations.push(Violation::new(
                format!("{entry_path}.command"),
                "must be a nonempty string".to_string(),
            )),
            Some(Value::String(_)) => {}
            Some(other) => violations.push(Violation::new(
                format!("{entry_path}.command"),
                format!("must be a string, found {}", json_type_name(other)),
            )),
        }

        if let Some(args) = entry_obj.get("args") {
            match args.as_array() {
                Some(items) => {
                    for (idx, item) in items.iter().enumerate() {
                        if !item.is_string() {
                            violations.push(Violation::new(
                                format!("{entry_path}.args[{idx}]"),
                                format!("must be a string, found {}", json_type_name(item)),
                            ));
                        }
                    }
                }
                None => violations.push(Violation::new(
                    format!("{entry_path}.args"),
                    format!("must be an array, found {}", json_type_name(args)),
                )),
            }
        }

        if let Some(env) = entry_obj.get("env") {
            match env.as_object() {
                Some(vars) => {
                    for (var, value) in vars {
                        if !value.is_string() {
                            violations.push(Violation::new(
                                format!("{entry_path}.env.{var}"),
                                format!("must be a string, found {}", json_type_name(value)),
                            ));
                        }
                    }
                }
                None => violations.push(Violation::new(
                    format!("{entry_path}.env"),
                    format!("must be an object, found {}", json_type_name(env)),
                )),
            }
        }

        if let Some(cwd) = entry_obj.get("cwd") {
            if !cwd.is_string() {
                violations.push(Violation::new(
                    format!("{entry_path}.cwd"),
                    format!("must be a string, found {}", json_type_name(cwd)),
                ));
            }
        }
    }

    violations
}
