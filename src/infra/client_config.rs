//! Usage: Read / atomically write the live client config as a generic JSON document.
//!
//! The document is an order-preserving key→value tree: the engine mutates only
//! the owned key and re-serializes everything else untouched, so foreign
//! top-level keys survive any number of switches.

use serde_json::{Map, Value};
use std::path::Path;

/// Order-preserving generic document (`serde_json` built with `preserve_order`).
pub type ConfigDocument = Map<String, Value>;

fn is_symlink(path: &Path) -> Result<bool, String> {
    std::fs::symlink_metadata(path)
        .map(|m| m.file_type().is_symlink())
        .map_err(|e| format!("IO_ERROR: failed to read metadata {}: {e}", path.display()))
}

pub(crate) fn read_optional_file(path: &Path) -> Result<Option<Vec<u8>>, String> {
    if !path.exists() {
        return Ok(None);
    }
    std::fs::read(path)
        .map(Some)
        .map_err(|e| format!("IO_ERROR: failed to read {}: {e}", path.display()))
}

/// Parse the live config. Absent file is the first-run case and yields an
/// empty document; a present but unparsable file is `CORRUPT_CONFIG` and the
/// caller must not mutate anything.
pub(crate) fn read_document(path: &Path) -> Result<(ConfigDocument, bool), String> {
    let Some(bytes) = read_optional_file(path)? else {
        return Ok((ConfigDocument::new(), false));
    };

    let root = serde_json::from_slice::<Value>(&bytes).map_err(|e| {
        format!(
            "CORRUPT_CONFIG: {} is not valid JSON: {e}",
            path.display()
        )
    })?;
    match root {
        Value::Object(map) => Ok((map, true)),
        other => Err(format!(
            "CORRUPT_CONFIG: {} root must be a JSON object, found {}",
            path.display(),
            json_type_name(&other)
        )),
    }
}

pub(crate) fn json_type_name(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "boolean",
        Value::Number(_) => "number",
        Value::String(_) => "string",
        Value::Array(_) => "array",
        Value::Object(_) => "object",
    }
}

/// Serialize `document` and replace `path` atomically: write to a temp file in
/// the same directory, then rename over the original. The live file is never
/// observable in a partially written state. Returns the written bytes so the
/// caller can validate exactly what landed on disk.
pub(crate) fn write_document(path: &Path, document: &ConfigDocument) -> Result<Vec<u8>, String> {
    let mut bytes = serde_json::to_vec_pretty(&Value::Object(document.clone()))
        .map_err(|e| format!("IO_ERROR: failed to serialize config json: {e}"))?;
    bytes.push(b'\n');
    write_file_atomic(path, &bytes)?;
    Ok(bytes)
}

pub(crate) fn write_file_atomic(path: &Path, bytes: &[u8]) -> Result<(), String> {
    if path.exists() && is_symlink(path)? {
        return Err(format!(
            "IO_ERROR: refusing to replace symlink path={}",
            path.display()
        ));
    }

    if let Some(parent) = path.parent() {
        std::fs::create_dir_all(parent)
            .map_err(|e| format!("IO_ERROR: failed to create dir {}: {e}", parent.display()))?;
    }

    let file_name = path.file_name().and_then(|v| v.to_str()).unwrap_or("file");
    let tmp_path = path.with_file_name(format!("{file_name}.switchboard-tmp"));

    std::fs::write(&tmp_path, bytes)
        .map_err(|e| format!("IO_ERROR: failed to write temp file {}: {e}", tmp_path.display()))?;

    #[cfg(windows)]
    if path.exists() {
        // Windows rename does not replace an existing destination.
        let _ = std::fs::remove_file(path);
    }

    std::fs::rename(&tmp_path, path)
        .map_err(|e| format!("IO_ERROR: failed to finalize file {}: {e}", path.display()))?;

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn absent_file_reads_as_empty_document() {
        let dir = tempfile::tempdir().expect("tempdir");
        let path = dir.path().join("missing.json");
        let (doc, existed) = read_document(&path).expect("read absent");
        assert!(doc.is_empty());
        assert!(!existed);
    }

    #[test]
    fn unparsable_file_is_corrupt_config() {
        let dir = tempfile::tempdir().expect("tempdir");
        let path = dir.path().join("broken.json");
        std::fs::write(&path, b"{ not json").expect("write fixture");
        let err = read_document(&path).expect_err("corrupt file");
        assert!(err.starts_with("CORRUPT_CONFIG:"), "{err}");
    }

    #[test]
    fn non_object_root_is_corrupt_config() {
        let dir = tempfile::tempdir().expect("tempdir");
        let path = dir.path().join("array.json");
        std::fs::write(&path, b"[1, 2, 3]\n").expect("write fixture");
        let err = read_document(&path).expect_err("array root");
        assert!(err.starts_with("CORRUPT_CONFIG:"), "{err}");
        assert!(err.contains("array"), "{err}");
    }

    #[test]
    fn write_then_read_preserves_key_order() {
        let dir = tempfile::tempdir().expect("tempdir");
        let path = dir.path().join("config.json");

        let mut doc = ConfigDocument::new();
        doc.insert("zeta".to_string(), serde_json::json!(1));
        doc.insert("alpha".to_string(), serde_json::json!({"x": true}));
        doc.insert("mid".to_string(), serde_json::json!("v"));
        write_document(&path, &doc).expect("write");

        let (read_back, existed) = read_document(&path).expect("read");
        assert!(existed);
        let keys: Vec<&String> = read_back.keys().collect();
        assert_eq!(keys, vec!["zeta", "alpha", "mid"]);
    }

    #[test]
    fn written_bytes_match_the_file_on_disk() {
        let dir = tempfile::tempdir().expect("tempdir");
        let path = dir.path().join("config.json");
        let mut doc = ConfigDocument::new();
        doc.insert("a".to_string(), serde_json::json!([1, 2]));
        let bytes = write_document(&path, &doc).expect("write");
        assert_eq!(bytes, std::fs::read(&path).expect("read back"));
        assert_eq!(bytes.last(), Some(&b'\n'));
    }

    #[test]
    fn atomic_write_leaves_no_temp_file_behind() {
        let dir = tempfile::tempdir().expect("tempdir");
        let path = dir.path().join("config.json");
        write_document(&path, &ConfigDocument::new()).expect("write");
        let leftovers: Vec<_> = std::fs::read_dir(dir.path())
            .expect("read dir")
            .filter_map(|e| e.ok())
            .filter(|e| e.file_name().to_string_lossy().contains("switchboard-tmp"))
            .collect();
        assert!(leftovers.is_empty());
    }

    #[cfg(unix)]
    #[test]
    fn symlinked_config_path_is_refused() {
        let dir = tempfile::tempdir().expect("tempdir");
        let target = dir.path().join("real.json");
        std::fs::write(&target, b"{}\n").expect("write target");
        let link = dir.path().join("link.json");
        std::os::unix::fs::symlink(&target, &link).expect("symlink");

        let err = write_file_atomic(&link, b"{}\n").expect_err("symlink refused");
        assert!(err.contains("refusing to replace symlink"), "{err}");
    }
}
