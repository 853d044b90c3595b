//! Usage: Unified engine error model (maps internal failures to `CODE: message` strings).

use std::sync::Arc;

pub type AppResult<T> = Result<T, AppError>;

/// Error kinds surfaced to callers. Internal helpers return `Result<_, String>`
/// with one of these codes as a `CODE: message` prefix; the `From<String>`
/// conversion below lifts them into structured errors.
pub mod codes {
    /// Unknown working-set or backup id.
    pub const NOT_FOUND: &str = "NOT_FOUND";
    /// Pre-existing config file unparsable; nothing was mutated.
    pub const CORRUPT_CONFIG: &str = "CORRUPT_CONFIG";
    /// Snapshot could not be created; aborts before any mutation.
    pub const BACKUP_ERROR: &str = "BACKUP_ERROR";
    /// Read/write/rename failure.
    pub const IO_ERROR: &str = "IO_ERROR";
    /// Post-write structural check failed.
    pub const VALIDATION_ERROR: &str = "VALIDATION_ERROR";
    /// Concurrent switch/restore on the same config path.
    pub const BUSY: &str = "BUSY";
    /// Working-set registry is internally inconsistent.
    pub const REGISTRY_ERROR: &str = "REGISTRY_ERROR";
}

#[derive(Debug, Clone, thiserror::Error)]
#[error("{code}: {message}")]
pub struct AppError {
    code: String,
    message: String,
    #[source]
    source: Option<Arc<dyn std::error::Error + Send + Sync>>,
}

impl AppError {
    pub fn new(code: impl Into<String>, message: impl Into<String>) -> Self {
        Self {
            code: code.into(),
            message: message.into(),
            source: None,
        }
    }

    pub fn code(&self) -> &str {
        &self.code
    }

    pub fn message(&self) -> &str {
        &self.message
    }
}

fn split_code_message(raw: &str) -> Option<(&str, &str)> {
    let msg = raw.trim();
    let msg = msg.strip_prefix("Error:").unwrap_or(msg).trim();
    if msg.is_empty() {
        return None;
    }

    let (maybe_code, rest) = msg.split_once(':')?;
    let code = maybe_code.trim();
    if code.is_empty() {
        return None;
    }
    let mut chars = code.chars();
    let first = chars.next()?;
    if !first.is_ascii_uppercase() {
        return None;
    }
    if !chars.all(|ch| ch.is_ascii_uppercase() || ch.is_ascii_digit() || ch == '_') {
        return None;
    }
    Some((code, rest.trim()))
}

impl From<String> for AppError {
    fn from(value: String) -> Self {
        if let Some((code, rest)) = split_code_message(&value) {
            let message = if rest.is_empty() { value.trim() } else { rest };
            return AppError::new(code.to_string(), message.to_string());
        }
        AppError::new("INTERNAL_ERROR", value)
    }
}

impl From<&'static str> for AppError {
    fn from(value: &'static str) -> Self {
        AppError::from(value.to_string())
    }
}

impl From<AppError> for String {
    fn from(value: AppError) -> Self {
        value.to_string()
    }
}
