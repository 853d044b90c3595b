mod domain;
mod engine;
mod infra;
mod shared;
pub mod test_support;

pub(crate) use domain::{switch, working_sets};

pub use domain::switch::{PreviewResult, RestoreResult, SwitchResult, SwitchState};
pub use domain::working_sets::{
    ServerDefinition, ServerRef, WorkingSet, WorkingSetRegistry, WorkingSetSummary,
};
pub use engine::Switchboard;
pub use infra::backups::Backup;
pub use infra::config_format::{
    ClaudeDesktopFormat, ConfigFormat, CursorFormat, WindsurfFormat,
};
pub use infra::validation::{check as validate_config_bytes, Violation};
pub use shared::error::{codes, AppError, AppResult};
