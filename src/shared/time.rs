//! Usage: Backup timestamp formatting/parsing (`YYYYMMDD_HHMMSS`, local time).

use chrono::{Local, NaiveDateTime};

pub(crate) const BACKUP_TIMESTAMP_FORMAT: &str = "%Y%m%d_%H%M%S";

pub(crate) fn backup_timestamp_now() -> String {
    Local::now().format(BACKUP_TIMESTAMP_FORMAT).to_string()
}

/// Parse the `YYYYMMDD_HHMMSS` portion of a backup id back into a timestamp.
pub(crate) fn parse_backup_timestamp(raw: &str) -> Option<NaiveDateTime> {
    NaiveDateTime::parse_from_str(raw, BACKUP_TIMESTAMP_FORMAT).ok()
}
