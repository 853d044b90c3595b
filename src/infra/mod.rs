pub(crate) mod backups;
pub(crate) mod client_config;
pub(crate) mod config_format;
pub(crate) mod validation;
