pub(crate) mod error;
pub(crate) mod mutex_ext;
pub(crate) mod path_locks;
pub(crate) mod time;
