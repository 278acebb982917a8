//! External table directory resolution.

use std::path::{Path, PathBuf};

/// Environment variable naming the directory of external table sets.
pub const TABLES_ENV_VAR: &str = "BUFR_TABLES";

/// Get the external tables directory.
///
/// Resolution order:
/// 1. an explicitly configured directory
/// 2. the `BUFR_TABLES` environment variable (ignored when empty)
///
/// `None` means only the built-in tables are used.
pub fn resolve_tables_dir(explicit: Option<&Path>) -> Option<PathBuf> {
    if let Some(dir) = explicit {
        return Some(dir.to_path_buf());
    }
    std::env::var_os(TABLES_ENV_VAR)
        .filter(|value| !value.is_empty())
        .map(PathBuf::from)
}
