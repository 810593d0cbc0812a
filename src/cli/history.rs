//! # History File
//!
//! Shell history lives in `~/.librarian_history`. The `LIBRARIAN_HISTORY`
//! environment variable overrides the location; set it to an empty string
//! to disable history persistence.
//!
//! rustyline does the file I/O; this module only resolves the path.

use std::env;
use std::path::PathBuf;

const DEFAULT_HISTORY_FILE: &str = ".librarian_history";
pub const HISTORY_ENV_VAR: &str = "LIBRARIAN_HISTORY";

pub fn history_path() -> Option<PathBuf> {
    resolve(
        env::var(HISTORY_ENV_VAR).ok(),
        env::var("HOME").ok().map(PathBuf::from),
    )
}

fn resolve(custom: Option<String>, home: Option<PathBuf>) -> Option<PathBuf> {
    match custom {
        Some(path) if path.is_empty() => None,
        Some(path) => Some(PathBuf::from(path)),
        None => home.map(|home| home.join(DEFAULT_HISTORY_FILE)),
    }
}
