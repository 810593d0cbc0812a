use serde::Deserialize;

use crate::config::{DEFAULT_MAX_INCLUDE_DEPTH, HARD_MAX_INCLUDE_DEPTH};

/// Runtime options of a [`Librarian`](super::Librarian).
///
/// Deserializable so it can be embedded as a `[librarian]` table in a
/// settings file; every field is optional there.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct LibrarianConfig {
    /// Commit after every `execute` that affected at least one row.
    pub auto_commit: bool,
    /// Read every top-level key from, and write single-row results to,
    /// index 0 of a sequence.
    pub all_arrays: bool,
    /// Prepare statements without substitutions while compiling.
    pub prepare_on_compile: bool,
    pub max_include_depth: usize,
}

impl Default for LibrarianConfig {
    fn default() -> Self {
        Self {
            auto_commit: true,
            all_arrays: false,
            prepare_on_compile: true,
            max_include_depth: DEFAULT_MAX_INCLUDE_DEPTH,
        }
    }
}

impl LibrarianConfig {
    /// Include depth actually enforced.
    pub fn include_depth_limit(&self) -> usize {
        self.max_include_depth.clamp(1, HARD_MAX_INCLUDE_DEPTH)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults() {
        let config = LibrarianConfig::default();
        assert!(config.auto_commit);
        assert!(!config.all_arrays);
        assert!(config.prepare_on_compile);
        assert_eq!(config.include_depth_limit(), DEFAULT_MAX_INCLUDE_DEPTH);
    }

    #[test]
    fn depth_is_clamped() {
        let deep = LibrarianConfig {
            max_include_depth: usize::MAX,
            ..Default::default()
        };
        assert_eq!(deep.include_depth_limit(), HARD_MAX_INCLUDE_DEPTH);

        let zero = LibrarianConfig {
            max_include_depth: 0,
            ..Default::default()
        };
        assert_eq!(zero.include_depth_limit(), 1);
    }

    #[test]
    fn partial_json_keeps_defaults() {
        let config: LibrarianConfig =
            serde_json::from_str(r#"{ "auto_commit": false, "max_include_depth": 4 }"#).unwrap();
        assert!(!config.auto_commit);
        assert!(config.prepare_on_compile);
        assert_eq!(config.max_include_depth, 4);

        assert!(serde_json::from_str::<LibrarianConfig>(r#"{ "autocommit": false }"#).is_err());
    }
}
