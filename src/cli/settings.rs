//! # Shell Settings
//!
//! The `librarian` binary reads an optional TOML file:
//!
//! ```toml
//! database = "bugs.db"
//! templates = "sql"
//! layout = "blocks"        # "files" (default) or "blocks"
//! extension = "lib"        # defaults to "sql" / "lib" per layout
//!
//! [librarian]
//! auto_commit = false
//! all_arrays = false
//! prepare_on_compile = true
//! max_include_depth = 32
//! ```
//!
//! Command-line flags are applied on top of the file.

use std::fs;
use std::path::{Path, PathBuf};

use eyre::{Result, WrapErr};
use serde::Deserialize;

use crate::archive::{Archiver, BlockArchiver, FileArchiver};
use crate::driver::SqliteConnection;
use crate::librarian::{Librarian, LibrarianConfig};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Layout {
    /// One file per tag.
    #[default]
    Files,
    /// Many `tag:` ... `;;` blocks per file.
    Blocks,
}

#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct Settings {
    /// SQLite database file; in-memory when absent.
    pub database: Option<PathBuf>,
    pub templates: Option<PathBuf>,
    pub layout: Layout,
    pub extension: Option<String>,
    pub librarian: LibrarianConfig,
}

pub type ShellLibrarian = Librarian<Box<dyn Archiver + Send>, SqliteConnection>;

impl Settings {
    pub fn load(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let content = fs::read_to_string(path)
            .wrap_err_with(|| format!("failed to read settings file {}", path.display()))?;
        Self::parse(&content)
            .wrap_err_with(|| format!("failed to parse settings file {}", path.display()))
    }

    pub fn parse(content: &str) -> Result<Self> {
        Ok(toml::from_str(content)?)
    }

    pub fn template_dir(&self) -> PathBuf {
        self.templates.clone().unwrap_or_else(|| PathBuf::from("."))
    }

    pub fn archiver(&self) -> Box<dyn Archiver + Send> {
        let dir = self.template_dir();
        match self.layout {
            Layout::Files => {
                let archiver = FileArchiver::new(dir);
                match &self.extension {
                    Some(ext) => Box::new(archiver.extension(ext)),
                    None => Box::new(archiver),
                }
            }
            Layout::Blocks => {
                let archiver = BlockArchiver::new(dir);
                match &self.extension {
                    Some(ext) => Box::new(archiver.extension(ext)),
                    None => Box::new(archiver),
                }
            }
        }
    }

    pub fn connection(&self) -> Result<SqliteConnection> {
        match &self.database {
            Some(path) => SqliteConnection::open(path),
            None => SqliteConnection::open_in_memory(),
        }
    }

    pub fn open(&self) -> Result<ShellLibrarian> {
        Librarian::builder()
            .archiver(self.archiver())
            .connection(self.connection()?)
            .config(self.librarian.clone())
            .build()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn empty_file_is_all_defaults() {
        let settings = Settings::parse("").unwrap();
        assert_eq!(settings, Settings::default());
        assert_eq!(settings.layout, Layout::Files);
        assert_eq!(settings.template_dir(), PathBuf::from("."));
    }

    #[test]
    fn full_file() {
        let settings = Settings::parse(
            r#"
            database = "bugs.db"
            templates = "sql"
            layout = "blocks"
            extension = "tpl"

            [librarian]
            auto_commit = false
            max_include_depth = 8
            "#,
        )
        .unwrap();

        assert_eq!(settings.database, Some(PathBuf::from("bugs.db")));
        assert_eq!(settings.layout, Layout::Blocks);
        assert_eq!(settings.extension.as_deref(), Some("tpl"));
        assert!(!settings.librarian.auto_commit);
        assert_eq!(settings.librarian.max_include_depth, 8);
        assert!(settings.librarian.prepare_on_compile);
    }

    #[test]
    fn unknown_keys_are_rejected() {
        assert!(Settings::parse("databse = 'typo.db'").is_err());
        assert!(Settings::parse("layout = 'tree'").is_err());
    }

    #[test]
    fn open_in_memory_with_block_layout() {
        let dir = tempfile::tempdir().unwrap();
        fs::write(dir.path().join("all.lib"), "one:\nSELECT1 1 AS one\n;;\n").unwrap();

        let settings = Settings {
            templates: Some(dir.path().to_path_buf()),
            layout: Layout::Blocks,
            ..Default::default()
        };
        let mut lib = settings.open().unwrap();
        let mut ctx = crate::types::Context::new();
        lib.execute("one", &mut ctx).unwrap();
        assert_eq!(ctx.scalar("one"), Some(&crate::types::Value::Int(1)));
    }
}
