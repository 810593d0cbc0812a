//! # Librarian Builder
//!
//! Fluent construction of a [`Librarian`]:
//!
//! ```ignore
//! let librarian = Librarian::builder()
//!     .archiver(FileArchiver::new("./sql"))
//!     .connection(SqliteConnection::open("bugs.db")?)
//!     .auto_commit(false)
//!     .build()?;
//! ```
//!
//! | Option              | Default | Effect                                        |
//! |---------------------|---------|-----------------------------------------------|
//! | auto_commit         | true    | commit after every call that changed rows     |
//! | all_arrays          | false   | read and write index 0 of top-level sequences |
//! | prepare_on_compile  | true    | surface driver errors while compiling         |
//! | max_include_depth   | 32      | bound on nested includes (clamped to 256)     |

use eyre::{eyre, Result};

use super::{Librarian, LibrarianConfig};
use crate::archive::Archiver;
use crate::driver::Connection;

pub struct LibrarianBuilder<A, C> {
    archiver: Option<A>,
    connection: Option<C>,
    config: LibrarianConfig,
}

impl<A, C> Default for LibrarianBuilder<A, C> {
    fn default() -> Self {
        Self {
            archiver: None,
            connection: None,
            config: LibrarianConfig::default(),
        }
    }
}

impl<A: Archiver, C: Connection> LibrarianBuilder<A, C> {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn archiver(mut self, archiver: A) -> Self {
        self.archiver = Some(archiver);
        self
    }

    pub fn connection(mut self, connection: C) -> Self {
        self.connection = Some(connection);
        self
    }

    /// Replaces every option at once, e.g. with a deserialized table.
    pub fn config(mut self, config: LibrarianConfig) -> Self {
        self.config = config;
        self
    }

    pub fn auto_commit(mut self, enabled: bool) -> Self {
        self.config.auto_commit = enabled;
        self
    }

    pub fn all_arrays(mut self, enabled: bool) -> Self {
        self.config.all_arrays = enabled;
        self
    }

    pub fn prepare_on_compile(mut self, enabled: bool) -> Self {
        self.config.prepare_on_compile = enabled;
        self
    }

    pub fn max_include_depth(mut self, depth: usize) -> Self {
        self.config.max_include_depth = depth;
        self
    }

    pub fn build(self) -> Result<Librarian<A, C>> {
        let archiver = self
            .archiver
            .ok_or_else(|| eyre!("no archiver configured for librarian"))?;
        let connection = self
            .connection
            .ok_or_else(|| eyre!("no connection configured for librarian"))?;
        Ok(Librarian::with_config(archiver, connection, self.config))
    }
}
