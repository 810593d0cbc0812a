use std::collections::BTreeSet;
use std::fs;
use std::io;
use std::path::{Path, PathBuf};

use tracing::debug;

use super::{validate_tag, Archiver, ChainCache, Fingerprint};
use crate::config::DEFAULT_TEMPLATE_EXTENSION;
use crate::error::{LibrarianError, Result};

/// One template file per tag: `<dir>/<tag>.<extension>`.
#[derive(Debug)]
pub struct FileArchiver {
    dir: PathBuf,
    extension: String,
    cache: ChainCache,
}

impl FileArchiver {
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        Self {
            dir: dir.into(),
            extension: DEFAULT_TEMPLATE_EXTENSION.to_string(),
            cache: ChainCache::new(),
        }
    }

    /// Template file extension, without the dot.
    pub fn extension(mut self, extension: &str) -> Self {
        self.extension = extension.trim_start_matches('.').to_string();
        self
    }

    pub fn dir(&self) -> &Path {
        &self.dir
    }

    pub fn path_of(&self, tag: &str) -> PathBuf {
        self.dir.join(format!("{}.{}", tag, self.extension))
    }
}

pub(super) fn file_fingerprint(path: &Path) -> io::Result<Fingerprint> {
    let meta = fs::metadata(path)?;
    Ok(Fingerprint::Modified {
        mtime: meta.modified()?,
        len: meta.len(),
    })
}

impl Archiver for FileArchiver {
    fn find(&mut self, tag: &str) -> Result<String> {
        validate_tag(tag)?;
        let path = self.path_of(tag);

        let not_found = |err: io::Error| match err.kind() {
            io::ErrorKind::NotFound => LibrarianError::TagNotFound {
                tag: tag.to_string(),
            },
            _ => LibrarianError::archive(&path, err),
        };

        let fingerprint = file_fingerprint(&path).map_err(not_found)?;
        let body = fs::read_to_string(&path).map_err(not_found)?;
        self.cache.observe(tag, fingerprint);

        debug!(tag, path = %path.display(), "read template file");
        Ok(body)
    }

    fn toc(&mut self) -> Result<BTreeSet<String>> {
        let entries = fs::read_dir(&self.dir).map_err(|e| LibrarianError::archive(&self.dir, e))?;
        let mut tags = BTreeSet::new();

        for entry in entries {
            let path = entry
                .map_err(|e| LibrarianError::archive(&self.dir, e))?
                .path();
            if !path.is_file() {
                continue;
            }
            if path.extension().and_then(|e| e.to_str()) != Some(self.extension.as_str()) {
                continue;
            }
            if let Some(stem) = path.file_stem().and_then(|s| s.to_str()) {
                if validate_tag(stem).is_ok() {
                    tags.insert(stem.to_string());
                }
            }
        }

        Ok(tags)
    }

    fn current_fingerprint(&self, tag: &str) -> Option<Fingerprint> {
        file_fingerprint(&self.path_of(tag)).ok()
    }

    fn chains(&self) -> &ChainCache {
        &self.cache
    }

    fn chains_mut(&mut self) -> &mut ChainCache {
        &mut self.cache
    }
}

#[cfg(test)]
mod tests {
    use std::sync::Arc;

    use tempfile::tempdir;

    use super::*;
    use crate::chain::StatementChain;
    use crate::driver::SqliteConnection;

    #[test]
    fn find_reads_tag_file() {
        let dir = tempdir().unwrap();
        fs::write(dir.path().join("t_count.sql"), "SELECT1 count(*) AS n FROM bug").unwrap();

        let mut archiver = FileArchiver::new(dir.path());
        assert_eq!(archiver.find("t_count").unwrap(), "SELECT1 count(*) AS n FROM bug");
        assert!(matches!(
            archiver.find("t_missing"),
            Err(LibrarianError::TagNotFound { .. })
        ));
        assert!(matches!(
            archiver.find("../t_count"),
            Err(LibrarianError::InvalidTag { .. })
        ));
    }

    #[test]
    fn toc_lists_matching_extension_only() {
        let dir = tempdir().unwrap();
        fs::write(dir.path().join("a.sql"), "SELECT 1").unwrap();
        fs::write(dir.path().join("b.sql"), "SELECT 2").unwrap();
        fs::write(dir.path().join("notes.txt"), "ignored").unwrap();
        fs::create_dir(dir.path().join("c.sql")).unwrap();

        let mut archiver = FileArchiver::new(dir.path());
        let toc: Vec<String> = archiver.toc().unwrap().into_iter().collect();
        assert_eq!(toc, vec!["a".to_string(), "b".to_string()]);

        let mut txt = FileArchiver::new(dir.path()).extension(".txt");
        assert!(txt.toc().unwrap().contains("notes"));
    }

    #[test]
    fn toc_of_missing_dir_is_archive_error() {
        let dir = tempdir().unwrap();
        let mut archiver = FileArchiver::new(dir.path().join("absent"));
        assert!(matches!(
            archiver.toc(),
            Err(LibrarianError::Archive { .. })
        ));
    }

    #[test]
    fn modification_invalidates_cache() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("a.sql");
        fs::write(&path, "SELECT 1").unwrap();

        let mut archiver = FileArchiver::new(dir.path());
        let body = archiver.find("a").unwrap();
        let mut conn = SqliteConnection::open_in_memory().unwrap();
        let chain = StatementChain::compile("a", &body, &mut conn, false).unwrap();
        archiver.cache("a", Arc::new(chain));
        assert!(archiver.is_valid("a"));

        fs::write(&path, "SELECT 1, 2").unwrap();
        assert!(!archiver.is_valid("a"), "length change must invalidate");

        fs::remove_file(&path).unwrap();
        assert!(archiver.lookup("a").is_none());
    }
}
