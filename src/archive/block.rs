//! Block files hold many tags each:
//!
//! ```text
//! insert_bug:
//! INSERT INTO bug (title) VALUES (:title);
//!
//! SELECT1 last_insert_rowid() AS bugid;
//! ;;
//!
//! count_bugs:
//! SELECT1 count(*) AS n FROM bug
//! ;;
//! ```
//!
//! A line holding only `name:` opens a block and a line holding only `;;`
//! closes it. Text between blocks is ignored. A block left open runs to the
//! end of the file. When two blocks share a name the first one, in file
//! path order, wins.

use std::collections::{BTreeMap, BTreeSet};
use std::fs;
use std::io;
use std::path::{Path, PathBuf};

use hashbrown::HashMap;
use tracing::{debug, warn};

use super::file::file_fingerprint;
use super::{validate_tag, Archiver, ChainCache, Fingerprint};
use crate::config::{BLOCK_TERMINATOR, DEFAULT_BLOCK_EXTENSION};
use crate::error::{LibrarianError, Result};

#[derive(Debug)]
struct LoadedFile {
    fingerprint: Fingerprint,
    blocks: Vec<(String, String)>,
}

#[derive(Debug)]
pub struct BlockArchiver {
    dir: PathBuf,
    extension: String,
    files: BTreeMap<PathBuf, LoadedFile>,
    index: HashMap<String, PathBuf>,
    cache: ChainCache,
}

impl BlockArchiver {
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        Self {
            dir: dir.into(),
            extension: DEFAULT_BLOCK_EXTENSION.to_string(),
            files: BTreeMap::new(),
            index: HashMap::new(),
            cache: ChainCache::new(),
        }
    }

    pub fn extension(mut self, extension: &str) -> Self {
        self.extension = extension.trim_start_matches('.').to_string();
        self
    }

    pub fn dir(&self) -> &Path {
        &self.dir
    }

    /// File currently defining `tag`, as of the last refresh.
    pub fn source_of(&self, tag: &str) -> Option<&Path> {
        self.index.get(tag).map(PathBuf::as_path)
    }

    /// Block files in the directory, in path order.
    fn listing(&self) -> io::Result<BTreeSet<PathBuf>> {
        let mut paths = BTreeSet::new();
        for entry in fs::read_dir(&self.dir)? {
            let path = entry?.path();
            if path.is_file()
                && path.extension().and_then(|e| e.to_str()) == Some(self.extension.as_str())
            {
                paths.insert(path);
            }
        }
        Ok(paths)
    }

    /// Rescans the directory, reparsing only files whose fingerprint changed.
    fn refresh(&mut self) -> Result<()> {
        let paths = self
            .listing()
            .map_err(|e| LibrarianError::archive(&self.dir, e))?;

        let mut files = BTreeMap::new();
        for path in paths {
            let fingerprint =
                file_fingerprint(&path).map_err(|e| LibrarianError::archive(&path, e))?;

            let loaded = match self.files.remove(&path) {
                Some(old) if old.fingerprint == fingerprint => old,
                _ => {
                    let text =
                        fs::read_to_string(&path).map_err(|e| LibrarianError::archive(&path, e))?;
                    let blocks = parse_blocks(&text);
                    debug!(path = %path.display(), blocks = blocks.len(), "parsed block file");
                    LoadedFile {
                        fingerprint,
                        blocks,
                    }
                }
            };
            files.insert(path, loaded);
        }

        let mut index: HashMap<String, PathBuf> = HashMap::new();
        for (path, file) in &files {
            for (tag, _) in &file.blocks {
                if let Some(first) = index.get(tag) {
                    warn!(
                        tag = %tag,
                        kept = %first.display(),
                        ignored = %path.display(),
                        "duplicate template block"
                    );
                    continue;
                }
                index.insert(tag.clone(), path.clone());
            }
        }

        self.files = files;
        self.index = index;
        Ok(())
    }
}

impl Archiver for BlockArchiver {
    fn find(&mut self, tag: &str) -> Result<String> {
        validate_tag(tag)?;
        self.refresh()?;

        let not_found = || LibrarianError::TagNotFound {
            tag: tag.to_string(),
        };
        let path = self.index.get(tag).ok_or_else(not_found)?;
        let file = self.files.get(path).ok_or_else(not_found)?;
        let body = file
            .blocks
            .iter()
            .find(|(name, _)| name == tag)
            .map(|(_, body)| body.clone())
            .ok_or_else(not_found)?;

        self.cache.observe(tag, file.fingerprint);
        Ok(body)
    }

    fn toc(&mut self) -> Result<BTreeSet<String>> {
        self.refresh()?;
        Ok(self.index.keys().cloned().collect())
    }

    /// Fingerprint of the defining file, or `None` once any file sorting at or
    /// before it was added or changed, since that file may now shadow `tag`.
    fn current_fingerprint(&self, tag: &str) -> Option<Fingerprint> {
        let defining = self.index.get(tag)?;
        let paths = self.listing().ok()?;

        for path in paths.iter().take_while(|path| *path <= defining) {
            let loaded = self.files.get(path)?;
            if file_fingerprint(path).ok()? != loaded.fingerprint {
                return None;
            }
        }
        file_fingerprint(defining).ok()
    }

    fn chains(&self) -> &ChainCache {
        &self.cache
    }

    fn chains_mut(&mut self) -> &mut ChainCache {
        &mut self.cache
    }
}

/// Splits a block file into `(tag, body)` pairs, in file order.
fn parse_blocks(text: &str) -> Vec<(String, String)> {
    let mut blocks: Vec<(String, String)> = Vec::new();
    let mut open: Option<(String, Vec<&str>)> = None;

    for line in text.lines() {
        let trimmed = line.trim();

        match open.take() {
            Some((name, body)) if trimmed == BLOCK_TERMINATOR => {
                push_block(&mut blocks, name, &body);
            }
            Some((name, mut body)) => {
                body.push(line);
                open = Some((name, body));
            }
            None => {
                if let Some(name) = block_header(trimmed) {
                    open = Some((name.to_string(), Vec::new()));
                }
            }
        }
    }
    if let Some((name, body)) = open {
        push_block(&mut blocks, name, &body);
    }

    blocks
}

fn push_block(blocks: &mut Vec<(String, String)>, name: String, body: &[&str]) {
    if blocks.iter().any(|(existing, _)| *existing == name) {
        warn!(tag = %name, "duplicate template block in one file");
        return;
    }
    blocks.push((name, body.join("\n")));
}

fn block_header(line: &str) -> Option<&str> {
    let name = line.strip_suffix(':')?;
    validate_tag(name).ok()?;
    Some(name)
}
