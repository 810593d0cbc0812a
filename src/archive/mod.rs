//! # Template Archives
//!
//! An [`Archiver`] locates the raw template text of a tag and keeps the
//! compiled [`StatementChain`] of every tag it handed out, together with the
//! [`Fingerprint`] of the source the chain was compiled from.
//!
//! ## Cache Protocol
//!
//! ```text
//! Librarian                        Archiver
//! ─────────                        ────────
//! lookup(tag) ───────────────────► cached chain, if source fingerprint
//!     │ miss                        still matches (is_valid)
//!     ▼
//! find(tag) ─────────────────────► raw text; fingerprint observed
//!     │
//!     ▼ compile (includes first)
//! cache(tag, chain) ─────────────► stored with the observed fingerprint
//! ```
//!
//! A failed compilation never reaches `cache`, so the next call reads and
//! compiles the source again.
//!
//! ## Implementations
//!
//! | Archiver | Layout | Fingerprint |
//! |----------|--------|-------------|
//! | [`FileArchiver`] | one `tag.sql` file per tag | mtime + length |
//! | [`BlockArchiver`] | `tag:` ... `;;` blocks in `*.lib` files | mtime + length of the defining file |
//! | [`MemoryArchiver`] | in-process map | write generation |
//!
//! ## Tag Names
//!
//! Tags are used as file stems, so every archiver rejects names that are
//! empty, contain path separators or NUL, or start with a dot.

mod block;
mod cache;
mod file;
mod memory;

pub use block::BlockArchiver;
pub use cache::{ChainCache, Fingerprint};
pub use file::FileArchiver;
pub use memory::MemoryArchiver;

use std::collections::BTreeSet;
use std::sync::Arc;

use crate::chain::StatementChain;
use crate::error::{LibrarianError, Result};

pub trait Archiver {
    /// Raw template text of `tag`. Records the source fingerprint for a
    /// later [`cache`](Archiver::cache) call.
    fn find(&mut self, tag: &str) -> Result<String>;

    /// Every tag this archiver can serve, without compiling anything.
    fn toc(&mut self) -> Result<BTreeSet<String>>;

    /// Current fingerprint of the source of `tag`, `None` when it is gone.
    fn current_fingerprint(&self, tag: &str) -> Option<Fingerprint>;

    fn chains(&self) -> &ChainCache;

    fn chains_mut(&mut self) -> &mut ChainCache;

    /// Whether the cached chain of `tag` is still backed by the same source.
    fn is_valid(&self, tag: &str) -> bool {
        match self.chains().fingerprint(tag) {
            Some(cached) => self.current_fingerprint(tag) == Some(cached),
            None => false,
        }
    }

    fn lookup(&self, tag: &str) -> Option<Arc<StatementChain>> {
        self.chains().get(tag, self.current_fingerprint(tag))
    }

    fn cache(&mut self, tag: &str, chain: Arc<StatementChain>) {
        self.chains_mut().store(tag, chain);
    }

    fn clear(&mut self) {
        self.chains_mut().clear();
    }
}

impl<A: Archiver + ?Sized> Archiver for Box<A> {
    fn find(&mut self, tag: &str) -> Result<String> {
        (**self).find(tag)
    }

    fn toc(&mut self) -> Result<BTreeSet<String>> {
        (**self).toc()
    }

    fn current_fingerprint(&self, tag: &str) -> Option<Fingerprint> {
        (**self).current_fingerprint(tag)
    }

    fn chains(&self) -> &ChainCache {
        (**self).chains()
    }

    fn chains_mut(&mut self) -> &mut ChainCache {
        (**self).chains_mut()
    }

    fn is_valid(&self, tag: &str) -> bool {
        (**self).is_valid(tag)
    }

    fn lookup(&self, tag: &str) -> Option<Arc<StatementChain>> {
        (**self).lookup(tag)
    }

    fn cache(&mut self, tag: &str, chain: Arc<StatementChain>) {
        (**self).cache(tag, chain)
    }

    fn clear(&mut self) {
        (**self).clear()
    }
}

pub fn validate_tag(tag: &str) -> Result<()> {
    let bad = tag.is_empty()
        || tag.starts_with('.')
        || tag.contains(['/', '\\', '\0'])
        || tag.chars().any(char::is_whitespace);
    if bad {
        return Err(LibrarianError::InvalidTag {
            tag: tag.to_string(),
        });
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn tag_validation() {
        for good in ["t_insert", "bug.count", "Report-2024"] {
            assert!(validate_tag(good).is_ok(), "{good} should be valid");
        }
        for bad in ["", ".hidden", "../etc/passwd", "a/b", "a\\b", "a b", "nul\0"] {
            assert!(
                matches!(validate_tag(bad), Err(LibrarianError::InvalidTag { .. })),
                "{bad:?} should be rejected"
            );
        }
    }

    #[test]
    fn boxed_archiver_forwards() {
        let mut boxed: Box<dyn Archiver> =
            Box::new(MemoryArchiver::new().with("a", "SELECT 1").with("b", "SELECT 2"));

        assert_eq!(boxed.find("a").unwrap(), "SELECT 1");
        assert_eq!(
            boxed.toc().unwrap().into_iter().collect::<Vec<_>>(),
            vec!["a".to_string(), "b".to_string()]
        );
        assert!(!boxed.is_valid("a"));
    }
}
