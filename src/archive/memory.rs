use std::collections::BTreeSet;

use hashbrown::HashMap;

use super::{validate_tag, Archiver, ChainCache, Fingerprint};
use crate::error::{LibrarianError, Result};

#[derive(Debug, Clone)]
struct Template {
    body: String,
    generation: u64,
}

/// Templates held in process memory.
///
/// Every write bumps a generation counter, which invalidates the cached
/// chain of the written tag. `find_count` reports how many times template
/// text was read, which makes cache hits observable.
#[derive(Debug, Default)]
pub struct MemoryArchiver {
    templates: HashMap<String, Template>,
    generation: u64,
    finds: usize,
    cache: ChainCache,
}

impl MemoryArchiver {
    pub fn new() -> Self {
        Self::default()
    }

    /// Builder-style [`insert`](Self::insert) for literal tags.
    ///
    /// # Panics
    ///
    /// Panics when `tag` is not a valid tag name. Use
    /// [`try_with`](Self::try_with) for tags that come from input.
    pub fn with(self, tag: &str, body: &str) -> Self {
        match self.try_with(tag, body) {
            Ok(archiver) => archiver,
            Err(err) => panic!("{err}"),
        }
    }

    pub fn try_with(mut self, tag: &str, body: &str) -> Result<Self> {
        self.insert(tag, body)?;
        Ok(self)
    }

    pub fn insert(&mut self, tag: &str, body: &str) -> Result<()> {
        validate_tag(tag)?;
        self.generation += 1;
        self.templates.insert(
            tag.to_string(),
            Template {
                body: body.to_string(),
                generation: self.generation,
            },
        );
        Ok(())
    }

    pub fn remove(&mut self, tag: &str) -> bool {
        self.cache.remove(tag);
        self.templates.remove(tag).is_some()
    }

    pub fn find_count(&self) -> usize {
        self.finds
    }
}

impl Archiver for MemoryArchiver {
    fn find(&mut self, tag: &str) -> Result<String> {
        validate_tag(tag)?;
        self.finds += 1;

        let template = self
            .templates
            .get(tag)
            .ok_or_else(|| LibrarianError::TagNotFound {
                tag: tag.to_string(),
            })?;
        self.cache
            .observe(tag, Fingerprint::Generation(template.generation));
        Ok(template.body.clone())
    }

    fn toc(&mut self) -> Result<BTreeSet<String>> {
        Ok(self.templates.keys().cloned().collect())
    }

    fn current_fingerprint(&self, tag: &str) -> Option<Fingerprint> {
        self.templates
            .get(tag)
            .map(|t| Fingerprint::Generation(t.generation))
    }

    fn chains(&self) -> &ChainCache {
        &self.cache
    }

    fn chains_mut(&mut self) -> &mut ChainCache {
        &mut self.cache
    }
}
