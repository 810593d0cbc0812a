use std::sync::Arc;
use std::time::SystemTime;

use hashbrown::HashMap;

use crate::chain::StatementChain;

/// Identity of a template source at the moment it was read.
///
/// A cached chain stays valid while its source still reports the same
/// fingerprint.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Fingerprint {
    /// File-backed source: modification time plus length, so a rewrite
    /// within the mtime granularity still shows up when the size changes.
    Modified { mtime: SystemTime, len: u64 },
    /// In-memory source: bumped on every write.
    Generation(u64),
}

#[derive(Debug, Clone)]
struct CachedChain {
    chain: Arc<StatementChain>,
    fingerprint: Fingerprint,
}

/// Tag to compiled chain map owned by an archiver.
///
/// `observe` records the fingerprint of the source text handed out by
/// `find`; `store` pairs a compiled chain with that fingerprint. A chain
/// stored without a prior observation is dropped.
#[derive(Debug, Default)]
pub struct ChainCache {
    chains: HashMap<String, CachedChain>,
    observed: HashMap<String, Fingerprint>,
}

impl ChainCache {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn observe(&mut self, tag: &str, fingerprint: Fingerprint) {
        self.observed.insert(tag.to_string(), fingerprint);
    }

    pub fn store(&mut self, tag: &str, chain: Arc<StatementChain>) -> bool {
        let Some(fingerprint) = self.observed.get(tag).copied() else {
            return false;
        };
        self.chains
            .insert(tag.to_string(), CachedChain { chain, fingerprint });
        true
    }

    /// Cached chain for `tag` if it was compiled from `current`.
    pub fn get(&self, tag: &str, current: Option<Fingerprint>) -> Option<Arc<StatementChain>> {
        let cached = self.chains.get(tag)?;
        (Some(cached.fingerprint) == current).then(|| Arc::clone(&cached.chain))
    }

    pub fn fingerprint(&self, tag: &str) -> Option<Fingerprint> {
        self.chains.get(tag).map(|c| c.fingerprint)
    }

    pub fn remove(&mut self, tag: &str) {
        self.chains.remove(tag);
        self.observed.remove(tag);
    }

    pub fn clear(&mut self) {
        self.chains.clear();
        self.observed.clear();
    }

    pub fn len(&self) -> usize {
        self.chains.len()
    }

    pub fn is_empty(&self) -> bool {
        self.chains.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::driver::SqliteConnection;

    fn chain(tag: &str) -> Arc<StatementChain> {
        let mut conn = SqliteConnection::open_in_memory().unwrap();
        Arc::new(StatementChain::compile(tag, "SELECT 1", &mut conn, false).unwrap())
    }

    #[test]
    fn store_requires_observation() {
        let mut cache = ChainCache::new();
        assert!(!cache.store("a", chain("a")));
        assert!(cache.is_empty());

        cache.observe("a", Fingerprint::Generation(1));
        assert!(cache.store("a", chain("a")));
        assert_eq!(cache.len(), 1);
    }

    #[test]
    fn get_checks_fingerprint() {
        let mut cache = ChainCache::new();
        let compiled = chain("a");
        cache.observe("a", Fingerprint::Generation(1));
        cache.store("a", Arc::clone(&compiled));

        let hit = cache.get("a", Some(Fingerprint::Generation(1))).unwrap();
        assert!(Arc::ptr_eq(&hit, &compiled));
        assert!(cache.get("a", Some(Fingerprint::Generation(2))).is_none());
        assert!(cache.get("a", None).is_none());
        assert!(cache.get("b", Some(Fingerprint::Generation(1))).is_none());
    }

    #[test]
    fn clear_forgets_observations() {
        let mut cache = ChainCache::new();
        cache.observe("a", Fingerprint::Generation(1));
        cache.store("a", chain("a"));
        cache.clear();

        assert!(cache.is_empty());
        assert!(!cache.store("a", chain("a")));
    }
}
