use std::collections::BTreeSet;
use std::sync::Arc;

use parking_lot::{Mutex, MutexGuard};

use super::Librarian;
use crate::archive::Archiver;
use crate::driver::Connection;
use crate::error::Result;
use crate::types::Context;

/// Cloneable handle serializing every call on one [`Librarian`].
///
/// Each method holds the lock for the whole call, so the running total and
/// the transaction of one `execute` never interleave with another thread's.
/// Use [`lock`](Self::lock) to group several calls, e.g. executes followed
/// by an explicit commit with auto-commit off.
pub struct SharedLibrarian<A, C> {
    inner: Arc<Mutex<Librarian<A, C>>>,
}

impl<A, C> Clone for SharedLibrarian<A, C> {
    fn clone(&self) -> Self {
        Self {
            inner: Arc::clone(&self.inner),
        }
    }
}

impl<A: Archiver, C: Connection> From<Librarian<A, C>> for SharedLibrarian<A, C> {
    fn from(librarian: Librarian<A, C>) -> Self {
        Self::new(librarian)
    }
}

impl<A: Archiver, C: Connection> SharedLibrarian<A, C> {
    pub fn new(librarian: Librarian<A, C>) -> Self {
        Self {
            inner: Arc::new(Mutex::new(librarian)),
        }
    }

    pub fn lock(&self) -> MutexGuard<'_, Librarian<A, C>> {
        self.inner.lock()
    }

    pub fn execute(&self, tag: &str, ctx: &mut Context) -> Result<usize> {
        self.inner.lock().execute(tag, ctx)
    }

    pub fn prepare<I>(&self, tags: I) -> Result<()>
    where
        I: IntoIterator,
        I::Item: AsRef<str>,
    {
        self.inner.lock().prepare(tags)
    }

    pub fn prepare_all(&self) -> Result<usize> {
        self.inner.lock().prepare_all()
    }

    pub fn toc(&self) -> Result<BTreeSet<String>> {
        self.inner.lock().toc()
    }

    pub fn commit(&self) -> Result<()> {
        self.inner.lock().commit()
    }

    pub fn rollback(&self) -> Result<()> {
        self.inner.lock().rollback()
    }

    pub fn set_auto_commit(&self, enabled: bool) {
        self.inner.lock().set_auto_commit(enabled)
    }

    pub fn auto_commit(&self) -> bool {
        self.inner.lock().auto_commit()
    }

    pub fn disconnect(&self) -> Result<()> {
        self.inner.lock().disconnect()
    }
}

#[cfg(test)]
mod tests {
    use std::thread;

    use super::*;
    use crate::archive::MemoryArchiver;
    use crate::driver::SqliteConnection;
    use crate::types::Value;

    #[test]
    fn concurrent_executes_are_serialized() {
        let mut conn = SqliteConnection::open_in_memory().unwrap();
        conn.execute_batch("CREATE TABLE hits (worker INTEGER)").unwrap();
        let archiver = MemoryArchiver::new()
            .with("hit", "INSERT INTO hits (worker) VALUES (:worker)")
            .with("count", "SELECT1 count(*) AS n FROM hits");
        let shared = SharedLibrarian::new(Librarian::new(archiver, conn));

        let handles: Vec<_> = (0..4)
            .map(|worker| {
                let shared = shared.clone();
                thread::spawn(move || {
                    for _ in 0..25 {
                        let mut ctx = Context::new().with("worker", worker);
                        assert_eq!(shared.execute("hit", &mut ctx).unwrap(), 1);
                    }
                })
            })
            .collect();
        for handle in handles {
            handle.join().unwrap();
        }

        let mut ctx = Context::new();
        shared.execute("count", &mut ctx).unwrap();
        assert_eq!(ctx.scalar("n"), Some(&Value::Int(100)));
        assert_eq!(shared.lock().archiver().find_count(), 2);
    }

    #[test]
    fn lock_groups_calls_into_one_transaction() {
        let mut conn = SqliteConnection::open_in_memory().unwrap();
        conn.execute_batch("CREATE TABLE t (x INTEGER)").unwrap();
        let archiver = MemoryArchiver::new().with("add", "INSERT INTO t VALUES (:x)");
        let shared: SharedLibrarian<_, _> = Librarian::new(archiver, conn).into();
        shared.set_auto_commit(false);

        {
            let mut lib = shared.lock();
            lib.execute("add", &mut Context::new().with("x", 1)).unwrap();
            lib.execute("add", &mut Context::new().with("x", 2)).unwrap();
            lib.rollback().unwrap();
        }

        let rows = shared
            .lock()
            .connection_mut()
            .unwrap()
            .query("SELECT count(*) FROM t", &[], None)
            .unwrap();
        assert_eq!(rows.rows[0].values[0], Value::Int(0));
        assert!(!shared.auto_commit());
    }
}
