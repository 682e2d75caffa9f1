//! Reader/writer wrapper around an [`Explorer`].
//!
//! Ingestion takes the write lock; queries take the read lock and may run
//! concurrently, since every traversal keeps its marks in a per-call overlay.

use std::sync::Arc;

use parking_lot::{RwLock, RwLockReadGuard, RwLockWriteGuard};

use crate::explorer::Explorer;

/// Cloneable handle to an explorer shared between threads.
#[derive(Debug, Clone, Default)]
pub struct SharedExplorer {
    inner: Arc<RwLock<Explorer>>,
}

impl SharedExplorer {
    pub fn new(explorer: Explorer) -> Self {
        Self {
            inner: Arc::new(RwLock::new(explorer)),
        }
    }

    /// Shared access for queries.
    pub fn read(&self) -> RwLockReadGuard<'_, Explorer> {
        self.inner.read()
    }

    /// Exclusive access for ingestion.
    pub fn write(&self) -> RwLockWriteGuard<'_, Explorer> {
        self.inner.write()
    }

    /// Run `f` under the read lock.
    pub fn query<T>(&self, f: impl FnOnce(&Explorer) -> T) -> T {
        f(&self.inner.read())
    }

    /// Run `f` under the write lock.
    pub fn ingest<T>(&self, f: impl FnOnce(&mut Explorer) -> T) -> T {
        f(&mut self.inner.write())
    }
}

impl From<Explorer> for SharedExplorer {
    fn from(explorer: Explorer) -> Self {
        Self::new(explorer)
    }
}
