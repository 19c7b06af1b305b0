//! Append-only version histories.

use crate::document::Snapshot;
use std::sync::{Arc, RwLock, RwLockReadGuard, RwLockWriteGuard};

/// One immutable entry in a history.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Version {
    /// Position in the history, starting at 0.
    pub id: usize,
    pub payload: Arc<str>,
    pub snapshot: Arc<Snapshot>,
}

/// Dense, gap-free list of versions.
///
/// Appends hold the write lock for the whole id-assign-and-push, so the id
/// handed back is always the position the version landed at. Readers see a
/// history either before or after an append, never in between.
#[derive(Debug, Default)]
pub struct History {
    versions: RwLock<Vec<Version>>,
}

impl History {
    pub fn new() -> Self {
        Self::default()
    }

    /// Append a snapshot and return the stored version.
    pub fn append(&self, snapshot: Snapshot) -> Version {
        let payload: Arc<str> = snapshot.payload().into();
        let snapshot = Arc::new(snapshot);
        let mut versions = self.write();
        let version = Version {
            id: versions.len(),
            payload,
            snapshot,
        };
        versions.push(version.clone());
        version
    }

    /// Every version with `id >= from`, oldest first. Empty when up to date.
    pub fn since(&self, from: usize) -> Vec<Version> {
        let versions = self.read();
        versions.get(from..).map(<[Version]>::to_vec).unwrap_or_default()
    }

    pub fn latest(&self) -> Option<Version> {
        self.read().last().cloned()
    }

    pub fn len(&self) -> usize {
        self.read().len()
    }

    pub fn is_empty(&self) -> bool {
        self.read().is_empty()
    }

    fn read(&self) -> RwLockReadGuard<'_, Vec<Version>> {
        // A panicking appender cannot leave a half-pushed Vec behind.
        self.versions.read().unwrap_or_else(|e| e.into_inner())
    }

    fn write(&self) -> RwLockWriteGuard<'_, Vec<Version>> {
        self.versions.write().unwrap_or_else(|e| e.into_inner())
    }
}
