//! Render cache and managed-path manifest
//!
//! The cache remembers, per output slot, the path last written and the
//! digest of what was written there. That single structure answers both
//! questions reconciliation asks: "did this render change?" and "which
//! on-disk paths are ours to delete?". It lives for one process run only.

use std::collections::{HashMap, HashSet};
use std::path::PathBuf;

/// Identity of the record a desired file is rendered from.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum SourceId {
    Filament(i64),
    Spool(i64),
}

impl SourceId {
    pub fn filament_id(&self) -> Option<i64> {
        match self {
            SourceId::Filament(id) => Some(*id),
            SourceId::Spool(_) => None,
        }
    }
}

/// One output slot: a source expanded over a suffix and a variant.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct SlotKey {
    pub source: SourceId,
    pub suffix: String,
    pub variant: String,
}

/// What was last written for a slot.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CachedOutput {
    pub path: PathBuf,
    pub digest: String,
}

/// In-memory state carried between sync cycles of one engine instance.
#[derive(Debug, Default)]
pub struct SyncCache {
    entries: HashMap<SlotKey, CachedOutput>,
}

impl SyncCache {
    pub fn get(&self, key: &SlotKey) -> Option<&CachedOutput> {
        self.entries.get(key)
    }

    /// Paths this engine has written and not yet withdrawn — the
    /// tool-managed set reconciliation is allowed to delete from.
    pub fn managed_paths(&self) -> HashSet<PathBuf> {
        self.entries.values().map(|e| e.path.clone()).collect()
    }

    /// Replace the whole cache with the state of the cycle that just ran.
    pub fn replace(&mut self, entries: HashMap<SlotKey, CachedOutput>) {
        self.entries = entries;
    }

    pub fn clear(&mut self) {
        self.entries.clear();
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}
