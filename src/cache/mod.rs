//! In-memory cache of minified scripts
//!
//! Keys are canonical source URLs, values are compiled code. Entries have no
//! individual expiry: the whole map is swapped out on clear, either by the
//! refresh timer or by an accepted webhook.
//!
//! # Clear vs. in-flight compiles
//!
//! | Step | Generation | Effect |
//! |------|------------|--------|
//! | Miss | g | caller records `g`, starts compiling |
//! | Clear | g+1 | map emptied |
//! | Insert at `g` | g+1 | dropped, the clear stays in force |
//!
//! Inserts that started after the clear carry `g+1` and land normally.

pub mod refresh;

pub use refresh::RefreshTask;

use std::collections::HashMap;
use std::sync::{RwLock, RwLockReadGuard, RwLockWriteGuard};
use tracing::debug;

/// Monotonic counter of clears, used to reject stale inserts
pub type Generation = u64;

#[derive(Debug, Default)]
struct Entries {
    generation: Generation,
    scripts: HashMap<String, String>,
}

/// Shared store of minified scripts
#[derive(Debug, Default)]
pub struct CodeCache {
    inner: RwLock<Entries>,
}

impl CodeCache {
    /// Create an empty cache
    pub fn new() -> Self {
        Self::default()
    }

    /// Cached code for `key`, if present
    pub fn lookup(&self, key: &str) -> Option<String> {
        self.read().scripts.get(key).cloned()
    }

    /// Store `code` under `key`, replacing any previous value
    pub fn insert(&self, key: impl Into<String>, code: impl Into<String>) {
        self.write().scripts.insert(key.into(), code.into());
    }

    /// Store `code` only if no clear happened since `generation` was read.
    ///
    /// Returns whether the entry was stored.
    pub fn insert_if_current(
        &self,
        key: impl Into<String>,
        code: impl Into<String>,
        generation: Generation,
    ) -> bool {
        let mut entries = self.write();
        if entries.generation != generation {
            debug!(
                "Dropping insert from generation {} (now {})",
                generation, entries.generation
            );
            return false;
        }
        entries.scripts.insert(key.into(), code.into());
        true
    }

    /// Current clear generation
    pub fn generation(&self) -> Generation {
        self.read().generation
    }

    /// Drop every entry at once. Returns how many were removed.
    pub fn clear(&self) -> usize {
        let mut entries = self.write();
        let removed = std::mem::take(&mut entries.scripts).len();
        entries.generation += 1;
        removed
    }

    /// Number of cached scripts
    pub fn len(&self) -> usize {
        self.read().scripts.len()
    }

    /// Whether the cache holds nothing
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    // A panic while holding the lock cannot leave the map half-written, so
    // poisoning is ignored.
    fn read(&self) -> RwLockReadGuard<'_, Entries> {
        self.inner.read().unwrap_or_else(|e| e.into_inner())
    }

    fn write(&self) -> RwLockWriteGuard<'_, Entries> {
        self.inner.write().unwrap_or_else(|e| e.into_inner())
    }
}
