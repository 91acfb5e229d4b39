//! Cache Store Module
//!
//! The storage contract a memoized operation writes its entries to, and the
//! default in-memory implementation.

use std::collections::HashMap;
use std::hash::Hash;

use parking_lot::RwLock;

use crate::cache::CacheEntry;
use crate::error::{MemoError, Result};

// == Cache Store Trait ==
/// Key to entry mapping used by a memoized operation.
///
/// Methods take `&self`; implementations provide their own interior
/// mutability. The engine never holds a store call across an `.await`.
/// Bulk clear is optional: stores without it keep the default
/// [`supports_clear`](Self::supports_clear) and [`clear`](Self::clear).
pub trait CacheStore<K, V, E>: Send + Sync + 'static {
    fn has(&self, key: &K) -> bool;

    fn get(&self, key: &K) -> Option<CacheEntry<V, E>>;

    /// Stores `entry`, superseding any previous entry for `key`.
    fn set(&self, key: K, entry: CacheEntry<V, E>);

    fn delete(&self, key: &K);

    /// Deletes the entry for `key` only if it is still the install numbered
    /// `generation`, cancelling its eviction timer.
    ///
    /// Returns whether an entry was removed. The provided version checks and
    /// deletes in two steps; stores shared across threads should override it
    /// to do both under one lock.
    fn delete_generation(&self, key: &K, generation: u64) -> bool {
        match self.get(key) {
            Some(entry) if entry.generation() == generation => {
                entry.cancel_eviction();
                self.delete(key);
                true
            }
            _ => false,
        }
    }

    /// Whether [`clear`](Self::clear) is implemented.
    fn supports_clear(&self) -> bool {
        false
    }

    /// Removes every entry.
    fn clear(&self) -> Result<()> {
        Err(MemoError::ClearUnsupported)
    }
}

// == Memory Store ==
/// Default store: a `HashMap` behind a `parking_lot::RwLock`.
///
/// Replacing, deleting or clearing entries cancels their eviction timers.
#[derive(Debug)]
pub struct MemoryStore<K, V, E> {
    entries: RwLock<HashMap<K, CacheEntry<V, E>>>,
}

impl<K, V, E> MemoryStore<K, V, E> {
    pub fn new() -> Self {
        Self {
            entries: RwLock::new(HashMap::new()),
        }
    }

    /// Returns the current number of entries in the store.
    pub fn len(&self) -> usize {
        self.entries.read().len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.read().is_empty()
    }
}

impl<K, V, E> Default for MemoryStore<K, V, E> {
    fn default() -> Self {
        Self::new()
    }
}

impl<K, V, E> CacheStore<K, V, E> for MemoryStore<K, V, E>
where
    K: Eq + Hash + Send + Sync + 'static,
    V: Clone + Send + Sync + 'static,
    E: Clone + Send + Sync + 'static,
{
    fn has(&self, key: &K) -> bool {
        self.entries.read().contains_key(key)
    }

    fn get(&self, key: &K) -> Option<CacheEntry<V, E>> {
        self.entries.read().get(key).cloned()
    }

    fn set(&self, key: K, entry: CacheEntry<V, E>) {
        let previous = self.entries.write().insert(key, entry);
        if let Some(previous) = previous {
            previous.cancel_eviction();
        }
    }

    fn delete(&self, key: &K) {
        let removed = self.entries.write().remove(key);
        if let Some(removed) = removed {
            removed.cancel_eviction();
        }
    }

    fn delete_generation(&self, key: &K, generation: u64) -> bool {
        let removed = {
            let mut entries = self.entries.write();
            let current = entries.get(key).map(|entry| entry.generation());
            if current == Some(generation) {
                entries.remove(key)
            } else {
                None
            }
        };
        match removed {
            Some(entry) => {
                entry.cancel_eviction();
                true
            }
            None => false,
        }
    }

    fn supports_clear(&self) -> bool {
        true
    }

    fn clear(&self) -> Result<()> {
        let drained: Vec<CacheEntry<V, E>> =
            self.entries.write().drain().map(|(_, entry)| entry).collect();
        for entry in &drained {
            entry.cancel_eviction();
        }
        Ok(())
    }
}
