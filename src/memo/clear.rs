//! Cache Clearing Module
//!
//! Bulk-clear entry points. A memoized operation owns its store, so clearing
//! goes through the operation itself or through a [`ClearHandle`] taken from
//! it, never through a global registry.

use std::fmt;
use std::marker::PhantomData;
use std::sync::Arc;

use tracing::debug;

use crate::cache::CacheStore;
use crate::error::{MemoError, Result};

/// Something whose memoized entries can be cleared in bulk.
pub trait CacheClear {
    fn clear_cache(&self) -> Result<()>;
}

/// Clears every entry of `target`.
///
/// # Errors
/// - [`MemoError::NotMemoized`] if `target` is an unbound [`ClearHandle`]
/// - [`MemoError::ClearUnsupported`] if the bound store cannot clear
///
/// Neither error touches any entry.
pub fn clear<T>(target: &T) -> Result<()>
where
    T: CacheClear + ?Sized,
{
    target.clear_cache()
}

impl<A, O, D, S> CacheClear for crate::Memoized<A, O, D, S>
where
    A: Send + 'static,
    O: crate::Operation<A>,
    D: crate::KeyDeriver<A>,
    S: CacheStore<D::Key, O::Output, O::Error>,
{
    fn clear_cache(&self) -> Result<()> {
        self.clear()
    }
}

// Object-safe view of a store's clear capability
trait ClearStore: Send + Sync {
    fn supports_clear(&self) -> bool;
    fn clear(&self) -> Result<()>;
}

struct BoundStore<K, V, E, S> {
    store: Arc<S>,
    _types: PhantomData<fn() -> (K, V, E)>,
}

impl<K, V, E, S> ClearStore for BoundStore<K, V, E, S>
where
    S: CacheStore<K, V, E>,
{
    fn supports_clear(&self) -> bool {
        self.store.supports_clear()
    }

    fn clear(&self) -> Result<()> {
        self.store.clear()
    }
}

// == Clear Handle ==
/// Cloneable, type-erased handle to one memoized operation's store.
///
/// Lets operations with different argument, value and store types be
/// cleared through one collection. A handle made with
/// [`ClearHandle::unbound`] belongs to no memoized operation.
#[derive(Clone, Default)]
pub struct ClearHandle {
    store: Option<Arc<dyn ClearStore>>,
}

impl ClearHandle {
    /// A handle not bound to any memoized operation.
    pub fn unbound() -> Self {
        Self::default()
    }

    pub(crate) fn bound<K, V, E, S>(store: Arc<S>) -> Self
    where
        K: 'static,
        V: 'static,
        E: 'static,
        S: CacheStore<K, V, E>,
    {
        Self {
            store: Some(Arc::new(BoundStore::<K, V, E, S> {
                store,
                _types: PhantomData,
            })),
        }
    }

    pub fn is_bound(&self) -> bool {
        self.store.is_some()
    }
}

impl CacheClear for ClearHandle {
    fn clear_cache(&self) -> Result<()> {
        let store = self.store.as_ref().ok_or(MemoError::NotMemoized)?;
        if !store.supports_clear() {
            return Err(MemoError::ClearUnsupported);
        }
        store.clear()?;
        debug!("Cleared memoized entries through handle");
        Ok(())
    }
}

impl fmt::Debug for ClearHandle {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ClearHandle")
            .field("bound", &self.is_bound())
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_unbound_handle_is_not_memoized() {
        let handle = ClearHandle::unbound();
        assert!(!handle.is_bound());
        assert_eq!(clear(&handle), Err(MemoError::NotMemoized));
    }

    #[test]
    fn test_handles_are_object_safe_targets() {
        let targets: Vec<Box<dyn CacheClear>> = vec![Box::new(ClearHandle::unbound())];
        for target in &targets {
            assert_eq!(clear(target.as_ref()), Err(MemoError::NotMemoized));
        }
    }
}
