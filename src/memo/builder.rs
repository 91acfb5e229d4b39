//! Memoized Builder Module
//!
//! Collects the policy, key deriver and store for a memoized operation.

use std::hash::Hash;
use std::marker::PhantomData;
use std::sync::Arc;
use std::time::Duration;

use crate::cache::{CacheStore, MemoryStore};
use crate::config::MemoConfig;
use crate::memo::{KeyDeriver, Memoized, Operation};

/// Store slot of a builder that will create its own [`MemoryStore`].
#[derive(Debug, Clone, Copy, Default)]
pub struct DefaultStore;

/// Builder returned by [`Memoized::builder`].
pub struct MemoizedBuilder<A, O, D, S> {
    operation: O,
    key_deriver: D,
    store: S,
    config: MemoConfig,
    _args: PhantomData<fn(A)>,
}

impl<A, O, D> MemoizedBuilder<A, O, D, DefaultStore>
where
    D: Default,
{
    pub(crate) fn new(operation: O) -> Self {
        Self {
            operation,
            key_deriver: D::default(),
            store: DefaultStore,
            config: MemoConfig::default(),
            _args: PhantomData,
        }
    }
}

impl<A, O, D, S> MemoizedBuilder<A, O, D, S> {
    /// Replaces the whole freshness policy.
    pub fn config(mut self, config: MemoConfig) -> Self {
        self.config = config;
        self
    }

    pub fn max_age(mut self, max_age: Duration) -> Self {
        self.config.max_age = Some(max_age);
        self
    }

    pub fn stale_while_revalidate(mut self, window: Duration) -> Self {
        self.config.stale_while_revalidate = Some(window);
        self
    }

    pub fn stale_if_error(mut self, window: Duration) -> Self {
        self.config.stale_if_error = Some(window);
        self
    }

    /// Keep failed populations and replay them until they expire.
    pub fn cache_errors(mut self, cache_errors: bool) -> Self {
        self.config.cache_errors = cache_errors;
        self
    }

    /// Derives keys with a closure instead of using the argument itself.
    pub fn cache_key<K, F>(self, derive: F) -> MemoizedBuilder<A, O, F, S>
    where
        F: Fn(&A) -> K + Send + Sync + 'static,
        K: Eq + Hash + Clone + Send + Sync + 'static,
    {
        self.key_deriver(derive)
    }

    /// Derives keys with any [`KeyDeriver`], e.g. [`FirstArg`](crate::FirstArg).
    pub fn key_deriver<D2>(self, key_deriver: D2) -> MemoizedBuilder<A, O, D2, S>
    where
        D2: KeyDeriver<A>,
    {
        MemoizedBuilder {
            operation: self.operation,
            key_deriver,
            store: self.store,
            config: self.config,
            _args: PhantomData,
        }
    }

    /// Writes entries to `store` instead of a private [`MemoryStore`].
    pub fn store<S2>(self, store: Arc<S2>) -> MemoizedBuilder<A, O, D, Arc<S2>> {
        MemoizedBuilder {
            operation: self.operation,
            key_deriver: self.key_deriver,
            store,
            config: self.config,
            _args: PhantomData,
        }
    }
}

impl<A, O, D> MemoizedBuilder<A, O, D, DefaultStore>
where
    A: Send + 'static,
    O: Operation<A>,
    D: KeyDeriver<A>,
{
    pub fn build(self) -> Memoized<A, O, D, MemoryStore<D::Key, O::Output, O::Error>> {
        Memoized::from_parts(
            self.operation,
            self.key_deriver,
            Arc::new(MemoryStore::new()),
            self.config,
        )
    }
}

impl<A, O, D, S> MemoizedBuilder<A, O, D, Arc<S>>
where
    A: Send + 'static,
    O: Operation<A>,
    D: KeyDeriver<A>,
    S: CacheStore<D::Key, O::Output, O::Error>,
{
    pub fn build(self) -> Memoized<A, O, D, S> {
        Memoized::from_parts(self.operation, self.key_deriver, self.store, self.config)
    }
}
