//! Memoized Operation Module
//!
//! The freshness engine. Every call picks one of four paths from the state
//! of the key's entry: serve it fresh, serve it stale while revalidating in
//! the background, refresh and fall back to it on error, or populate anew.

use std::marker::PhantomData;
use std::panic::{self, AssertUnwindSafe};
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;

use futures::future::{BoxFuture, FutureExt};
use parking_lot::Mutex;
use tokio::sync::oneshot;
use tokio::time::Instant;
use tracing::{debug, trace};

use crate::cache::{
    CacheEntry, CacheStore, Freshness, FreshnessWindows, MemoStats, MemoryStore, SharedResult,
};
use crate::config::MemoConfig;
use crate::error::{MemoError, Result};
use crate::memo::{ClearHandle, DefaultStore, Identity, KeyDeriver, MemoizedBuilder, Operation};
use crate::tasks::spawn_eviction_timer;

/// Result of one call to a memoized operation.
pub type CallResult<A, O> = std::result::Result<<O as Operation<A>>::Output, <O as Operation<A>>::Error>;

// == Memoized ==
/// A memoized async operation.
///
/// Cloning is cheap: clones share the same store, policy and statistics.
/// The store is owned by this value, so [`clear`](Self::clear) needs no
/// process-wide registration.
pub struct Memoized<A, O, D, S> {
    inner: Arc<Inner<A, O, D, S>>,
}

struct Inner<A, O, D, S> {
    operation: O,
    key_deriver: D,
    store: Arc<S>,
    config: MemoConfig,
    windows: FreshnessWindows,
    generation: AtomicU64,
    stats: Arc<Mutex<MemoStats>>,
    _args: PhantomData<fn(A)>,
}

impl<A, O, D, S> Clone for Memoized<A, O, D, S> {
    fn clone(&self) -> Self {
        Self {
            inner: Arc::clone(&self.inner),
        }
    }
}

impl<A, O> Memoized<A, O, Identity, MemoryStore<A, O::Output, O::Error>>
where
    O: Operation<A>,
{
    /// Starts building a memoized operation keyed on its argument and
    /// backed by a fresh [`MemoryStore`].
    pub fn builder(operation: O) -> MemoizedBuilder<A, O, Identity, DefaultStore> {
        MemoizedBuilder::new(operation)
    }
}

impl<A, O> Memoized<A, O, Identity, MemoryStore<A, O::Output, O::Error>>
where
    A: std::hash::Hash + Eq + Clone + Send + Sync + 'static,
    O: Operation<A>,
{
    /// Memoizes `operation` with `config`, the default key and the default store.
    pub fn new(operation: O, config: MemoConfig) -> Self {
        Self::builder(operation).config(config).build()
    }
}

impl<A, O, D, S> Memoized<A, O, D, S>
where
    A: Send + 'static,
    O: Operation<A>,
    D: KeyDeriver<A>,
    S: CacheStore<D::Key, O::Output, O::Error>,
{
    pub(crate) fn from_parts(operation: O, key_deriver: D, store: Arc<S>, config: MemoConfig) -> Self {
        Self {
            inner: Arc::new(Inner {
                operation,
                key_deriver,
                store,
                windows: FreshnessWindows::from(&config),
                config,
                generation: AtomicU64::new(0),
                stats: Arc::new(Mutex::new(MemoStats::new())),
                _args: PhantomData,
            }),
        }
    }

    // == Call ==
    /// Invokes the memoized operation.
    ///
    /// The path decision, any entry install and any background refresh all
    /// happen here, before the returned future is first polled. Concurrent
    /// callers that miss on the same key therefore share the entry the first
    /// one installed. Must be called within a tokio runtime.
    pub fn call(&self, args: A) -> BoxFuture<'static, CallResult<A, O>> {
        let inner = &self.inner;
        let key = inner.key_deriver.derive_key(&args);

        let Some(entry) = inner.store.get(&key) else {
            trace!("No entry, populating");
            return inner.populate(key, args);
        };

        let now = Instant::now();
        match entry.freshness(now) {
            Freshness::Fresh => {
                inner.stats.lock().record_fresh_hit();
                trace!(generation = entry.generation(), "Serving fresh entry");
                entry.value().boxed()
            }
            Freshness::StaleWhileRevalidate => {
                inner.stats.lock().record_stale_hit();
                debug!(
                    generation = entry.generation(),
                    "Serving stale entry, revalidating in background"
                );
                let inner = Arc::clone(inner);
                tokio::spawn(async move {
                    // Failures leave the stale entry and its timer as they are
                    if inner.refresh(key, args, now).await.is_err() {
                        inner.stats.lock().record_revalidation_failure();
                    }
                });
                entry.value().boxed()
            }
            Freshness::StaleIfError => {
                trace!(generation = entry.generation(), "Refreshing stale entry");
                let stats = Arc::clone(&inner.stats);
                let inner = Arc::clone(inner);
                let refresh = tokio::spawn(async move { inner.refresh(key, args, now).await });
                async move {
                    match refresh.await {
                        Ok(Ok(value)) => Ok(value),
                        Err(err) if err.is_panic() => panic::resume_unwind(err.into_panic()),
                        Ok(Err(_)) | Err(_) => {
                            stats.lock().record_error_fallback();
                            debug!(
                                generation = entry.generation(),
                                "Refresh failed, serving stale entry"
                            );
                            entry.value().await
                        }
                    }
                }
                .boxed()
            }
            Freshness::Expired => {
                trace!(generation = entry.generation(), "Entry expired, populating");
                inner.populate(key, args)
            }
        }
    }

    // == Forget ==
    /// Removes the entry for these arguments, if any, and cancels its timer.
    pub fn forget(&self, args: &A) {
        let key = self.inner.key_deriver.derive_key(args);
        if let Some(entry) = self.inner.store.get(&key) {
            entry.cancel_eviction();
            self.inner.store.delete(&key);
            debug!(generation = entry.generation(), "Forgot entry");
        }
    }

    /// Whether a live entry exists for these arguments.
    pub fn contains(&self, args: &A) -> bool {
        let key = self.inner.key_deriver.derive_key(args);
        self.inner.store.has(&key)
    }

    // == Clear ==
    /// Removes every entry from the bound store.
    ///
    /// Fails with [`MemoError::ClearUnsupported`] without touching any entry
    /// when the store has no bulk-clear capability.
    pub fn clear(&self) -> Result<()> {
        if !self.inner.store.supports_clear() {
            return Err(MemoError::ClearUnsupported);
        }
        self.inner.store.clear()?;
        debug!("Cleared memoized entries");
        Ok(())
    }

    /// A type-erased handle that clears this operation's store.
    pub fn clear_handle(&self) -> ClearHandle {
        ClearHandle::bound::<D::Key, O::Output, O::Error, S>(Arc::clone(&self.inner.store))
    }

    /// Snapshot of this operation's statistics.
    pub fn stats(&self) -> MemoStats {
        self.inner.stats.lock().clone()
    }

    pub fn config(&self) -> &MemoConfig {
        &self.inner.config
    }

    /// The store entries are written to.
    pub fn store(&self) -> &Arc<S> {
        &self.inner.store
    }
}

impl<A, O, D, S> Inner<A, O, D, S>
where
    A: Send + 'static,
    O: Operation<A>,
    D: KeyDeriver<A>,
    S: CacheStore<D::Key, O::Output, O::Error>,
{
    // == Install ==
    /// Stores a new entry for `key`, superseding the current one, and arms
    /// its eviction timer.
    fn install(
        &self,
        key: D::Key,
        value: SharedResult<O::Output, O::Error>,
        created_at: Instant,
    ) -> CacheEntry<O::Output, O::Error> {
        let generation = self.generation.fetch_add(1, Ordering::Relaxed) + 1;
        let entry = CacheEntry::new(value, created_at, self.windows, generation);

        if let Some(previous) = self.store.get(&key) {
            previous.cancel_eviction();
        }
        self.store.set(key.clone(), entry.clone());

        let stats = Arc::clone(&self.stats);
        let _ = spawn_eviction_timer(Arc::downgrade(&self.store), key, &entry, move || {
            stats.lock().record_eviction();
        });

        entry
    }

    // == Populate ==
    /// Cold path: starts the operation and installs its in-flight result
    /// right away.
    ///
    /// On failure the entry is removed again unless errors are cached, so the
    /// next call retries. A panic removes it too, then reaches every waiter.
    /// The operation runs to completion even if every caller stops waiting.
    fn populate(&self, key: D::Key, args: A) -> BoxFuture<'static, CallResult<A, O>> {
        self.stats.lock().record_miss();

        // Invoked before install: a panic while building the future leaves no entry behind
        let operation = self.operation.invoke(args);

        let (sender, receiver) = oneshot::channel::<CallResult<A, O>>();
        let value: SharedResult<O::Output, O::Error> = async move {
            match receiver.await {
                Ok(result) => result,
                // The sender is only dropped without sending when the operation panicked
                Err(_) => panic!("memoized operation panicked"),
            }
        }
        .boxed()
        .shared();

        let generation = self.install(key.clone(), value.clone(), Instant::now()).generation();

        let store = Arc::downgrade(&self.store);
        let stats = Arc::clone(&self.stats);
        let cache_errors = self.config.cache_errors;

        tokio::spawn(async move {
            let outcome = AssertUnwindSafe(operation).catch_unwind().await;
            let keep = match &outcome {
                Ok(Ok(_)) => true,
                Ok(Err(_)) => cache_errors,
                Err(_) => false,
            };
            if !keep {
                if let Some(store) = store.upgrade() {
                    if store.delete_generation(&key, generation) {
                        stats.lock().record_failure_evicted();
                        debug!(generation, "Population failed, entry removed");
                    }
                }
            }
            match outcome {
                Ok(result) => {
                    let _ = sender.send(result);
                }
                Err(payload) => panic::resume_unwind(payload),
            }
        });

        value.boxed()
    }

    // == Refresh ==
    /// Runs the operation for a stale entry and installs the result on
    /// success, timestamped with `started`. Failures install nothing.
    async fn refresh(&self, key: D::Key, args: A, started: Instant) -> CallResult<A, O> {
        let result = self.operation.invoke(args).await;
        if let Ok(value) = &result {
            let settled = futures::future::ready(Ok(value.clone())).boxed().shared();
            let generation = self.install(key, settled, started).generation();
            trace!(generation, "Installed refreshed entry");
        }
        result
    }
}
