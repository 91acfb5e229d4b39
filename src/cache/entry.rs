//! Cache Entry Module
//!
//! Defines individual memoized entries, their freshness windows and the
//! cancellable eviction token each entry owns.

use std::fmt;
use std::sync::Arc;
use std::time::Duration;

use futures::future::{BoxFuture, Shared};
use tokio::sync::Notify;
use tokio::time::Instant;

use crate::config::MemoConfig;

/// Awaitable handle to the result of one population attempt.
///
/// Cloning is cheap and every clone resolves to the same result, which is
/// what lets concurrent callers share a single in-flight operation.
pub type SharedResult<V, E> = Shared<BoxFuture<'static, Result<V, E>>>;

// == Freshness ==
/// Temporal zone an entry is in at a given instant.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Freshness {
    /// Inside the fresh window, served unconditionally
    Fresh,
    /// Past the fresh window but inside the stale-while-revalidate window
    StaleWhileRevalidate,
    /// Past the fresh window and outside any revalidate window, inside stale-if-error
    StaleIfError,
    /// Outside every configured window
    Expired,
}

// == Freshness Windows ==
/// The durations that decide an entry's zone, measured from its creation.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct FreshnessWindows {
    /// Fresh window, `None` = fresh forever
    pub fresh_for: Option<Duration>,
    /// Measured from the end of the fresh window
    pub stale_while_revalidate: Option<Duration>,
    /// Measured from the end of the fresh window
    pub stale_if_error: Option<Duration>,
}

impl FreshnessWindows {
    /// Classifies an entry of the given age.
    ///
    /// All bounds are half-open: an age landing exactly on a boundary has
    /// already left that window. Stale-while-revalidate wins over
    /// stale-if-error when both windows contain the age.
    pub fn classify(&self, age: Duration) -> Freshness {
        let fresh_for = match self.fresh_for {
            Some(fresh_for) => fresh_for,
            None => return Freshness::Fresh,
        };
        if age < fresh_for {
            return Freshness::Fresh;
        }

        let stale_for = age - fresh_for;
        if matches!(self.stale_while_revalidate, Some(window) if stale_for < window) {
            return Freshness::StaleWhileRevalidate;
        }
        if matches!(self.stale_if_error, Some(window) if stale_for < window) {
            return Freshness::StaleIfError;
        }
        Freshness::Expired
    }

    /// Total time an entry stays usable in any zone.
    ///
    /// Returns `None` when the entry never expires, either because the fresh
    /// window is unbounded or because the sum does not fit in a `Duration`.
    pub fn lifetime(&self) -> Option<Duration> {
        let fresh_for = self.fresh_for?;
        let stale_for = self
            .stale_while_revalidate
            .unwrap_or(Duration::ZERO)
            .max(self.stale_if_error.unwrap_or(Duration::ZERO));
        fresh_for.checked_add(stale_for)
    }
}

impl From<&MemoConfig> for FreshnessWindows {
    fn from(config: &MemoConfig) -> Self {
        Self {
            fresh_for: config.max_age,
            stale_while_revalidate: config.stale_while_revalidate,
            stale_if_error: config.stale_if_error,
        }
    }
}

// == Eviction Handle ==
/// Cancellable token for an entry's scheduled eviction.
///
/// Cancelling before the timer task has started still takes effect: the
/// permit is stored and consumed by the task on its first poll.
#[derive(Debug, Clone, Default)]
pub struct EvictionHandle {
    cancel: Arc<Notify>,
}

impl EvictionHandle {
    pub fn new() -> Self {
        Self::default()
    }

    /// Stops the scheduled eviction. Idempotent.
    pub fn cancel(&self) {
        self.cancel.notify_one();
    }

    /// Resolves once [`cancel`](Self::cancel) has been called.
    pub async fn cancelled(&self) {
        self.cancel.notified().await;
    }
}

// == Cache Entry ==
/// One memoized population for a key.
///
/// Entries are immutable once created. Refreshing a key installs a new
/// entry instead of touching the current one.
pub struct CacheEntry<V, E> {
    value: SharedResult<V, E>,
    created_at: Instant,
    windows: FreshnessWindows,
    generation: u64,
    eviction: Option<EvictionHandle>,
}

impl<V, E> CacheEntry<V, E> {
    // == Constructor ==
    /// Creates an entry holding `value`, created at `created_at`.
    ///
    /// An eviction handle is attached only when the windows give the entry a
    /// finite lifetime.
    pub fn new(
        value: SharedResult<V, E>,
        created_at: Instant,
        windows: FreshnessWindows,
        generation: u64,
    ) -> Self {
        let eviction = windows
            .lifetime()
            .and_then(|lifetime| created_at.checked_add(lifetime))
            .map(|_| EvictionHandle::new());

        Self {
            value,
            created_at,
            windows,
            generation,
            eviction,
        }
    }

    /// The stored value handle.
    pub fn value(&self) -> SharedResult<V, E> {
        self.value.clone()
    }

    pub fn created_at(&self) -> Instant {
        self.created_at
    }

    pub fn windows(&self) -> FreshnessWindows {
        self.windows
    }

    /// Install number, unique per memoized function.
    pub fn generation(&self) -> u64 {
        self.generation
    }

    pub fn eviction(&self) -> Option<&EvictionHandle> {
        self.eviction.as_ref()
    }

    // == Freshness ==
    /// Zone this entry is in at `now`.
    pub fn freshness(&self, now: Instant) -> Freshness {
        self.windows
            .classify(now.saturating_duration_since(self.created_at))
    }

    // == Eviction Deadline ==
    /// When the eviction timer should fire, `None` for immortal entries.
    pub fn eviction_deadline(&self) -> Option<Instant> {
        self.windows
            .lifetime()
            .and_then(|lifetime| self.created_at.checked_add(lifetime))
    }

    /// Cancels the scheduled eviction, if any.
    pub fn cancel_eviction(&self) {
        if let Some(handle) = &self.eviction {
            handle.cancel();
        }
    }
}

impl<V, E> Clone for CacheEntry<V, E> {
    fn clone(&self) -> Self {
        Self {
            value: self.value.clone(),
            created_at: self.created_at,
            windows: self.windows,
            generation: self.generation,
            eviction: self.eviction.clone(),
        }
    }
}

impl<V, E> fmt::Debug for CacheEntry<V, E> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("CacheEntry")
            .field("created_at", &self.created_at)
            .field("windows", &self.windows)
            .field("generation", &self.generation)
            .field("evictable", &self.eviction.is_some())
            .finish_non_exhaustive()
    }
}
