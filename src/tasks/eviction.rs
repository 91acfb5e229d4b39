//! Eviction Timer Task
//!
//! Background task that removes one entry once all of its windows have closed.

use std::sync::Weak;

use tokio::task::JoinHandle;
use tokio::time::sleep_until;
use tracing::{debug, trace};

use crate::cache::{CacheEntry, CacheStore};

/// Spawns the eviction timer for an entry that has just been installed under `key`.
///
/// The task sleeps until the entry's eviction deadline, then deletes the key
/// only if the store still holds this very entry (same generation), so a
/// late timer never removes a newer entry. Cancelling the entry's
/// [`EvictionHandle`](crate::cache::EvictionHandle) ends the task early.
/// The store is held weakly: dropping the memoized operation ends eviction.
///
/// `on_evict` runs after a successful eviction.
///
/// # Returns
/// `None` for immortal entries, which get no timer. Otherwise the task's
/// JoinHandle; dropping it detaches the task.
pub fn spawn_eviction_timer<K, V, E, S, F>(
    store: Weak<S>,
    key: K,
    entry: &CacheEntry<V, E>,
    on_evict: F,
) -> Option<JoinHandle<()>>
where
    K: Send + Sync + 'static,
    V: Clone + Send + Sync + 'static,
    E: Clone + Send + Sync + 'static,
    S: CacheStore<K, V, E>,
    F: FnOnce() + Send + 'static,
{
    let deadline = entry.eviction_deadline()?;
    let handle = entry.eviction()?.clone();
    let generation = entry.generation();

    Some(tokio::spawn(async move {
        tokio::select! {
            biased;

            _ = handle.cancelled() => {
                trace!(generation, "Eviction timer cancelled");
            }
            _ = sleep_until(deadline) => {
                let Some(store) = store.upgrade() else {
                    return;
                };
                if store.delete_generation(&key, generation) {
                    on_evict();
                    debug!(generation, "Evicted entry after its last window closed");
                } else {
                    trace!(generation, "Eviction skipped, entry already superseded");
                }
            }
        }
    }))
}
