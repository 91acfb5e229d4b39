//! Cache Module
//!
//! Entries, freshness windows, the store contract and statistics.

mod entry;
mod stats;
mod store;


// Re-export public types
pub use entry::{CacheEntry, EvictionHandle, Freshness, FreshnessWindows, SharedResult};
pub use stats::MemoStats;
pub use store::{CacheStore, MemoryStore};
