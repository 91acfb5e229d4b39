//! Memoization Statistics Module
//!
//! Tracks which freshness path each call took and what happened to entries.

use serde::Serialize;

// == Memo Stats ==
/// Counters for a single memoized operation.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct MemoStats {
    /// Calls served from a fresh entry
    pub fresh_hits: u64,
    /// Calls served a stale entry while a background refresh started
    pub stale_hits: u64,
    /// Background refreshes started
    pub revalidations: u64,
    /// Background refreshes that failed and were discarded
    pub revalidation_failures: u64,
    /// Calls answered with a stale entry because the refresh failed
    pub error_fallbacks: u64,
    /// Calls that had to run the operation (no usable entry)
    pub misses: u64,
    /// Entries dropped because their population failed and errors are not cached
    pub failures_evicted: u64,
    /// Entries removed by their eviction timer
    pub evictions: u64,
}

impl MemoStats {
    // == Constructor ==
    /// Creates a new MemoStats with all counters at zero.
    pub fn new() -> Self {
        Self::default()
    }

    // == Hit Rate ==
    /// Share of calls answered from a cached entry without waiting on the operation.
    ///
    /// Returns 0.0 if no calls have been made.
    pub fn hit_rate(&self) -> f64 {
        let hits = self.fresh_hits + self.stale_hits;
        let total = hits + self.misses;
        if total == 0 {
            0.0
        } else {
            hits as f64 / total as f64
        }
    }

    pub fn record_fresh_hit(&mut self) {
        self.fresh_hits += 1;
    }

    /// Records a stale-while-revalidate hit, which always starts one refresh.
    pub fn record_stale_hit(&mut self) {
        self.stale_hits += 1;
        self.revalidations += 1;
    }

    pub fn record_revalidation_failure(&mut self) {
        self.revalidation_failures += 1;
    }

    pub fn record_error_fallback(&mut self) {
        self.error_fallbacks += 1;
    }

    pub fn record_miss(&mut self) {
        self.misses += 1;
    }

    pub fn record_failure_evicted(&mut self) {
        self.failures_evicted += 1;
    }

    pub fn record_eviction(&mut self) {
        self.evictions += 1;
    }
}

// == Unit Tests ==
#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_stats_new() {
        let stats = MemoStats::new();
        assert_eq!(stats, MemoStats::default());
        assert_eq!(stats.misses, 0);
    }

    #[test]
    fn test_hit_rate_no_requests() {
        assert_eq!(MemoStats::new().hit_rate(), 0.0);
    }

    #[test]
    fn test_hit_rate_mixed() {
        let mut stats = MemoStats::new();
        stats.record_fresh_hit();
        stats.record_stale_hit();
        stats.record_miss();
        stats.record_miss();
        assert_eq!(stats.hit_rate(), 0.5);
    }

    #[test]
    fn test_stale_hit_counts_revalidation() {
        let mut stats = MemoStats::new();
        stats.record_stale_hit();
        stats.record_revalidation_failure();
        assert_eq!(stats.stale_hits, 1);
        assert_eq!(stats.revalidations, 1);
        assert_eq!(stats.revalidation_failures, 1);
    }

    #[test]
    fn test_stats_serialize() {
        let mut stats = MemoStats::new();
        stats.record_eviction();
        stats.record_failure_evicted();
        stats.record_error_fallback();

        let json = serde_json::to_value(&stats).unwrap();
        assert_eq!(json["evictions"], 1);
        assert_eq!(json["failures_evicted"], 1);
        assert_eq!(json["error_fallbacks"], 1);
        assert_eq!(json["fresh_hits"], 0);
    }
}
