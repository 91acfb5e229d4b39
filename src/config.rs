//! Configuration Module
//!
//! Freshness policy for a memoized operation, loadable from environment variables.

use std::env;
use std::time::Duration;

/// Freshness policy applied to every entry a memoized operation installs.
///
/// `None` durations are unset: an unset `max_age` means entries stay fresh
/// forever, unset stale windows are simply skipped.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct MemoConfig {
    /// How long after population an entry is served unconditionally
    pub max_age: Option<Duration>,
    /// Window after `max_age` where stale data is served while refreshing in background
    pub stale_while_revalidate: Option<Duration>,
    /// Window after `max_age` where stale data is served if a refresh fails
    pub stale_if_error: Option<Duration>,
    /// Keep failed populations cached and replay them until they expire
    pub cache_errors: bool,
}

impl MemoConfig {
    /// Creates a new MemoConfig by loading values from environment variables.
    ///
    /// # Environment Variables
    /// - `MEMO_MAX_AGE_MS` - Fresh window in milliseconds (default: infinite)
    /// - `MEMO_STALE_WHILE_REVALIDATE_MS` - Revalidate window in milliseconds (default: unset)
    /// - `MEMO_STALE_IF_ERROR_MS` - Error fallback window in milliseconds (default: unset)
    /// - `MEMO_CACHE_ERRORS` - `true` or `1` to cache failures (default: false)
    pub fn from_env() -> Self {
        Self {
            max_age: millis_from_env("MEMO_MAX_AGE_MS"),
            stale_while_revalidate: millis_from_env("MEMO_STALE_WHILE_REVALIDATE_MS"),
            stale_if_error: millis_from_env("MEMO_STALE_IF_ERROR_MS"),
            cache_errors: env::var("MEMO_CACHE_ERRORS")
                .map(|v| matches!(v.trim(), "1" | "true" | "TRUE" | "True"))
                .unwrap_or(false),
        }
    }

    pub fn with_max_age(mut self, max_age: Duration) -> Self {
        self.max_age = Some(max_age);
        self
    }

    pub fn with_stale_while_revalidate(mut self, window: Duration) -> Self {
        self.stale_while_revalidate = Some(window);
        self
    }

    pub fn with_stale_if_error(mut self, window: Duration) -> Self {
        self.stale_if_error = Some(window);
        self
    }

    pub fn with_cache_errors(mut self, cache_errors: bool) -> Self {
        self.cache_errors = cache_errors;
        self
    }
}

fn millis_from_env(name: &str) -> Option<Duration> {
    env::var(name)
        .ok()
        .and_then(|v| v.trim().parse::<u64>().ok())
        .map(Duration::from_millis)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_config_default() {
        let config = MemoConfig::default();
        assert_eq!(config.max_age, None);
        assert_eq!(config.stale_while_revalidate, None);
        assert_eq!(config.stale_if_error, None);
        assert!(!config.cache_errors);
    }

    #[test]
    fn test_config_builders() {
        let config = MemoConfig::default()
            .with_max_age(Duration::from_millis(100))
            .with_stale_while_revalidate(Duration::from_millis(500))
            .with_stale_if_error(Duration::from_millis(50))
            .with_cache_errors(true);

        assert_eq!(config.max_age, Some(Duration::from_millis(100)));
        assert_eq!(config.stale_while_revalidate, Some(Duration::from_millis(500)));
        assert_eq!(config.stale_if_error, Some(Duration::from_millis(50)));
        assert!(config.cache_errors);
    }

    // Single test touching the environment to avoid races between test threads
    #[test]
    fn test_config_from_env() {
        env::remove_var("MEMO_MAX_AGE_MS");
        env::remove_var("MEMO_STALE_WHILE_REVALIDATE_MS");
        env::remove_var("MEMO_STALE_IF_ERROR_MS");
        env::remove_var("MEMO_CACHE_ERRORS");

        assert_eq!(MemoConfig::from_env(), MemoConfig::default());

        env::set_var("MEMO_MAX_AGE_MS", "100");
        env::set_var("MEMO_STALE_WHILE_REVALIDATE_MS", "500");
        env::set_var("MEMO_STALE_IF_ERROR_MS", "not-a-number");
        env::set_var("MEMO_CACHE_ERRORS", "1");

        let config = MemoConfig::from_env();
        assert_eq!(config.max_age, Some(Duration::from_millis(100)));
        assert_eq!(config.stale_while_revalidate, Some(Duration::from_millis(500)));
        assert_eq!(config.stale_if_error, None);
        assert!(config.cache_errors);

        env::remove_var("MEMO_MAX_AGE_MS");
        env::remove_var("MEMO_STALE_WHILE_REVALIDATE_MS");
        env::remove_var("MEMO_STALE_IF_ERROR_MS");
        env::remove_var("MEMO_CACHE_ERRORS");
    }
}
