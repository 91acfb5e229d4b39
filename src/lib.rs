//! SWR Memo - Async memoization with stale-while-revalidate
//!
//! Caches the results of an async operation per key and serves them under a
//! freshness policy with three zones: fresh, stale-but-usable and expired.
//! Stale entries are either served while a background refresh runs or kept
//! as a fallback when a refresh fails.
//!
//! ```ignore
//! let lookup = Memoized::builder(fetch_user)
//!     .max_age(Duration::from_secs(60))
//!     .stale_while_revalidate(Duration::from_secs(300))
//!     .build();
//!
//! let user = lookup.call(42).await?;
//! ```

pub mod cache;
pub mod config;
pub mod error;
pub mod memo;
pub mod tasks;

pub use cache::{CacheEntry, CacheStore, MemoStats, MemoryStore};
pub use config::MemoConfig;
pub use error::MemoError;
pub use memo::{clear, CacheClear, ClearHandle, FirstArg, Identity, KeyDeriver, Memoized, Operation};
