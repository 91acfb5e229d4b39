//! Memo Module
//!
//! Wraps an async operation with the freshness engine.
//!
//! # Call Paths
//! - Fresh: serve the entry, the operation is not invoked
//! - Stale-while-revalidate: serve the entry, refresh it in the background
//! - Stale-if-error: refresh now, serve the entry if the refresh fails
//! - Cold: run the operation and install its in-flight result immediately

mod builder;
mod clear;
mod key;
mod memoized;
mod operation;

pub use builder::{DefaultStore, MemoizedBuilder};
pub use clear::{clear, CacheClear, ClearHandle};
pub use key::{FirstArg, Identity, KeyDeriver};
pub use memoized::{CallResult, Memoized};
pub use operation::Operation;
