//! Background Tasks Module
//!
//! Contains the tasks memoized operations spawn besides the operation itself.
//!
//! # Tasks
//! - Eviction timer: removes an entry once all of its windows have closed

mod eviction;

pub use eviction::spawn_eviction_timer;
