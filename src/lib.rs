//! lrukit: a capacity-bounded LRU cache with optional time-to-live,
//! shared hit/miss statistics and dual-order iteration.
//!
//! ## Quick Start
//!
//! ```
//! use lrukit::prelude::*;
//!
//! let stats = Statistics::with_keys([1]).into_shared();
//! let mut cache: Cache<u64, String> = Cache::new(2);
//! cache.monitor_with(stats.clone());
//!
//! assert!(cache.insert(1, "one".to_string()).was_inserted());
//! cache.insert(2, "two".to_string());
//! cache.insert(3, "three".to_string());
//!
//! assert_eq!(cache.lookup(&1), Err(CacheError::KeyNotFound));
//! assert_eq!(cache.lookup(&3).map(String::as_str), Ok("three"));
//! assert_eq!(stats.misses_for(&1), Ok(1));
//! ```
//!
//! ## Modules
//!
//! | Module        | Contents                                              |
//! |---------------|-------------------------------------------------------|
//! | [`engine`]    | `Engine`, the `Cache` / `TimedCache` aliases           |
//! | [`iter`]      | Ordered and unordered cursors, handles, `Iter`         |
//! | [`statistics`]| Shared hit/miss counters with per-key monitoring       |
//! | [`callbacks`] | Hit, miss and access observers                         |
//! | [`builder`]   | `CacheBuilder`                                         |
//! | [`policy`]    | `Capacity` and `TimeToLive` entry policies             |
//! | [`clock`]     | `SystemClock` and `ManualClock`                        |
//! | [`ds`]        | Slot arena and intrusive recency list                  |

pub mod builder;
pub mod callbacks;
pub mod clock;
pub mod ds;
pub mod engine;
pub mod error;
pub mod iter;
mod last_accessed;
pub mod policy;
pub mod prelude;
pub mod statistics;
pub mod traits;

pub use engine::{Cache, Engine, RecencyMode, TimedCache, DEFAULT_CAPACITY};
pub use error::{CacheError, ConfigError, InvariantError, Result};
