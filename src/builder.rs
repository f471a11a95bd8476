//! Cache builder.
//!
//! Collects capacity, time-to-live, recency mode and statistics settings and
//! produces either a plain [`Cache`] or a [`TimedCache`].
//!
//! ## Example
//!
//! ```rust
//! use lrukit::builder::CacheBuilder;
//! use lrukit::RecencyMode;
//! use std::time::Duration;
//!
//! let mut cache = CacheBuilder::new(100)
//!     .recency_mode(RecencyMode::OnAccess)
//!     .statistics(true)
//!     .build::<u64, String>();
//! cache.insert(1, "hello".to_string());
//! assert_eq!(cache.lookup(&1), Ok(&"hello".to_string()));
//! assert_eq!(cache.hit_rate(), Ok(1.0));
//!
//! let timed = CacheBuilder::new(16)
//!     .time_to_live(Duration::from_secs(5))
//!     .try_build_timed::<u64, String>()
//!     .unwrap();
//! assert_eq!(timed.time_to_live(), Duration::from_secs(5));
//! ```

use std::hash::{BuildHasher, Hash};
use std::time::Duration;

use rustc_hash::FxBuildHasher;
use tracing::debug;

use crate::clock::SystemClock;
use crate::engine::{Cache, Engine, RecencyMode, TimedCache, DEFAULT_CAPACITY};
use crate::error::ConfigError;
use crate::policy::{Capacity, TimeToLive};
use crate::statistics::Statistics;
use crate::traits::{Clock, EntryPolicy};

/// Builder for creating cache instances.
#[derive(Debug, Clone)]
pub struct CacheBuilder {
    capacity: usize,
    ttl: Option<Duration>,
    mode: RecencyMode,
    statistics: bool,
}

impl CacheBuilder {
    /// Create a new cache builder with the specified capacity.
    pub fn new(capacity: usize) -> Self {
        Self {
            capacity,
            ttl: None,
            mode: RecencyMode::default(),
            statistics: false,
        }
    }

    /// Time-to-live for caches built with [`try_build_timed`](Self::try_build_timed).
    /// Ignored by [`build`](Self::build).
    pub fn time_to_live(mut self, ttl: Duration) -> Self {
        self.ttl = Some(ttl);
        self
    }

    pub fn recency_mode(mut self, mode: RecencyMode) -> Self {
        self.mode = mode;
        self
    }

    /// Attach a fresh statistics object to the built cache.
    pub fn statistics(mut self, enabled: bool) -> Self {
        self.statistics = enabled;
        self
    }

    /// Build a plain LRU cache.
    pub fn build<K, V>(self) -> Cache<K, V>
    where
        K: Hash + Eq + Clone,
    {
        self.build_with_hasher(FxBuildHasher)
    }

    /// Build a plain LRU cache using `hasher` for its index.
    pub fn build_with_hasher<K, V, S>(self, hasher: S) -> Cache<K, V, S>
    where
        K: Hash + Eq + Clone,
        S: BuildHasher,
    {
        self.finish(Capacity, hasher)
    }

    /// Build a time-to-live cache reading the system clock.
    ///
    /// Fails if no time-to-live was configured or it is zero.
    pub fn try_build_timed<K, V>(self) -> Result<TimedCache<K, V>, ConfigError>
    where
        K: Hash + Eq + Clone,
    {
        self.try_build_timed_with_clock(SystemClock)
    }

    /// Build a time-to-live cache reading time from `clock`.
    pub fn try_build_timed_with_clock<K, V, C>(
        self,
        clock: C,
    ) -> Result<TimedCache<K, V, C>, ConfigError>
    where
        K: Hash + Eq + Clone,
        C: Clock,
    {
        let ttl = self
            .ttl
            .ok_or_else(|| ConfigError::new("time-to-live cache requires a time-to-live"))?;
        if ttl.is_zero() {
            return Err(ConfigError::new("time-to-live must be greater than zero"));
        }
        Ok(self.finish(TimeToLive::with_clock(ttl, clock), FxBuildHasher))
    }

    fn finish<K, V, P, S>(self, policy: P, hasher: S) -> Engine<K, V, P, S>
    where
        K: Hash + Eq + Clone,
        P: EntryPolicy,
        S: BuildHasher,
    {
        debug!(
            capacity = self.capacity,
            ttl = ?self.ttl,
            mode = ?self.mode,
            statistics = self.statistics,
            "building cache"
        );
        let cache = Engine::with_policy_and_hasher(self.capacity, policy, hasher)
            .with_recency_mode(self.mode);
        if self.statistics {
            cache.with_statistics(Statistics::new().into_shared())
        } else {
            cache
        }
    }
}

impl Default for CacheBuilder {
    /// Builder for a cache of [`DEFAULT_CAPACITY`].
    fn default() -> Self {
        Self::new(DEFAULT_CAPACITY)
    }
}
