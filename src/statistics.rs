//! Hit/miss statistics shared between caches.
//!
//! A [`Statistics`] object counts every value-returning access of the caches
//! it is attached to, and keeps per-key counters for the keys it has been
//! asked to monitor. Caches hold it through [`SharedStatistics`], a plain
//! `Rc`, so any number of caches on the same thread can feed one object and
//! every handle sees the same numbers.
//!
//! ```text
//!   Cache A ──┐
//!             ├──► Rc<Statistics<K>> ── accesses, hits
//!   Cache B ──┘                        └─ monitored: K -> { hits, misses }
//! ```
//!
//! Counters are `Cell`s so recording works through `&self`. The type is
//! `!Sync`; share it between caches on one thread only.
//!
//! ## Example
//!
//! ```
//! use lrukit::statistics::Statistics;
//! use lrukit::Cache;
//!
//! let stats = Statistics::with_keys(["a"]).into_shared();
//! let mut cache: Cache<&str, i32> = Cache::new(8);
//! cache.monitor_with(stats.clone());
//!
//! cache.insert("a", 1);
//! assert_eq!(cache.lookup(&"a"), Ok(&1));
//! assert!(cache.lookup(&"b").is_err());
//!
//! assert_eq!(stats.total_accesses(), 2);
//! assert_eq!(stats.hits_for(&"a"), Ok(1));
//! assert_eq!(stats.hit_rate(), Ok(0.5));
//! ```

use std::cell::{Cell, RefCell};
use std::fmt;
use std::hash::Hash;
use std::rc::Rc;

use rustc_hash::FxHashMap;

use crate::error::{CacheError, Result};

/// Reference-counted statistics handle held by caches and callers alike.
pub type SharedStatistics<K> = Rc<Statistics<K>>;

/// Hit and miss counts recorded for one monitored key.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct KeyStatistics {
    pub hits: u64,
    pub misses: u64,
}

impl KeyStatistics {
    pub fn new(hits: u64, misses: u64) -> Self {
        Self { hits, misses }
    }

    pub fn accesses(&self) -> u64 {
        self.hits + self.misses
    }
}

/// Aggregate and per-key access counters.
pub struct Statistics<K> {
    accesses: Cell<u64>,
    hits: Cell<u64>,
    monitored: RefCell<FxHashMap<K, KeyStatistics>>,
}

impl<K> Statistics<K>
where
    K: Eq + Hash,
{
    /// Statistics that only track aggregate counters until keys are monitored.
    pub fn new() -> Self {
        Self {
            accesses: Cell::new(0),
            hits: Cell::new(0),
            monitored: RefCell::new(FxHashMap::default()),
        }
    }

    /// Statistics monitoring each key of `keys` from the start.
    pub fn with_keys<I>(keys: I) -> Self
    where
        I: IntoIterator<Item = K>,
    {
        let stats = Self::new();
        for key in keys {
            stats.monitor(key);
        }
        stats
    }

    /// Wraps `self` for sharing between caches.
    pub fn into_shared(self) -> SharedStatistics<K> {
        Rc::new(self)
    }

    /// Starts tracking `key`. Counters already recorded for it are kept.
    pub fn monitor(&self, key: K) {
        self.monitored.borrow_mut().entry(key).or_default();
    }

    /// Stops tracking `key` and drops its counters.
    pub fn unmonitor(&self, key: &K) -> bool {
        self.monitored.borrow_mut().remove(key).is_some()
    }

    pub fn unmonitor_all(&self) {
        self.monitored.borrow_mut().clear();
    }

    pub fn is_monitoring(&self, key: &K) -> bool {
        self.monitored.borrow().contains_key(key)
    }

    /// Whether any key is currently monitored.
    pub fn is_monitoring_keys(&self) -> bool {
        !self.monitored.borrow().is_empty()
    }

    pub fn number_of_monitored_keys(&self) -> usize {
        self.monitored.borrow().len()
    }

    pub fn total_accesses(&self) -> u64 {
        self.accesses.get()
    }

    pub fn total_hits(&self) -> u64 {
        self.hits.get()
    }

    pub fn total_misses(&self) -> u64 {
        self.accesses.get() - self.hits.get()
    }

    /// `hits / accesses`; [`CacheError::NoAccesses`] before the first access.
    pub fn hit_rate(&self) -> Result<f64> {
        self.rate(self.total_hits())
    }

    /// `misses / accesses`; [`CacheError::NoAccesses`] before the first access.
    pub fn miss_rate(&self) -> Result<f64> {
        self.rate(self.total_misses())
    }

    /// Counters of a monitored key.
    pub fn stats_for(&self, key: &K) -> Result<KeyStatistics> {
        self.monitored
            .borrow()
            .get(key)
            .copied()
            .ok_or(CacheError::UnmonitoredKey)
    }

    pub fn hits_for(&self, key: &K) -> Result<u64> {
        self.stats_for(key).map(|stats| stats.hits)
    }

    pub fn misses_for(&self, key: &K) -> Result<u64> {
        self.stats_for(key).map(|stats| stats.misses)
    }

    /// Zeroes every counter; the set of monitored keys is unchanged.
    pub fn reset(&self) {
        self.accesses.set(0);
        self.hits.set(0);
        for stats in self.monitored.borrow_mut().values_mut() {
            *stats = KeyStatistics::default();
        }
    }

    pub(crate) fn record_hit(&self, key: &K) {
        self.accesses.set(self.accesses.get() + 1);
        self.hits.set(self.hits.get() + 1);
        if let Some(stats) = self.monitored.borrow_mut().get_mut(key) {
            stats.hits += 1;
        }
    }

    pub(crate) fn record_miss(&self, key: &K) {
        self.accesses.set(self.accesses.get() + 1);
        if let Some(stats) = self.monitored.borrow_mut().get_mut(key) {
            stats.misses += 1;
        }
    }

    fn rate(&self, count: u64) -> Result<f64> {
        match self.total_accesses() {
            0 => Err(CacheError::NoAccesses),
            accesses => Ok(count as f64 / accesses as f64),
        }
    }
}

impl<K> Default for Statistics<K>
where
    K: Eq + Hash,
{
    fn default() -> Self {
        Self::new()
    }
}

impl<K> fmt::Debug for Statistics<K> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Statistics")
            .field("accesses", &self.accesses.get())
            .field("hits", &self.hits.get())
            .field("monitored_keys", &self.monitored.borrow().len())
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    mod construction {
        use super::*;

        #[test]
        fn constructs_from_key_list() {
            let stats = Statistics::with_keys([1, 2, 3]);
            for key in 1..=3 {
                assert!(stats.is_monitoring(&key));
            }
            assert_eq!(stats.number_of_monitored_keys(), 3);
        }

        #[test]
        fn constructs_from_iterator() {
            let keys = vec!["x".to_string(), "y".to_string()];
            let stats = Statistics::with_keys(keys.iter().cloned());
            assert!(stats.is_monitoring(&"x".to_string()));
            assert!(stats.is_monitoring(&"y".to_string()));
        }

        #[test]
        fn empty_preconditions() {
            let stats: Statistics<i32> = Statistics::new();
            assert!(!stats.is_monitoring_keys());
            assert_eq!(stats.number_of_monitored_keys(), 0);
            assert!(!stats.is_monitoring(&1));
            assert_eq!(stats.total_accesses(), 0);
            assert_eq!(stats.total_hits(), 0);
            assert_eq!(stats.total_misses(), 0);
        }
    }

    mod recording {
        use super::*;

        #[test]
        fn records_hits() {
            let stats = Statistics::with_keys([1, 2]);

            stats.record_hit(&1);
            assert_eq!(stats.hits_for(&1), Ok(1));
            assert_eq!(stats.total_accesses(), 1);
            assert_eq!(stats.total_hits(), 1);
            assert_eq!(stats.total_misses(), 0);
            assert_eq!(stats.hit_rate(), Ok(1.0));
            assert_eq!(stats.miss_rate(), Ok(0.0));

            stats.record_hit(&1);
            stats.record_hit(&2);
            assert_eq!(stats.hits_for(&1), Ok(2));
            assert_eq!(stats.hits_for(&2), Ok(1));
            assert_eq!(stats.total_accesses(), 3);
            assert_eq!(stats.total_hits(), 3);
        }

        #[test]
        fn records_misses() {
            let stats = Statistics::with_keys([1, 2]);

            stats.record_miss(&1);
            stats.record_miss(&1);
            stats.record_miss(&2);
            assert_eq!(stats.misses_for(&1), Ok(2));
            assert_eq!(stats.misses_for(&2), Ok(1));
            assert_eq!(stats.total_accesses(), 3);
            assert_eq!(stats.total_hits(), 0);
            assert_eq!(stats.total_misses(), 3);
            assert_eq!(stats.hit_rate(), Ok(0.0));
            assert_eq!(stats.miss_rate(), Ok(1.0));
        }

        #[test]
        fn unmonitored_keys_still_count_in_aggregate() {
            let stats = Statistics::with_keys([1]);
            stats.record_hit(&9);
            stats.record_miss(&9);
            assert_eq!(stats.total_accesses(), 2);
            assert_eq!(stats.total_hits(), 1);
            assert_eq!(stats.stats_for(&1), Ok(KeyStatistics::new(0, 0)));
        }

        #[test]
        fn rates_are_calculated_correctly() {
            let stats = Statistics::with_keys([1, 2, 3]);
            for _ in 0..20 {
                stats.record_hit(&1);
            }
            for _ in 0..80 {
                stats.record_miss(&1);
            }
            let hit_rate = stats.hit_rate().unwrap();
            let miss_rate = stats.miss_rate().unwrap();
            assert!((hit_rate - 0.2).abs() < f64::EPSILON);
            assert!((miss_rate - 0.8).abs() < f64::EPSILON);
            assert!((hit_rate + miss_rate - 1.0).abs() < f64::EPSILON);
        }

        #[test]
        fn rates_without_accesses_are_errors() {
            let stats: Statistics<u8> = Statistics::new();
            assert_eq!(stats.hit_rate(), Err(CacheError::NoAccesses));
            assert_eq!(stats.miss_rate(), Err(CacheError::NoAccesses));
        }

        #[test]
        fn reset_zeroes_counters_but_keeps_keys() {
            let stats = Statistics::with_keys([1]);
            stats.record_hit(&1);
            stats.record_miss(&1);
            stats.reset();
            assert_eq!(stats.total_accesses(), 0);
            assert_eq!(stats.stats_for(&1), Ok(KeyStatistics::default()));
            assert!(stats.is_monitoring(&1));
        }
    }

    mod monitoring {
        use super::*;

        #[test]
        fn can_dynamically_monitor_and_unmonitor_keys() {
            let stats = Statistics::new();
            assert_eq!(stats.number_of_monitored_keys(), 0);

            stats.monitor(1);
            assert_eq!(stats.number_of_monitored_keys(), 1);
            assert!(stats.is_monitoring(&1));
            assert!(!stats.is_monitoring(&2));

            stats.monitor(2);
            assert_eq!(stats.number_of_monitored_keys(), 2);

            assert!(stats.unmonitor(&1));
            assert!(!stats.unmonitor(&1));
            assert!(!stats.is_monitoring(&1));
            assert!(stats.is_monitoring(&2));

            stats.unmonitor_all();
            assert!(!stats.is_monitoring_keys());
        }

        #[test]
        fn monitoring_again_keeps_existing_counts() {
            let stats = Statistics::with_keys([1]);
            stats.record_hit(&1);
            stats.record_miss(&1);
            stats.monitor(1);
            assert_eq!(stats.stats_for(&1), Ok(KeyStatistics::new(1, 1)));
        }

        #[test]
        fn unmonitored_key_is_an_error_not_zero() {
            let stats = Statistics::with_keys([1, 2, 3]);
            assert_eq!(stats.stats_for(&4), Err(CacheError::UnmonitoredKey));
            assert_eq!(stats.hits_for(&5), Err(CacheError::UnmonitoredKey));
            assert_eq!(stats.misses_for(&6), Err(CacheError::UnmonitoredKey));
            assert_eq!(stats.hits_for(&1), Ok(0));
        }
    }

    #[test]
    fn shared_handles_see_the_same_counters() {
        let stats = Statistics::with_keys([1, 2, 3]).into_shared();
        let first = Rc::clone(&stats);
        let second = Rc::clone(&stats);

        first.record_hit(&1);
        second.record_hit(&1);
        stats.record_miss(&2);

        assert_eq!(stats.total_accesses(), 3);
        assert_eq!(stats.total_hits(), 2);
        assert_eq!(stats.total_misses(), 1);
        assert_eq!(first.hits_for(&1), Ok(2));
        assert_eq!(second.misses_for(&1), Ok(0));
        assert_eq!(stats.hits_for(&2), Ok(0));
        assert_eq!(stats.misses_for(&2), Ok(1));
    }

    #[test]
    fn debug_output_summarises_counters() {
        let stats = Statistics::with_keys(["k"]);
        stats.record_hit(&"k");
        let dbg = format!("{:?}", stats);
        assert!(dbg.contains("accesses: 1"));
        assert!(dbg.contains("monitored_keys: 1"));
    }
}
