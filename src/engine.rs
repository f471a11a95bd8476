//! # Capacity-Bounded LRU Engine
//!
//! One generic engine backs both public caches:
//!
//! - [`Cache<K, V>`](Cache): entries live until evicted or erased.
//! - [`TimedCache<K, V>`](TimedCache): entries additionally expire once their
//!   time-to-live has elapsed.
//!
//! The difference is an [`EntryPolicy`] type parameter; everything else
//! (index, recency queue, last-accessed slot, statistics, callbacks and
//! iterators) is shared.
//!
//! ## Architecture
//!
//! ```text
//!   ┌──────────────────────────────────────────────────────────────────────┐
//!   │                        Engine<K, V, P, S>                            │
//!   │                                                                      │
//!   │   index: HashMap<K, SlotId, S>                                       │
//!   │   ┌─────────┬────────┐                                               │
//!   │   │  key a  │  id_0  │──┐                                            │
//!   │   │  key b  │  id_1  │──┼──┐                                         │
//!   │   │  key c  │  id_2  │──┼──┼──┐                                      │
//!   │   └─────────┴────────┘  │  │  │                                      │
//!   │                         ▼  ▼  ▼                                      │
//!   │   order: IntrusiveList<Entry { key, value, stamp }>                  │
//!   │     front ─► [a] ◄──► [b] ◄──► [c] ◄── back                          │
//!   │              LRU                MRU                                  │
//!   │                                                                      │
//!   │   last_accessed: Cell<Option<SlotId>>   (memo, never owns)           │
//!   │   statistics:    Option<Rc<Statistics<K>>>                           │
//!   │   callbacks:     hit / miss / access observers                       │
//!   │   generation:    bumped by every structural mutation                 │
//!   │   id:            process-unique, stamped into every handle           │
//!   └──────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! Entries are stored in the recency queue's slot arena, so the `SlotId`
//! held by the index is both the entry's storage address and its position
//! in the queue. Erasing a key is one hash removal plus an O(1) unlink.
//!
//! ## Operations
//!
//! | Method                | Complexity | Recency effect                        |
//! |-----------------------|------------|---------------------------------------|
//! | `insert(k, v)`        | O(1)*      | new or replaced key moves to the back |
//! | `contains(&k)`        | O(1)       | none; refreshes the last-accessed slot |
//! | `lookup(&k)`          | O(1)       | none                                  |
//! | `lookup_mut(&k)`      | O(1)       | promotes only in `RecencyMode::OnAccess` |
//! | `erase(&k)`           | O(1)       | -                                     |
//! | `set_capacity(n)`     | O(n)       | evicts from the front, then repacks   |
//! | `clear()`             | O(n)       | -                                     |
//!
//! `*` amortized; may evict the front entry first.
//!
//! ## Recency Policy
//!
//! Only insertion (including replacement of an existing key) changes
//! eviction order by default. `lookup` never does. Callers that want
//! LRU-on-read can opt into [`RecencyMode::OnAccess`], which promotes on
//! `lookup_mut` and `get_or_insert_with`, or call [`Engine::touch`].
//!
//! Promotion re-stamps the entry. For a [`TimedCache`] that means a promoted
//! entry starts a fresh time-to-live, while plain `lookup` and `contains`
//! never extend it.
//!
//! ## Thread Safety
//!
//! The engine is single-threaded: the last-accessed slot and statistics use
//! `Cell`/`Rc`, so the type is neither `Send` nor `Sync`.
//!
//! ## Example Usage
//!
//! ```
//! use lrukit::Cache;
//!
//! let mut cache: Cache<&str, i32> = Cache::new(2);
//! cache.insert("a", 1);
//! cache.insert("b", 2);
//! cache.insert("c", 3);
//!
//! assert!(!cache.contains(&"a"));
//! assert_eq!(cache.lookup(&"b"), Ok(&2));
//! assert_eq!(cache.lookup(&"c"), Ok(&3));
//! ```

use std::collections::HashMap;
use std::fmt;
use std::hash::{BuildHasher, Hash};
use std::sync::atomic::{AtomicU64, Ordering};
use std::time::Duration;

use rustc_hash::FxBuildHasher;
use tracing::{debug, trace};

use crate::callbacks::Callbacks;
use crate::clock::SystemClock;
use crate::ds::intrusive_list::IntrusiveList;
use crate::ds::slot_arena::SlotId;
use crate::error::{CacheError, InvariantError, Result};
use crate::iter::{Handle, InsertionResult, Iter, OrderedIter, UnorderedIter};
use crate::last_accessed::LastAccessed;
use crate::policy::{Capacity, TimeToLive};
use crate::statistics::{KeyStatistics, SharedStatistics};
use crate::traits::{Clock, EntryPolicy};

/// Capacity used when none is given.
pub const DEFAULT_CAPACITY: usize = 128;

/// Source of per-engine identities stamped into handles.
static NEXT_ENGINE_ID: AtomicU64 = AtomicU64::new(0);

/// Plain LRU cache.
pub type Cache<K, V, S = FxBuildHasher> = Engine<K, V, Capacity, S>;

/// LRU cache whose entries also expire after a fixed duration.
///
/// The clock restarts whenever an entry is promoted: `insert` of an existing
/// key, [`Engine::touch`], and the promoting lookups of
/// [`RecencyMode::OnAccess`] all give the entry a fresh time-to-live.
pub type TimedCache<K, V, C = SystemClock, S = FxBuildHasher> = Engine<K, V, TimeToLive<C>, S>;

/// When a key moves to the most-recently-used end of the queue.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum RecencyMode {
    /// Only `insert` (and `touch`) promote. Lookups leave the order alone.
    #[default]
    OnInsert,
    /// `lookup_mut` and `get_or_insert_with` promote as well.
    ///
    /// Promotion re-stamps the entry, so in a [`TimedCache`] these lookups
    /// also restart its time-to-live.
    OnAccess,
}

/// Value plus bookkeeping stored for one live key.
#[derive(Debug)]
pub(crate) struct Entry<K, V, T> {
    pub(crate) key: K,
    pub(crate) value: V,
    pub(crate) stamp: T,
}

/// Generic LRU engine; use the [`Cache`] or [`TimedCache`] aliases.
pub struct Engine<K, V, P = Capacity, S = FxBuildHasher>
where
    P: EntryPolicy,
{
    index: HashMap<K, SlotId, S>,
    pub(crate) order: IntrusiveList<Entry<K, V, P::Stamp>>,
    last_accessed: LastAccessed,
    capacity: usize,
    policy: P,
    mode: RecencyMode,
    statistics: Option<SharedStatistics<K>>,
    callbacks: Callbacks<K, V>,
    id: u64,
    pub(crate) generation: u64,
}

// ---------------------------------------------------------------------------
// Construction
// ---------------------------------------------------------------------------

impl<K, V> Engine<K, V, Capacity, FxBuildHasher>
where
    K: Hash + Eq + Clone,
{
    /// Creates an LRU cache holding at most `capacity` entries.
    ///
    /// A capacity of 0 creates a cache that accepts no items.
    ///
    /// # Example
    /// ```
    /// use lrukit::Cache;
    ///
    /// let cache: Cache<u32, String> = Cache::new(100);
    /// assert_eq!(cache.capacity(), 100);
    /// ```
    pub fn new(capacity: usize) -> Self {
        Self::with_hasher(capacity, FxBuildHasher)
    }

    /// Creates a cache of `capacity` and inserts `pairs` in order, so only
    /// the last `capacity` distinct keys remain.
    pub fn from_pairs<I>(capacity: usize, pairs: I) -> Self
    where
        I: IntoIterator<Item = (K, V)>,
    {
        let mut cache = Self::new(capacity);
        cache.extend(pairs);
        cache
    }
}

impl<K, V, S> Engine<K, V, Capacity, S>
where
    K: Hash + Eq + Clone,
    S: BuildHasher,
{
    /// Creates an LRU cache using `hasher` for the index.
    pub fn with_hasher(capacity: usize, hasher: S) -> Self {
        Self::with_policy_and_hasher(capacity, Capacity, hasher)
    }
}

impl<K, V> Engine<K, V, TimeToLive<SystemClock>, FxBuildHasher>
where
    K: Hash + Eq + Clone,
{
    /// Creates a time-to-live cache with [`DEFAULT_CAPACITY`].
    ///
    /// # Example
    /// ```
    /// use lrukit::TimedCache;
    /// use std::time::Duration;
    ///
    /// let mut cache: TimedCache<&str, i32> = TimedCache::new(Duration::from_secs(60));
    /// cache.insert("session", 7);
    /// assert!(cache.contains(&"session"));
    /// ```
    pub fn new(ttl: Duration) -> Self {
        Self::with_capacity(ttl, DEFAULT_CAPACITY)
    }

    pub fn with_capacity(ttl: Duration, capacity: usize) -> Self {
        Self::with_clock(ttl, capacity, SystemClock)
    }
}

impl<K, V, C> Engine<K, V, TimeToLive<C>, FxBuildHasher>
where
    K: Hash + Eq + Clone,
    C: Clock,
{
    /// Creates a time-to-live cache reading time from `clock`.
    pub fn with_clock(ttl: Duration, capacity: usize, clock: C) -> Self {
        Self::with_policy_and_hasher(capacity, TimeToLive::with_clock(ttl, clock), FxBuildHasher)
    }
}

impl<K, V, P, S> Engine<K, V, P, S>
where
    K: Hash + Eq + Clone,
    P: EntryPolicy,
    S: BuildHasher,
{
    /// Creates an engine from its parts.
    ///
    /// Storage is reserved for at most [`DEFAULT_CAPACITY`] entries up front
    /// and grows on demand, so a huge `capacity` costs nothing until used.
    pub fn with_policy_and_hasher(capacity: usize, policy: P, hasher: S) -> Self {
        let reserve = capacity.min(DEFAULT_CAPACITY);
        Self {
            index: HashMap::with_capacity_and_hasher(reserve, hasher),
            order: IntrusiveList::with_capacity(reserve),
            last_accessed: LastAccessed::new(),
            capacity,
            policy,
            mode: RecencyMode::default(),
            statistics: None,
            callbacks: Callbacks::new(),
            id: NEXT_ENGINE_ID.fetch_add(1, Ordering::Relaxed),
            generation: 0,
        }
    }

    /// Sets when keys are promoted to most-recently-used.
    pub fn with_recency_mode(mut self, mode: RecencyMode) -> Self {
        self.mode = mode;
        self
    }

    /// Attaches shared statistics at construction.
    pub fn with_statistics(mut self, statistics: SharedStatistics<K>) -> Self {
        self.monitor_with(statistics);
        self
    }

    // -----------------------------------------------------------------------
    // Size and capacity
    // -----------------------------------------------------------------------

    /// Number of stored entries, expired ones included until they are purged.
    #[inline]
    pub fn len(&self) -> usize {
        self.index.len()
    }

    /// Alias of [`len`](Self::len).
    #[inline]
    pub fn size(&self) -> usize {
        self.len()
    }

    #[inline]
    pub fn capacity(&self) -> usize {
        self.capacity
    }

    #[inline]
    pub fn space_left(&self) -> usize {
        self.capacity.saturating_sub(self.len())
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    #[inline]
    pub fn is_full(&self) -> bool {
        self.len() >= self.capacity
    }

    /// Changes the capacity, evicting from the front until the cache fits.
    ///
    /// A shrink that evicts also repacks the surviving entries, so storage
    /// order walks only live slots afterwards.
    pub fn set_capacity(&mut self, new_capacity: usize) {
        let mut evicted = 0usize;
        while self.len() > new_capacity {
            if self.evict_front().is_none() {
                break;
            }
            evicted += 1;
        }
        self.capacity = new_capacity;

        if evicted > 0 {
            debug!(evicted, capacity = new_capacity, "shrank cache capacity");
            self.compact();
            self.bump();
        }
        debug_assert_eq!(self.index.len(), self.order.len());
    }

    pub fn recency_mode(&self) -> RecencyMode {
        self.mode
    }

    pub fn policy(&self) -> &P {
        &self.policy
    }

    // -----------------------------------------------------------------------
    // Access
    // -----------------------------------------------------------------------

    /// Returns `true` if `key` is stored and still live.
    ///
    /// Does not touch the recency order and records no statistics. A hit is
    /// remembered so that an immediately following `lookup` of the same key
    /// skips the hash lookup.
    #[inline]
    pub fn contains(&self, key: &K) -> bool {
        self.resolve(key).is_some()
    }

    /// Returns the value stored for `key`.
    ///
    /// Fails with [`CacheError::KeyNotFound`] if the key is absent or expired.
    /// The recency order is left unchanged.
    ///
    /// # Example
    /// ```
    /// use lrukit::{Cache, CacheError};
    ///
    /// let mut cache: Cache<u32, &str> = Cache::new(4);
    /// cache.insert(1, "one");
    ///
    /// if cache.contains(&1) {
    ///     assert_eq!(cache.lookup(&1), Ok(&"one"));
    /// }
    /// assert_eq!(cache.lookup(&2), Err(CacheError::KeyNotFound));
    /// ```
    pub fn lookup(&self, key: &K) -> Result<&V> {
        match self.resolve(key).and_then(|id| self.order.get(id)) {
            Some(entry) => {
                self.record_hit(key, &entry.value);
                Ok(&entry.value)
            },
            None => {
                self.record_miss(key);
                Err(CacheError::KeyNotFound)
            },
        }
    }

    /// Mutable variant of [`lookup`](Self::lookup).
    ///
    /// Promotes the key when the cache runs in [`RecencyMode::OnAccess`].
    pub fn lookup_mut(&mut self, key: &K) -> Result<&mut V> {
        let Some(id) = self.resolve(key) else {
            self.record_miss(key);
            return Err(CacheError::KeyNotFound);
        };
        if self.mode == RecencyMode::OnAccess {
            self.promote(id);
        }
        if let Some(entry) = self.order.get(id) {
            self.record_hit(key, &entry.value);
        }
        self.order
            .get_mut(id)
            .map(|entry| &mut entry.value)
            .ok_or(CacheError::KeyNotFound)
    }

    /// Returns the cached value for `key`, computing and inserting it on a miss.
    ///
    /// This is the memoization path: a hit or miss is recorded exactly once
    /// per call. With a capacity of 0 the value is computed every time.
    ///
    /// # Example
    /// ```
    /// use lrukit::Cache;
    ///
    /// let mut squares: Cache<u64, u64> = Cache::new(16);
    /// assert_eq!(squares.get_or_insert_with(12, |n| n * n), 144);
    /// assert_eq!(squares.get_or_insert_with(12, |_| unreachable!()), 144);
    /// ```
    pub fn get_or_insert_with<F>(&mut self, key: K, make: F) -> V
    where
        F: FnOnce(&K) -> V,
        V: Clone,
    {
        if let Some(id) = self.resolve(&key) {
            if self.mode == RecencyMode::OnAccess {
                self.promote(id);
            }
            if let Some(entry) = self.order.get(id) {
                self.record_hit(&key, &entry.value);
                return entry.value.clone();
            }
        }

        self.record_miss(&key);
        let value = make(&key);
        self.insert(key, value.clone());
        value
    }

    /// Marks a live key as most recently used without reading it.
    ///
    /// In a [`TimedCache`] this also restarts the entry's time-to-live.
    pub fn touch(&mut self, key: &K) -> bool {
        match self.resolve(key) {
            Some(id) => {
                self.promote(id);
                true
            },
            None => false,
        }
    }

    /// Least recently used entry.
    pub fn front(&self) -> Result<(&K, &V)> {
        self.order
            .front()
            .map(|entry| (&entry.key, &entry.value))
            .ok_or(CacheError::EmptyCache { requested: "front" })
    }

    /// Most recently used entry.
    pub fn back(&self) -> Result<(&K, &V)> {
        self.order
            .back()
            .map(|entry| (&entry.key, &entry.value))
            .ok_or(CacheError::EmptyCache { requested: "back" })
    }

    // -----------------------------------------------------------------------
    // Mutation
    // -----------------------------------------------------------------------

    /// Inserts or replaces `key`.
    ///
    /// A present key gets the new value in place and moves to the back of the
    /// recency queue (`was_inserted() == false`). An absent key evicts the
    /// front entry first if the cache is full. With a capacity of 0 nothing is
    /// stored and the returned handle is past-the-end.
    ///
    /// The returned handle stays valid until the next mutation.
    pub fn insert(&mut self, key: K, value: V) -> InsertionResult {
        if let Some(&id) = self.index.get(&key) {
            if let Some(entry) = self.order.get_mut(id) {
                entry.value = value;
            }
            self.promote(id);
            self.last_accessed.set(id);
            return InsertionResult::new(false, self.handle(Some(id)));
        }

        if self.capacity == 0 {
            return InsertionResult::new(false, self.handle(None));
        }

        if self.len() >= self.capacity {
            self.evict_front();
        }

        let stamp = self.policy.stamp();
        let id = self.order.push_back(Entry {
            key: key.clone(),
            value,
            stamp,
        });
        self.index.insert(key, id);
        self.last_accessed.set(id);
        self.bump();

        debug_assert_eq!(self.index.len(), self.order.len());
        InsertionResult::new(true, self.handle(Some(id)))
    }

    /// Inserts every pair in order; returns how many keys were new.
    pub fn insert_all<I>(&mut self, pairs: I) -> usize
    where
        I: IntoIterator<Item = (K, V)>,
    {
        pairs
            .into_iter()
            .map(|(key, value)| self.insert(key, value))
            .filter(InsertionResult::was_inserted)
            .count()
    }

    /// Removes `key`; returns whether anything was removed.
    pub fn erase(&mut self, key: &K) -> bool {
        let Some(id) = self.index.remove(key) else {
            return false;
        };
        self.last_accessed.invalidate_if(id);
        self.order.remove(id);
        self.bump();

        debug_assert_eq!(self.index.len(), self.order.len());
        true
    }

    /// Removes the entry a handle points at and returns it.
    ///
    /// Fails with [`CacheError::InvalidIterator`] for a past-the-end handle
    /// and [`CacheError::StaleHandle`] after an intervening mutation. A handle
    /// from another cache fails with [`CacheError::ForeignHandle`].
    pub fn erase_at(&mut self, handle: Handle) -> Result<(K, V)> {
        let id = self.validate(handle)?.ok_or(CacheError::InvalidIterator)?;
        let entry = self.order.remove(id).ok_or(CacheError::InvalidIterator)?;
        self.index.remove(&entry.key);
        self.last_accessed.invalidate_if(id);
        self.bump();
        Ok((entry.key, entry.value))
    }

    /// Removes and returns the least recently used entry.
    pub fn pop_front(&mut self) -> Option<(K, V)> {
        let evicted = self.evict_front()?;
        self.bump();
        Some(evicted)
    }

    /// Removes every entry.
    pub fn clear(&mut self) {
        self.index.clear();
        self.order.clear();
        self.last_accessed.invalidate();
        self.bump();
    }

    // -----------------------------------------------------------------------
    // Iteration
    // -----------------------------------------------------------------------

    /// Ordered iterator at the least recently used entry.
    pub fn ordered_begin(&self) -> OrderedIter<'_, K, V, P, S> {
        OrderedIter::new(self, self.order.front_id())
    }

    pub fn ordered_end(&self) -> OrderedIter<'_, K, V, P, S> {
        OrderedIter::new(self, None)
    }

    /// Unordered iterator at the first entry in storage order.
    pub fn unordered_begin(&self) -> UnorderedIter<'_, K, V, P, S> {
        UnorderedIter::new(self, self.order.first_in_storage())
    }

    pub fn unordered_end(&self) -> UnorderedIter<'_, K, V, P, S> {
        UnorderedIter::new(self, None)
    }

    /// Unordered iterator at `key`, or the end iterator if it is absent or expired.
    pub fn find(&self, key: &K) -> UnorderedIter<'_, K, V, P, S> {
        UnorderedIter::new(self, self.resolve(key))
    }

    /// Reopens a handle as an ordered iterator.
    pub fn ordered_at(&self, handle: Handle) -> Result<OrderedIter<'_, K, V, P, S>> {
        Ok(OrderedIter::new(self, self.validate(handle)?))
    }

    /// Reopens a handle as an unordered iterator.
    pub fn unordered_at(&self, handle: Handle) -> Result<UnorderedIter<'_, K, V, P, S>> {
        Ok(UnorderedIter::new(self, self.validate(handle)?))
    }

    /// Entries from least to most recently used.
    pub fn iter(&self) -> Iter<'_, K, V, P, S> {
        Iter::new(self)
    }

    pub fn keys(&self) -> impl DoubleEndedIterator<Item = &K> + '_ {
        self.iter().map(|(key, _)| key)
    }

    pub fn values(&self) -> impl DoubleEndedIterator<Item = &V> + '_ {
        self.iter().map(|(_, value)| value)
    }

    // -----------------------------------------------------------------------
    // Statistics and callbacks
    // -----------------------------------------------------------------------

    /// Starts feeding `statistics` from this cache's accesses.
    pub fn monitor_with(&mut self, statistics: SharedStatistics<K>) {
        debug!("attached statistics to cache");
        self.statistics = Some(statistics);
    }

    /// Detaches the statistics object, returning it.
    pub fn stop_monitoring(&mut self) -> Option<SharedStatistics<K>> {
        let detached = self.statistics.take();
        if detached.is_some() {
            debug!("detached statistics from cache");
        }
        detached
    }

    pub fn is_monitoring(&self) -> bool {
        self.statistics.is_some()
    }

    /// Attached statistics; [`CacheError::NotMonitoring`] if there are none.
    pub fn statistics(&self) -> Result<&SharedStatistics<K>> {
        self.statistics.as_ref().ok_or(CacheError::NotMonitoring)
    }

    pub fn stats_for(&self, key: &K) -> Result<KeyStatistics> {
        self.statistics()?.stats_for(key)
    }

    pub fn hits_for(&self, key: &K) -> Result<u64> {
        self.statistics()?.hits_for(key)
    }

    pub fn misses_for(&self, key: &K) -> Result<u64> {
        self.statistics()?.misses_for(key)
    }

    pub fn hit_rate(&self) -> Result<f64> {
        self.statistics()?.hit_rate()
    }

    pub fn miss_rate(&self) -> Result<f64> {
        self.statistics()?.miss_rate()
    }

    pub fn on_hit(&mut self, callback: impl Fn(&K, &V) + 'static) {
        self.callbacks.on_hit(callback);
    }

    pub fn on_miss(&mut self, callback: impl Fn(&K) + 'static) {
        self.callbacks.on_miss(callback);
    }

    pub fn on_access(&mut self, callback: impl Fn(&K, bool) + 'static) {
        self.callbacks.on_access(callback);
    }

    pub fn callbacks(&self) -> &Callbacks<K, V> {
        &self.callbacks
    }

    pub fn clear_callbacks(&mut self) {
        self.callbacks.clear();
    }

    // -----------------------------------------------------------------------
    // Invariants
    // -----------------------------------------------------------------------

    /// Verifies that index, recency queue and last-accessed slot agree.
    pub fn check_invariants(&self) -> std::result::Result<(), InvariantError> {
        if self.index.len() != self.order.len() {
            return Err(InvariantError::new(format!(
                "index holds {} keys but recency queue holds {}",
                self.index.len(),
                self.order.len()
            )));
        }
        if self.len() > self.capacity {
            return Err(InvariantError::new(format!(
                "len {} exceeds capacity {}",
                self.len(),
                self.capacity
            )));
        }

        let mut count = 0usize;
        let mut prev: Option<SlotId> = None;
        for (id, entry) in self.order.iter_entries() {
            count += 1;
            match self.index.get(&entry.key) {
                Some(&indexed) if indexed == id => {},
                other => {
                    return Err(InvariantError::new(format!(
                        "queue node {:?} is indexed as {:?}",
                        id, other
                    )));
                },
            }
            if self.order.prev_id(id) != prev {
                return Err(InvariantError::new(format!(
                    "queue node {:?} has a broken back link",
                    id
                )));
            }
            if count > self.index.len() {
                return Err(InvariantError::new("cycle detected in recency queue"));
            }
            prev = Some(id);
        }
        if count != self.index.len() {
            return Err(InvariantError::new(format!(
                "walked {} queue nodes, expected {}",
                count,
                self.index.len()
            )));
        }

        if let Some(id) = self.last_accessed.get() {
            if !self.order.contains(id) {
                return Err(InvariantError::new(format!(
                    "last accessed slot {:?} is not live",
                    id
                )));
            }
        }
        Ok(())
    }

    // -----------------------------------------------------------------------
    // Internals
    // -----------------------------------------------------------------------

    /// Slot of `key` regardless of liveness, via the last-accessed slot first.
    #[inline]
    fn slot_of(&self, key: &K) -> Option<SlotId> {
        self.last_accessed
            .probe(key, |id| self.order.get(id).map(|entry| &entry.key))
            .or_else(|| self.index.get(key).copied())
    }

    /// Slot of `key` if it is stored and live; remembers it on success.
    fn resolve(&self, key: &K) -> Option<SlotId> {
        let id = self.slot_of(key)?;
        let entry = self.order.get(id)?;
        if self.policy.is_live(&entry.stamp) {
            self.last_accessed.set(id);
            Some(id)
        } else {
            self.last_accessed.invalidate_if(id);
            trace!("entry found but no longer live");
            None
        }
    }

    pub(crate) fn entry_is_live(&self, id: SlotId) -> bool {
        self.order
            .get(id)
            .is_some_and(|entry| self.policy.is_live(&entry.stamp))
    }

    /// Moves `id` to the back and re-stamps it.
    fn promote(&mut self, id: SlotId) {
        let stamp = self.policy.stamp();
        if let Some(entry) = self.order.get_mut(id) {
            entry.stamp = stamp;
        }
        self.order.move_to_back(id);
        self.bump();
    }

    /// Repacks the recency queue into dense storage and repoints the index.
    /// Callers bump the generation.
    fn compact(&mut self) {
        let index = &mut self.index;
        self.order.compact(|entry, id| {
            if let Some(slot) = index.get_mut(&entry.key) {
                *slot = id;
            }
        });
        self.index.shrink_to(self.order.len());
        self.last_accessed.invalidate();
        trace!(slots = self.order.slot_count(), "compacted cache storage");
    }

    /// Drops the front entry. Callers bump the generation.
    fn evict_front(&mut self) -> Option<(K, V)> {
        let (id, entry) = self.order.pop_front()?;
        self.index.remove(&entry.key);
        self.last_accessed.invalidate_if(id);
        trace!(
            len = self.order.len(),
            capacity = self.capacity,
            "evicted least recently used entry"
        );
        Some((entry.key, entry.value))
    }

    fn record_hit(&self, key: &K, value: &V) {
        if let Some(statistics) = &self.statistics {
            statistics.record_hit(key);
        }
        self.callbacks.hit(key, value);
    }

    fn record_miss(&self, key: &K) {
        if let Some(statistics) = &self.statistics {
            statistics.record_miss(key);
        }
        self.callbacks.miss(key);
    }

    #[inline]
    fn bump(&mut self) {
        self.generation = self.generation.wrapping_add(1);
    }

    fn validate(&self, handle: Handle) -> Result<Option<SlotId>> {
        if handle.owner != self.id {
            return Err(CacheError::ForeignHandle);
        }
        if handle.generation != self.generation {
            return Err(CacheError::StaleHandle);
        }
        Ok(handle.slot)
    }
}

impl<K, V, P, S> Engine<K, V, P, S>
where
    P: EntryPolicy,
{
    /// Handle to `slot`, tagged with this engine's identity and generation.
    #[inline]
    pub(crate) fn handle(&self, slot: Option<SlotId>) -> Handle {
        Handle::new(self.id, slot, self.generation)
    }
}

// ---------------------------------------------------------------------------
// Time-to-live operations
// ---------------------------------------------------------------------------

impl<K, V, C, S> Engine<K, V, TimeToLive<C>, S>
where
    K: Hash + Eq + Clone,
    C: Clock,
    S: BuildHasher,
{
    /// The configured time-to-live.
    pub fn time_to_live(&self) -> Duration {
        self.policy.ttl()
    }

    /// Whether a stored key has expired; [`CacheError::KeyNotFound`] if absent.
    pub fn is_expired(&self, key: &K) -> Result<bool> {
        let id = self.slot_of(key).ok_or(CacheError::KeyNotFound)?;
        Ok(!self.entry_is_live(id))
    }

    /// Time left before `key` expires; [`CacheError::KeyNotFound`] if absent.
    pub fn remaining_ttl(&self, key: &K) -> Result<Duration> {
        let id = self.slot_of(key).ok_or(CacheError::KeyNotFound)?;
        let entry = self.order.get(id).ok_or(CacheError::KeyNotFound)?;
        Ok(self.policy.remaining(&entry.stamp))
    }

    /// Removes expired entries from the front; returns how many were removed.
    ///
    /// Entries are stamped in queue order, so the sweep stops at the first
    /// live entry.
    pub fn purge_expired(&mut self) -> usize {
        let mut purged = 0usize;
        while let Some(front) = self.order.front_id() {
            if self.entry_is_live(front) {
                break;
            }
            if self.evict_front().is_none() {
                break;
            }
            purged += 1;
        }

        if purged > 0 {
            debug!(purged, remaining = self.len(), "purged expired entries");
            self.bump();
        }
        debug_assert_eq!(self.index.len(), self.order.len());
        purged
    }

    /// Whether the most recently inserted entry has expired, i.e. nothing in
    /// the cache is live. An empty cache counts as all expired.
    pub fn all_expired(&self) -> bool {
        match self.order.back_id() {
            Some(id) => !self.entry_is_live(id),
            None => true,
        }
    }
}

// ---------------------------------------------------------------------------
// Trait impls
// ---------------------------------------------------------------------------

impl<K, V, S> Default for Engine<K, V, Capacity, S>
where
    K: Hash + Eq + Clone,
    S: BuildHasher + Default,
{
    /// Creates an LRU cache with [`DEFAULT_CAPACITY`].
    fn default() -> Self {
        Self::with_hasher(DEFAULT_CAPACITY, S::default())
    }
}

impl<K, V, P, S> Extend<(K, V)> for Engine<K, V, P, S>
where
    K: Hash + Eq + Clone,
    P: EntryPolicy,
    S: BuildHasher,
{
    fn extend<T: IntoIterator<Item = (K, V)>>(&mut self, iter: T) {
        for (key, value) in iter {
            self.insert(key, value);
        }
    }
}

impl<K, V, S> FromIterator<(K, V)> for Engine<K, V, Capacity, S>
where
    K: Hash + Eq + Clone,
    S: BuildHasher + Default,
{
    /// Collects into a cache large enough for every pair (at least
    /// [`DEFAULT_CAPACITY`]).
    fn from_iter<T: IntoIterator<Item = (K, V)>>(iter: T) -> Self {
        let pairs: Vec<(K, V)> = iter.into_iter().collect();
        let mut cache = Self::with_hasher(pairs.len().max(DEFAULT_CAPACITY), S::default());
        cache.extend(pairs);
        cache
    }
}

impl<'a, K, V, P, S> IntoIterator for &'a Engine<K, V, P, S>
where
    K: Hash + Eq + Clone,
    P: EntryPolicy,
    S: BuildHasher,
{
    type Item = (&'a K, &'a V);
    type IntoIter = Iter<'a, K, V, P, S>;

    fn into_iter(self) -> Self::IntoIter {
        self.iter()
    }
}

impl<K, V, P, S> fmt::Debug for Engine<K, V, P, S>
where
    P: EntryPolicy + fmt::Debug,
{
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Engine")
            .field("len", &self.index.len())
            .field("capacity", &self.capacity)
            .field("policy", &self.policy)
            .field("recency_mode", &self.mode)
            .field("monitoring", &self.statistics.is_some())
            .finish_non_exhaustive()
    }
}
