//! Cursors and iterators over a cache.
//!
//! Two cursor kinds walk the same entries in different orders:
//!
//! ```text
//!   OrderedIter    front ──► ... ──► back ──► end     (LRU to MRU)
//!   UnorderedIter  slot 0 ──► slot 1 ──► ... ──► end  (storage order)
//! ```
//!
//! Both borrow the cache, so no mutation can happen while either is alive.
//! Positions that must survive a mutation are carried as a [`Handle`]
//! instead, which the cache checks against its generation counter before
//! reopening.
//!
//! ## Equality
//!
//! Two cursors (of either kind) are equal when they belong to the same cache
//! and sit on the same entry, or when both are past-the-end. An ordered end
//! therefore equals an unordered end, while an end never equals a cursor on
//! an entry.
//!
//! ## Example
//!
//! ```
//! use lrukit::Cache;
//!
//! let mut cache: Cache<&str, i32> = Cache::new(4);
//! cache.insert("a", 1);
//! cache.insert("b", 2);
//!
//! let found = cache.find(&"b");
//! let ordered = found.to_ordered().unwrap();
//! assert_eq!(ordered, found);
//! assert_eq!(ordered.value(), Ok(&2));
//! assert!(cache.ordered_end() == cache.unordered_end());
//!
//! let keys: Vec<_> = cache.ordered_begin().map(|(k, _)| *k).collect();
//! assert_eq!(keys, ["a", "b"]);
//! ```

use std::fmt;
use std::hash::{BuildHasher, Hash};
use std::iter::FusedIterator;
use std::ptr;

use crate::ds::slot_arena::SlotId;
use crate::engine::Engine;
use crate::error::{CacheError, Result};
use crate::traits::EntryPolicy;

// ---------------------------------------------------------------------------
// Handle
// ---------------------------------------------------------------------------

/// Detached position of an entry, valid until the cache's next mutation.
///
/// Reopen it with [`Engine::ordered_at`] or [`Engine::unordered_at`], or
/// consume it with [`Engine::erase_at`]. Only the cache that minted a handle
/// accepts it; any other cache answers [`CacheError::ForeignHandle`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Handle {
    pub(crate) owner: u64,
    pub(crate) slot: Option<SlotId>,
    pub(crate) generation: u64,
}

impl Handle {
    pub(crate) fn new(owner: u64, slot: Option<SlotId>, generation: u64) -> Self {
        Self {
            owner,
            slot,
            generation,
        }
    }

    /// Whether this is a past-the-end position.
    pub fn is_end(&self) -> bool {
        self.slot.is_none()
    }
}

/// Outcome of [`Engine::insert`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct InsertionResult {
    inserted: bool,
    handle: Handle,
}

impl InsertionResult {
    pub(crate) fn new(inserted: bool, handle: Handle) -> Self {
        Self { inserted, handle }
    }

    /// `true` if the key was new, `false` if an existing entry was updated
    /// (or the cache has zero capacity).
    pub fn was_inserted(&self) -> bool {
        self.inserted
    }

    /// Position of the written entry.
    pub fn handle(&self) -> Handle {
        self.handle
    }
}

// ---------------------------------------------------------------------------
// Shared cursor plumbing
// ---------------------------------------------------------------------------

fn entry_at<K, V, P, S>(
    cache: &Engine<K, V, P, S>,
    position: Option<SlotId>,
) -> Result<(&K, &V)>
where
    P: EntryPolicy,
{
    position
        .and_then(|id| cache.order.get(id))
        .map(|entry| (&entry.key, &entry.value))
        .ok_or(CacheError::InvalidIterator)
}

fn same_position<K, V, P, S>(
    a: (&Engine<K, V, P, S>, Option<SlotId>),
    b: (&Engine<K, V, P, S>, Option<SlotId>),
) -> bool
where
    P: EntryPolicy,
{
    match (a.1, b.1) {
        (None, None) => true,
        (Some(x), Some(y)) => x == y && ptr::eq(a.0, b.0),
        _ => false,
    }
}

// ---------------------------------------------------------------------------
// OrderedIter
// ---------------------------------------------------------------------------

/// Cursor walking entries from least to most recently used.
pub struct OrderedIter<'a, K, V, P, S>
where
    P: EntryPolicy,
{
    cache: &'a Engine<K, V, P, S>,
    position: Option<SlotId>,
}

impl<'a, K, V, P, S> OrderedIter<'a, K, V, P, S>
where
    P: EntryPolicy,
{
    pub(crate) fn new(cache: &'a Engine<K, V, P, S>, position: Option<SlotId>) -> Self {
        Self { cache, position }
    }

    pub fn is_end(&self) -> bool {
        self.position.is_none()
    }

    /// Key and value at the cursor; [`CacheError::InvalidIterator`] at the end.
    pub fn entry(&self) -> Result<(&'a K, &'a V)> {
        entry_at(self.cache, self.position)
    }

    pub fn key(&self) -> Result<&'a K> {
        self.entry().map(|(key, _)| key)
    }

    pub fn value(&self) -> Result<&'a V> {
        self.entry().map(|(_, value)| value)
    }

    /// Steps towards the most recently used end. Stays put at the end.
    pub fn advance(&mut self) {
        self.position = self.position.and_then(|id| self.cache.order.next_id(id));
    }

    /// Steps towards the least recently used end; from the end it moves to
    /// the back. Returns `false` if there was nowhere to go.
    pub fn retreat(&mut self) -> bool {
        let target = match self.position {
            Some(id) => self.cache.order.prev_id(id),
            None => self.cache.order.back_id(),
        };
        match target {
            Some(id) => {
                self.position = Some(id);
                true
            },
            None => false,
        }
    }

    pub fn handle(&self) -> Handle {
        self.cache.handle(self.position)
    }

    /// Same position as an unordered cursor. Always succeeds.
    pub fn to_unordered(&self) -> UnorderedIter<'a, K, V, P, S> {
        UnorderedIter::new(self.cache, self.position)
    }
}

impl<'a, K, V, P, S> Iterator for OrderedIter<'a, K, V, P, S>
where
    P: EntryPolicy,
{
    type Item = (&'a K, &'a V);

    fn next(&mut self) -> Option<Self::Item> {
        let item = self.entry().ok()?;
        self.advance();
        Some(item)
    }
}

impl<K, V, P, S> FusedIterator for OrderedIter<'_, K, V, P, S> where P: EntryPolicy {}

impl<K, V, P, S> Clone for OrderedIter<'_, K, V, P, S>
where
    P: EntryPolicy,
{
    fn clone(&self) -> Self {
        *self
    }
}

impl<K, V, P, S> Copy for OrderedIter<'_, K, V, P, S> where P: EntryPolicy {}

impl<K, V, P, S> fmt::Debug for OrderedIter<'_, K, V, P, S>
where
    P: EntryPolicy,
{
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("OrderedIter")
            .field("position", &self.position)
            .finish()
    }
}

// ---------------------------------------------------------------------------
// UnorderedIter
// ---------------------------------------------------------------------------

/// Cursor walking entries in storage order.
///
/// This is the kind returned by [`Engine::find`]; seeking costs one hash
/// lookup because the entry's storage slot is its position.
pub struct UnorderedIter<'a, K, V, P, S>
where
    P: EntryPolicy,
{
    cache: &'a Engine<K, V, P, S>,
    position: Option<SlotId>,
}

impl<'a, K, V, P, S> UnorderedIter<'a, K, V, P, S>
where
    P: EntryPolicy,
{
    pub(crate) fn new(cache: &'a Engine<K, V, P, S>, position: Option<SlotId>) -> Self {
        Self { cache, position }
    }

    pub fn is_end(&self) -> bool {
        self.position.is_none()
    }

    /// Key and value at the cursor; [`CacheError::InvalidIterator`] at the end.
    pub fn entry(&self) -> Result<(&'a K, &'a V)> {
        entry_at(self.cache, self.position)
    }

    pub fn key(&self) -> Result<&'a K> {
        self.entry().map(|(key, _)| key)
    }

    pub fn value(&self) -> Result<&'a V> {
        self.entry().map(|(_, value)| value)
    }

    /// Steps to the next occupied slot. Stays put at the end.
    pub fn advance(&mut self) {
        self.position = self
            .position
            .and_then(|id| self.cache.order.next_in_storage(id));
    }

    pub fn handle(&self) -> Handle {
        self.cache.handle(self.position)
    }

    /// Same position as an ordered cursor.
    ///
    /// Fails with [`CacheError::InvalidIteratorConversion`] at the end: the
    /// unordered end carries no recency position to convert.
    ///
    /// ```
    /// use lrukit::{Cache, CacheError};
    ///
    /// let cache: Cache<u8, u8> = Cache::new(2);
    /// assert_eq!(
    ///     cache.unordered_end().to_ordered().unwrap_err(),
    ///     CacheError::InvalidIteratorConversion
    /// );
    /// ```
    pub fn to_ordered(&self) -> Result<OrderedIter<'a, K, V, P, S>> {
        let id = self
            .position
            .ok_or(CacheError::InvalidIteratorConversion)?;
        Ok(OrderedIter::new(self.cache, Some(id)))
    }
}

impl<'a, K, V, P, S> Iterator for UnorderedIter<'a, K, V, P, S>
where
    P: EntryPolicy,
{
    type Item = (&'a K, &'a V);

    fn next(&mut self) -> Option<Self::Item> {
        let item = self.entry().ok()?;
        self.advance();
        Some(item)
    }
}

impl<K, V, P, S> FusedIterator for UnorderedIter<'_, K, V, P, S> where P: EntryPolicy {}

impl<K, V, P, S> Clone for UnorderedIter<'_, K, V, P, S>
where
    P: EntryPolicy,
{
    fn clone(&self) -> Self {
        *self
    }
}

impl<K, V, P, S> Copy for UnorderedIter<'_, K, V, P, S> where P: EntryPolicy {}

impl<K, V, P, S> fmt::Debug for UnorderedIter<'_, K, V, P, S>
where
    P: EntryPolicy,
{
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("UnorderedIter")
            .field("position", &self.position)
            .finish()
    }
}

// ---------------------------------------------------------------------------
// Equality within and across kinds
// ---------------------------------------------------------------------------

impl<K, V, P, S> PartialEq for OrderedIter<'_, K, V, P, S>
where
    P: EntryPolicy,
{
    fn eq(&self, other: &Self) -> bool {
        same_position((self.cache, self.position), (other.cache, other.position))
    }
}

impl<K, V, P, S> Eq for OrderedIter<'_, K, V, P, S> where P: EntryPolicy {}

impl<K, V, P, S> PartialEq for UnorderedIter<'_, K, V, P, S>
where
    P: EntryPolicy,
{
    fn eq(&self, other: &Self) -> bool {
        same_position((self.cache, self.position), (other.cache, other.position))
    }
}

impl<K, V, P, S> Eq for UnorderedIter<'_, K, V, P, S> where P: EntryPolicy {}

impl<'b, K, V, P, S> PartialEq<UnorderedIter<'b, K, V, P, S>> for OrderedIter<'_, K, V, P, S>
where
    P: EntryPolicy,
{
    fn eq(&self, other: &UnorderedIter<'b, K, V, P, S>) -> bool {
        same_position((self.cache, self.position), (other.cache, other.position))
    }
}

impl<'b, K, V, P, S> PartialEq<OrderedIter<'b, K, V, P, S>> for UnorderedIter<'_, K, V, P, S>
where
    P: EntryPolicy,
{
    fn eq(&self, other: &OrderedIter<'b, K, V, P, S>) -> bool {
        other == self
    }
}

// ---------------------------------------------------------------------------
// Iter
// ---------------------------------------------------------------------------

/// Double-ended iterator over `(&K, &V)` from least to most recently used.
pub struct Iter<'a, K, V, P, S>
where
    P: EntryPolicy,
{
    cache: &'a Engine<K, V, P, S>,
    front: Option<SlotId>,
    back: Option<SlotId>,
    remaining: usize,
}

impl<'a, K, V, P, S> Iter<'a, K, V, P, S>
where
    K: Hash + Eq + Clone,
    P: EntryPolicy,
    S: BuildHasher,
{
    pub(crate) fn new(cache: &'a Engine<K, V, P, S>) -> Self {
        Self {
            cache,
            front: cache.order.front_id(),
            back: cache.order.back_id(),
            remaining: cache.len(),
        }
    }
}

impl<'a, K, V, P, S> Iterator for Iter<'a, K, V, P, S>
where
    P: EntryPolicy,
{
    type Item = (&'a K, &'a V);

    fn next(&mut self) -> Option<Self::Item> {
        if self.remaining == 0 {
            return None;
        }
        let id = self.front?;
        let entry = self.cache.order.get(id)?;
        self.front = self.cache.order.next_id(id);
        self.remaining -= 1;
        Some((&entry.key, &entry.value))
    }

    fn size_hint(&self) -> (usize, Option<usize>) {
        (self.remaining, Some(self.remaining))
    }
}

impl<K, V, P, S> DoubleEndedIterator for Iter<'_, K, V, P, S>
where
    P: EntryPolicy,
{
    fn next_back(&mut self) -> Option<Self::Item> {
        if self.remaining == 0 {
            return None;
        }
        let id = self.back?;
        let entry = self.cache.order.get(id)?;
        self.back = self.cache.order.prev_id(id);
        self.remaining -= 1;
        Some((&entry.key, &entry.value))
    }
}

impl<K, V, P, S> ExactSizeIterator for Iter<'_, K, V, P, S> where P: EntryPolicy {}

impl<K, V, P, S> FusedIterator for Iter<'_, K, V, P, S> where P: EntryPolicy {}

impl<K, V, P, S> fmt::Debug for Iter<'_, K, V, P, S>
where
    P: EntryPolicy,
{
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Iter")
            .field("remaining", &self.remaining)
            .finish()
    }
}
