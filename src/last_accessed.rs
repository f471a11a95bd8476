//! Single-slot memo of the most recently resolved entry.
//!
//! Collapses the common `if cache.contains(&k) { cache.lookup(&k) }` pattern
//! into one hash lookup: `contains` records the slot it found, and the
//! following `lookup` of the same key reads the slot directly.
//!
//! The slot never owns anything. It holds a `SlotId` that the engine clears
//! whenever the entry behind it is erased, evicted, cleared or found
//! expired. A probe also compares the stored key against the candidate, so
//! a slot that was recycled for another key can never answer for the old one.

use std::cell::Cell;

use crate::ds::slot_arena::SlotId;

#[derive(Debug, Default)]
pub(crate) struct LastAccessed {
    slot: Cell<Option<SlotId>>,
}

impl LastAccessed {
    pub(crate) fn new() -> Self {
        Self::default()
    }

    #[inline]
    pub(crate) fn get(&self) -> Option<SlotId> {
        self.slot.get()
    }

    #[inline]
    pub(crate) fn set(&self, id: SlotId) {
        self.slot.set(Some(id));
    }

    #[inline]
    pub(crate) fn invalidate(&self) {
        self.slot.set(None);
    }

    /// Clears the slot if it refers to `id`.
    #[inline]
    pub(crate) fn invalidate_if(&self, id: SlotId) {
        if self.slot.get() == Some(id) {
            self.slot.set(None);
        }
    }

    /// Returns the remembered slot if its key equals `key`.
    ///
    /// `key_at` resolves a slot to the key stored there.
    #[inline]
    pub(crate) fn probe<'a, K, F>(&self, key: &K, key_at: F) -> Option<SlotId>
    where
        K: Eq + 'a,
        F: FnOnce(SlotId) -> Option<&'a K>,
    {
        let id = self.slot.get()?;
        match key_at(id) {
            Some(stored) if stored == key => Some(id),
            _ => None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn empty_slot_never_matches() {
        let last = LastAccessed::new();
        assert_eq!(last.get(), None);
        assert_eq!(last.probe(&1, |_| Some(&1)), None);
    }

    #[test]
    fn probe_compares_stored_key() {
        let last = LastAccessed::new();
        last.set(SlotId(3));
        let keys = ["a", "b", "c", "d"];

        assert_eq!(last.probe(&"d", |id| keys.get(id.index())), Some(SlotId(3)));
        assert_eq!(last.probe(&"a", |id| keys.get(id.index())), None);
    }

    #[test]
    fn probe_misses_when_slot_is_gone() {
        let last = LastAccessed::new();
        last.set(SlotId(0));
        assert_eq!(last.probe(&"a", |_| None), None);
    }

    #[test]
    fn invalidate_if_only_clears_matching_slot() {
        let last = LastAccessed::new();
        last.set(SlotId(1));

        last.invalidate_if(SlotId(2));
        assert_eq!(last.get(), Some(SlotId(1)));

        last.invalidate_if(SlotId(1));
        assert_eq!(last.get(), None);

        last.set(SlotId(4));
        last.invalidate();
        assert_eq!(last.get(), None);
    }
}
