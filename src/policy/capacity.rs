//! Capacity-only policy: entries stay valid until evicted or erased.

use crate::traits::EntryPolicy;

/// Policy of the plain LRU cache. Entries carry no bookkeeping.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct Capacity;

impl EntryPolicy for Capacity {
    type Stamp = ();

    #[inline]
    fn stamp(&self) {}

    #[inline]
    fn is_live(&self, _stamp: &()) -> bool {
        true
    }
}
