//! Slot storage with stable handles.
//!
//! `SlotArena` hands out a [`SlotId`] for every stored value. A handle stays
//! valid until its value is removed; vacated slots are chained into an
//! embedded free list and reused by later inserts.
//!
//! ```text
//!   slots:  [ Occupied(a) | Vacant(next: 3) | Occupied(c) | Vacant(next: -) ]
//!   free_head ─► 1 ─► 3
//! ```
//!
//! Storage order (slot index order) is stable between mutations and is what
//! the cache exposes as its "unordered" iteration order.

/// Stable handle to a value stored in a [`SlotArena`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct SlotId(pub(crate) usize);

impl SlotId {
    /// Returns the raw slot index.
    pub fn index(self) -> usize {
        self.0
    }
}

#[derive(Debug)]
enum Slot<T> {
    Occupied(T),
    Vacant { next_free: Option<usize> },
}

impl<T> Slot<T> {
    fn as_ref(&self) -> Option<&T> {
        match self {
            Slot::Occupied(value) => Some(value),
            Slot::Vacant { .. } => None,
        }
    }

    fn as_mut(&mut self) -> Option<&mut T> {
        match self {
            Slot::Occupied(value) => Some(value),
            Slot::Vacant { .. } => None,
        }
    }
}

/// Vector of slots with an intrusive free list.
#[derive(Debug)]
pub struct SlotArena<T> {
    slots: Vec<Slot<T>>,
    free_head: Option<usize>,
    len: usize,
}

impl<T> SlotArena<T> {
    pub fn new() -> Self {
        Self {
            slots: Vec::new(),
            free_head: None,
            len: 0,
        }
    }

    pub fn with_capacity(capacity: usize) -> Self {
        Self {
            slots: Vec::with_capacity(capacity),
            free_head: None,
            len: 0,
        }
    }

    /// Stores `value`, reusing the most recently vacated slot when available.
    pub fn insert(&mut self, value: T) -> SlotId {
        let idx = match self.free_head {
            Some(idx) => {
                if let Slot::Vacant { next_free } = self.slots[idx] {
                    self.free_head = next_free;
                }
                self.slots[idx] = Slot::Occupied(value);
                idx
            },
            None => {
                self.slots.push(Slot::Occupied(value));
                self.slots.len() - 1
            },
        };
        self.len += 1;
        SlotId(idx)
    }

    /// Removes and returns the value at `id`; `None` if the slot is vacant.
    pub fn remove(&mut self, id: SlotId) -> Option<T> {
        let slot = self.slots.get_mut(id.0)?;
        if slot.as_ref().is_none() {
            return None;
        }
        let vacated = std::mem::replace(
            slot,
            Slot::Vacant {
                next_free: self.free_head,
            },
        );
        self.free_head = Some(id.0);
        self.len -= 1;
        match vacated {
            Slot::Occupied(value) => Some(value),
            Slot::Vacant { .. } => None,
        }
    }

    pub fn get(&self, id: SlotId) -> Option<&T> {
        self.slots.get(id.0).and_then(Slot::as_ref)
    }

    pub fn get_mut(&mut self, id: SlotId) -> Option<&mut T> {
        self.slots.get_mut(id.0).and_then(Slot::as_mut)
    }

    pub fn contains(&self, id: SlotId) -> bool {
        self.get(id).is_some()
    }

    /// Returns the first occupied slot at or after index `start`.
    pub fn first_occupied_from(&self, start: usize) -> Option<SlotId> {
        self.slots
            .iter()
            .enumerate()
            .skip(start)
            .find(|(_, slot)| slot.as_ref().is_some())
            .map(|(idx, _)| SlotId(idx))
    }

    pub fn len(&self) -> usize {
        self.len
    }

    pub fn is_empty(&self) -> bool {
        self.len == 0
    }

    /// Number of slots backing the arena, occupied or vacant.
    pub fn slot_count(&self) -> usize {
        self.slots.len()
    }

    pub fn clear(&mut self) {
        self.slots.clear();
        self.free_head = None;
        self.len = 0;
    }

    pub fn iter(&self) -> impl Iterator<Item = (SlotId, &T)> {
        self.slots
            .iter()
            .enumerate()
            .filter_map(|(idx, slot)| slot.as_ref().map(|value| (SlotId(idx), value)))
    }
}

impl<T> Default for SlotArena<T> {
    fn default() -> Self {
        Self::new()
    }
}
