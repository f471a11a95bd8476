//! Recency queue: a doubly linked list backed by `SlotArena`.
//!
//! Nodes live in a `SlotArena` and link to each other by `SlotId`, so a
//! node's handle stays stable while it moves around the list. The cache
//! keeps the least recently used entry at the front and the most recently
//! used entry at the back.
//!
//! ## Architecture
//!
//! ```text
//!   arena (SlotArena<Node<T>>)
//!   ┌────────┬─────────────────────────────────────────────┐
//!   │ SlotId │ Node { value, prev, next }                  │
//!   ├────────┼─────────────────────────────────────────────┤
//!   │ id_0   │ { value: A, prev: None, next: Some(id_1) }  │
//!   │ id_1   │ { value: B, prev: Some(id_0), next: id_2 }  │
//!   │ id_2   │ { value: C, prev: Some(id_1), next: None }  │
//!   └────────┴─────────────────────────────────────────────┘
//!
//!   head ─► [id_0] ◄──► [id_1] ◄──► [id_2] ◄── tail
//!            (LRU)                    (MRU)
//! ```
//!
//! ## Performance
//! - `push_back` / `pop_front` / `remove` / `move_to_back`: O(1)
//! - `next_id` / `prev_id`: O(1)
//! - `iter`: O(n)
//!
//! `debug_validate_invariants()` is available in debug/test builds.

use crate::ds::slot_arena::{SlotArena, SlotId};

#[derive(Debug)]
struct Node<T> {
    value: T,
    prev: Option<SlotId>,
    next: Option<SlotId>,
}

/// Doubly linked list whose nodes are addressed by `SlotId`.
#[derive(Debug)]
pub struct IntrusiveList<T> {
    arena: SlotArena<Node<T>>,
    head: Option<SlotId>,
    tail: Option<SlotId>,
}

impl<T> IntrusiveList<T> {
    /// Creates an empty list.
    pub fn new() -> Self {
        Self::with_capacity(0)
    }

    /// Creates an empty list with reserved node capacity.
    pub fn with_capacity(capacity: usize) -> Self {
        Self {
            arena: SlotArena::with_capacity(capacity),
            head: None,
            tail: None,
        }
    }

    pub fn len(&self) -> usize {
        self.arena.len()
    }

    pub fn is_empty(&self) -> bool {
        self.arena.is_empty()
    }

    /// Returns `true` if `id` is currently a node in this list.
    pub fn contains(&self, id: SlotId) -> bool {
        self.arena.contains(id)
    }

    /// SlotId at the front (least recent end).
    pub fn front_id(&self) -> Option<SlotId> {
        self.head
    }

    /// SlotId at the back (most recent end).
    pub fn back_id(&self) -> Option<SlotId> {
        self.tail
    }

    pub fn front(&self) -> Option<&T> {
        self.head.and_then(|id| self.get(id))
    }

    pub fn back(&self) -> Option<&T> {
        self.tail.and_then(|id| self.get(id))
    }

    /// Node following `id` in list order.
    pub fn next_id(&self, id: SlotId) -> Option<SlotId> {
        self.arena.get(id).and_then(|node| node.next)
    }

    /// Node preceding `id` in list order.
    pub fn prev_id(&self, id: SlotId) -> Option<SlotId> {
        self.arena.get(id).and_then(|node| node.prev)
    }

    /// First live node in storage order, ignoring list order.
    pub fn first_in_storage(&self) -> Option<SlotId> {
        self.arena.first_occupied_from(0)
    }

    /// Live node after `id` in storage order, ignoring list order.
    pub fn next_in_storage(&self, id: SlotId) -> Option<SlotId> {
        self.arena.first_occupied_from(id.index() + 1)
    }

    pub fn get(&self, id: SlotId) -> Option<&T> {
        self.arena.get(id).map(|node| &node.value)
    }

    pub fn get_mut(&mut self, id: SlotId) -> Option<&mut T> {
        self.arena.get_mut(id).map(|node| &mut node.value)
    }

    /// Appends a node at the back and returns its `SlotId`.
    pub fn push_back(&mut self, value: T) -> SlotId {
        let id = self.arena.insert(Node {
            value,
            prev: self.tail,
            next: None,
        });
        match self.tail.and_then(|tail| self.arena.get_mut(tail)) {
            Some(node) => node.next = Some(id),
            None => self.head = Some(id),
        }
        self.tail = Some(id);
        id
    }

    /// Removes and returns the front value.
    pub fn pop_front(&mut self) -> Option<(SlotId, T)> {
        let id = self.head?;
        self.remove(id).map(|value| (id, value))
    }

    /// Removes the node `id` from the list and returns its value.
    pub fn remove(&mut self, id: SlotId) -> Option<T> {
        self.detach(id)?;
        self.arena.remove(id).map(|node| node.value)
    }

    /// Moves an existing node to the back; returns `false` if `id` is not present.
    pub fn move_to_back(&mut self, id: SlotId) -> bool {
        if !self.arena.contains(id) {
            return false;
        }
        if Some(id) == self.tail {
            return true;
        }
        self.detach(id);
        self.attach_back(id);
        true
    }

    /// Number of storage slots, including vacant ones left by removals.
    pub fn slot_count(&self) -> usize {
        self.arena.slot_count()
    }

    /// Repacks the nodes into fresh storage in front-to-back order and
    /// releases the old slots. Every `SlotId` changes; `moved` sees each
    /// value with its new id.
    pub fn compact(&mut self, mut moved: impl FnMut(&T, SlotId)) {
        let len = self.len();
        let mut old = std::mem::replace(self, Self::with_capacity(len));
        while let Some((_, value)) = old.pop_front() {
            let id = self.push_back(value);
            if let Some(value) = self.get(id) {
                moved(value, id);
            }
        }
    }

    /// Clears the list and frees all nodes.
    pub fn clear(&mut self) {
        self.arena.clear();
        self.head = None;
        self.tail = None;
    }

    /// Iterates values from front to back.
    pub fn iter(&self) -> impl Iterator<Item = &T> + '_ {
        self.iter_entries().map(|(_, value)| value)
    }

    /// Iterates `(SlotId, &T)` pairs from front to back.
    pub fn iter_entries(&self) -> IntrusiveListEntryIter<'_, T> {
        IntrusiveListEntryIter {
            list: self,
            current: self.head,
        }
    }

    fn detach(&mut self, id: SlotId) -> Option<()> {
        let (prev, next) = {
            let node = self.arena.get(id)?;
            (node.prev, node.next)
        };

        match prev.and_then(|prev_id| self.arena.get_mut(prev_id)) {
            Some(prev_node) => prev_node.next = next,
            None => self.head = next,
        }

        match next.and_then(|next_id| self.arena.get_mut(next_id)) {
            Some(next_node) => next_node.prev = prev,
            None => self.tail = prev,
        }

        if let Some(node) = self.arena.get_mut(id) {
            node.prev = None;
            node.next = None;
        }

        Some(())
    }

    fn attach_back(&mut self, id: SlotId) -> Option<()> {
        let old_tail = self.tail;
        let node = self.arena.get_mut(id)?;
        node.next = None;
        node.prev = old_tail;

        match old_tail.and_then(|tail| self.arena.get_mut(tail)) {
            Some(tail_node) => tail_node.next = Some(id),
            None => self.head = Some(id),
        }
        self.tail = Some(id);
        Some(())
    }

    #[cfg(any(test, debug_assertions))]
    pub fn debug_validate_invariants(&self) {
        if self.head.is_none() || self.tail.is_none() {
            assert!(self.head.is_none());
            assert!(self.tail.is_none());
            assert_eq!(self.len(), 0);
            return;
        }

        let mut seen = std::collections::HashSet::new();
        let mut count = 0usize;
        let mut current = self.head;
        let mut prev = None;

        while let Some(id) = current {
            assert!(seen.insert(id));
            let node = self.arena.get(id).expect("node missing");
            assert_eq!(node.prev, prev);
            if let Some(next_id) = node.next {
                let next_node = self.arena.get(next_id).expect("next node missing");
                assert_eq!(next_node.prev, Some(id));
            } else {
                assert_eq!(self.tail, Some(id));
            }

            prev = Some(id);
            current = node.next;
            count += 1;
            assert!(count <= self.len());
        }

        assert_eq!(count, self.len());
    }
}

impl<T> Default for IntrusiveList<T> {
    fn default() -> Self {
        Self::new()
    }
}

/// Iterator over `(SlotId, &T)` pairs from front to back.
pub struct IntrusiveListEntryIter<'a, T> {
    list: &'a IntrusiveList<T>,
    current: Option<SlotId>,
}

impl<'a, T> Iterator for IntrusiveListEntryIter<'a, T> {
    type Item = (SlotId, &'a T);

    fn next(&mut self) -> Option<Self::Item> {
        let id = self.current?;
        let node = self.list.arena.get(id)?;
        self.current = node.next;
        Some((id, &node.value))
    }
}
