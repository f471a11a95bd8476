//! Access observers.
//!
//! Callers can register closures that run on every value-returning access:
//! hit callbacks see the key and the value served, miss callbacks see the
//! key, and access callbacks see the key plus whether it was a hit.
//! Callbacks run after statistics are recorded, in registration order.

use std::fmt;

pub type HitCallback<K, V> = Box<dyn Fn(&K, &V)>;
pub type MissCallback<K> = Box<dyn Fn(&K)>;
pub type AccessCallback<K> = Box<dyn Fn(&K, bool)>;

/// Registered hit, miss and access observers of one cache.
pub struct Callbacks<K, V> {
    hit: Vec<HitCallback<K, V>>,
    miss: Vec<MissCallback<K>>,
    access: Vec<AccessCallback<K>>,
}

impl<K, V> Callbacks<K, V> {
    pub fn new() -> Self {
        Self {
            hit: Vec::new(),
            miss: Vec::new(),
            access: Vec::new(),
        }
    }

    pub fn on_hit(&mut self, callback: impl Fn(&K, &V) + 'static) {
        self.hit.push(Box::new(callback));
    }

    pub fn on_miss(&mut self, callback: impl Fn(&K) + 'static) {
        self.miss.push(Box::new(callback));
    }

    pub fn on_access(&mut self, callback: impl Fn(&K, bool) + 'static) {
        self.access.push(Box::new(callback));
    }

    pub fn clear_hit_callbacks(&mut self) {
        self.hit.clear();
    }

    pub fn clear_miss_callbacks(&mut self) {
        self.miss.clear();
    }

    pub fn clear_access_callbacks(&mut self) {
        self.access.clear();
    }

    pub fn clear(&mut self) {
        self.clear_hit_callbacks();
        self.clear_miss_callbacks();
        self.clear_access_callbacks();
    }

    /// Total number of registered callbacks.
    pub fn len(&self) -> usize {
        self.hit.len() + self.miss.len() + self.access.len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    pub(crate) fn hit(&self, key: &K, value: &V) {
        for callback in &self.hit {
            callback(key, value);
        }
        for callback in &self.access {
            callback(key, true);
        }
    }

    pub(crate) fn miss(&self, key: &K) {
        for callback in &self.miss {
            callback(key);
        }
        for callback in &self.access {
            callback(key, false);
        }
    }
}

impl<K, V> Default for Callbacks<K, V> {
    fn default() -> Self {
        Self::new()
    }
}

impl<K, V> fmt::Debug for Callbacks<K, V> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Callbacks")
            .field("hit", &self.hit.len())
            .field("miss", &self.miss.len())
            .field("access", &self.access.len())
            .finish()
    }
}
