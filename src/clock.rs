//! Time sources for the time-to-live cache.
//!
//! - [`SystemClock`] reads `Instant::now()` on every call.
//! - [`ManualClock`] only moves when told to; clones share the same time,
//!   so a test can keep one handle and hand another to the cache.

use std::cell::Cell;
use std::rc::Rc;
use std::time::{Duration, Instant};

use crate::traits::Clock;

/// Wall clock backed by [`Instant::now`].
#[derive(Debug, Clone, Copy, Default)]
pub struct SystemClock;

impl Clock for SystemClock {
    #[inline]
    fn now(&self) -> Instant {
        Instant::now()
    }
}

/// Manually advanced clock.
///
/// # Example
///
/// ```
/// use lrukit::clock::ManualClock;
/// use lrukit::traits::Clock;
/// use std::time::Duration;
///
/// let clock = ManualClock::new();
/// let shared = clock.clone();
/// let before = shared.now();
/// clock.advance(Duration::from_secs(1));
/// assert_eq!(shared.now().duration_since(before), Duration::from_secs(1));
/// ```
#[derive(Debug, Clone)]
pub struct ManualClock {
    now: Rc<Cell<Instant>>,
}

impl ManualClock {
    /// Starts at the current instant.
    pub fn new() -> Self {
        Self::starting_at(Instant::now())
    }

    pub fn starting_at(start: Instant) -> Self {
        Self {
            now: Rc::new(Cell::new(start)),
        }
    }

    /// Moves time forward by `by` for every clone of this clock.
    pub fn advance(&self, by: Duration) {
        self.now.set(self.now.get() + by);
    }
}

impl Default for ManualClock {
    fn default() -> Self {
        Self::new()
    }
}

impl Clock for ManualClock {
    #[inline]
    fn now(&self) -> Instant {
        self.now.get()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn system_clock_is_monotonic() {
        let clock = SystemClock;
        let a = clock.now();
        let b = clock.now();
        assert!(b >= a);
    }

    #[test]
    fn manual_clock_only_moves_on_advance() {
        let clock = ManualClock::new();
        let t0 = clock.now();
        assert_eq!(clock.now(), t0);

        clock.advance(Duration::from_millis(250));
        assert_eq!(clock.now(), t0 + Duration::from_millis(250));
    }

    #[test]
    fn manual_clock_clones_share_time() {
        let clock = ManualClock::new();
        let other = clock.clone();
        let t0 = other.now();

        clock.advance(Duration::from_secs(3));
        assert_eq!(other.now(), t0 + Duration::from_secs(3));
    }

    #[test]
    fn clock_is_implemented_for_references() {
        fn read<C: Clock>(clock: C) -> Instant {
            clock.now()
        }
        let clock = ManualClock::new();
        assert_eq!(read(&clock), clock.now());
    }
}
