//! # Engine Seams
//!
//! The cache engine is a single generic type. What differs between the
//! capacity-only cache and the time-to-live cache is captured by two small
//! traits instead of a type hierarchy.
//!
//! ```text
//!   ┌──────────────────────────────────────────────────────────────────┐
//!   │                 Engine<K, V, P: EntryPolicy, S>                  │
//!   │                                                                  │
//!   │   insert ──► P::stamp()          (bookkeeping for a new entry)   │
//!   │   lookup ──► P::is_live(&stamp)  (is the entry still usable?)    │
//!   └─────────────────────────────────┬────────────────────────────────┘
//!                                     │
//!                 ┌───────────────────┴────────────────────┐
//!                 ▼                                        ▼
//!   ┌──────────────────────────┐            ┌──────────────────────────────┐
//!   │ Capacity                 │            │ TimeToLive<C: Clock>         │
//!   │  Stamp = ()              │            │  Stamp = Instant             │
//!   │  always live             │            │  live while age < ttl        │
//!   └──────────────────────────┘            └──────────────┬───────────────┘
//!                                                          │
//!                                            ┌─────────────┴─────────────┐
//!                                            ▼                           ▼
//!                                      SystemClock                  ManualClock
//! ```
//!
//! ## Trait Summary
//!
//! | Trait         | Purpose                                                |
//! |---------------|--------------------------------------------------------|
//! | `EntryPolicy` | Creates per-entry bookkeeping and judges its validity   |
//! | `Clock`       | Monotonic time source read at access time               |

use std::fmt::Debug;
use std::time::Instant;

/// Admission and validity rules applied by the engine to every entry.
///
/// A policy is consulted when an entry is created or promoted
/// ([`stamp`](EntryPolicy::stamp)) and whenever a value-returning access or
/// `contains` needs to know whether the entry may still be served
/// ([`is_live`](EntryPolicy::is_live)).
///
/// Stamps must be monotone along the recency queue: an entry closer to the
/// back never becomes invalid before one closer to the front. The engine
/// relies on this when purging from the front.
pub trait EntryPolicy {
    /// Per-entry bookkeeping stored next to the value.
    type Stamp: Debug;

    /// Bookkeeping for an entry that is being inserted or promoted now.
    fn stamp(&self) -> Self::Stamp;

    /// Whether an entry carrying `stamp` may still be served.
    fn is_live(&self, stamp: &Self::Stamp) -> bool;
}

/// Monotonic time source.
///
/// # Example
///
/// ```
/// use lrukit::clock::ManualClock;
/// use lrukit::traits::Clock;
/// use std::time::Duration;
///
/// let clock = ManualClock::new();
/// let start = clock.now();
/// clock.advance(Duration::from_millis(5));
/// assert_eq!(clock.now() - start, Duration::from_millis(5));
/// ```
pub trait Clock {
    fn now(&self) -> Instant;
}

impl<C: Clock + ?Sized> Clock for &C {
    fn now(&self) -> Instant {
        (**self).now()
    }
}
