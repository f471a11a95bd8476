//! Time-to-live policy.
//!
//! Every entry is stamped with the instant it was inserted (or last
//! re-inserted). An entry whose age has reached the configured duration is
//! expired: lookups treat it as absent, but nothing is removed until the
//! entry is evicted, erased, overwritten, or swept by `purge_expired`.
//!
//! ```text
//!   inserted ──────────── ttl ────────────► expires
//!      │  live: age < ttl                  │  expired: age >= ttl
//! ```

use std::time::{Duration, Instant};

use crate::clock::SystemClock;
use crate::traits::{Clock, EntryPolicy};

/// Expiration policy with a fixed duration and a pluggable clock.
#[derive(Debug, Clone)]
pub struct TimeToLive<C = SystemClock> {
    ttl: Duration,
    clock: C,
}

impl TimeToLive<SystemClock> {
    pub fn new(ttl: Duration) -> Self {
        Self::with_clock(ttl, SystemClock)
    }
}

impl<C: Clock> TimeToLive<C> {
    pub fn with_clock(ttl: Duration, clock: C) -> Self {
        Self { ttl, clock }
    }

    /// The configured time-to-live.
    #[inline]
    pub fn ttl(&self) -> Duration {
        self.ttl
    }

    pub fn clock(&self) -> &C {
        &self.clock
    }

    /// Time left before an entry stamped at `inserted` expires.
    pub fn remaining(&self, inserted: &Instant) -> Duration {
        self.ttl.saturating_sub(self.age(inserted))
    }

    #[inline]
    fn age(&self, inserted: &Instant) -> Duration {
        self.clock.now().saturating_duration_since(*inserted)
    }
}

impl<C: Clock> EntryPolicy for TimeToLive<C> {
    type Stamp = Instant;

    #[inline]
    fn stamp(&self) -> Instant {
        self.clock.now()
    }

    #[inline]
    fn is_live(&self, stamp: &Instant) -> bool {
        self.age(stamp) < self.ttl
    }
}
