//! Entry policies plugged into the cache engine.
//!
//! | Policy          | Stamp     | Entry is live while         |
//! |-----------------|-----------|-----------------------------|
//! | `Capacity`      | `()`      | always                      |
//! | `TimeToLive<C>` | `Instant` | `now - inserted < ttl`      |

pub mod capacity;
pub mod time_to_live;

pub use capacity::Capacity;
pub use time_to_live::TimeToLive;
