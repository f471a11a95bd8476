pub use crate::builder::CacheBuilder;
pub use crate::callbacks::Callbacks;
pub use crate::clock::{ManualClock, SystemClock};
pub use crate::engine::{Cache, Engine, RecencyMode, TimedCache, DEFAULT_CAPACITY};
pub use crate::error::{CacheError, ConfigError, InvariantError};
pub use crate::iter::{Handle, InsertionResult, Iter, OrderedIter, UnorderedIter};
pub use crate::policy::{Capacity, TimeToLive};
pub use crate::statistics::{KeyStatistics, SharedStatistics, Statistics};
pub use crate::traits::{Clock, EntryPolicy};
