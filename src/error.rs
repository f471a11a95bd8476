//! Error types for the lrukit library.
//!
//! ## Key Components
//!
//! - [`CacheError`]: Returned by cache, iterator and statistics operations.
//!   Every variant is recoverable; the cache is left unchanged.
//! - [`ConfigError`]: Returned when builder parameters are invalid
//!   (e.g. a time-to-live cache without a duration).
//! - [`InvariantError`]: Returned when internal data-structure invariants are
//!   violated (`check_invariants`).
//!
//! ## Example Usage
//!
//! ```
//! use lrukit::error::CacheError;
//! use lrukit::Cache;
//!
//! let cache: Cache<&str, i32> = Cache::new(4);
//! assert_eq!(cache.lookup(&"missing"), Err(CacheError::KeyNotFound));
//! assert_eq!(cache.front().unwrap_err().to_string(), "requested front of empty cache");
//! ```

use thiserror::Error;

/// Convenience alias used throughout the crate.
pub type Result<T> = std::result::Result<T, CacheError>;

// ---------------------------------------------------------------------------
// CacheError
// ---------------------------------------------------------------------------

/// Errors reported by the cache engine, its iterators and statistics.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
pub enum CacheError {
    /// Lookup of an absent key, or of a key whose time-to-live has elapsed.
    #[error("failed to find key")]
    KeyNotFound,

    /// `front()` / `back()` on a cache with no entries.
    #[error("requested {requested} of empty cache")]
    EmptyCache { requested: &'static str },

    /// Dereferencing or erasing through a past-the-end position.
    #[error("past-the-end iterator is invalid here")]
    InvalidIterator,

    /// Converting the past-the-end unordered iterator to an ordered one.
    #[error("cannot convert past-the-end unordered iterator to ordered iterator")]
    InvalidIteratorConversion,

    /// A handle minted before a later mutation of the same cache.
    #[error("handle was invalidated by a later mutation")]
    StaleHandle,

    /// A handle minted by a different cache.
    #[error("handle belongs to a different cache")]
    ForeignHandle,

    /// Statistics requested from a cache with no statistics attached.
    #[error("statistics monitoring not enabled for this cache")]
    NotMonitoring,

    /// Per-key statistics requested for a key that is not monitored.
    #[error("requested statistics for unmonitored key")]
    UnmonitoredKey,

    /// Hit or miss rate requested before any access was recorded.
    #[error("rate is undefined without any recorded access")]
    NoAccesses,
}

// ---------------------------------------------------------------------------
// ConfigError
// ---------------------------------------------------------------------------

/// Error returned when cache configuration parameters are invalid.
///
/// Produced by [`CacheBuilder::try_build_timed`](crate::builder::CacheBuilder::try_build_timed).
///
/// # Example
///
/// ```
/// use lrukit::builder::CacheBuilder;
///
/// let err = CacheBuilder::new(8).try_build_timed::<u64, u64>().unwrap_err();
/// assert!(err.to_string().contains("time-to-live"));
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("{0}")]
pub struct ConfigError(String);

impl ConfigError {
    /// Creates a new `ConfigError` with the given description.
    #[inline]
    pub fn new(msg: impl Into<String>) -> Self {
        Self(msg.into())
    }

    /// Returns the error description.
    #[inline]
    pub fn message(&self) -> &str {
        &self.0
    }
}

// ---------------------------------------------------------------------------
// InvariantError
// ---------------------------------------------------------------------------

/// Error returned when internal cache invariants are violated.
///
/// Produced by [`Engine::check_invariants`](crate::engine::Engine::check_invariants).
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("{0}")]
pub struct InvariantError(String);

impl InvariantError {
    /// Creates a new `InvariantError` with the given description.
    #[inline]
    pub fn new(msg: impl Into<String>) -> Self {
        Self(msg.into())
    }

    /// Returns the error description.
    #[inline]
    pub fn message(&self) -> &str {
        &self.0
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
