//! Stored cache entries.

use serde::{Deserialize, Serialize};
use std::time::{Duration, SystemTime, UNIX_EPOCH};

/// A cached producer result and the moment it was written.
///
/// Freshness is not a property of the entry: the TTL is supplied by whoever reads it, so
/// two callers may judge the same entry differently.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CacheEntry<T> {
    pub data: T,
    /// Milliseconds since the Unix epoch.
    pub timestamp: i64,
}

impl<T> CacheEntry<T> {
    /// Wrap `data` stamped with the current time.
    pub fn new(data: T) -> Self {
        Self::with_timestamp(data, now_millis())
    }

    pub fn with_timestamp(data: T, timestamp: i64) -> Self {
        CacheEntry { data, timestamp }
    }

    /// Milliseconds elapsed between the write and `now`. Negative if the clock moved back.
    pub fn age_millis(&self, now: i64) -> i64 {
        now.saturating_sub(self.timestamp)
    }

    /// Fresh iff `now - timestamp < ttl`.
    pub fn is_fresh(&self, ttl: Duration, now: i64) -> bool {
        let ttl_ms = i64::try_from(ttl.as_millis()).unwrap_or(i64::MAX);
        self.age_millis(now) < ttl_ms
    }
}

/// Current wall-clock time in milliseconds since the Unix epoch.
pub fn now_millis() -> i64 {
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .map(|d| i64::try_from(d.as_millis()).unwrap_or(i64::MAX))
        .unwrap_or(0)
}
