//! In-memory exchange rate cache with a fixed time-to-live.
//!
//! Entries expire `ttl` after the rate was fetched. Expired entries are
//! dropped lazily the next time they are looked up.

use crate::core::clock::Clock;
use crate::core::currency::RatePair;
use crate::core::error::RateError;
use chrono::{DateTime, Duration, Utc};
use dashmap::DashMap;
use rust_decimal::Decimal;
use std::sync::Arc;
use tracing::debug;

/// Default lifetime of a cached rate.
pub const DEFAULT_TTL: std::time::Duration = std::time::Duration::from_secs(60 * 60);

/// Longest lifetime a cache accepts.
pub const MAX_TTL: std::time::Duration = std::time::Duration::from_secs(10 * 365 * 24 * 60 * 60);

/// A cached rate. Replaced wholesale on refresh, never mutated.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CacheEntry {
    pub rate: Decimal,
    pub expires_at: DateTime<Utc>,
}

impl CacheEntry {
    fn is_live(&self, now: DateTime<Utc>) -> bool {
        now < self.expires_at
    }
}

/// Concurrent rate cache keyed by ordered currency pair.
///
/// Backed by a sharded map, so callers working on unrelated pairs rarely touch
/// the same lock and no lock is ever held across an await point.
pub struct RateCache {
    entries: DashMap<RatePair, CacheEntry>,
    ttl: Duration,
    clock: Arc<dyn Clock>,
}

impl RateCache {
    pub fn new(ttl: std::time::Duration, clock: Arc<dyn Clock>) -> Result<Self, RateError> {
        if ttl.is_zero() {
            return Err(RateError::InvalidInput(
                "cache TTL must be greater than zero".to_string(),
            ));
        }
        if ttl > MAX_TTL {
            return Err(RateError::InvalidInput(format!(
                "cache TTL must not exceed {} seconds",
                MAX_TTL.as_secs()
            )));
        }
        let ttl = Duration::from_std(ttl)
            .map_err(|e| RateError::InvalidInput(format!("cache TTL out of range: {e}")))?;

        Ok(Self {
            entries: DashMap::new(),
            ttl,
            clock,
        })
    }

    pub fn ttl(&self) -> Duration {
        self.ttl
    }

    /// Returns the live entry for `pair`.
    ///
    /// An expired entry counts as a miss and is evicted, unless another caller
    /// replaced it with a fresh one in the meantime.
    pub fn lookup(&self, pair: &RatePair) -> Option<CacheEntry> {
        let now = self.clock.now();

        let entry = self.entries.get(pair).map(|e| e.value().clone());
        match entry {
            Some(entry) if entry.is_live(now) => {
                debug!(pair = %pair, expires_at = %entry.expires_at, "Cache HIT");
                Some(entry)
            }
            Some(_) => {
                self.entries.remove_if(pair, |_, e| !e.is_live(now));
                debug!(pair = %pair, "Cache entry expired");
                None
            }
            None => {
                debug!(pair = %pair, "Cache MISS");
                None
            }
        }
    }

    /// Stores `rate` for `pair`, expiring `ttl` after `fetched_at`. Last writer wins.
    ///
    /// An expiry past the last representable instant is clamped to it.
    pub fn store(&self, pair: RatePair, rate: Decimal, fetched_at: DateTime<Utc>) -> CacheEntry {
        let expires_at = fetched_at
            .checked_add_signed(self.ttl)
            .unwrap_or(DateTime::<Utc>::MAX_UTC);
        let entry = CacheEntry { rate, expires_at };
        debug!(pair = %pair, rate = %rate, expires_at = %entry.expires_at, "Cache PUT");
        self.entries.insert(pair, entry.clone());
        entry
    }

    /// Removes the entry for `pair`. Returns whether anything was removed.
    pub fn invalidate(&self, pair: &RatePair) -> bool {
        let removed = self.entries.remove(pair).is_some();
        debug!(pair = %pair, removed, "Cache REMOVE");
        removed
    }

    pub fn clear(&self) {
        self.entries.clear();
        debug!("Cache CLEAR");
    }

    /// Number of physically stored entries, expired ones included.
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}
