use async_trait::async_trait;
use bytes::Bytes;
use serde::Serialize;
use std::time::Duration;

/// Snapshot of cache statistics.
///
/// Counters are scoped to one store instance and only ever grow.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize)]
pub struct CacheStats {
    pub hits: u64,
    pub misses: u64,
}

impl CacheStats {
    /// Total number of logical lookups (hits + misses).
    pub fn total_ops(&self) -> u64 {
        self.hits + self.misses
    }

    /// Fraction of lookups that were hits, `0.0` before the first lookup.
    pub fn hit_ratio(&self) -> f64 {
        let total = self.total_ops();
        if total > 0 {
            self.hits as f64 / total as f64
        } else {
            0.0
        }
    }
}

#[derive(Debug, thiserror::Error)]
pub enum CacheError {
    #[error("cache ttl must be positive, got {0:?}")]
    InvalidTtl(Duration),
    #[error("cache backend error: {0}")]
    Backend(String),
    #[error("cache backend did not answer within {0:?}")]
    Timeout(Duration),
    #[error("cache protocol error: {0}")]
    Protocol(String),
}

impl CacheError {
    /// True for errors caused by the caller rather than the backend.
    pub fn is_validation(&self) -> bool {
        matches!(self, CacheError::InvalidTtl(_))
    }
}

/// Common interface for all TTL stores.
///
/// Implementations: in-process map, RESP2 network backend.
/// A lookup of an absent or expired key is `Ok(None)`; `Err` is reserved for
/// backend failures so callers can tell "errored" from "missed".
#[async_trait]
pub trait CacheStore: Send + Sync {
    /// Look up a key. Counts exactly one hit or one miss.
    async fn get(&self, key: &str) -> Result<Option<Bytes>, CacheError>;

    /// Store a value for `ttl`. A zero ttl is rejected.
    async fn set(&self, key: &str, value: Bytes, ttl: Duration) -> Result<(), CacheError>;

    /// Whether a live entry exists. Does not touch the counters.
    async fn exists(&self, key: &str) -> Result<bool, CacheError>;

    /// Remove a key. Removing an absent key is not an error.
    async fn delete(&self, key: &str) -> Result<(), CacheError>;

    /// Drop every entry.
    async fn clear(&self) -> Result<(), CacheError>;

    /// Current statistics snapshot.
    fn stats(&self) -> CacheStats;

    /// Human-readable backend name.
    fn name(&self) -> &'static str;
}

pub(crate) fn check_ttl(ttl: Duration) -> Result<(), CacheError> {
    if ttl.is_zero() {
        return Err(CacheError::InvalidTtl(ttl));
    }
    Ok(())
}
