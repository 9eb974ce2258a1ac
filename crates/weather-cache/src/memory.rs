use crate::stats::StatsCounter;
use crate::traits::{check_ttl, CacheError, CacheStats, CacheStore};
use async_trait::async_trait;
use bytes::Bytes;
use parking_lot::RwLock;
use std::collections::HashMap;
use std::sync::atomic::{AtomicU64, Ordering};
use std::time::{Duration, Instant};

/// Every this many inserts, expired entries are swept from the whole map.
const SWEEP_INTERVAL: u64 = 256;

/// A stored value and the instant it stops being served.
///
/// Never mutated after insert; a later `set` for the same key replaces it.
#[derive(Clone, Debug)]
struct CacheEntry {
    value: Bytes,
    expires_at: Instant,
}

impl CacheEntry {
    fn is_expired(&self, now: Instant) -> bool {
        now >= self.expires_at
    }
}

/// In-process TTL store.
///
/// One `RwLock` guards the map: lookups share the read lock, inserts and
/// removals take the write lock. Expiry is lazy. An expired entry reads as a
/// miss and is removed on that read; entries nobody reads again are dropped
/// by a sweep that runs every `SWEEP_INTERVAL` inserts.
pub struct MemoryCache {
    entries: RwLock<HashMap<String, CacheEntry>>,
    stats: StatsCounter,
    inserts: AtomicU64,
}

impl MemoryCache {
    pub fn new() -> Self {
        Self {
            entries: RwLock::new(HashMap::new()),
            stats: StatsCounter::new(),
            inserts: AtomicU64::new(0),
        }
    }

    fn lookup(&self, key: &str) -> Option<Bytes> {
        let now = Instant::now();
        let expired = {
            let entries = self.entries.read();
            match entries.get(key) {
                Some(entry) if !entry.is_expired(now) => {
                    self.stats.record_hit();
                    return Some(entry.value.clone());
                }
                Some(_) => true,
                None => false,
            }
        };

        self.stats.record_miss();

        if expired {
            // Re-check under the write lock: a concurrent set may have
            // replaced the stale entry in between.
            let mut entries = self.entries.write();
            if entries.get(key).is_some_and(|e| e.is_expired(now)) {
                entries.remove(key);
            }
        }
        None
    }

    fn insert(&self, key: &str, value: Bytes, ttl: Duration) -> Result<(), CacheError> {
        check_ttl(ttl)?;
        let now = Instant::now();
        let expires_at = now.checked_add(ttl).ok_or(CacheError::InvalidTtl(ttl))?;

        let sweep = self.inserts.fetch_add(1, Ordering::Relaxed) % SWEEP_INTERVAL
            == SWEEP_INTERVAL - 1;

        let mut entries = self.entries.write();
        if sweep {
            entries.retain(|_, e| !e.is_expired(now));
        }
        entries.insert(key.to_string(), CacheEntry { value, expires_at });
        Ok(())
    }

    /// Drop every expired entry now. Returns how many were removed.
    pub fn purge_expired(&self) -> usize {
        let now = Instant::now();
        let mut entries = self.entries.write();
        let before = entries.len();
        entries.retain(|_, e| !e.is_expired(now));
        before - entries.len()
    }

    fn contains(&self, key: &str) -> bool {
        let now = Instant::now();
        self.entries
            .read()
            .get(key)
            .is_some_and(|e| !e.is_expired(now))
    }

    /// Number of physically stored entries, expired ones included.
    pub fn len(&self) -> usize {
        self.entries.read().len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.read().is_empty()
    }
}

impl Default for MemoryCache {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl CacheStore for MemoryCache {
    async fn get(&self, key: &str) -> Result<Option<Bytes>, CacheError> {
        Ok(self.lookup(key))
    }

    async fn set(&self, key: &str, value: Bytes, ttl: Duration) -> Result<(), CacheError> {
        self.insert(key, value, ttl)
    }

    async fn exists(&self, key: &str) -> Result<bool, CacheError> {
        Ok(self.contains(key))
    }

    async fn delete(&self, key: &str) -> Result<(), CacheError> {
        self.entries.write().remove(key);
        Ok(())
    }

    async fn clear(&self) -> Result<(), CacheError> {
        self.entries.write().clear();
        Ok(())
    }

    fn stats(&self) -> CacheStats {
        self.stats.snapshot()
    }

    fn name(&self) -> &'static str {
        "memory"
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Arc;

    fn val(s: &'static str) -> Bytes {
        Bytes::from_static(s.as_bytes())
    }

    #[tokio::test]
    async fn basic_set_and_get() {
        let cache = MemoryCache::new();
        cache.set("a", val("1"), Duration::from_secs(60)).await.unwrap();

        assert_eq!(cache.get("a").await.unwrap(), Some(val("1")));
        assert_eq!(cache.get("b").await.unwrap(), None);
    }

    #[tokio::test]
    async fn zero_ttl_rejected() {
        let cache = MemoryCache::new();
        let err = cache.set("a", val("1"), Duration::ZERO).await.unwrap_err();
        assert!(matches!(err, CacheError::InvalidTtl(_)));
        assert!(cache.is_empty());
    }

    #[tokio::test]
    async fn ttl_expiration() {
        let cache = MemoryCache::new();
        cache
            .set("k", val("v"), Duration::from_millis(100))
            .await
            .unwrap();
        assert_eq!(cache.get("k").await.unwrap(), Some(val("v")));

        tokio::time::sleep(Duration::from_millis(150)).await;

        assert_eq!(cache.get("k").await.unwrap(), None);
        // Lazily removed on the expired read
        assert_eq!(cache.len(), 0);
    }

    #[tokio::test]
    async fn expired_entry_counts_as_miss_only() {
        let cache = MemoryCache::new();
        cache
            .set("k", val("v"), Duration::from_millis(20))
            .await
            .unwrap();
        tokio::time::sleep(Duration::from_millis(40)).await;

        assert!(!cache.exists("k").await.unwrap());
        assert_eq!(cache.get("k").await.unwrap(), None);

        let stats = cache.stats();
        assert_eq!(stats.hits, 0);
        assert_eq!(stats.misses, 1);
    }

    #[tokio::test]
    async fn unread_expired_entries_are_swept_by_inserts() {
        let cache = MemoryCache::new();
        for i in 0..10 {
            cache
                .set(&format!("stale-{i}"), val("v"), Duration::from_millis(10))
                .await
                .unwrap();
        }
        tokio::time::sleep(Duration::from_millis(30)).await;
        assert_eq!(cache.len(), 10);

        for i in 0..SWEEP_INTERVAL {
            cache
                .set(&format!("fresh-{i}"), val("v"), Duration::from_secs(60))
                .await
                .unwrap();
        }
        assert_eq!(cache.len(), SWEEP_INTERVAL as usize);
        assert!(cache.exists("fresh-0").await.unwrap());
        // Sweeping never touches the counters
        assert_eq!(cache.stats().total_ops(), 0);
    }

    #[tokio::test]
    async fn purge_expired_keeps_live_entries() {
        let cache = MemoryCache::new();
        cache.set("short", val("1"), Duration::from_millis(10)).await.unwrap();
        cache.set("long", val("2"), Duration::from_secs(60)).await.unwrap();
        tokio::time::sleep(Duration::from_millis(30)).await;

        assert_eq!(cache.purge_expired(), 1);
        assert_eq!(cache.len(), 1);
        assert_eq!(cache.get("long").await.unwrap(), Some(val("2")));
    }

    #[tokio::test]
    async fn later_set_supersedes() {
        let cache = MemoryCache::new();
        cache.set("a", val("old"), Duration::from_secs(60)).await.unwrap();
        cache.set("a", val("new"), Duration::from_secs(60)).await.unwrap();

        assert_eq!(cache.len(), 1);
        assert_eq!(cache.get("a").await.unwrap(), Some(val("new")));
    }

    #[tokio::test]
    async fn delete_and_clear() {
        let cache = MemoryCache::new();
        cache.set("a", val("1"), Duration::from_secs(60)).await.unwrap();
        cache.set("b", val("2"), Duration::from_secs(60)).await.unwrap();

        cache.delete("a").await.unwrap();
        cache.delete("a").await.unwrap(); // already gone
        assert!(!cache.exists("a").await.unwrap());
        assert!(cache.exists("b").await.unwrap());

        cache.clear().await.unwrap();
        assert!(cache.is_empty());
    }

    #[tokio::test]
    async fn stats_tracking() {
        let cache = MemoryCache::new();
        cache.set("a", val("1"), Duration::from_secs(60)).await.unwrap();
        cache.get("a").await.unwrap(); // hit
        cache.get("a").await.unwrap(); // hit
        cache.get("z").await.unwrap(); // miss
        cache.exists("a").await.unwrap();
        cache.delete("z").await.unwrap();

        let stats = cache.stats();
        assert_eq!(stats.hits, 2);
        assert_eq!(stats.misses, 1);
        assert_eq!(stats.total_ops(), 3);
        assert!((stats.hit_ratio() - 0.6667).abs() < 1e-3);
    }

    #[test]
    fn concurrent_access() {
        use std::thread;

        let cache = Arc::new(MemoryCache::new());
        for i in 0..100 {
            cache
                .insert(&format!("key-{}", i), val("x"), Duration::from_secs(60))
                .unwrap();
        }

        let mut handles = vec![];
        for t in 0..8 {
            let cache = Arc::clone(&cache);
            handles.push(thread::spawn(move || {
                for i in 0..500 {
                    let key = format!("key-{}", (t * 500 + i) % 200);
                    if i % 3 == 0 {
                        cache.insert(&key, val("y"), Duration::from_secs(60)).unwrap();
                    } else {
                        cache.lookup(&key);
                    }
                }
            }));
        }

        for h in handles {
            h.join().unwrap();
        }

        let stats = cache.stats();
        assert!(stats.total_ops() > 0);
        assert!(cache.len() <= 200);
    }

    #[test]
    fn is_send_and_sync() {
        fn assert_send_sync<T: Send + Sync>() {}
        assert_send_sync::<MemoryCache>();
    }
}
