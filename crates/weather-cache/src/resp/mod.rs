mod cmd;
mod connection;

use crate::stats::StatsCounter;
use crate::traits::{check_ttl, CacheError, CacheStats, CacheStore};
use async_trait::async_trait;
use bytes::Bytes;
use connection::RespConnection;
use parking_lot::Mutex;
use redis_protocol::resp2::types::BytesFrame;
use std::time::Duration;

/// Connection settings for a Redis-compatible server.
#[derive(Clone, Debug)]
pub struct RespConfig {
    pub address: String,
    pub database: u32,
    pub password: Option<String>,
    pub connect_timeout: Duration,
    pub io_timeout: Duration,
    /// Idle connections kept for reuse.
    pub max_idle: usize,
}

impl Default for RespConfig {
    fn default() -> Self {
        Self {
            address: "127.0.0.1:6379".to_string(),
            database: 0,
            password: None,
            connect_timeout: Duration::from_secs(2),
            io_timeout: Duration::from_secs(1),
            max_idle: 8,
        }
    }
}

/// TTL store backed by a Redis-compatible server over RESP2.
///
/// Expiry is the server's native TTL (`SET .. PX`). Connections are checked
/// out of an idle pool; the pool lock is only held to pop or push, never
/// across a round trip. A connection that failed mid-request is dropped.
pub struct RespCache {
    config: RespConfig,
    idle: Mutex<Vec<RespConnection>>,
    stats: StatsCounter,
}

impl RespCache {
    pub fn new(config: RespConfig) -> Self {
        tracing::info!(
            addr = %config.address,
            db = config.database,
            max_idle = config.max_idle,
            "RESP cache initialized"
        );
        Self {
            config,
            idle: Mutex::new(Vec::new()),
            stats: StatsCounter::new(),
        }
    }

    /// Round-trip a PING to verify the server is reachable.
    pub async fn ping(&self) -> Result<(), CacheError> {
        cmd::expect_status(self.call(cmd::ping()).await?)
    }

    /// Pop an idle connection or dial a new one. The flag is true for a
    /// pooled connection.
    async fn checkout(&self) -> Result<(RespConnection, bool), CacheError> {
        let pooled = self.idle.lock().pop();
        match pooled {
            Some(conn) => Ok((conn, true)),
            None => Ok((RespConnection::connect(&self.config).await?, false)),
        }
    }

    fn checkin(&self, conn: RespConnection) {
        let mut idle = self.idle.lock();
        if idle.len() < self.config.max_idle {
            idle.push(conn);
        }
    }

    async fn call(&self, frame: BytesFrame) -> Result<BytesFrame, CacheError> {
        let (mut conn, reused) = self.checkout().await?;
        match conn.request(&frame).await {
            Ok(reply) => {
                self.checkin(conn);
                Ok(reply)
            }
            // Idle connection closed by the server since its last use
            // (restart, idle timeout); the rest of the pool is stale too.
            // Every command sent here is idempotent.
            Err(CacheError::Backend(e)) if reused => {
                tracing::debug!(error = %e, addr = %self.config.address, "pooled RESP connection is dead, retrying on a fresh one");
                self.idle.lock().clear();
                let mut conn = RespConnection::connect(&self.config).await?;
                let reply = conn.request(&frame).await?;
                self.checkin(conn);
                Ok(reply)
            }
            Err(e) => {
                tracing::debug!(error = %e, addr = %self.config.address, "RESP request failed, dropping connection");
                Err(e)
            }
        }
    }
}

#[async_trait]
impl CacheStore for RespCache {
    async fn get(&self, key: &str) -> Result<Option<Bytes>, CacheError> {
        let value = cmd::expect_bulk_or_null(self.call(cmd::get(key)).await?)?;
        match value {
            Some(_) => self.stats.record_hit(),
            None => self.stats.record_miss(),
        }
        Ok(value)
    }

    async fn set(&self, key: &str, value: Bytes, ttl: Duration) -> Result<(), CacheError> {
        check_ttl(ttl)?;
        cmd::expect_status(self.call(cmd::set_px(key, value, ttl)).await?)
    }

    async fn exists(&self, key: &str) -> Result<bool, CacheError> {
        Ok(cmd::expect_integer(self.call(cmd::exists(key)).await?)? > 0)
    }

    async fn delete(&self, key: &str) -> Result<(), CacheError> {
        cmd::expect_integer(self.call(cmd::del(key)).await?)?;
        Ok(())
    }

    async fn clear(&self) -> Result<(), CacheError> {
        cmd::expect_status(self.call(cmd::flushdb()).await?)
    }

    fn stats(&self) -> CacheStats {
        self.stats.snapshot()
    }

    fn name(&self) -> &'static str {
        "redis"
    }
}
