//! TTL key/value stores for the weather pipeline.
//!
//! Two interchangeable [`CacheStore`] implementations: [`MemoryCache`] keeps
//! entries in-process, [`RespCache`] talks RESP2 to a Redis-compatible server.
//! Both count hits and misses per instance.

pub mod memory;
pub mod resp;
pub mod stats;
pub mod traits;

pub use memory::MemoryCache;
pub use resp::{RespCache, RespConfig};
pub use traits::{CacheError, CacheStats, CacheStore};
