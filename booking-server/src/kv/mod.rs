//! Key-value store seam
//!
//! The hold protocol, the idempotency cache and the availability cache all
//! live in one external KV service under distinct namespaces. The trait
//! keeps every consumer dependency-injected (no process-wide registries)
//! and lets tests and single-node deployments run against the in-memory
//! twin instead of Redis.
//!
//! # Key namespaces (operational contract, preserved for admin inspection)
//!
//! | 前缀 | 用途 |
//! |------|------|
//! | `hold:{slot_id}` | 槽位占用 (advisory hold) |
//! | `idem:{key}` | 幂等键缓存 |
//! | `avail:{restaurant_id}:{date}` | 可用性缓存 |

use std::time::Duration;

use async_trait::async_trait;
use chrono::NaiveDate;
use thiserror::Error;
use uuid::Uuid;

pub mod memory;
pub mod redis;

pub use memory::MemoryKvStore;
pub use redis::RedisKvStore;

/// KV store error types
#[derive(Debug, Error)]
pub enum KvError {
    #[error("KV store unavailable: {0}")]
    Unavailable(String),
}

/// Result type for KV operations
pub type KvResult<T> = Result<T, KvError>;

/// Minimal contract the booking protocols need from the shared KV service.
///
/// TTL expiry is the store's own responsibility: no caller may observe a
/// key after its TTL elapses, and there is no application-tier sweeper.
#[async_trait]
pub trait KvStore: Send + Sync {
    /// Atomic create-if-absent with TTL. Returns `true` when the key was written.
    async fn set_nx_ex(&self, key: &str, value: &str, ttl: Duration) -> KvResult<bool>;

    /// Unconditional write with TTL.
    async fn set_ex(&self, key: &str, value: &str, ttl: Duration) -> KvResult<()>;

    async fn get(&self, key: &str) -> KvResult<Option<String>>;

    /// Delete a key. Deleting an absent key is not an error.
    async fn del(&self, key: &str) -> KvResult<()>;

    /// Reset the TTL of an existing key.
    async fn expire(&self, key: &str, ttl: Duration) -> KvResult<()>;
}

// ── Namespaced key builders ─────────────────────────────────────────

pub fn hold_key(slot_id: Uuid) -> String {
    format!("hold:{slot_id}")
}

pub fn idem_key(key: &str) -> String {
    format!("idem:{key}")
}

pub fn avail_key(restaurant_id: Uuid, date: NaiveDate) -> String {
    format!("avail:{restaurant_id}:{date}")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn key_namespaces_are_stable() {
        let slot = Uuid::nil();
        assert_eq!(
            hold_key(slot),
            "hold:00000000-0000-0000-0000-000000000000"
        );
        assert_eq!(idem_key("abc"), "idem:abc");
        let date = NaiveDate::from_ymd_opt(2025, 3, 14).unwrap();
        assert_eq!(
            avail_key(slot, date),
            "avail:00000000-0000-0000-0000-000000000000:2025-03-14"
        );
    }
}
