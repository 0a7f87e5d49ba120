//! In-memory KV store
//!
//! Lock-free map with lazy TTL expiry: an expired entry is treated as
//! absent and removed on the next touch, so no caller ever observes a key
//! past its TTL, the same observable contract the Redis store gives us.
//! Used by tests and by single-node deployments without a REDIS_URL.

use std::time::{Duration, Instant};

use async_trait::async_trait;
use dashmap::DashMap;
use dashmap::mapref::entry::Entry;

use super::{KvResult, KvStore};

#[derive(Debug)]
struct Record {
    value: String,
    expires_at: Option<Instant>,
}

impl Record {
    fn new(value: &str, ttl: Duration) -> Self {
        Self {
            value: value.to_string(),
            expires_at: Instant::now().checked_add(ttl),
        }
    }

    fn live(&self) -> bool {
        match self.expires_at {
            Some(deadline) => Instant::now() < deadline,
            None => true,
        }
    }
}

#[derive(Debug, Default)]
pub struct MemoryKvStore {
    records: DashMap<String, Record>,
}

impl MemoryKvStore {
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl KvStore for MemoryKvStore {
    async fn set_nx_ex(&self, key: &str, value: &str, ttl: Duration) -> KvResult<bool> {
        // The entry API holds the shard lock, making check-then-write atomic
        match self.records.entry(key.to_string()) {
            Entry::Occupied(mut occupied) => {
                if occupied.get().live() {
                    Ok(false)
                } else {
                    occupied.insert(Record::new(value, ttl));
                    Ok(true)
                }
            }
            Entry::Vacant(vacant) => {
                vacant.insert(Record::new(value, ttl));
                Ok(true)
            }
        }
    }

    async fn set_ex(&self, key: &str, value: &str, ttl: Duration) -> KvResult<()> {
        self.records.insert(key.to_string(), Record::new(value, ttl));
        Ok(())
    }

    async fn get(&self, key: &str) -> KvResult<Option<String>> {
        if let Some(record) = self.records.get(key) {
            if record.live() {
                return Ok(Some(record.value.clone()));
            }
        }
        // Reap the dead entry (re-checked under the shard lock)
        self.records.remove_if(key, |_, record| !record.live());
        Ok(None)
    }

    async fn del(&self, key: &str) -> KvResult<()> {
        self.records.remove(key);
        Ok(())
    }

    async fn expire(&self, key: &str, ttl: Duration) -> KvResult<()> {
        if let Some(mut record) = self.records.get_mut(key) {
            if record.live() {
                record.expires_at = Instant::now().checked_add(ttl);
            }
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn set_nx_is_exclusive() {
        let kv = MemoryKvStore::new();
        let ttl = Duration::from_secs(60);
        assert!(kv.set_nx_ex("k", "a", ttl).await.unwrap());
        assert!(!kv.set_nx_ex("k", "b", ttl).await.unwrap());
        assert_eq!(kv.get("k").await.unwrap().as_deref(), Some("a"));
    }

    #[tokio::test]
    async fn expired_key_is_absent_and_reclaimable() {
        let kv = MemoryKvStore::new();
        assert!(
            kv.set_nx_ex("k", "a", Duration::from_millis(20))
                .await
                .unwrap()
        );
        tokio::time::sleep(Duration::from_millis(50)).await;
        assert_eq!(kv.get("k").await.unwrap(), None);
        // The slot is free again for a different writer
        assert!(
            kv.set_nx_ex("k", "b", Duration::from_secs(60))
                .await
                .unwrap()
        );
    }

    #[tokio::test]
    async fn del_is_idempotent() {
        let kv = MemoryKvStore::new();
        kv.del("missing").await.unwrap();
        kv.set_ex("k", "v", Duration::from_secs(60)).await.unwrap();
        kv.del("k").await.unwrap();
        kv.del("k").await.unwrap();
        assert_eq!(kv.get("k").await.unwrap(), None);
    }

    #[tokio::test]
    async fn expire_refreshes_a_live_key() {
        let kv = MemoryKvStore::new();
        kv.set_ex("k", "v", Duration::from_millis(30)).await.unwrap();
        kv.expire("k", Duration::from_secs(60)).await.unwrap();
        tokio::time::sleep(Duration::from_millis(60)).await;
        assert_eq!(kv.get("k").await.unwrap().as_deref(), Some("v"));
    }
}
