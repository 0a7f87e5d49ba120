//! Redis-backed KV store
//!
//! Production implementation over a [`redis::aio::ConnectionManager`],
//! which reconnects transparently. The conditional hold write maps to a
//! single `SET key value NX EX ttl` command.

use std::time::Duration;

use async_trait::async_trait;
use redis::AsyncCommands;
use redis::aio::ConnectionManager;

use super::{KvError, KvResult, KvStore};

#[derive(Clone)]
pub struct RedisKvStore {
    conn: ConnectionManager,
}

impl RedisKvStore {
    /// Connect to Redis at `url` (e.g. `redis://127.0.0.1:6379`).
    pub async fn connect(url: &str) -> KvResult<Self> {
        let client = redis::Client::open(url)
            .map_err(|e| KvError::Unavailable(format!("invalid Redis URL: {e}")))?;
        let conn = ConnectionManager::new(client)
            .await
            .map_err(|e| KvError::Unavailable(format!("failed to connect to Redis: {e}")))?;
        tracing::info!("Redis connection established");
        Ok(Self { conn })
    }
}

fn unavailable(e: redis::RedisError) -> KvError {
    KvError::Unavailable(e.to_string())
}

#[async_trait]
impl KvStore for RedisKvStore {
    async fn set_nx_ex(&self, key: &str, value: &str, ttl: Duration) -> KvResult<bool> {
        let mut conn = self.conn.clone();
        // SET NX EX replies OK on success, nil when the key already exists
        let reply: Option<String> = redis::cmd("SET")
            .arg(key)
            .arg(value)
            .arg("NX")
            .arg("EX")
            .arg(ttl.as_secs().max(1))
            .query_async(&mut conn)
            .await
            .map_err(unavailable)?;
        Ok(reply.is_some())
    }

    async fn set_ex(&self, key: &str, value: &str, ttl: Duration) -> KvResult<()> {
        let mut conn = self.conn.clone();
        let _: () = conn
            .set_ex(key, value, ttl.as_secs().max(1))
            .await
            .map_err(unavailable)?;
        Ok(())
    }

    async fn get(&self, key: &str) -> KvResult<Option<String>> {
        let mut conn = self.conn.clone();
        conn.get(key).await.map_err(unavailable)
    }

    async fn del(&self, key: &str) -> KvResult<()> {
        let mut conn = self.conn.clone();
        let _: () = conn.del(key).await.map_err(unavailable)?;
        Ok(())
    }

    async fn expire(&self, key: &str, ttl: Duration) -> KvResult<()> {
        let mut conn = self.conn.clone();
        let _: () = conn
            .expire(key, ttl.as_secs().max(1) as i64)
            .await
            .map_err(unavailable)?;
        Ok(())
    }
}
