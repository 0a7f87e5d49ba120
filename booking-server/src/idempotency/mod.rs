//! Idempotency cache (Layer 3)
//!
//! Maps a client-chosen key to the terminal response of a
//! create-reservation call under `idem:{key}`. A replay within the TTL
//! returns the identical cached response instead of re-running payment or
//! ledger side effects. Write-once-intent: the coordinator only writes
//! after computing the canonical result, so no compare-and-swap is needed.

use std::sync::Arc;
use std::time::Duration;

use shared::response::BookingResponse;
use tracing::warn;

use crate::kv::{KvStore, idem_key};

#[derive(Clone)]
pub struct IdempotencyStore {
    kv: Arc<dyn KvStore>,
    ttl: Duration,
}

impl IdempotencyStore {
    pub fn new(kv: Arc<dyn KvStore>, ttl: Duration) -> Self {
        Self { kv, ttl }
    }

    /// Look up a cached response. Store miss, corrupt payload, or an
    /// unreachable store all mean the caller proceeds with real execution.
    pub async fn check(&self, key: &str) -> Option<BookingResponse> {
        match self.kv.get(&idem_key(key)).await {
            Ok(Some(json)) => match serde_json::from_str(&json) {
                Ok(response) => Some(response),
                Err(e) => {
                    warn!(key, error = %e, "Discarding corrupt idempotency record");
                    None
                }
            },
            Ok(None) => None,
            Err(e) => {
                warn!(key, error = %e, "Idempotency store unreachable, executing for real");
                None
            }
        }
    }

    /// Cache the terminal response. Failures are logged, not fatal; the
    /// booking already succeeded.
    pub async fn put(&self, key: &str, response: &BookingResponse) {
        let json = match serde_json::to_string(response) {
            Ok(json) => json,
            Err(e) => {
                warn!(key, error = %e, "Failed to serialize idempotency record");
                return;
            }
        };
        if let Err(e) = self.kv.set_ex(&idem_key(key), &json, self.ttl).await {
            warn!(key, error = %e, "Failed to cache idempotency record");
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::kv::MemoryKvStore;
    use chrono::Utc;
    use shared::models::ReservationStatus;
    use uuid::Uuid;

    fn response() -> BookingResponse {
        BookingResponse {
            reservation_id: Uuid::new_v4(),
            confirmation_code: "ABCDEF".to_string(),
            status: ReservationStatus::Confirmed,
            restaurant_name: "Chez Test".to_string(),
            cuisine: None,
            date_time: Utc::now(),
            party_size: 2,
        }
    }

    #[tokio::test]
    async fn replay_returns_identical_response() {
        let store = IdempotencyStore::new(
            Arc::new(MemoryKvStore::new()),
            Duration::from_secs(86_400),
        );
        assert!(store.check("key-1").await.is_none());

        let original = response();
        store.put("key-1", &original).await;

        let replayed = store.check("key-1").await.expect("cached response");
        assert_eq!(replayed, original);
        // A different key is a different logical attempt
        assert!(store.check("key-2").await.is_none());
    }
}
