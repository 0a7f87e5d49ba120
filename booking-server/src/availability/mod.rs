//! Availability cache
//!
//! Read-through cache of computed available slots per (restaurant, date)
//! under `avail:{restaurant_id}:{date}`, 60s TTL. The key deliberately
//! ignores party size: most of a day's slot set is reused across party
//! sizes, and filtering a cached result is cheap. Invalidation is
//! synchronous with every commit and cancellation touching the
//! (restaurant, date), so stale windows stay short without write-through
//! complexity.

use std::sync::Arc;
use std::time::Duration;

use chrono::NaiveDate;
use tracing::warn;
use uuid::Uuid;

use shared::request::AvailabilityQuery;
use shared::response::AvailabilityResponse;

use crate::db::repository::{RepoResult, SlotRepository};
use crate::kv::{KvStore, avail_key};

#[derive(Clone)]
pub struct AvailabilityCache {
    kv: Arc<dyn KvStore>,
    slots: SlotRepository,
    ttl: Duration,
}

impl AvailabilityCache {
    pub fn new(kv: Arc<dyn KvStore>, slots: SlotRepository, ttl: Duration) -> Self {
        Self { kv, slots, ttl }
    }

    /// Availability for one (restaurant, date), filtered by party size.
    ///
    /// KV failures degrade to the ledger query. Table-group queries bypass
    /// the cache entirely: the cache key ignores the group, and cached
    /// entries carry no group id to filter on.
    pub async fn get(&self, query: &AvailabilityQuery) -> RepoResult<AvailabilityResponse> {
        let min_capacity = query.party_size.unwrap_or(1).max(1);

        if query.table_group_id.is_none() {
            if let Some(mut cached) = self.read_cache(query.restaurant_id, query.date).await {
                cached.slots.retain(|slot| slot.capacity >= min_capacity);
                return Ok(cached);
            }
        }

        // Fallback to the ledger
        let slots = self
            .slots
            .find_available(
                query.restaurant_id,
                query.date,
                min_capacity,
                query.table_group_id,
            )
            .await?;

        let response = AvailabilityResponse {
            restaurant_id: query.restaurant_id,
            date: query.date,
            slots,
        };

        if query.table_group_id.is_none() {
            self.write_cache(&response).await;
        }

        Ok(response)
    }

    /// Drop the cache entry so the next read sees the ledger. Called
    /// synchronously on every successful commit and cancellation.
    pub async fn invalidate(&self, restaurant_id: Uuid, date: NaiveDate) {
        if let Err(e) = self.kv.del(&avail_key(restaurant_id, date)).await {
            warn!(%restaurant_id, %date, error = %e, "Failed to invalidate availability cache");
        }
    }

    async fn read_cache(
        &self,
        restaurant_id: Uuid,
        date: NaiveDate,
    ) -> Option<AvailabilityResponse> {
        match self.kv.get(&avail_key(restaurant_id, date)).await {
            Ok(Some(json)) => match serde_json::from_str(&json) {
                Ok(response) => Some(response),
                Err(e) => {
                    warn!(%restaurant_id, %date, error = %e, "Discarding corrupt availability cache entry");
                    None
                }
            },
            Ok(None) => None,
            Err(e) => {
                warn!(%restaurant_id, %date, error = %e, "Availability cache unreachable, querying ledger");
                None
            }
        }
    }

    async fn write_cache(&self, response: &AvailabilityResponse) {
        let json = match serde_json::to_string(response) {
            Ok(json) => json,
            Err(_) => return,
        };
        let key = avail_key(response.restaurant_id, response.date);
        if let Err(e) = self.kv.set_ex(&key, &json, self.ttl).await {
            warn!(error = %e, "Failed to write availability cache");
        }
    }
}
