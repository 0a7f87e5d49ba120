//! Advisory hold protocol (Layer 1)
//!
//! A hold is a short-lived, advisory claim on a slot, stored under
//! `hold:{slot_id}` with value `{user_id}:{token}` and a hard TTL. It
//! reduces contention before the ledger, but is never relied on for
//! correctness: the ledger's unique constraint stays the final arbiter.
//!
//! Failure posture when the KV store is unreachable:
//! - acquire denies (never risk handing out two holds)
//! - release logs and returns (TTL will reap the key)
//! - validate surfaces the error so the coordinator can degrade gracefully

use std::sync::Arc;
use std::time::Duration;

use chrono::{DateTime, Utc};
use tracing::{info, warn};
use uuid::Uuid;

use crate::kv::{KvResult, KvStore, hold_key};
use crate::services::EventPublisher;
use shared::event::BookingEvent;

/// Result of an acquire attempt. Denied covers both "held by someone
/// else" and "store unreachable"; callers cannot tell them apart, by
/// contract.
#[derive(Debug, Clone)]
pub enum HoldOutcome {
    Acquired {
        token: String,
        expires_at: DateTime<Utc>,
    },
    Denied,
}

#[derive(Clone)]
pub struct HoldStore {
    kv: Arc<dyn KvStore>,
    events: EventPublisher,
    ttl: Duration,
}

impl HoldStore {
    pub fn new(kv: Arc<dyn KvStore>, events: EventPublisher, ttl: Duration) -> Self {
        Self { kv, events, ttl }
    }

    pub fn ttl(&self) -> Duration {
        self.ttl
    }

    /// Attempt to acquire (or refresh) the hold on a slot.
    ///
    /// At most one hold exists per slot at any instant: the create is an
    /// atomic set-if-absent. A repeated acquire by the owner refreshes the
    /// TTL and returns the existing token, so a client's retried hold
    /// request is not punished.
    pub async fn acquire(&self, slot_id: Uuid, user_id: Uuid) -> HoldOutcome {
        self.acquire_with_ttl(slot_id, user_id, self.ttl).await
    }

    /// Same as [`acquire`](Self::acquire) with an explicit TTL.
    pub async fn acquire_with_ttl(
        &self,
        slot_id: Uuid,
        user_id: Uuid,
        ttl: Duration,
    ) -> HoldOutcome {
        let key = hold_key(slot_id);
        let token = Uuid::new_v4().simple().to_string();
        let value = format!("{user_id}:{token}");

        match self.kv.set_nx_ex(&key, &value, ttl).await {
            Ok(true) => {
                let expires_at = expiry(ttl);
                info!(%slot_id, %user_id, ttl_secs = ttl.as_secs(), "Hold acquired");
                self.events.publish(BookingEvent::SlotHeld {
                    slot_id,
                    user_id,
                    expires_at,
                });
                HoldOutcome::Acquired { token, expires_at }
            }
            Ok(false) => self.try_refresh(slot_id, user_id, ttl).await,
            Err(e) => {
                // Deny rather than risk double-acquisition
                warn!(%slot_id, error = %e, "Hold store unreachable, denying hold");
                HoldOutcome::Denied
            }
        }
    }

    /// The key already exists: if it belongs to the same user, refresh the
    /// TTL and hand back the stored token.
    async fn try_refresh(&self, slot_id: Uuid, user_id: Uuid, ttl: Duration) -> HoldOutcome {
        let key = hold_key(slot_id);
        match self.kv.get(&key).await {
            Ok(Some(existing)) => {
                match existing.split_once(':') {
                    Some((owner, stored_token)) if owner == user_id.to_string() => {
                        if let Err(e) = self.kv.expire(&key, ttl).await {
                            warn!(%slot_id, error = %e, "Failed to refresh hold TTL");
                            return HoldOutcome::Denied;
                        }
                        let expires_at = expiry(ttl);
                        info!(%slot_id, %user_id, "Hold refreshed for same user");
                        self.events.publish(BookingEvent::SlotHeld {
                            slot_id,
                            user_id,
                            expires_at,
                        });
                        HoldOutcome::Acquired {
                            token: stored_token.to_string(),
                            expires_at,
                        }
                    }
                    _ => {
                        info!(%slot_id, "Hold denied - already held by another user");
                        HoldOutcome::Denied
                    }
                }
            }
            // Expired between the conditional write and the read; the
            // client simply retries
            Ok(None) => HoldOutcome::Denied,
            Err(e) => {
                warn!(%slot_id, error = %e, "Hold store unreachable, denying hold");
                HoldOutcome::Denied
            }
        }
    }

    /// Compare the supplied token against the stored one.
    ///
    /// `Ok(false)` covers an absent key (expired or never existed) and a
    /// token mismatch. An `Err` means the store could not be reached; the
    /// coordinator decides whether to degrade.
    pub async fn validate(&self, slot_id: Uuid, token: &str) -> KvResult<bool> {
        let value = self.kv.get(&hold_key(slot_id)).await?;
        Ok(match value {
            // Value format is {user_id}:{token}
            Some(stored) => stored
                .rsplit_once(':')
                .is_some_and(|(_, stored_token)| stored_token == token),
            None => false,
        })
    }

    /// Unconditionally delete the hold. Idempotent; failures are logged
    /// and swallowed; the TTL reaps the key either way.
    pub async fn release(&self, slot_id: Uuid) {
        match self.kv.del(&hold_key(slot_id)).await {
            Ok(()) => info!(%slot_id, "Hold released"),
            Err(e) => warn!(%slot_id, error = %e, "Failed to release hold"),
        }
    }
}

fn expiry(ttl: Duration) -> DateTime<Utc> {
    Utc::now() + chrono::Duration::from_std(ttl).unwrap_or_else(|_| chrono::Duration::seconds(300))
}
