//! Domain events
//!
//! Published fire-and-forget by the booking server; consumers (dashboards,
//! notification workers) assume at-least-once delivery. The server never
//! blocks on, or retries, a publish.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Typed booking domain event
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum BookingEvent {
    SlotHeld {
        slot_id: Uuid,
        user_id: Uuid,
        expires_at: DateTime<Utc>,
    },
    SlotReleased {
        slot_id: Uuid,
        reason: Option<String>,
    },
    ReservationCreated {
        reservation_id: Uuid,
        user_id: Uuid,
        restaurant_id: Uuid,
        slot_id: Uuid,
        confirmation_code: String,
        start_time: DateTime<Utc>,
        party_size: i64,
    },
    ReservationCancelled {
        reservation_id: Uuid,
        user_id: Uuid,
        restaurant_id: Uuid,
        slot_id: Uuid,
        reason: Option<String>,
    },
}

impl BookingEvent {
    /// Event name for logging / routing
    pub fn name(&self) -> &'static str {
        match self {
            BookingEvent::SlotHeld { .. } => "slot_held",
            BookingEvent::SlotReleased { .. } => "slot_released",
            BookingEvent::ReservationCreated { .. } => "reservation_created",
            BookingEvent::ReservationCancelled { .. } => "reservation_cancelled",
        }
    }
}
