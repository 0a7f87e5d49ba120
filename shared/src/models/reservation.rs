//! Reservation Model

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Reservation lifecycle status
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[cfg_attr(feature = "db", derive(sqlx::Type))]
#[cfg_attr(feature = "db", sqlx(rename_all = "UPPERCASE"))]
#[serde(rename_all = "UPPERCASE")]
pub enum ReservationStatus {
    Confirmed,
    Cancelled,
    #[cfg_attr(feature = "db", sqlx(rename = "NO_SHOW"))]
    #[serde(rename = "NO_SHOW")]
    NoShow,
    Completed,
    Pending,
}

impl ReservationStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            ReservationStatus::Confirmed => "CONFIRMED",
            ReservationStatus::Cancelled => "CANCELLED",
            ReservationStatus::NoShow => "NO_SHOW",
            ReservationStatus::Completed => "COMPLETED",
            ReservationStatus::Pending => "PENDING",
        }
    }
}

impl std::fmt::Display for ReservationStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Deposit payment status
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[cfg_attr(feature = "db", derive(sqlx::Type))]
#[cfg_attr(feature = "db", sqlx(rename_all = "UPPERCASE"))]
#[serde(rename_all = "UPPERCASE")]
pub enum PaymentStatus {
    None,
    Pending,
    Captured,
    Refunded,
    Failed,
}

impl PaymentStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            PaymentStatus::None => "NONE",
            PaymentStatus::Pending => "PENDING",
            PaymentStatus::Captured => "CAPTURED",
            PaymentStatus::Refunded => "REFUNDED",
            PaymentStatus::Failed => "FAILED",
        }
    }
}

impl std::fmt::Display for PaymentStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Durable, authoritative record of a successful booking.
///
/// `slot_id` is unique across non-cancelled rows, enforced by a partial
/// unique index at the storage layer, the final arbiter under contention.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[cfg_attr(feature = "db", derive(sqlx::FromRow))]
pub struct Reservation {
    pub reservation_id: Uuid,
    pub user_id: Uuid,
    pub restaurant_id: Uuid,
    pub slot_id: Uuid,
    pub confirmation_code: String,
    pub party_size: i64,
    pub special_requests: Option<String>,
    pub status: ReservationStatus,
    /// Deposit in cents (integer money, converted at the payment boundary)
    pub deposit_cents: i64,
    pub payment_status: PaymentStatus,
    pub payment_intent_id: Option<String>,
    pub idempotency_key: Option<String>,
    pub booked_at: DateTime<Utc>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}
