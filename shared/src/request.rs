//! API request payloads
//!
//! Wire format is camelCase, matching the diner-facing clients.

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// POST /api/inventory/hold
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct HoldRequest {
    pub slot_id: Uuid,
    pub user_id: Uuid,
}

/// POST /api/reservations
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct BookingRequest {
    pub slot_id: Uuid,
    pub user_id: Uuid,
    /// Capability credential from a prior hold. Optional: booking without
    /// a hold is legal; the ledger constraint stays the backstop.
    #[serde(default)]
    pub hold_token: Option<String>,
    pub party_size: i64,
    #[serde(default)]
    pub special_requests: Option<String>,
    #[serde(default)]
    pub payment_token: Option<String>,
    /// Fallback when the Idempotency-Key header is absent
    #[serde(default)]
    pub idempotency_key: Option<String>,
}

/// GET /api/inventory/availability query string
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AvailabilityQuery {
    pub restaurant_id: Uuid,
    pub date: NaiveDate,
    #[serde(default)]
    pub party_size: Option<i64>,
    #[serde(default)]
    pub table_group_id: Option<Uuid>,
}

/// GET /api/inventory/hold/{slot_id}/validate query string
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ValidateHoldQuery {
    pub hold_token: String,
}
