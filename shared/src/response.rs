//! API response payloads

use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::models::ReservationStatus;

/// Successful hold acquisition
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct HoldResponse {
    pub hold_token: String,
    pub expires_at: DateTime<Utc>,
    pub slot_id: Uuid,
}

/// Reservation detail returned by create / lookup endpoints
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct BookingResponse {
    pub reservation_id: Uuid,
    pub confirmation_code: String,
    pub status: ReservationStatus,
    pub restaurant_name: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub cuisine: Option<String>,
    pub date_time: DateTime<Utc>,
    pub party_size: i64,
}

/// One available slot, joined with its table for display
#[derive(Debug, Clone, Serialize, Deserialize)]
#[cfg_attr(feature = "db", derive(sqlx::FromRow))]
#[serde(rename_all = "camelCase")]
pub struct AvailableSlotDetail {
    pub slot_id: Uuid,
    pub start_time: DateTime<Utc>,
    pub end_time: DateTime<Utc>,
    pub table_number: String,
    pub table_group_name: Option<String>,
    pub capacity: i64,
}

/// GET /api/inventory/availability
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AvailabilityResponse {
    pub restaurant_id: Uuid,
    pub date: NaiveDate,
    pub slots: Vec<AvailableSlotDetail>,
}
