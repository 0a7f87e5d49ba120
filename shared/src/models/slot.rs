//! Time Slot Model

use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Slot lifecycle status.
///
/// `Held` is advisory only; the KV hold store, not this column, is
/// authoritative for hold state (holds must expire without a transaction).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[cfg_attr(feature = "db", derive(sqlx::Type))]
#[cfg_attr(feature = "db", sqlx(rename_all = "UPPERCASE"))]
#[serde(rename_all = "UPPERCASE")]
pub enum SlotStatus {
    Available,
    Held,
    Booked,
}

impl SlotStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            SlotStatus::Available => "AVAILABLE",
            SlotStatus::Held => "HELD",
            SlotStatus::Booked => "BOOKED",
        }
    }
}

impl std::fmt::Display for SlotStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// One bookable (table, time-window) pair for one restaurant on one date
#[derive(Debug, Clone, Serialize, Deserialize)]
#[cfg_attr(feature = "db", derive(sqlx::FromRow))]
pub struct TimeSlot {
    pub slot_id: Uuid,
    pub restaurant_id: Uuid,
    pub table_id: Uuid,
    pub table_group_id: Option<Uuid>,
    pub start_time: DateTime<Utc>,
    pub end_time: DateTime<Utc>,
    /// Derived from `start_time`, kept as a column for partitioned lookup
    pub date: NaiveDate,
    pub status: SlotStatus,
    pub capacity: i64,
    /// Advisory only, see [`SlotStatus`]
    pub held_by: Option<Uuid>,
    pub held_until: Option<DateTime<Utc>>,
}
