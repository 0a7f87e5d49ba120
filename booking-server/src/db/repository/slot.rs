//! Time Slot Repository

use chrono::NaiveDate;
use shared::models::TimeSlot;
use shared::response::AvailableSlotDetail;
use sqlx::SqlitePool;
use uuid::Uuid;

use super::RepoResult;

const SLOT_COLUMNS: &str = "slot_id, restaurant_id, table_id, table_group_id, \
     start_time, end_time, date, status, capacity, held_by, held_until";

#[derive(Clone)]
pub struct SlotRepository {
    pool: SqlitePool,
}

impl SlotRepository {
    pub fn new(pool: SqlitePool) -> Self {
        Self { pool }
    }

    /// Find slot by id
    pub async fn find_by_id(&self, slot_id: Uuid) -> RepoResult<Option<TimeSlot>> {
        let slot = sqlx::query_as::<_, TimeSlot>(&format!(
            "SELECT {SLOT_COLUMNS} FROM time_slots WHERE slot_id = ?"
        ))
        .bind(slot_id)
        .fetch_optional(&self.pool)
        .await?;
        Ok(slot)
    }

    /// Available slots for one restaurant and date, joined with their
    /// tables for display. `min_capacity` filters out tables too small for
    /// the party.
    pub async fn find_available(
        &self,
        restaurant_id: Uuid,
        date: NaiveDate,
        min_capacity: i64,
        table_group_id: Option<Uuid>,
    ) -> RepoResult<Vec<AvailableSlotDetail>> {
        let base = "SELECT ts.slot_id, ts.start_time, ts.end_time, \
                    dt.table_number, tg.name AS table_group_name, ts.capacity \
             FROM time_slots ts \
             JOIN dining_tables dt ON dt.table_id = ts.table_id \
             LEFT JOIN table_groups tg ON tg.table_group_id = ts.table_group_id \
             WHERE ts.restaurant_id = ? AND ts.date = ? \
               AND ts.status = 'AVAILABLE' AND ts.capacity >= ?";

        let slots = match table_group_id {
            Some(group_id) => {
                let sql = format!("{base} AND ts.table_group_id = ? ORDER BY ts.start_time");
                sqlx::query_as::<_, AvailableSlotDetail>(&sql)
                    .bind(restaurant_id)
                    .bind(date)
                    .bind(min_capacity)
                    .bind(group_id)
                    .fetch_all(&self.pool)
                    .await?
            }
            None => {
                let sql = format!("{base} ORDER BY ts.start_time");
                sqlx::query_as::<_, AvailableSlotDetail>(&sql)
                    .bind(restaurant_id)
                    .bind(date)
                    .bind(min_capacity)
                    .fetch_all(&self.pool)
                    .await?
            }
        };
        Ok(slots)
    }
}
