//! Reservation Repository (the ledger core)
//!
//! `commit_reservation` is the single atomic transaction that makes a
//! booking durable. The partial unique index on `reservations.slot_id`
//! is the final arbiter between concurrent commit attempts: the hold
//! layer only reduces how often two requests get this far, it is never
//! trusted for correctness (a client may skip holds entirely).

use chrono::Utc;
use shared::models::{PaymentStatus, Reservation, ReservationStatus, SlotStatus, TimeSlot};
use shared::response::BookingResponse;
use sqlx::SqlitePool;
use tracing::{info, warn};
use uuid::Uuid;

use super::{RepoError, RepoResult};
use crate::booking::confirmation;

/// Attempts before giving up on confirmation-code collisions. With a
/// 32^6 code space this fires essentially never, but it is handled, not
/// assumed away.
const CODE_ATTEMPTS: u32 = 5;

/// Input for a commit attempt
#[derive(Debug, Clone)]
pub struct NewReservation {
    pub user_id: Uuid,
    pub slot_id: Uuid,
    pub party_size: i64,
    pub special_requests: Option<String>,
    pub deposit_cents: i64,
    pub payment_status: PaymentStatus,
    pub payment_intent_id: Option<String>,
    pub idempotency_key: Option<String>,
}

/// Outcome of a commit attempt. Losing the slot race is an expected
/// result under contention, not an error.
#[derive(Debug)]
pub enum CommitOutcome {
    Created {
        reservation: Reservation,
        slot: TimeSlot,
    },
    /// Another transaction committed the slot first
    Conflict,
    /// The referenced slot does not exist
    SlotMissing,
}

/// Outcome of a cancellation
#[derive(Debug)]
pub enum CancelOutcome {
    Cancelled {
        reservation: Reservation,
        slot: Option<TimeSlot>,
    },
    AlreadyCancelled,
    NotFound,
}

const RESERVATION_COLUMNS: &str = "reservation_id, user_id, restaurant_id, slot_id, \
     confirmation_code, party_size, special_requests, status, deposit_cents, \
     payment_status, payment_intent_id, idempotency_key, booked_at, created_at, updated_at";

#[derive(Clone)]
pub struct ReservationRepository {
    pool: SqlitePool,
}

impl ReservationRepository {
    pub fn new(pool: SqlitePool) -> Self {
        Self { pool }
    }

    /// Commit a reservation under the slot uniqueness constraint.
    ///
    /// The slot lookup happens before the transaction so the transaction's
    /// first statement is a write; SQLite then queues competing writers on
    /// busy_timeout instead of failing lock upgrades.
    pub async fn commit_reservation(&self, new: NewReservation) -> RepoResult<CommitOutcome> {
        let Some(slot) = self.find_slot(new.slot_id).await? else {
            return Ok(CommitOutcome::SlotMissing);
        };

        for _ in 0..CODE_ATTEMPTS {
            let code = confirmation::generate_code();
            let now = Utc::now();
            let reservation = Reservation {
                reservation_id: Uuid::new_v4(),
                user_id: new.user_id,
                restaurant_id: slot.restaurant_id,
                slot_id: new.slot_id,
                confirmation_code: code,
                party_size: new.party_size,
                special_requests: new.special_requests.clone(),
                status: ReservationStatus::Confirmed,
                deposit_cents: new.deposit_cents,
                payment_status: new.payment_status,
                payment_intent_id: new.payment_intent_id.clone(),
                idempotency_key: new.idempotency_key.clone(),
                booked_at: now,
                created_at: now,
                updated_at: now,
            };

            let mut tx = self.pool.begin().await?;

            let inserted = sqlx::query(
                "INSERT INTO reservations (reservation_id, user_id, restaurant_id, slot_id, \
                     confirmation_code, party_size, special_requests, status, deposit_cents, \
                     payment_status, payment_intent_id, idempotency_key, booked_at, created_at, updated_at) \
                 VALUES (?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?)",
            )
            .bind(reservation.reservation_id)
            .bind(reservation.user_id)
            .bind(reservation.restaurant_id)
            .bind(reservation.slot_id)
            .bind(&reservation.confirmation_code)
            .bind(reservation.party_size)
            .bind(&reservation.special_requests)
            .bind(reservation.status)
            .bind(reservation.deposit_cents)
            .bind(reservation.payment_status)
            .bind(&reservation.payment_intent_id)
            .bind(&reservation.idempotency_key)
            .bind(reservation.booked_at)
            .bind(reservation.created_at)
            .bind(reservation.updated_at)
            .execute(&mut *tx)
            .await;

            match inserted {
                Ok(_) => {}
                Err(sqlx::Error::Database(db_err)) if db_err.is_unique_violation() => {
                    let message = db_err.message().to_string();
                    tx.rollback().await.ok();
                    if message.contains("confirmation_code") {
                        // Code collision: regenerate and retry
                        warn!(slot_id = %new.slot_id, "Confirmation code collision, regenerating");
                        continue;
                    }
                    // slot_id index: another transaction won the race
                    return Ok(CommitOutcome::Conflict);
                }
                Err(e) => {
                    tx.rollback().await.ok();
                    return Err(e.into());
                }
            }

            sqlx::query(
                "UPDATE time_slots SET status = ?, held_by = NULL, held_until = NULL \
                 WHERE slot_id = ?",
            )
            .bind(SlotStatus::Booked)
            .bind(new.slot_id)
            .execute(&mut *tx)
            .await
            .map_err(RepoError::from)?;

            tx.commit().await?;

            info!(
                reservation_id = %reservation.reservation_id,
                slot_id = %new.slot_id,
                "Reservation committed"
            );
            return Ok(CommitOutcome::Created { reservation, slot });
        }

        Err(RepoError::Database(
            "could not generate a unique confirmation code".to_string(),
        ))
    }

    /// Cancel a reservation: flip the reservation to CANCELLED and the slot
    /// back to AVAILABLE in one transaction. Refunds are the coordinator's
    /// concern (external call, not transactional with this change).
    pub async fn cancel(&self, reservation_id: Uuid) -> RepoResult<CancelOutcome> {
        let Some(mut reservation) = self.find_by_id(reservation_id).await? else {
            return Ok(CancelOutcome::NotFound);
        };
        if reservation.status == ReservationStatus::Cancelled {
            return Ok(CancelOutcome::AlreadyCancelled);
        }

        let slot = self.find_slot(reservation.slot_id).await?;
        let now = Utc::now();

        let mut tx = self.pool.begin().await?;
        sqlx::query("UPDATE reservations SET status = ?, updated_at = ? WHERE reservation_id = ?")
            .bind(ReservationStatus::Cancelled)
            .bind(now)
            .bind(reservation_id)
            .execute(&mut *tx)
            .await
            .map_err(RepoError::from)?;
        if slot.is_some() {
            sqlx::query(
                "UPDATE time_slots SET status = ?, held_by = NULL, held_until = NULL \
                 WHERE slot_id = ?",
            )
            .bind(SlotStatus::Available)
            .bind(reservation.slot_id)
            .execute(&mut *tx)
            .await
            .map_err(RepoError::from)?;
        }
        tx.commit().await?;

        reservation.status = ReservationStatus::Cancelled;
        reservation.updated_at = now;
        info!(%reservation_id, "Reservation cancelled");
        Ok(CancelOutcome::Cancelled { reservation, slot })
    }

    /// Flip the payment status after a refund was issued
    pub async fn mark_refunded(&self, reservation_id: Uuid) -> RepoResult<()> {
        sqlx::query(
            "UPDATE reservations SET payment_status = ?, updated_at = ? WHERE reservation_id = ?",
        )
        .bind(PaymentStatus::Refunded)
        .bind(Utc::now())
        .bind(reservation_id)
        .execute(&self.pool)
        .await?;
        Ok(())
    }

    /// Find reservation by id
    pub async fn find_by_id(&self, reservation_id: Uuid) -> RepoResult<Option<Reservation>> {
        let reservation = sqlx::query_as::<_, Reservation>(&format!(
            "SELECT {RESERVATION_COLUMNS} FROM reservations WHERE reservation_id = ?"
        ))
        .bind(reservation_id)
        .fetch_optional(&self.pool)
        .await?;
        Ok(reservation)
    }

    /// Reservation detail joined for display, by id
    pub async fn find_response_by_id(
        &self,
        reservation_id: Uuid,
    ) -> RepoResult<Option<BookingResponse>> {
        let row = sqlx::query_as::<_, BookingRow>(&format!(
            "{BOOKING_ROW_QUERY} WHERE r.reservation_id = ?"
        ))
        .bind(reservation_id)
        .fetch_optional(&self.pool)
        .await?;
        Ok(row.map(BookingRow::into_response))
    }

    /// Reservation detail joined for display, by confirmation code
    pub async fn find_response_by_code(&self, code: &str) -> RepoResult<Option<BookingResponse>> {
        let row = sqlx::query_as::<_, BookingRow>(&format!(
            "{BOOKING_ROW_QUERY} WHERE r.confirmation_code = ?"
        ))
        .bind(code)
        .fetch_optional(&self.pool)
        .await?;
        Ok(row.map(BookingRow::into_response))
    }

    /// All reservations of a user, newest first
    pub async fn list_for_user(&self, user_id: Uuid) -> RepoResult<Vec<BookingResponse>> {
        let rows = sqlx::query_as::<_, BookingRow>(&format!(
            "{BOOKING_ROW_QUERY} WHERE r.user_id = ? ORDER BY r.created_at DESC"
        ))
        .bind(user_id)
        .fetch_all(&self.pool)
        .await?;
        Ok(rows.into_iter().map(BookingRow::into_response).collect())
    }

    async fn find_slot(&self, slot_id: Uuid) -> RepoResult<Option<TimeSlot>> {
        let slot = sqlx::query_as::<_, TimeSlot>(
            "SELECT slot_id, restaurant_id, table_id, table_group_id, start_time, end_time, \
                    date, status, capacity, held_by, held_until \
             FROM time_slots WHERE slot_id = ?",
        )
        .bind(slot_id)
        .fetch_optional(&self.pool)
        .await?;
        Ok(slot)
    }
}

const BOOKING_ROW_QUERY: &str = "SELECT r.reservation_id, r.confirmation_code, r.status, \
            rest.name AS restaurant_name, rest.cuisine, ts.start_time, r.booked_at, r.party_size \
     FROM reservations r \
     JOIN restaurants rest ON rest.restaurant_id = r.restaurant_id \
     LEFT JOIN time_slots ts ON ts.slot_id = r.slot_id";

/// Joined row backing the display projections
#[derive(sqlx::FromRow)]
struct BookingRow {
    reservation_id: Uuid,
    confirmation_code: String,
    status: ReservationStatus,
    restaurant_name: String,
    cuisine: Option<String>,
    start_time: Option<chrono::DateTime<Utc>>,
    booked_at: chrono::DateTime<Utc>,
    party_size: i64,
}

impl BookingRow {
    fn into_response(self) -> BookingResponse {
        BookingResponse {
            reservation_id: self.reservation_id,
            confirmation_code: self.confirmation_code,
            status: self.status,
            restaurant_name: self.restaurant_name,
            cuisine: self.cuisine,
            // A slot can be pruned by retention; fall back to booking time
            date_time: self.start_time.unwrap_or(self.booked_at),
            party_size: self.party_size,
        }
    }
}
