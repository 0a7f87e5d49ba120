//! BookingCoordinator - End-to-end request orchestration
//!
//! # Booking Flow
//!
//! ```text
//! create_reservation(request, key)
//!     ├─ 1. Validate input (before any store call)
//!     ├─ 2. Idempotency check (on hit: return cached response, run nothing else)
//!     ├─ 3. Validate hold token (skip on KV infrastructure failure)
//!     ├─ 4. Charge deposit via payment collaborator
//!     ├─ 5. Ledger commit under the slot unique constraint
//!     │      ├─ Conflict  → refund (best-effort) → 409
//!     │      └─ NoSlot    → refund (best-effort) → 404
//!     ├─ 6. Cache idempotent response (24h)
//!     ├─ 7. Release hold (cleanup)
//!     ├─ 8. Invalidate availability cache for (restaurant, date)
//!     ├─ 9. Publish ReservationCreated (fire-and-forget)
//!     └─ 10. Return response
//! ```
//!
//! There is no retry loop inside a single call; retries are the client's
//! responsibility, made safe by the idempotency layer.

use std::sync::Arc;

use rust_decimal::Decimal;
use tracing::{error, info, warn};
use uuid::Uuid;

use shared::event::BookingEvent;
use shared::models::PaymentStatus;
use shared::request::BookingRequest;
use shared::response::BookingResponse;

use crate::availability::AvailabilityCache;
use crate::db::repository::{
    CancelOutcome, CommitOutcome, NewReservation, ReservationRepository, RestaurantRepository,
};
use crate::holds::HoldStore;
use crate::idempotency::IdempotencyStore;
use crate::services::payment::{ChargeRequest, RefundRequest};
use crate::services::{EventPublisher, PaymentGateway};
use crate::utils::validation::{validate_booking_request, validate_idempotency_key};
use crate::utils::{AppError, AppResult};

/// Result of a cancellation request
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CancelResult {
    Cancelled,
    /// Cancelling twice is a no-op success
    AlreadyCancelled,
}

#[derive(Clone)]
pub struct BookingCoordinator {
    reservations: ReservationRepository,
    restaurants: RestaurantRepository,
    holds: HoldStore,
    idempotency: IdempotencyStore,
    availability: AvailabilityCache,
    payment: Arc<dyn PaymentGateway>,
    events: EventPublisher,
    deposit_cents: i64,
}

impl BookingCoordinator {
    #[allow(clippy::too_many_arguments)]
    pub fn new(
        reservations: ReservationRepository,
        restaurants: RestaurantRepository,
        holds: HoldStore,
        idempotency: IdempotencyStore,
        availability: AvailabilityCache,
        payment: Arc<dyn PaymentGateway>,
        events: EventPublisher,
        deposit_cents: i64,
    ) -> Self {
        Self {
            reservations,
            restaurants,
            holds,
            idempotency,
            availability,
            payment,
            events,
            deposit_cents,
        }
    }

    /// Create a reservation. `header_key` is the Idempotency-Key header;
    /// the request-body key is the fallback.
    pub async fn create_reservation(
        &self,
        request: BookingRequest,
        header_key: Option<String>,
    ) -> AppResult<BookingResponse> {
        validate_booking_request(&request)?;

        let idempotency_key = header_key.or_else(|| request.idempotency_key.clone());
        if let Some(key) = &idempotency_key {
            validate_idempotency_key(key)?;

            // ── Layer 3: idempotency short-circuit ──────────────────
            // The only branch allowed to skip everything: re-running
            // payment or commit on a retried request is the exact bug
            // this layer exists to prevent.
            if let Some(cached) = self.idempotency.check(key).await {
                info!(key = %key, "Idempotency hit, returning cached response");
                return Ok(cached);
            }
        }

        // ── Layer 1: hold validation ────────────────────────────────
        if let Some(token) = &request.hold_token {
            match self.holds.validate(request.slot_id, token).await {
                Ok(true) => {}
                Ok(false) => {
                    return Err(AppError::conflict(
                        "Hold is no longer valid. Please try again.",
                    ));
                }
                // Graceful degradation: the ledger constraint remains the
                // backstop when the hold store cannot be reached
                Err(e) => {
                    warn!(
                        slot_id = %request.slot_id, error = %e,
                        "Could not validate hold, proceeding without validation"
                    );
                }
            }
        }

        // ── Charge deposit ──────────────────────────────────────────
        let mut payment_intent_id: Option<String> = None;
        let mut deposit_cents = 0i64;
        let mut payment_status = PaymentStatus::None;

        if let Some(token) = &request.payment_token {
            let charge = self
                .payment
                .charge(ChargeRequest {
                    amount: Decimal::new(self.deposit_cents, 2),
                    currency: "usd".to_string(),
                    payment_token: token.clone(),
                    idempotency_key: idempotency_key.clone(),
                    description: Some(format!(
                        "Deposit for reservation at slot {}",
                        request.slot_id
                    )),
                })
                .await;
            match charge {
                Ok(response) => {
                    payment_intent_id = Some(response.payment_intent_id);
                    deposit_cents = self.deposit_cents;
                    payment_status = PaymentStatus::Captured;
                }
                // Nothing was committed yet, so failing here needs no
                // compensating action
                Err(e) => {
                    error!(slot_id = %request.slot_id, error = %e, "Payment failed");
                    return Err(AppError::PaymentFailed(e.to_string()));
                }
            }
        }

        // ── Layer 2: ledger commit under the unique constraint ──────
        let outcome = self
            .reservations
            .commit_reservation(NewReservation {
                user_id: request.user_id,
                slot_id: request.slot_id,
                party_size: request.party_size,
                special_requests: request.special_requests.clone(),
                deposit_cents,
                payment_status,
                payment_intent_id: payment_intent_id.clone(),
                idempotency_key: idempotency_key.clone(),
            })
            .await;

        let (reservation, slot) = match outcome {
            Ok(CommitOutcome::Created { reservation, slot }) => (reservation, slot),
            Ok(CommitOutcome::Conflict) => {
                self.try_refund(payment_intent_id.as_deref(), deposit_cents)
                    .await;
                warn!(
                    slot_id = %request.slot_id,
                    "Double-booking prevented by ledger constraint"
                );
                return Err(AppError::conflict("This time slot has already been booked"));
            }
            Ok(CommitOutcome::SlotMissing) => {
                self.try_refund(payment_intent_id.as_deref(), deposit_cents)
                    .await;
                return Err(AppError::not_found("Time slot not found"));
            }
            Err(e) => return Err(AppError::database(e.to_string())),
        };

        // ── Build response ──────────────────────────────────────────
        let restaurant_name = self
            .restaurants
            .find_name(slot.restaurant_id)
            .await
            .ok()
            .flatten()
            .unwrap_or_else(|| "Unknown".to_string());

        let response = BookingResponse {
            reservation_id: reservation.reservation_id,
            confirmation_code: reservation.confirmation_code.clone(),
            status: reservation.status,
            restaurant_name,
            cuisine: None,
            date_time: slot.start_time,
            party_size: reservation.party_size,
        };

        // ── Layer 3: cache the terminal response ────────────────────
        if let Some(key) = &idempotency_key {
            self.idempotency.put(key, &response).await;
        }

        // The slot is booked now; a lingering hold is harmless but tidied
        self.holds.release(request.slot_id).await;

        // The booked slot disappears from availability reads immediately
        // instead of waiting out the cache TTL
        self.availability.invalidate(slot.restaurant_id, slot.date).await;

        self.events.publish(BookingEvent::ReservationCreated {
            reservation_id: reservation.reservation_id,
            user_id: reservation.user_id,
            restaurant_id: reservation.restaurant_id,
            slot_id: reservation.slot_id,
            confirmation_code: reservation.confirmation_code.clone(),
            start_time: slot.start_time,
            party_size: reservation.party_size,
        });

        Ok(response)
    }

    /// Cancel a reservation: flip the ledger state, then refund a captured
    /// deposit. The refund is an external call and deliberately not
    /// transactional with the state change.
    pub async fn cancel_reservation(&self, reservation_id: Uuid) -> AppResult<CancelResult> {
        let outcome = self
            .reservations
            .cancel(reservation_id)
            .await
            .map_err(|e| AppError::database(e.to_string()))?;

        let (reservation, slot) = match outcome {
            CancelOutcome::NotFound => {
                return Err(AppError::not_found("Reservation not found"));
            }
            CancelOutcome::AlreadyCancelled => return Ok(CancelResult::AlreadyCancelled),
            CancelOutcome::Cancelled { reservation, slot } => (reservation, slot),
        };

        // The freed slot reappears in availability reads immediately
        if let Some(slot) = &slot {
            self.availability
                .invalidate(reservation.restaurant_id, slot.date)
                .await;
        }

        if reservation.payment_status == PaymentStatus::Captured {
            self.try_refund(
                reservation.payment_intent_id.as_deref(),
                reservation.deposit_cents,
            )
            .await;
            if let Err(e) = self.reservations.mark_refunded(reservation_id).await {
                error!(%reservation_id, error = %e, "Failed to record refund");
            }
        }

        self.events.publish(BookingEvent::ReservationCancelled {
            reservation_id: reservation.reservation_id,
            user_id: reservation.user_id,
            restaurant_id: reservation.restaurant_id,
            slot_id: reservation.slot_id,
            reason: Some("Cancelled by user".to_string()),
        });

        Ok(CancelResult::Cancelled)
    }

    /// Compensating refund. This is a saga step, not a two-phase commit:
    /// the refund itself can fail, which is logged and surfaced as an
    /// operational error without changing the user-visible result.
    async fn try_refund(&self, payment_intent_id: Option<&str>, deposit_cents: i64) {
        let Some(payment_intent_id) = payment_intent_id else {
            return;
        };
        let refund = self
            .payment
            .refund(RefundRequest {
                payment_intent_id: payment_intent_id.to_string(),
                amount: Some(Decimal::new(deposit_cents, 2)),
            })
            .await;
        if let Err(e) = refund {
            error!(
                payment_intent_id = %payment_intent_id, error = %e,
                "Failed to refund payment"
            );
        }
    }
}
