//! End-to-end booking flow through the coordinator
//!
//! Drives the same three-layer protocol the HTTP handlers call into:
//! idempotency → hold validation → deposit charge → ledger commit →
//! compensation / cache invalidation.

mod common;

use uuid::Uuid;

use booking_server::booking::confirmation::{CODE_ALPHABET, CODE_LENGTH};
use booking_server::{AppError, CancelResult, HoldOutcome};
use shared::request::AvailabilityQuery;

fn assert_code_shape(code: &str) {
    assert_eq!(code.len(), CODE_LENGTH);
    assert!(
        code.bytes().all(|b| CODE_ALPHABET.contains(&b)),
        "confirmation code {code} outside alphabet"
    );
}

#[tokio::test]
async fn contended_slot_full_scenario() {
    let env = common::setup().await;
    let state = &env.state;
    let pool = state.db.clone();
    let restaurant_id = common::seed_restaurant(&pool, "Chez Annette").await;
    let slot_id = common::seed_slot(&pool, restaurant_id, 4, 18).await;

    let user_a = Uuid::new_v4();
    let user_b = Uuid::new_v4();

    // A takes the hold; B is denied while it lives
    let HoldOutcome::Acquired { token: token_a, .. } = state.holds.acquire(slot_id, user_a).await
    else {
        panic!("A's hold must succeed");
    };
    assert!(matches!(
        state.holds.acquire(slot_id, user_b).await,
        HoldOutcome::Denied
    ));

    // A books with hold token and payment token
    let mut request_a = common::booking_request(slot_id, user_a);
    request_a.hold_token = Some(token_a);
    request_a.payment_token = Some("tok_ok".to_string());
    let response = state
        .coordinator
        .create_reservation(request_a, None)
        .await
        .expect("A's booking succeeds");
    assert_code_shape(&response.confirmation_code);
    assert_eq!(response.restaurant_name, "Chez Annette");
    assert_eq!(env.payment.charge_count(), 1);
    assert_eq!(common::slot_status(&pool, slot_id).await, "BOOKED");

    // The hold was released on commit, so B can acquire one, but it is
    // moot: the ledger constraint still rejects B's booking
    let HoldOutcome::Acquired { token: token_b, .. } = state.holds.acquire(slot_id, user_b).await
    else {
        panic!("hold store no longer blocks the booked slot");
    };
    let mut request_b = common::booking_request(slot_id, user_b);
    request_b.hold_token = Some(token_b);
    let err = state
        .coordinator
        .create_reservation(request_b, None)
        .await
        .expect_err("the booked slot must not be double-booked");
    assert!(matches!(err, AppError::Conflict(_)));
    assert_eq!(common::reservation_rows_for_slot(&pool, slot_id).await, 1);

    // A cancels; the slot reverts and B's fresh attempt succeeds
    assert_eq!(
        state
            .coordinator
            .cancel_reservation(response.reservation_id)
            .await
            .unwrap(),
        CancelResult::Cancelled
    );
    assert_eq!(common::slot_status(&pool, slot_id).await, "AVAILABLE");

    state.holds.release(slot_id).await;
    let HoldOutcome::Acquired { token: token_b, .. } = state.holds.acquire(slot_id, user_b).await
    else {
        panic!("B's hold must succeed after cancellation");
    };
    let mut retry_b = common::booking_request(slot_id, user_b);
    retry_b.hold_token = Some(token_b);
    let response_b = state
        .coordinator
        .create_reservation(retry_b, None)
        .await
        .expect("B's booking succeeds after cancellation");
    assert_code_shape(&response_b.confirmation_code);
}

#[tokio::test]
async fn idempotent_retry_runs_side_effects_once() {
    let env = common::setup().await;
    let state = &env.state;
    let pool = state.db.clone();
    let restaurant_id = common::seed_restaurant(&pool, "La Table").await;
    let slot_id = common::seed_slot(&pool, restaurant_id, 4, 19).await;

    let mut request = common::booking_request(slot_id, Uuid::new_v4());
    request.payment_token = Some("tok_ok".to_string());
    let key = Some("retry-attempt-4711".to_string());

    let first = state
        .coordinator
        .create_reservation(request.clone(), key.clone())
        .await
        .expect("first attempt succeeds");
    let second = state
        .coordinator
        .create_reservation(request, key)
        .await
        .expect("replay returns the cached result");

    // Identical response, one charge, one row
    assert_eq!(first, second);
    assert_eq!(env.payment.charge_count(), 1);
    assert_eq!(common::reservation_rows_for_slot(&pool, slot_id).await, 1);
}

#[tokio::test]
async fn cancellation_refunds_captured_deposit() {
    let env = common::setup().await;
    let state = &env.state;
    let pool = state.db.clone();
    let restaurant_id = common::seed_restaurant(&pool, "Osteria").await;
    let slot_id = common::seed_slot(&pool, restaurant_id, 2, 20).await;

    let mut request = common::booking_request(slot_id, Uuid::new_v4());
    request.payment_token = Some("tok_ok".to_string());
    let response = state
        .coordinator
        .create_reservation(request, None)
        .await
        .unwrap();

    assert_eq!(
        state
            .coordinator
            .cancel_reservation(response.reservation_id)
            .await
            .unwrap(),
        CancelResult::Cancelled
    );
    assert_eq!(env.payment.refund_count(), 1);
    assert_eq!(common::slot_status(&pool, slot_id).await, "AVAILABLE");

    let payment_status: String =
        sqlx::query_scalar("SELECT payment_status FROM reservations WHERE reservation_id = ?")
            .bind(response.reservation_id)
            .fetch_one(&pool)
            .await
            .unwrap();
    assert_eq!(payment_status, "REFUNDED");

    // Cancelling again is a no-op success, with no second refund
    assert_eq!(
        state
            .coordinator
            .cancel_reservation(response.reservation_id)
            .await
            .unwrap(),
        CancelResult::AlreadyCancelled
    );
    assert_eq!(env.payment.refund_count(), 1);
}

#[tokio::test]
async fn stale_hold_token_is_a_conflict() {
    let env = common::setup().await;
    let state = &env.state;
    let pool = state.db.clone();
    let restaurant_id = common::seed_restaurant(&pool, "Bistro").await;
    let slot_id = common::seed_slot(&pool, restaurant_id, 4, 17).await;

    // Someone else owns the hold; a forged/stale token must not pass
    state.holds.acquire(slot_id, Uuid::new_v4()).await;
    let mut request = common::booking_request(slot_id, Uuid::new_v4());
    request.hold_token = Some("stale-token".to_string());

    let err = state
        .coordinator
        .create_reservation(request, None)
        .await
        .expect_err("stale hold token is rejected");
    assert!(matches!(err, AppError::Conflict(_)));
    assert_eq!(common::reservation_rows_for_slot(&pool, slot_id).await, 0);
}

#[tokio::test]
async fn missing_slot_refunds_the_charge() {
    let env = common::setup().await;
    let state = &env.state;

    let mut request = common::booking_request(Uuid::new_v4(), Uuid::new_v4());
    request.payment_token = Some("tok_ok".to_string());

    let err = state
        .coordinator
        .create_reservation(request, None)
        .await
        .expect_err("unknown slot");
    assert!(matches!(err, AppError::NotFound(_)));
    // The deposit was charged before the lookup failed, then compensated
    assert_eq!(env.payment.charge_count(), 1);
    assert_eq!(env.payment.refund_count(), 1);
}

#[tokio::test]
async fn validation_rejects_before_any_side_effect() {
    let env = common::setup().await;
    let state = &env.state;

    let mut request = common::booking_request(Uuid::new_v4(), Uuid::new_v4());
    request.party_size = 0;
    request.payment_token = Some("tok_ok".to_string());

    let err = state
        .coordinator
        .create_reservation(request, None)
        .await
        .expect_err("non-positive party size");
    assert!(matches!(err, AppError::Validation(_)));
    assert_eq!(env.payment.charge_count(), 0);
}

#[tokio::test]
async fn declined_charge_aborts_without_ledger_write() {
    let env = common::setup().await;
    let state = &env.state;
    let pool = state.db.clone();
    let restaurant_id = common::seed_restaurant(&pool, "Cantina").await;
    let slot_id = common::seed_slot(&pool, restaurant_id, 4, 21).await;

    env.payment.decline_next_charges(true);
    let mut request = common::booking_request(slot_id, Uuid::new_v4());
    request.payment_token = Some("tok_declined".to_string());

    let err = state
        .coordinator
        .create_reservation(request, None)
        .await
        .expect_err("declined card");
    assert!(matches!(err, AppError::PaymentFailed(_)));
    // Nothing was committed, nothing to compensate
    assert_eq!(common::reservation_rows_for_slot(&pool, slot_id).await, 0);
    assert_eq!(env.payment.refund_count(), 0);
    assert_eq!(common::slot_status(&pool, slot_id).await, "AVAILABLE");
}

#[tokio::test]
async fn availability_filters_and_invalidates() {
    let env = common::setup().await;
    let state = &env.state;
    let pool = state.db.clone();
    let restaurant_id = common::seed_restaurant(&pool, "Le Jardin").await;
    let small_slot = common::seed_slot(&pool, restaurant_id, 2, 18).await;
    let large_slot = common::seed_slot(&pool, restaurant_id, 6, 19).await;

    let query = AvailabilityQuery {
        restaurant_id,
        date: common::test_date(),
        party_size: None,
        table_group_id: None,
    };

    // Read-through populates the cache
    let all = state.availability.get(&query).await.unwrap();
    assert_eq!(all.slots.len(), 2);

    // Cache hit filtered by party size; the key ignores party size
    let mut bigger_party = query.clone();
    bigger_party.party_size = Some(4);
    let filtered = state.availability.get(&bigger_party).await.unwrap();
    assert_eq!(filtered.slots.len(), 1);
    assert_eq!(filtered.slots[0].slot_id, large_slot);

    // Booking invalidates the entry synchronously; the slot disappears
    // immediately rather than after the cache TTL
    state
        .coordinator
        .create_reservation(common::booking_request(small_slot, Uuid::new_v4()), None)
        .await
        .unwrap();
    let after_booking = state.availability.get(&query).await.unwrap();
    assert_eq!(after_booking.slots.len(), 1);
    assert_eq!(after_booking.slots[0].slot_id, large_slot);
}
