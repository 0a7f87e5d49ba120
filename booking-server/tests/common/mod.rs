//! Shared test fixtures: temp-dir SQLite ledger, in-memory KV store and a
//! counting payment gateway, wired through the same state assembly the
//! server uses.

#![allow(dead_code)]

use std::sync::Arc;
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};

use async_trait::async_trait;
use chrono::{NaiveDate, Utc};
use sqlx::SqlitePool;
use uuid::Uuid;

use booking_server::services::payment::{
    ChargeRequest, ChargeResponse, PaymentError, PaymentGateway, RefundRequest, RefundResponse,
};
use booking_server::{Config, DbService, KvStore, MemoryKvStore, ServerState};
use shared::request::BookingRequest;

/// Payment gateway double that counts charges/refunds and can be told to
/// decline charges.
#[derive(Default)]
pub struct CountingPaymentGateway {
    charges: AtomicUsize,
    refunds: AtomicUsize,
    decline_charges: AtomicBool,
}

impl CountingPaymentGateway {
    pub fn charge_count(&self) -> usize {
        self.charges.load(Ordering::SeqCst)
    }

    pub fn refund_count(&self) -> usize {
        self.refunds.load(Ordering::SeqCst)
    }

    pub fn decline_next_charges(&self, decline: bool) {
        self.decline_charges.store(decline, Ordering::SeqCst);
    }
}

#[async_trait]
impl PaymentGateway for CountingPaymentGateway {
    async fn charge(&self, request: ChargeRequest) -> Result<ChargeResponse, PaymentError> {
        if self.decline_charges.load(Ordering::SeqCst) {
            return Err(PaymentError::Declined("card declined".to_string()));
        }
        self.charges.fetch_add(1, Ordering::SeqCst);
        Ok(ChargeResponse {
            payment_intent_id: format!("pi_test_{}", Uuid::new_v4().simple()),
            status: "captured".to_string(),
            amount: request.amount,
        })
    }

    async fn refund(&self, request: RefundRequest) -> Result<RefundResponse, PaymentError> {
        let _ = request;
        self.refunds.fetch_add(1, Ordering::SeqCst);
        Ok(RefundResponse {
            refund_id: format!("re_test_{}", Uuid::new_v4().simple()),
            status: "refunded".to_string(),
        })
    }
}

pub struct TestEnv {
    pub state: ServerState,
    pub payment: Arc<CountingPaymentGateway>,
    _dir: tempfile::TempDir,
}

pub async fn setup() -> TestEnv {
    let dir = tempfile::tempdir().expect("temp dir");
    let db_path = dir.path().join("booktable.db");
    let db_path = db_path.to_str().expect("utf-8 path");

    let db = DbService::new(db_path).await.expect("database");
    let kv: Arc<dyn KvStore> = Arc::new(MemoryKvStore::new());
    let payment = Arc::new(CountingPaymentGateway::default());

    let config = Config::with_overrides(db_path, 0);
    let state = ServerState::with_collaborators(config, db.pool, kv, payment.clone());

    TestEnv {
        state,
        payment,
        _dir: dir,
    }
}

pub fn test_date() -> NaiveDate {
    NaiveDate::from_ymd_opt(2025, 6, 1).expect("valid test date")
}

pub async fn seed_restaurant(pool: &SqlitePool, name: &str) -> Uuid {
    let restaurant_id = Uuid::new_v4();
    let now = Utc::now();
    sqlx::query(
        "INSERT INTO restaurants (restaurant_id, name, cuisine, is_active, created_at, updated_at) \
         VALUES (?, ?, ?, 1, ?, ?)",
    )
    .bind(restaurant_id)
    .bind(name)
    .bind("Italian")
    .bind(now)
    .bind(now)
    .execute(pool)
    .await
    .expect("seed restaurant");
    restaurant_id
}

/// Seed one table with one AVAILABLE slot at `hour` on [`test_date`].
pub async fn seed_slot(pool: &SqlitePool, restaurant_id: Uuid, capacity: i64, hour: u32) -> Uuid {
    let table_id = Uuid::new_v4();
    let table_number = format!("T{}", &table_id.simple().to_string()[..6]);
    sqlx::query(
        "INSERT INTO dining_tables (table_id, restaurant_id, table_group_id, table_number, capacity, min_capacity) \
         VALUES (?, ?, NULL, ?, ?, 1)",
    )
    .bind(table_id)
    .bind(restaurant_id)
    .bind(&table_number)
    .bind(capacity)
    .execute(pool)
    .await
    .expect("seed table");

    let slot_id = Uuid::new_v4();
    let start_time = test_date().and_hms_opt(hour, 0, 0).expect("valid hour").and_utc();
    let end_time = start_time + chrono::Duration::hours(2);
    sqlx::query(
        "INSERT INTO time_slots (slot_id, restaurant_id, table_id, table_group_id, start_time, \
             end_time, date, status, capacity, held_by, held_until) \
         VALUES (?, ?, ?, NULL, ?, ?, ?, 'AVAILABLE', ?, NULL, NULL)",
    )
    .bind(slot_id)
    .bind(restaurant_id)
    .bind(table_id)
    .bind(start_time)
    .bind(end_time)
    .bind(test_date())
    .bind(capacity)
    .execute(pool)
    .await
    .expect("seed slot");
    slot_id
}

pub async fn slot_status(pool: &SqlitePool, slot_id: Uuid) -> String {
    sqlx::query_scalar("SELECT status FROM time_slots WHERE slot_id = ?")
        .bind(slot_id)
        .fetch_one(pool)
        .await
        .expect("slot status")
}

pub async fn reservation_rows_for_slot(pool: &SqlitePool, slot_id: Uuid) -> i64 {
    sqlx::query_scalar("SELECT COUNT(*) FROM reservations WHERE slot_id = ?")
        .bind(slot_id)
        .fetch_one(pool)
        .await
        .expect("reservation count")
}

pub fn booking_request(slot_id: Uuid, user_id: Uuid) -> BookingRequest {
    BookingRequest {
        slot_id,
        user_id,
        hold_token: None,
        party_size: 2,
        special_requests: None,
        payment_token: None,
        idempotency_key: None,
    }
}
