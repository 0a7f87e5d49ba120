//! Inventory API Handlers

use axum::{
    Json,
    extract::{Path, Query, State},
};
use serde::Serialize;
use uuid::Uuid;

use shared::event::BookingEvent;
use shared::request::{AvailabilityQuery, HoldRequest, ValidateHoldQuery};
use shared::response::{AvailabilityResponse, HoldResponse};

use crate::core::ServerState;
use crate::holds::HoldOutcome;
use crate::utils::{AppError, AppResponse, AppResult, ok};

/// GET /api/inventory/availability - 查询可用槽位 (读穿缓存)
pub async fn availability(
    State(state): State<ServerState>,
    Query(query): Query<AvailabilityQuery>,
) -> AppResult<Json<AppResponse<AvailabilityResponse>>> {
    let response = state
        .availability
        .get(&query)
        .await
        .map_err(|e| AppError::database(e.to_string()))?;
    Ok(ok(response))
}

/// POST /api/inventory/hold - 占用槽位 (SET NX + TTL)
pub async fn acquire_hold(
    State(state): State<ServerState>,
    Json(request): Json<HoldRequest>,
) -> AppResult<Json<AppResponse<HoldResponse>>> {
    match state.holds.acquire(request.slot_id, request.user_id).await {
        HoldOutcome::Acquired { token, expires_at } => Ok(ok(HoldResponse {
            hold_token: token,
            expires_at,
            slot_id: request.slot_id,
        })),
        HoldOutcome::Denied => Err(AppError::conflict("Slot already held by another diner")),
    }
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
pub struct MessageResponse {
    pub message: String,
}

/// DELETE /api/inventory/hold/{slot_id} - 提前释放占用
pub async fn release_hold(
    State(state): State<ServerState>,
    Path(slot_id): Path<Uuid>,
) -> AppResult<Json<AppResponse<MessageResponse>>> {
    state.holds.release(slot_id).await;

    state.events.publish(BookingEvent::SlotReleased {
        slot_id,
        reason: Some("Released by user".to_string()),
    });

    Ok(ok(MessageResponse {
        message: "Hold released".to_string(),
    }))
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ValidateHoldResponse {
    pub valid: bool,
}

/// GET /api/inventory/hold/{slot_id}/validate - 校验占用令牌
pub async fn validate_hold(
    State(state): State<ServerState>,
    Path(slot_id): Path<Uuid>,
    Query(query): Query<ValidateHoldQuery>,
) -> AppResult<Json<AppResponse<ValidateHoldResponse>>> {
    // A store failure reads as "not valid" here; the booking path applies
    // its own degradation policy via the coordinator
    let valid = state
        .holds
        .validate(slot_id, &query.hold_token)
        .await
        .unwrap_or(false);
    Ok(ok(ValidateHoldResponse { valid }))
}
