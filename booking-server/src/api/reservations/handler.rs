//! Reservations API Handlers

use axum::{
    Json,
    extract::{Path, State},
};
use http::HeaderMap;
use serde::Serialize;
use uuid::Uuid;

use shared::request::BookingRequest;
use shared::response::BookingResponse;

use crate::booking::CancelResult;
use crate::core::ServerState;
use crate::db::repository::ReservationRepository;
use crate::utils::{AppError, AppResponse, AppResult, ok};

/// POST /api/reservations - 创建预订 (关键路径)
pub async fn create(
    State(state): State<ServerState>,
    headers: HeaderMap,
    Json(request): Json<BookingRequest>,
) -> AppResult<Json<AppResponse<BookingResponse>>> {
    // Idempotency key from header, falling back to the request body
    let header_key = headers
        .get("Idempotency-Key")
        .and_then(|value| value.to_str().ok())
        .map(|value| value.to_string());

    let response = state
        .coordinator
        .create_reservation(request, header_key)
        .await?;
    Ok(ok(response))
}

/// GET /api/reservations/{id} - 查询预订详情
pub async fn get_by_id(
    State(state): State<ServerState>,
    Path(id): Path<Uuid>,
) -> AppResult<Json<AppResponse<BookingResponse>>> {
    let repo = ReservationRepository::new(state.db.clone());
    let response = repo
        .find_response_by_id(id)
        .await
        .map_err(|e| AppError::database(e.to_string()))?
        .ok_or_else(|| AppError::not_found("Reservation not found"))?;
    Ok(ok(response))
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
pub struct MessageResponse {
    pub message: String,
}

/// POST /api/reservations/{id}/cancel - 取消预订
pub async fn cancel(
    State(state): State<ServerState>,
    Path(id): Path<Uuid>,
) -> AppResult<Json<AppResponse<MessageResponse>>> {
    let message = match state.coordinator.cancel_reservation(id).await? {
        CancelResult::Cancelled => "Reservation cancelled",
        CancelResult::AlreadyCancelled => "Already cancelled",
    };
    Ok(ok(MessageResponse {
        message: message.to_string(),
    }))
}

/// GET /api/reservations/user/{user_id} - 用户的全部预订
pub async fn list_for_user(
    State(state): State<ServerState>,
    Path(user_id): Path<Uuid>,
) -> AppResult<Json<AppResponse<Vec<BookingResponse>>>> {
    let repo = ReservationRepository::new(state.db.clone());
    let reservations = repo
        .list_for_user(user_id)
        .await
        .map_err(|e| AppError::database(e.to_string()))?;
    Ok(ok(reservations))
}

/// GET /api/reservations/confirm/{code} - 按确认码查询
pub async fn lookup_by_code(
    State(state): State<ServerState>,
    Path(code): Path<String>,
) -> AppResult<Json<AppResponse<BookingResponse>>> {
    let repo = ReservationRepository::new(state.db.clone());
    let response = repo
        .find_response_by_code(&code)
        .await
        .map_err(|e| AppError::database(e.to_string()))?
        .ok_or_else(|| AppError::not_found("Reservation not found"))?;
    Ok(ok(response))
}
