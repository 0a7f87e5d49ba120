//! Reservations API 模块 - 预订关键路径
//!
//! POST /api/reservations 是三层防超订协议的入口：
//! 幂等键 → 占用校验 → 账本唯一约束。

mod handler;

use axum::{
    Router,
    routing::{get, post},
};

use crate::core::ServerState;

pub fn router() -> Router<ServerState> {
    Router::new().nest("/api/reservations", routes())
}

fn routes() -> Router<ServerState> {
    Router::new()
        .route("/", post(handler::create))
        .route("/{id}", get(handler::get_by_id))
        .route("/{id}/cancel", post(handler::cancel))
        .route("/user/{user_id}", get(handler::list_for_user))
        .route("/confirm/{code}", get(handler::lookup_by_code))
}
