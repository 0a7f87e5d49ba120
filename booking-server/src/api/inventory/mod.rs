//! Inventory API 模块 - 可用性查询与槽位占用

mod handler;

use axum::{
    Router,
    routing::{delete, get, post},
};

use crate::core::ServerState;

pub fn router() -> Router<ServerState> {
    Router::new().nest("/api/inventory", routes())
}

fn routes() -> Router<ServerState> {
    Router::new()
        .route("/availability", get(handler::availability))
        .route("/hold", post(handler::acquire_hold))
        .route("/hold/{slot_id}", delete(handler::release_hold))
        .route("/hold/{slot_id}/validate", get(handler::validate_hold))
}
