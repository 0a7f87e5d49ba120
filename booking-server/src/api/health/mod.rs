//! 健康检查路由
//!
//! # 路由列表
//!
//! | 路径 | 方法 | 说明 |
//! |------|------|------|
//! | /health | GET | 简单健康检查 |
//! | /health/detailed | GET | 详细健康检查 (数据库 + KV) |

use std::time::{Duration, Instant};

use axum::{Json, Router, extract::State, routing::get};
use serde::Serialize;

use crate::core::ServerState;

/// 健康检查路由 - 公共路由
pub fn router() -> Router<ServerState> {
    Router::new()
        .route("/health", get(health))
        .route("/health/detailed", get(detailed_health))
}

/// 简单健康检查响应
#[derive(Serialize)]
pub struct HealthResponse {
    /// 状态 (ok | error)
    status: &'static str,
    /// 版本号
    version: &'static str,
    /// 运行环境
    environment: String,
}

/// 详细健康检查响应
#[derive(Serialize)]
pub struct DetailedHealthResponse {
    status: &'static str,
    version: &'static str,
    /// 各组件检查结果
    checks: HealthChecks,
}

#[derive(Serialize)]
pub struct HealthChecks {
    /// 数据库检查
    database: CheckResult,
    /// KV 存储检查
    kv_store: CheckResult,
}

/// 单项检查结果
#[derive(Serialize)]
pub struct CheckResult {
    /// 状态 (ok | error)
    status: &'static str,
    /// 延迟 (毫秒)
    latency_ms: u128,
}

async fn health(State(state): State<ServerState>) -> Json<HealthResponse> {
    Json(HealthResponse {
        status: "ok",
        version: env!("CARGO_PKG_VERSION"),
        environment: state.config.environment.clone(),
    })
}

async fn detailed_health(State(state): State<ServerState>) -> Json<DetailedHealthResponse> {
    let database = check_database(&state).await;
    let kv_store = check_kv(&state).await;

    let status = if database.status == "ok" && kv_store.status == "ok" {
        "ok"
    } else {
        "error"
    };

    Json(DetailedHealthResponse {
        status,
        version: env!("CARGO_PKG_VERSION"),
        checks: HealthChecks { database, kv_store },
    })
}

async fn check_database(state: &ServerState) -> CheckResult {
    let started = Instant::now();
    let status = match sqlx::query("SELECT 1").execute(&state.db).await {
        Ok(_) => "ok",
        Err(_) => "error",
    };
    CheckResult {
        status,
        latency_ms: started.elapsed().as_millis(),
    }
}

async fn check_kv(state: &ServerState) -> CheckResult {
    let started = Instant::now();
    let status = match state
        .kv
        .set_ex("health:ping", "pong", Duration::from_secs(5))
        .await
    {
        Ok(()) => "ok",
        Err(_) => "error",
    };
    CheckResult {
        status,
        latency_ms: started.elapsed().as_millis(),
    }
}
