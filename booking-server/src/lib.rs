//! BookTable Booking Server - 餐厅预订并发核心
//!
//! # 架构概述
//!
//! 防止稀缺时段被超订的三层协议：
//!
//! - **Layer 1** (`holds`): KV 槽位占用 (SET NX + TTL)，降低竞争
//! - **Layer 2** (`db`): 账本唯一约束，并发提交的最终仲裁
//! - **Layer 3** (`idempotency`): 幂等键，重试安全
//!
//! # 模块结构
//!
//! ```text
//! booking-server/src/
//! ├── core/          # 配置、状态、服务器
//! ├── api/           # HTTP 路由和处理器
//! ├── booking/       # 预订协调器 (编排 + 补偿)
//! ├── db/            # SQLite 账本 (repository)
//! ├── kv/            # KV 存储 (Redis / 内存)
//! ├── holds/         # 槽位占用协议
//! ├── idempotency/   # 幂等键缓存
//! ├── availability/  # 可用性读穿缓存
//! ├── services/      # 支付网关、事件发布
//! └── utils/         # 错误、日志、验证
//! ```

pub mod api;
pub mod availability;
pub mod booking;
pub mod core;
pub mod db;
pub mod holds;
pub mod idempotency;
pub mod kv;
pub mod services;
pub mod utils;

// Re-export 公共类型
pub use booking::{BookingCoordinator, CancelResult};
pub use core::{Config, Server, ServerState};
pub use db::DbService;
pub use db::repository::{
    CancelOutcome, CommitOutcome, NewReservation, ReservationRepository, RestaurantRepository,
    SlotRepository,
};
pub use holds::{HoldOutcome, HoldStore};
pub use idempotency::IdempotencyStore;
pub use kv::{KvStore, MemoryKvStore, RedisKvStore};
pub use services::{DevPaymentGateway, EventPublisher, PaymentGateway};
pub use utils::{AppError, AppResult};

// Re-export logger functions
pub use utils::logger::{init_logger, init_logger_with_file};

/// 设置环境 (dotenv + 日志)
pub fn setup_environment() -> anyhow::Result<()> {
    dotenv::dotenv().ok();

    let log_level = std::env::var("LOG_LEVEL").ok();
    let log_dir = std::env::var("LOG_DIR").ok();
    init_logger_with_file(log_level.as_deref(), log_dir.as_deref());

    Ok(())
}

pub fn print_banner() {
    println!(
        r#"
    ____              __   ______      __    __
   / __ )____  ____  / /__/_  __/___ _/ /_  / /__
  / __  / __ \/ __ \/ //_// / / __ `/ __ \/ / _ \
 / /_/ / /_/ / /_/ / ,<  / / / /_/ / /_/ / /  __/
/_____/\____/\____/_/|_|/_/  \__,_/_.___/_/\___/
    "#
    );
}
