use std::sync::Arc;
use std::time::Duration;

use sqlx::SqlitePool;

use crate::availability::AvailabilityCache;
use crate::booking::BookingCoordinator;
use crate::core::Config;
use crate::db::DbService;
use crate::db::repository::{ReservationRepository, RestaurantRepository, SlotRepository};
use crate::holds::HoldStore;
use crate::idempotency::IdempotencyStore;
use crate::kv::{KvStore, MemoryKvStore, RedisKvStore};
use crate::services::{DevPaymentGateway, EventPublisher, HttpPaymentGateway, PaymentGateway};

/// 服务器状态 - 持有所有协作方的共享引用
///
/// 每个依赖都是显式构造并注入的：跨请求协调只发生在两个共享存储
/// (KV、SQLite) 中，进程内没有可变的全局注册表。
///
/// # 组件
///
/// | 字段 | 说明 |
/// |------|------|
/// | config | 配置项 (不可变) |
/// | db | SQLite 连接池 (账本) |
/// | kv | KV 存储 (占用/幂等/缓存) |
/// | holds | 槽位占用协议 |
/// | idempotency | 幂等键缓存 |
/// | availability | 可用性缓存 |
/// | payment | 支付网关 |
/// | events | 领域事件发布 |
/// | coordinator | 预订协调器 |
#[derive(Clone)]
pub struct ServerState {
    /// 服务器配置
    pub config: Config,
    /// SQLite 连接池
    pub db: SqlitePool,
    /// KV 存储
    pub kv: Arc<dyn KvStore>,
    /// 槽位占用协议
    pub holds: HoldStore,
    /// 幂等键缓存
    pub idempotency: IdempotencyStore,
    /// 可用性缓存
    pub availability: AvailabilityCache,
    /// 支付网关
    pub payment: Arc<dyn PaymentGateway>,
    /// 领域事件发布
    pub events: EventPublisher,
    /// 预订协调器
    pub coordinator: BookingCoordinator,
}

impl ServerState {
    /// 初始化服务器状态
    ///
    /// 按顺序初始化：
    /// 1. 数据库 (连接池 + 迁移)
    /// 2. KV 存储 (Redis 或进程内)
    /// 3. 支付网关 (HTTP 或模拟)
    /// 4. 协议层 (holds / idempotency / availability)
    /// 5. 预订协调器
    ///
    /// # Panics
    ///
    /// 数据库或 Redis 初始化失败时 panic
    pub async fn initialize(config: &Config) -> Self {
        // 1. Database
        let db_service = DbService::new(&config.database_path)
            .await
            .expect("Failed to initialize database");
        let db = db_service.pool;

        // 2. KV store
        let kv: Arc<dyn KvStore> = match &config.redis_url {
            Some(url) => Arc::new(
                RedisKvStore::connect(url)
                    .await
                    .expect("Failed to connect to Redis"),
            ),
            None => {
                tracing::info!("REDIS_URL not set, using in-memory KV store");
                Arc::new(MemoryKvStore::new())
            }
        };

        // 3. Payment gateway
        let payment: Arc<dyn PaymentGateway> = match &config.payment_service_url {
            Some(url) => Arc::new(HttpPaymentGateway::new(url.clone())),
            None => {
                tracing::info!("PAYMENT_SERVICE_URL not set, using simulated payment gateway");
                Arc::new(DevPaymentGateway::new())
            }
        };

        Self::with_collaborators(config.clone(), db, kv, payment)
    }

    /// 手动装配所有协作方 (测试与 initialize 共用)
    pub fn with_collaborators(
        config: Config,
        db: SqlitePool,
        kv: Arc<dyn KvStore>,
        payment: Arc<dyn PaymentGateway>,
    ) -> Self {
        let events = EventPublisher::default();
        let holds = HoldStore::new(
            kv.clone(),
            events.clone(),
            Duration::from_secs(config.hold_ttl_secs),
        );
        let idempotency = IdempotencyStore::new(
            kv.clone(),
            Duration::from_secs(config.idempotency_ttl_secs),
        );
        let availability = AvailabilityCache::new(
            kv.clone(),
            SlotRepository::new(db.clone()),
            Duration::from_secs(config.availability_cache_ttl_secs),
        );
        let coordinator = BookingCoordinator::new(
            ReservationRepository::new(db.clone()),
            RestaurantRepository::new(db.clone()),
            holds.clone(),
            idempotency.clone(),
            availability.clone(),
            payment.clone(),
            events.clone(),
            config.deposit_cents,
        );

        Self {
            config,
            db,
            kv,
            holds,
            idempotency,
            availability,
            payment,
            events,
            coordinator,
        }
    }

    /// 获取数据库连接池
    pub fn get_db(&self) -> SqlitePool {
        self.db.clone()
    }

    /// 获取预订协调器
    pub fn coordinator(&self) -> &BookingCoordinator {
        &self.coordinator
    }
}
