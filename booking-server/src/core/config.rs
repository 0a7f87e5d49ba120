/// 服务器配置 - 预订服务的所有配置项
///
/// # 环境变量
///
/// 所有配置项都可以通过环境变量覆盖：
///
/// | 环境变量 | 默认值 | 说明 |
/// |----------|--------|------|
/// | HTTP_PORT | 5003 | HTTP 服务端口 |
/// | DATABASE_PATH | booktable.db | SQLite 数据库路径 |
/// | REDIS_URL | (未设置 = 内存 KV) | Redis 连接地址 |
/// | PAYMENT_SERVICE_URL | (未设置 = 模拟网关) | 支付服务地址 |
/// | HOLD_TTL_SECS | 300 | 槽位占用 TTL (秒) |
/// | IDEMPOTENCY_TTL_SECS | 86400 | 幂等键 TTL (秒) |
/// | AVAILABILITY_CACHE_TTL_SECS | 60 | 可用性缓存 TTL (秒) |
/// | DEPOSIT_CENTS | 2500 | 标准订金 (分) |
/// | ENVIRONMENT | development | 运行环境 |
///
/// # 示例
///
/// ```ignore
/// DATABASE_PATH=/data/booktable.db HTTP_PORT=8080 cargo run
/// ```
#[derive(Debug, Clone)]
pub struct Config {
    /// HTTP API 服务端口
    pub http_port: u16,
    /// SQLite 数据库路径
    pub database_path: String,
    /// Redis 连接地址 (未设置时使用进程内 KV)
    pub redis_url: Option<String>,
    /// 支付服务地址 (未设置时使用模拟网关)
    pub payment_service_url: Option<String>,
    /// 槽位占用 TTL (秒)
    pub hold_ttl_secs: u64,
    /// 幂等键缓存 TTL (秒)
    pub idempotency_ttl_secs: u64,
    /// 可用性缓存 TTL (秒)
    pub availability_cache_ttl_secs: u64,
    /// 标准订金金额 (分)
    pub deposit_cents: i64,
    /// 运行环境: development | staging | production
    pub environment: String,
}

impl Config {
    /// 从环境变量加载配置
    ///
    /// 如果环境变量未设置，使用默认值
    pub fn from_env() -> Self {
        Self {
            http_port: std::env::var("HTTP_PORT")
                .ok()
                .and_then(|p| p.parse().ok())
                .unwrap_or(5003),
            database_path: std::env::var("DATABASE_PATH")
                .unwrap_or_else(|_| "booktable.db".into()),
            redis_url: std::env::var("REDIS_URL").ok(),
            payment_service_url: std::env::var("PAYMENT_SERVICE_URL").ok(),
            hold_ttl_secs: std::env::var("HOLD_TTL_SECS")
                .ok()
                .and_then(|v| v.parse().ok())
                .unwrap_or(300),
            idempotency_ttl_secs: std::env::var("IDEMPOTENCY_TTL_SECS")
                .ok()
                .and_then(|v| v.parse().ok())
                .unwrap_or(86_400),
            availability_cache_ttl_secs: std::env::var("AVAILABILITY_CACHE_TTL_SECS")
                .ok()
                .and_then(|v| v.parse().ok())
                .unwrap_or(60),
            deposit_cents: std::env::var("DEPOSIT_CENTS")
                .ok()
                .and_then(|v| v.parse().ok())
                .unwrap_or(2500),
            environment: std::env::var("ENVIRONMENT").unwrap_or_else(|_| "development".into()),
        }
    }

    /// 使用自定义值覆盖部分配置
    ///
    /// 常用于测试场景
    pub fn with_overrides(database_path: impl Into<String>, http_port: u16) -> Self {
        let mut config = Self::from_env();
        config.database_path = database_path.into();
        config.http_port = http_port;
        config
    }

    /// 是否生产环境
    pub fn is_production(&self) -> bool {
        self.environment == "production"
    }

    /// 是否开发环境
    pub fn is_development(&self) -> bool {
        self.environment == "development"
    }
}

impl Default for Config {
    fn default() -> Self {
        Self::from_env()
    }
}
