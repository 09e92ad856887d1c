use std::time::Duration;

/// 服务器配置
///
/// # 环境变量
///
/// 所有配置项都可以通过环境变量覆盖：
///
/// | 环境变量 | 默认值 | 说明 |
/// |----------|--------|------|
/// | DATA_DIR | /var/lib/bookstore | 数据目录 (redb 数据库文件) |
/// | ORDER_TTL_SECS | 10 | 未支付订单的自动取消时限（秒） |
/// | LOG_DIR | (无) | 日志目录，未设置时只输出到 stdout |
/// | ENVIRONMENT | development | 运行环境 |
///
/// # 示例
///
/// ```ignore
/// DATA_DIR=/data/bookstore ORDER_TTL_SECS=30 cargo run
/// ```
#[derive(Debug, Clone)]
pub struct Config {
    /// 数据目录，存放 accounts/catalog/orders 数据库文件
    pub data_dir: String,
    /// 未支付订单保留时长，超时自动取消
    pub order_ttl: Duration,
    /// 日志目录 (可选)
    pub log_dir: Option<String>,
    /// 运行环境: development | staging | production
    pub environment: String,
}

impl Config {
    /// 从环境变量加载配置
    ///
    /// 如果环境变量未设置，使用默认值
    pub fn from_env() -> Self {
        Self {
            data_dir: std::env::var("DATA_DIR").unwrap_or_else(|_| "/var/lib/bookstore".into()),
            order_ttl: Duration::from_secs(
                std::env::var("ORDER_TTL_SECS")
                    .ok()
                    .and_then(|v| v.parse().ok())
                    .unwrap_or(10),
            ),
            log_dir: std::env::var("LOG_DIR").ok(),
            environment: std::env::var("ENVIRONMENT").unwrap_or_else(|_| "development".into()),
        }
    }

    /// 使用自定义值覆盖部分配置
    ///
    /// 常用于测试场景
    pub fn with_overrides(data_dir: impl Into<String>, order_ttl: Duration) -> Self {
        let mut config = Self::from_env();
        config.data_dir = data_dir.into();
        config.order_ttl = order_ttl;
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

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_with_overrides() {
        let config = Config::with_overrides("/tmp/test", Duration::from_millis(100));
        assert_eq!(config.data_dir, "/tmp/test");
        assert_eq!(config.order_ttl, Duration::from_millis(100));
    }
}
