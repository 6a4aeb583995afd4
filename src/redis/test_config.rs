//! 集中化的 Redis 測試配置
//!
//! 提供一致的測試環境配置，支援不同部署環境（本地開發、Docker 容器）。
//! 需要真實伺服器的測試在 Redis 不可用時會自行跳過。

use crate::codec::Codec;
use crate::redis::pool::{ConnectionPool, RedisPool, RedisPoolError};
use crate::redis::util::RedisUtil;
use std::sync::Arc;
use std::time::Duration;

/// 測試連接池大小；樂觀鎖測試同時需要兩個連接
const TEST_POOL_SIZE: u32 = 4;

/// Redis 測試配置建構器
pub struct RedisTestConfig;

impl RedisTestConfig {
    /// 獲取測試用 Redis URL
    ///
    /// 優先級：
    /// 1. REDIS_TEST_URL 環境變數
    /// 2. 檢測 Docker 環境使用 redis:6379
    /// 3. 預設 localhost:6379
    pub fn get_test_url() -> String {
        Self::resolve_test_url(std::env::var("REDIS_TEST_URL").ok(), Self::is_docker_environment())
    }

    fn resolve_test_url(configured: Option<String>, in_docker: bool) -> String {
        match configured.filter(|url| !url.is_empty()) {
            Some(url) => url,
            None if in_docker => "redis://redis:6379".to_string(),
            None => "redis://localhost:6379".to_string(),
        }
    }

    fn is_docker_environment() -> bool {
        std::env::var("DOCKER_CONTAINER").is_ok() || std::path::Path::new("/.dockerenv").exists()
    }

    /// 建立測試用 Redis 連接池，連接在第一次取用時才建立
    pub fn create_test_pool() -> Result<Arc<ConnectionPool>, RedisPoolError> {
        Self::create_pool_at(&Self::get_test_url())
    }

    fn create_pool_at(url: &str) -> Result<Arc<ConnectionPool>, RedisPoolError> {
        let pool = ConnectionPool::from_url(url, TEST_POOL_SIZE, Duration::from_secs(2))?;
        Ok(Arc::new(pool))
    }

    /// 檢查 Redis 是否可用於測試
    pub async fn is_redis_available() -> bool {
        match Self::create_test_pool() {
            Ok(pool) => pool.check_health().await,
            Err(_) => false,
        }
    }

    /// Redis 可用時返回使用指定編解碼器的門面，否則印出跳過訊息並返回 `None`
    pub async fn skip_if_redis_unavailable(
        test_name: &str,
        codec: Codec,
    ) -> Option<RedisUtil<Arc<ConnectionPool>>> {
        let pool = match Self::create_test_pool() {
            Ok(pool) => pool,
            Err(e) => {
                eprintln!("跳過 Redis 測試 '{}': {}", test_name, e);
                return None;
            }
        };
        if !pool.check_health().await {
            eprintln!("跳過 Redis 測試 '{}': Redis 環境不可用", test_name);
            return None;
        }
        Some(RedisUtil::new(pool, codec))
    }

    /// 測試專用鍵，包含進程號避免平行執行的測試互相干擾
    pub fn unique_key(scope: &str, name: &str) -> String {
        format!("redis_facade:test:{}:{}:{}", std::process::id(), scope, name)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_resolve_test_url() {
        assert_eq!(
            RedisTestConfig::resolve_test_url(Some("redis://custom:1234".to_string()), true),
            "redis://custom:1234"
        );
        assert_eq!(RedisTestConfig::resolve_test_url(None, true), "redis://redis:6379");
        assert_eq!(RedisTestConfig::resolve_test_url(None, false), "redis://localhost:6379");
        // 空字串視為未設置
        assert_eq!(
            RedisTestConfig::resolve_test_url(Some(String::new()), false),
            "redis://localhost:6379"
        );
    }

    #[test]
    fn test_unique_key_is_scoped() {
        let a = RedisTestConfig::unique_key("list", "q");
        let b = RedisTestConfig::unique_key("set", "q");
        assert_ne!(a, b);
        assert!(a.starts_with("redis_facade:test:"));
        assert!(a.ends_with(":list:q"));
    }

    #[test]
    fn test_create_pool_is_lazy() {
        // 建立連接池不需要伺服器
        let pool = RedisTestConfig::create_pool_at("redis://127.0.0.1:1").expect("無法創建Redis連接池");
        assert_eq!(pool.pool_size(), TEST_POOL_SIZE);
    }
}
