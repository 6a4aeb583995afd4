use async_trait::async_trait;
use deadpool_redis::redis::cmd;
use serde::{de::DeserializeOwned, Serialize};

use crate::redis::pool::RedisPool;
use crate::redis::util::{require_items, require_non_empty, run_on, RedisUtil, RedisUtilResult};

/// 集合操作
///
/// 成員以編碼後的位元組比較，同一個值在同一種標籤風格下總是得到相同的編碼。
#[async_trait]
pub trait SetOperations: Send + Sync + 'static {
    /// 所有成員，順序不保證
    async fn set_members<V>(&self, key: &str) -> RedisUtilResult<Vec<V>>
    where
        V: DeserializeOwned + Send + 'static;

    /// 是否為成員
    async fn set_has<V>(&self, key: &str, value: &V) -> RedisUtilResult<bool>
    where
        V: Serialize + ?Sized + Sync + 'static;

    /// 加入成員，返回新增的數量（已存在的成員不計）
    async fn set_add<V>(&self, key: &str, values: &[V], ttl_secs: Option<u64>) -> RedisUtilResult<u64>
    where
        V: Serialize + Sync + 'static;

    /// 成員數量
    async fn set_size(&self, key: &str) -> RedisUtilResult<u64>;

    /// 移除成員，返回實際移除的數量
    async fn set_remove<V>(&self, key: &str, values: &[V]) -> RedisUtilResult<u64>
    where
        V: Serialize + Sync + 'static;
}

#[async_trait]
impl<P: RedisPool> SetOperations for RedisUtil<P> {
    async fn set_members<V>(&self, key: &str) -> RedisUtilResult<Vec<V>>
    where
        V: DeserializeOwned + Send + 'static,
    {
        require_non_empty(key, "鍵")?;

        let mut command = cmd("SMEMBERS");
        command.arg(self.codec().encode_key(key));
        let raw: Vec<Vec<u8>> = self.run("SMEMBERS", key, &command).await?;
        self.decode_all(key, raw)
    }

    async fn set_has<V>(&self, key: &str, value: &V) -> RedisUtilResult<bool>
    where
        V: Serialize + ?Sized + Sync + 'static,
    {
        require_non_empty(key, "鍵")?;

        let mut command = cmd("SISMEMBER");
        command.arg(self.codec().encode_key(key)).arg(self.encode(value)?);
        self.run("SISMEMBER", key, &command).await
    }

    async fn set_add<V>(&self, key: &str, values: &[V], ttl_secs: Option<u64>) -> RedisUtilResult<u64>
    where
        V: Serialize + Sync + 'static,
    {
        require_non_empty(key, "鍵")?;
        require_items(values, "SADD 的成員")?;

        let mut command = cmd("SADD");
        command.arg(self.codec().encode_key(key));
        for member in self.encode_all(values)? {
            command.arg(member);
        }

        let mut conn = self.conn().await?;
        let added: u64 = run_on(&mut conn, "SADD", key, &command).await?;
        Self::expire_after_write(&mut conn, key, ttl_secs).await?;
        Ok(added)
    }

    async fn set_size(&self, key: &str) -> RedisUtilResult<u64> {
        require_non_empty(key, "鍵")?;

        let mut command = cmd("SCARD");
        command.arg(self.codec().encode_key(key));
        self.run("SCARD", key, &command).await
    }

    async fn set_remove<V>(&self, key: &str, values: &[V]) -> RedisUtilResult<u64>
    where
        V: Serialize + Sync + 'static,
    {
        require_non_empty(key, "鍵")?;
        require_items(values, "SREM 的成員")?;

        let mut command = cmd("SREM");
        command.arg(self.codec().encode_key(key));
        for member in self.encode_all(values)? {
            command.arg(member);
        }
        self.run("SREM", key, &command).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::codec::Codec;
    use crate::redis::operations::KeyOperations;
    use crate::redis::pool::MockRedisPool;
    use crate::redis::test_config::RedisTestConfig;
    use crate::redis::util::RedisUtilError;
    use assert_matches::assert_matches;
    use serde_json::json;
    use std::collections::HashSet;

    #[tokio::test]
    async fn test_membership_scenario() {
        let Some(util) = RedisTestConfig::skip_if_redis_unavailable("test_membership_scenario", Codec::default()).await else {
            return;
        };
        let key = RedisTestConfig::unique_key("set", "s");

        assert_eq!(util.set_add(&key, &["a", "b", "a"], None).await.unwrap(), 2);
        assert!(util.set_has(&key, "a").await.unwrap());
        assert_eq!(util.set_remove(&key, &["a"]).await.unwrap(), 1);
        assert_eq!(util.set_size(&key).await.unwrap(), 1);
        assert!(!util.set_has(&key, "a").await.unwrap());

        util.delete(&[&key]).await.unwrap();
    }

    #[tokio::test]
    async fn test_duplicates_collapse() {
        let Some(util) = RedisTestConfig::skip_if_redis_unavailable("test_duplicates_collapse", Codec::default()).await else {
            return;
        };
        let key = RedisTestConfig::unique_key("set", "dedup");
        let members = vec![json!({"id": 1}), json!([1, 2]), json!({"id": 1}), json!("x"), json!([1, 2])];
        let distinct: HashSet<String> = members.iter().map(|m| m.to_string()).collect();

        let added = util.set_add(&key, &members, Some(60)).await.unwrap();
        assert_eq!(added as usize, distinct.len());
        assert_eq!(util.set_size(&key).await.unwrap() as usize, distinct.len());
        assert!(util.get_expire(&key).await.unwrap() > 0);

        // 再次加入相同成員不改變集合
        assert_eq!(util.set_add(&key, &members, None).await.unwrap(), 0);

        let stored: HashSet<String> = util
            .set_members::<serde_json::Value>(&key)
            .await
            .unwrap()
            .iter()
            .map(|m| m.to_string())
            .collect();
        assert_eq!(stored, distinct);

        util.delete(&[&key]).await.unwrap();
    }

    #[tokio::test]
    async fn test_empty_member_lists_are_rejected() {
        let mut pool = MockRedisPool::new();
        pool.expect_get_conn().times(0);
        let util = RedisUtil::new(pool, Codec::default());

        let none: [&str; 0] = [];
        assert_matches!(util.set_add("s", &none, None).await, Err(RedisUtilError::Usage(_)));
        assert_matches!(util.set_remove("s", &none).await, Err(RedisUtilError::Usage(_)));
        assert_matches!(util.set_size("").await, Err(RedisUtilError::Usage(_)));
    }
}
