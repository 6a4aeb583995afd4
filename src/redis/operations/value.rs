use async_trait::async_trait;
use deadpool_redis::redis::cmd;
use serde::{de::DeserializeOwned, Serialize};

use crate::redis::pool::RedisPool;
use crate::redis::util::{require_non_empty, RedisUtil, RedisUtilResult};

/// 字串值操作
#[async_trait]
pub trait ValueOperations: Send + Sync + 'static {
    /// 獲取鍵對應的值，鍵不存在時返回 `None`
    async fn get<V>(&self, key: &str) -> RedisUtilResult<Option<V>>
    where
        V: DeserializeOwned + Send + 'static;

    /// 寫入值
    ///
    /// `ttl_secs` 大於 0 時以 SET EX 原子地設置過期時間；否則為普通 SET，
    /// 會清除鍵原有的過期時間。
    async fn set<V>(&self, key: &str, value: &V, ttl_secs: Option<u64>) -> RedisUtilResult<()>
    where
        V: Serialize + ?Sized + Sync + 'static;

    /// 原子遞增（`step` 為負數時遞減），鍵不存在時從 0 開始
    async fn increment(&self, key: &str, step: i64) -> RedisUtilResult<i64>;
}

#[async_trait]
impl<P: RedisPool> ValueOperations for RedisUtil<P> {
    async fn get<V>(&self, key: &str) -> RedisUtilResult<Option<V>>
    where
        V: DeserializeOwned + Send + 'static,
    {
        require_non_empty(key, "鍵")?;

        let mut command = cmd("GET");
        command.arg(self.codec().encode_key(key));
        let raw: Option<Vec<u8>> = self.run("GET", key, &command).await?;
        self.decode_opt(key, raw)
    }

    async fn set<V>(&self, key: &str, value: &V, ttl_secs: Option<u64>) -> RedisUtilResult<()>
    where
        V: Serialize + ?Sized + Sync + 'static,
    {
        require_non_empty(key, "鍵")?;
        let payload = self.encode(value)?;

        let mut command = cmd("SET");
        command.arg(self.codec().encode_key(key)).arg(payload);
        if let Some(ttl) = ttl_secs.filter(|ttl| *ttl > 0) {
            command.arg("EX").arg(ttl);
        }
        self.run::<()>("SET", key, &command).await
    }

    async fn increment(&self, key: &str, step: i64) -> RedisUtilResult<i64> {
        require_non_empty(key, "鍵")?;

        let mut command = cmd("INCRBY");
        command.arg(self.codec().encode_key(key)).arg(step);
        self.run("INCRBY", key, &command).await
    }
}
