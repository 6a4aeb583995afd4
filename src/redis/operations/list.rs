use async_trait::async_trait;
use deadpool_redis::redis::cmd;
use serde::{de::DeserializeOwned, Serialize};

use crate::redis::pool::RedisPool;
use crate::redis::util::{require_items, require_non_empty, run_on, RedisUtil, RedisUtilResult};

/// 列表操作
///
/// 索引從 0 開始；負數索引從尾端算起，-1 為最後一個元素。
#[async_trait]
pub trait ListOperations: Send + Sync + 'static {
    /// 取得 `[start, end]` 區間（含兩端）的元素
    async fn list_range<V>(&self, key: &str, start: i64, end: i64) -> RedisUtilResult<Vec<V>>
    where
        V: DeserializeOwned + Send + 'static;

    /// 列表長度，鍵不存在時為 0
    async fn list_size(&self, key: &str) -> RedisUtilResult<u64>;

    /// 依索引取得元素
    async fn list_index<V>(&self, key: &str, index: i64) -> RedisUtilResult<Option<V>>
    where
        V: DeserializeOwned + Send + 'static;

    /// 從尾端推入一個值，返回推入後的長度
    async fn list_append<V>(&self, key: &str, value: &V, ttl_secs: Option<u64>) -> RedisUtilResult<u64>
    where
        V: Serialize + ?Sized + Sync + 'static;

    /// 從尾端依序推入多個值，返回推入後的長度
    async fn list_append_all<V>(
        &self,
        key: &str,
        values: &[V],
        ttl_secs: Option<u64>,
    ) -> RedisUtilResult<u64>
    where
        V: Serialize + Sync + 'static;

    /// 替換指定索引的元素；索引越界時返回伺服器錯誤
    async fn list_set_at<V>(&self, key: &str, index: i64, value: &V) -> RedisUtilResult<()>
    where
        V: Serialize + ?Sized + Sync + 'static;

    /// 移除最多 `|count|` 個等於 `value` 的元素，返回移除數量
    ///
    /// `count > 0` 由頭到尾，`count < 0` 由尾到頭，`count = 0` 移除全部。
    async fn list_remove<V>(&self, key: &str, count: i64, value: &V) -> RedisUtilResult<u64>
    where
        V: Serialize + ?Sized + Sync + 'static;

    /// 彈出最右邊（尾端）的元素
    async fn list_right_pop<V>(&self, key: &str) -> RedisUtilResult<Option<V>>
    where
        V: DeserializeOwned + Send + 'static;
}

#[async_trait]
impl<P: RedisPool> ListOperations for RedisUtil<P> {
    async fn list_range<V>(&self, key: &str, start: i64, end: i64) -> RedisUtilResult<Vec<V>>
    where
        V: DeserializeOwned + Send + 'static,
    {
        require_non_empty(key, "鍵")?;

        let mut command = cmd("LRANGE");
        command.arg(self.codec().encode_key(key)).arg(start).arg(end);
        let raw: Vec<Vec<u8>> = self.run("LRANGE", key, &command).await?;
        self.decode_all(key, raw)
    }

    async fn list_size(&self, key: &str) -> RedisUtilResult<u64> {
        require_non_empty(key, "鍵")?;

        let mut command = cmd("LLEN");
        command.arg(self.codec().encode_key(key));
        self.run("LLEN", key, &command).await
    }

    async fn list_index<V>(&self, key: &str, index: i64) -> RedisUtilResult<Option<V>>
    where
        V: DeserializeOwned + Send + 'static,
    {
        require_non_empty(key, "鍵")?;

        let mut command = cmd("LINDEX");
        command.arg(self.codec().encode_key(key)).arg(index);
        let raw: Option<Vec<u8>> = self.run("LINDEX", key, &command).await?;
        self.decode_opt(key, raw)
    }

    async fn list_append<V>(&self, key: &str, value: &V, ttl_secs: Option<u64>) -> RedisUtilResult<u64>
    where
        V: Serialize + ?Sized + Sync + 'static,
    {
        require_non_empty(key, "鍵")?;

        let mut command = cmd("RPUSH");
        command.arg(self.codec().encode_key(key)).arg(self.encode(value)?);

        let mut conn = self.conn().await?;
        let length: u64 = run_on(&mut conn, "RPUSH", key, &command).await?;
        Self::expire_after_write(&mut conn, key, ttl_secs).await?;
        Ok(length)
    }

    async fn list_append_all<V>(
        &self,
        key: &str,
        values: &[V],
        ttl_secs: Option<u64>,
    ) -> RedisUtilResult<u64>
    where
        V: Serialize + Sync + 'static,
    {
        require_non_empty(key, "鍵")?;
        require_items(values, "RPUSH 的值")?;

        let mut command = cmd("RPUSH");
        command.arg(self.codec().encode_key(key));
        for payload in self.encode_all(values)? {
            command.arg(payload);
        }

        let mut conn = self.conn().await?;
        let length: u64 = run_on(&mut conn, "RPUSH", key, &command).await?;
        Self::expire_after_write(&mut conn, key, ttl_secs).await?;
        Ok(length)
    }

    async fn list_set_at<V>(&self, key: &str, index: i64, value: &V) -> RedisUtilResult<()>
    where
        V: Serialize + ?Sized + Sync + 'static,
    {
        require_non_empty(key, "鍵")?;

        let mut command = cmd("LSET");
        command
            .arg(self.codec().encode_key(key))
            .arg(index)
            .arg(self.encode(value)?);
        self.run::<()>("LSET", key, &command).await
    }

    async fn list_remove<V>(&self, key: &str, count: i64, value: &V) -> RedisUtilResult<u64>
    where
        V: Serialize + ?Sized + Sync + 'static,
    {
        require_non_empty(key, "鍵")?;

        let mut command = cmd("LREM");
        command
            .arg(self.codec().encode_key(key))
            .arg(count)
            .arg(self.encode(value)?);
        self.run("LREM", key, &command).await
    }

    async fn list_right_pop<V>(&self, key: &str) -> RedisUtilResult<Option<V>>
    where
        V: DeserializeOwned + Send + 'static,
    {
        require_non_empty(key, "鍵")?;

        let mut command = cmd("RPOP");
        command.arg(self.codec().encode_key(key));
        let raw: Option<Vec<u8>> = self.run("RPOP", key, &command).await?;
        self.decode_opt(key, raw)
    }
}
