use async_trait::async_trait;
use deadpool_redis::redis::cmd;
use serde::{de::DeserializeOwned, Serialize};

use crate::redis::pool::RedisPool;
use crate::redis::util::{require_items, require_non_empty, run_on, RedisUtil, RedisUtilError, RedisUtilResult};

/// 有序集合操作
///
/// 排名從 0 開始；範圍查詢的兩端都包含在內。分數邊界可以是
/// `f64::NEG_INFINITY` 與 `f64::INFINITY`。
#[async_trait]
pub trait ZSetOperations: Send + Sync + 'static {
    /// 加入或更新成員分數，返回是否為新成員
    async fn zset_add<V>(&self, key: &str, value: &V, score: f64) -> RedisUtilResult<bool>
    where
        V: Serialize + ?Sized + Sync + 'static;

    /// 批量加入，返回新成員數量；`ttl_secs` 語義同 `hash_put_all`
    async fn zset_add_all<V>(
        &self,
        key: &str,
        entries: &[(V, f64)],
        ttl_secs: Option<u64>,
    ) -> RedisUtilResult<u64>
    where
        V: Serialize + Sync + 'static;

    async fn zset_has<V>(&self, key: &str, value: &V) -> RedisUtilResult<bool>
    where
        V: Serialize + ?Sized + Sync + 'static;

    async fn zset_size(&self, key: &str) -> RedisUtilResult<u64>;

    /// 移除成員，返回實際移除的數量
    async fn zset_remove<V>(&self, key: &str, values: &[V]) -> RedisUtilResult<u64>
    where
        V: Serialize + Sync + 'static;

    /// 成員分數，不是成員時為 `None`
    async fn zset_score<V>(&self, key: &str, value: &V) -> RedisUtilResult<Option<f64>>
    where
        V: Serialize + ?Sized + Sync + 'static;

    /// 遞增成員分數，返回新分數；成員不存在時從 0 開始
    async fn zset_increment<V>(&self, key: &str, value: &V, delta: f64) -> RedisUtilResult<f64>
    where
        V: Serialize + ?Sized + Sync + 'static;

    /// 依排名區間取得成員（分數由低到高）
    async fn zset_range<V>(&self, key: &str, start: i64, end: i64) -> RedisUtilResult<Vec<V>>
    where
        V: DeserializeOwned + Send + 'static;

    /// 依排名區間取得成員與分數
    async fn zset_range_with_scores<V>(
        &self,
        key: &str,
        start: i64,
        end: i64,
    ) -> RedisUtilResult<Vec<(V, f64)>>
    where
        V: DeserializeOwned + Send + 'static;

    /// 依分數區間 `[min, max]` 取得成員
    async fn zset_range_by_score<V>(&self, key: &str, min: f64, max: f64) -> RedisUtilResult<Vec<V>>
    where
        V: DeserializeOwned + Send + 'static;

    /// 分數在 `[min, max]` 內的成員數量
    async fn zset_count(&self, key: &str, min: f64, max: f64) -> RedisUtilResult<u64>;

    /// 由低到高的排名
    async fn zset_rank<V>(&self, key: &str, value: &V) -> RedisUtilResult<Option<u64>>
    where
        V: Serialize + ?Sized + Sync + 'static;

    /// 由高到低的排名
    async fn zset_reverse_rank<V>(&self, key: &str, value: &V) -> RedisUtilResult<Option<u64>>
    where
        V: Serialize + ?Sized + Sync + 'static;
}

fn require_score(score: f64) -> RedisUtilResult<()> {
    if score.is_nan() {
        return Err(RedisUtilError::Usage("分數不可為 NaN".to_string()));
    }
    Ok(())
}

impl<P: RedisPool> RedisUtil<P> {
    async fn member_query<T, V>(&self, op: &str, key: &str, value: &V) -> RedisUtilResult<T>
    where
        T: deadpool_redis::redis::FromRedisValue + Send,
        V: Serialize + ?Sized + 'static,
    {
        require_non_empty(key, "鍵")?;

        let mut command = cmd(op);
        command.arg(self.codec().encode_key(key)).arg(self.encode(value)?);
        self.run(op, key, &command).await
    }
}

#[async_trait]
impl<P: RedisPool> ZSetOperations for RedisUtil<P> {
    async fn zset_add<V>(&self, key: &str, value: &V, score: f64) -> RedisUtilResult<bool>
    where
        V: Serialize + ?Sized + Sync + 'static,
    {
        require_non_empty(key, "鍵")?;
        require_score(score)?;

        let mut command = cmd("ZADD");
        command
            .arg(self.codec().encode_key(key))
            .arg(score)
            .arg(self.encode(value)?);
        let added: u64 = self.run("ZADD", key, &command).await?;
        Ok(added > 0)
    }

    async fn zset_add_all<V>(
        &self,
        key: &str,
        entries: &[(V, f64)],
        ttl_secs: Option<u64>,
    ) -> RedisUtilResult<u64>
    where
        V: Serialize + Sync + 'static,
    {
        require_non_empty(key, "鍵")?;
        require_items(entries, "ZADD 的成員")?;

        let mut command = cmd("ZADD");
        command.arg(self.codec().encode_key(key));
        for (value, score) in entries {
            require_score(*score)?;
            command.arg(*score).arg(self.encode(value)?);
        }

        let mut conn = self.conn().await?;
        let added: u64 = run_on(&mut conn, "ZADD", key, &command).await?;
        Self::expire_after_write(&mut conn, key, ttl_secs).await?;
        Ok(added)
    }

    async fn zset_has<V>(&self, key: &str, value: &V) -> RedisUtilResult<bool>
    where
        V: Serialize + ?Sized + Sync + 'static,
    {
        let score: Option<f64> = self.member_query("ZSCORE", key, value).await?;
        Ok(score.is_some())
    }

    async fn zset_size(&self, key: &str) -> RedisUtilResult<u64> {
        require_non_empty(key, "鍵")?;

        let mut command = cmd("ZCARD");
        command.arg(self.codec().encode_key(key));
        self.run("ZCARD", key, &command).await
    }

    async fn zset_remove<V>(&self, key: &str, values: &[V]) -> RedisUtilResult<u64>
    where
        V: Serialize + Sync + 'static,
    {
        require_non_empty(key, "鍵")?;
        require_items(values, "ZREM 的成員")?;

        let mut command = cmd("ZREM");
        command.arg(self.codec().encode_key(key));
        for member in self.encode_all(values)? {
            command.arg(member);
        }
        self.run("ZREM", key, &command).await
    }

    async fn zset_score<V>(&self, key: &str, value: &V) -> RedisUtilResult<Option<f64>>
    where
        V: Serialize + ?Sized + Sync + 'static,
    {
        self.member_query("ZSCORE", key, value).await
    }

    async fn zset_increment<V>(&self, key: &str, value: &V, delta: f64) -> RedisUtilResult<f64>
    where
        V: Serialize + ?Sized + Sync + 'static,
    {
        require_non_empty(key, "鍵")?;
        require_score(delta)?;

        let mut command = cmd("ZINCRBY");
        command
            .arg(self.codec().encode_key(key))
            .arg(delta)
            .arg(self.encode(value)?);
        self.run("ZINCRBY", key, &command).await
    }

    async fn zset_range<V>(&self, key: &str, start: i64, end: i64) -> RedisUtilResult<Vec<V>>
    where
        V: DeserializeOwned + Send + 'static,
    {
        require_non_empty(key, "鍵")?;

        let mut command = cmd("ZRANGE");
        command.arg(self.codec().encode_key(key)).arg(start).arg(end);
        let raw: Vec<Vec<u8>> = self.run("ZRANGE", key, &command).await?;
        self.decode_all(key, raw)
    }

    async fn zset_range_with_scores<V>(
        &self,
        key: &str,
        start: i64,
        end: i64,
    ) -> RedisUtilResult<Vec<(V, f64)>>
    where
        V: DeserializeOwned + Send + 'static,
    {
        require_non_empty(key, "鍵")?;

        let mut command = cmd("ZRANGE");
        command
            .arg(self.codec().encode_key(key))
            .arg(start)
            .arg(end)
            .arg("WITHSCORES");
        let raw: Vec<(Vec<u8>, f64)> = self.run("ZRANGE", key, &command).await?;

        let mut members = Vec::with_capacity(raw.len());
        for (bytes, score) in raw {
            members.push((self.decode(key, &bytes)?, score));
        }
        Ok(members)
    }

    async fn zset_range_by_score<V>(&self, key: &str, min: f64, max: f64) -> RedisUtilResult<Vec<V>>
    where
        V: DeserializeOwned + Send + 'static,
    {
        require_non_empty(key, "鍵")?;
        require_score(min)?;
        require_score(max)?;

        let mut command = cmd("ZRANGEBYSCORE");
        command.arg(self.codec().encode_key(key)).arg(min).arg(max);
        let raw: Vec<Vec<u8>> = self.run("ZRANGEBYSCORE", key, &command).await?;
        self.decode_all(key, raw)
    }

    async fn zset_count(&self, key: &str, min: f64, max: f64) -> RedisUtilResult<u64> {
        require_non_empty(key, "鍵")?;
        require_score(min)?;
        require_score(max)?;

        let mut command = cmd("ZCOUNT");
        command.arg(self.codec().encode_key(key)).arg(min).arg(max);
        self.run("ZCOUNT", key, &command).await
    }

    async fn zset_rank<V>(&self, key: &str, value: &V) -> RedisUtilResult<Option<u64>>
    where
        V: Serialize + ?Sized + Sync + 'static,
    {
        self.member_query("ZRANK", key, value).await
    }

    async fn zset_reverse_rank<V>(&self, key: &str, value: &V) -> RedisUtilResult<Option<u64>>
    where
        V: Serialize + ?Sized + Sync + 'static,
    {
        self.member_query("ZREVRANK", key, value).await
    }
}
