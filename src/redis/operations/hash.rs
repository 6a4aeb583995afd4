use async_trait::async_trait;
use deadpool_redis::redis::cmd;
use serde::{de::DeserializeOwned, Serialize};
use std::collections::HashMap;

use crate::redis::pool::RedisPool;
use crate::redis::util::{require_non_empty, run_on, RedisUtil, RedisUtilError, RedisUtilResult};

/// 雜湊操作
///
/// 欄位名以字串寫入，欄位值經過編解碼器。
#[async_trait]
pub trait HashOperations: Send + Sync + 'static {
    /// 獲取單一欄位
    async fn hash_get_field<V>(&self, key: &str, field: &str) -> RedisUtilResult<Option<V>>
    where
        V: DeserializeOwned + Send + 'static;

    /// 獲取所有欄位
    async fn hash_get_all<V>(&self, key: &str) -> RedisUtilResult<HashMap<String, V>>
    where
        V: DeserializeOwned + Send + 'static;

    /// 批量寫入欄位，`ttl_secs` 大於 0 時於寫入後設置過期時間
    ///
    /// 寫入與 EXPIRE 是兩個命令，並非原子操作；之後不帶 TTL 的寫入不會保留此過期時間。
    async fn hash_put_all<V>(
        &self,
        key: &str,
        entries: &HashMap<String, V>,
        ttl_secs: Option<u64>,
    ) -> RedisUtilResult<()>
    where
        V: Serialize + Sync + 'static;

    /// 寫入單一欄位，不存在時創建雜湊表；TTL 語義同 `hash_put_all`
    async fn hash_put<V>(
        &self,
        key: &str,
        field: &str,
        value: &V,
        ttl_secs: Option<u64>,
    ) -> RedisUtilResult<()>
    where
        V: Serialize + ?Sized + Sync + 'static;

    /// 刪除欄位，返回實際刪除的數量
    async fn hash_delete<F>(&self, key: &str, fields: &[F]) -> RedisUtilResult<u64>
    where
        F: AsRef<str> + Sync;

    /// 欄位是否存在
    async fn hash_has_field(&self, key: &str, field: &str) -> RedisUtilResult<bool>;

    /// 欄位原子遞增，返回新值；欄位不存在時從 0 開始
    async fn hash_increment(&self, key: &str, field: &str, delta: f64) -> RedisUtilResult<f64>;
}

#[async_trait]
impl<P: RedisPool> HashOperations for RedisUtil<P> {
    async fn hash_get_field<V>(&self, key: &str, field: &str) -> RedisUtilResult<Option<V>>
    where
        V: DeserializeOwned + Send + 'static,
    {
        require_non_empty(key, "鍵")?;
        require_non_empty(field, "欄位")?;

        let mut command = cmd("HGET");
        command.arg(self.codec().encode_key(key)).arg(field);
        let raw: Option<Vec<u8>> = self.run("HGET", key, &command).await?;
        self.decode_opt(key, raw)
    }

    async fn hash_get_all<V>(&self, key: &str) -> RedisUtilResult<HashMap<String, V>>
    where
        V: DeserializeOwned + Send + 'static,
    {
        require_non_empty(key, "鍵")?;

        let mut command = cmd("HGETALL");
        command.arg(self.codec().encode_key(key));
        let raw: HashMap<String, Vec<u8>> = self.run("HGETALL", key, &command).await?;

        let mut entries = HashMap::with_capacity(raw.len());
        for (field, bytes) in raw {
            let value = self.decode(key, &bytes)?;
            entries.insert(field, value);
        }
        Ok(entries)
    }

    async fn hash_put_all<V>(
        &self,
        key: &str,
        entries: &HashMap<String, V>,
        ttl_secs: Option<u64>,
    ) -> RedisUtilResult<()>
    where
        V: Serialize + Sync + 'static,
    {
        require_non_empty(key, "鍵")?;
        if entries.is_empty() {
            return Err(RedisUtilError::Usage("雜湊寫入至少需要一個欄位".to_string()));
        }

        let mut command = cmd("HSET");
        command.arg(self.codec().encode_key(key));
        for (field, value) in entries {
            require_non_empty(field, "欄位")?;
            command.arg(field.as_str()).arg(self.encode(value)?);
        }

        let mut conn = self.conn().await?;
        let _: u64 = run_on(&mut conn, "HSET", key, &command).await?;
        Self::expire_after_write(&mut conn, key, ttl_secs).await
    }

    async fn hash_put<V>(
        &self,
        key: &str,
        field: &str,
        value: &V,
        ttl_secs: Option<u64>,
    ) -> RedisUtilResult<()>
    where
        V: Serialize + ?Sized + Sync + 'static,
    {
        require_non_empty(key, "鍵")?;
        require_non_empty(field, "欄位")?;

        let mut command = cmd("HSET");
        command
            .arg(self.codec().encode_key(key))
            .arg(field)
            .arg(self.encode(value)?);

        let mut conn = self.conn().await?;
        let _: u64 = run_on(&mut conn, "HSET", key, &command).await?;
        Self::expire_after_write(&mut conn, key, ttl_secs).await
    }

    async fn hash_delete<F>(&self, key: &str, fields: &[F]) -> RedisUtilResult<u64>
    where
        F: AsRef<str> + Sync,
    {
        require_non_empty(key, "鍵")?;
        if fields.is_empty() {
            return Err(RedisUtilError::Usage("HDEL 至少需要一個欄位".to_string()));
        }

        let mut command = cmd("HDEL");
        command.arg(self.codec().encode_key(key));
        for field in fields {
            command.arg(field.as_ref());
        }
        self.run("HDEL", key, &command).await
    }

    async fn hash_has_field(&self, key: &str, field: &str) -> RedisUtilResult<bool> {
        require_non_empty(key, "鍵")?;
        require_non_empty(field, "欄位")?;

        let mut command = cmd("HEXISTS");
        command.arg(self.codec().encode_key(key)).arg(field);
        self.run("HEXISTS", key, &command).await
    }

    async fn hash_increment(&self, key: &str, field: &str, delta: f64) -> RedisUtilResult<f64> {
        require_non_empty(key, "鍵")?;
        require_non_empty(field, "欄位")?;

        let mut command = cmd("HINCRBYFLOAT");
        command.arg(self.codec().encode_key(key)).arg(field).arg(delta);
        self.run("HINCRBYFLOAT", key, &command).await
    }
}
