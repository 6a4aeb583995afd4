use async_trait::async_trait;
use deadpool_redis::redis::cmd;
use std::collections::HashSet;
use tracing::debug;

use crate::redis::pool::RedisPool;
use crate::redis::util::{require_non_empty, run_on, RedisUtil, RedisUtilResult};

/// 鍵空間操作
#[async_trait]
pub trait KeyOperations: Send + Sync + 'static {
    /// 檢查鍵是否存在
    async fn exists(&self, key: &str) -> RedisUtilResult<bool>;

    /// 刪除一個或多個鍵，返回實際刪除的數量；不存在的鍵不算錯誤
    async fn delete<K>(&self, keys: &[K]) -> RedisUtilResult<u64>
    where
        K: AsRef<str> + Sync;

    /// 設置過期時間（秒）
    ///
    /// `ttl_secs <= 0` 時不做任何事並返回 false；否則返回伺服器的結果
    /// （鍵不存在時為 false）。
    async fn expire(&self, key: &str, ttl_secs: i64) -> RedisUtilResult<bool>;

    /// 剩餘存活秒數；-1 表示沒有過期時間，-2 表示鍵不存在
    async fn get_expire(&self, key: &str) -> RedisUtilResult<i64>;

    /// 以 SCAN 遊標取得所有符合 glob 樣式的鍵
    async fn scan(&self, pattern: &str) -> RedisUtilResult<HashSet<String>>;
}

#[async_trait]
impl<P: RedisPool> KeyOperations for RedisUtil<P> {
    async fn exists(&self, key: &str) -> RedisUtilResult<bool> {
        require_non_empty(key, "鍵")?;

        let mut command = cmd("EXISTS");
        command.arg(self.codec().encode_key(key));
        let count: i64 = self.run("EXISTS", key, &command).await?;
        Ok(count > 0)
    }

    async fn delete<K>(&self, keys: &[K]) -> RedisUtilResult<u64>
    where
        K: AsRef<str> + Sync,
    {
        for key in keys {
            require_non_empty(key.as_ref(), "鍵")?;
        }
        if keys.is_empty() {
            return Ok(0);
        }

        let mut command = cmd("DEL");
        for key in keys {
            command.arg(self.codec().encode_key(key.as_ref()));
        }
        let label = keys[0].as_ref();
        let deleted: u64 = self.run("DEL", label, &command).await?;

        debug!("刪除 {} 個鍵中的 {} 個", keys.len(), deleted);
        Ok(deleted)
    }

    async fn expire(&self, key: &str, ttl_secs: i64) -> RedisUtilResult<bool> {
        require_non_empty(key, "鍵")?;
        if ttl_secs <= 0 {
            return Ok(false);
        }

        let mut command = cmd("EXPIRE");
        command.arg(self.codec().encode_key(key)).arg(ttl_secs);
        self.run("EXPIRE", key, &command).await
    }

    async fn get_expire(&self, key: &str) -> RedisUtilResult<i64> {
        require_non_empty(key, "鍵")?;

        let mut command = cmd("TTL");
        command.arg(self.codec().encode_key(key));
        self.run("TTL", key, &command).await
    }

    async fn scan(&self, pattern: &str) -> RedisUtilResult<HashSet<String>> {
        require_non_empty(pattern, "樣式")?;

        let mut conn = self.conn().await?;
        let mut cursor: u64 = 0;
        let mut keys = HashSet::new();

        loop {
            // 使用 SCAN 而非 KEYS，避免大鍵空間阻塞伺服器
            let mut command = cmd("SCAN");
            command
                .arg(cursor)
                .arg("MATCH")
                .arg(pattern)
                .arg("COUNT")
                .arg(self.scan_count());
            let (next_cursor, batch): (u64, Vec<Vec<u8>>) =
                run_on(&mut conn, "SCAN", pattern, &command).await?;

            for raw in batch {
                keys.insert(self.codec().decode_key(raw)?);
            }

            cursor = next_cursor;
            if cursor == 0 {
                break;
            }
        }

        debug!("SCAN {} 找到 {} 個鍵", pattern, keys.len());
        Ok(keys)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::codec::Codec;
    use crate::redis::operations::ValueOperations;
    use crate::redis::test_config::RedisTestConfig;
    use std::time::Duration;

    #[tokio::test]
    async fn test_exists_and_delete() {
        let Some(util) = RedisTestConfig::skip_if_redis_unavailable("test_exists_and_delete", Codec::default()).await else {
            return;
        };
        let a = RedisTestConfig::unique_key("keys", "a");
        let b = RedisTestConfig::unique_key("keys", "b");
        let missing = RedisTestConfig::unique_key("keys", "missing");

        util.set(&a, "hi", None).await.expect("SET失敗");
        util.set(&b, &1, None).await.expect("SET失敗");
        assert!(util.exists(&a).await.expect("EXISTS失敗"));

        // 不存在的鍵不是錯誤
        assert_eq!(util.delete(&[&a, &b, &missing]).await.expect("DEL失敗"), 2);
        assert!(!util.exists(&a).await.expect("EXISTS失敗"));
        assert_eq!(util.delete(&[&missing]).await.expect("DEL失敗"), 0);
    }

    #[tokio::test]
    async fn test_expire_and_ttl_sentinels() {
        let Some(util) = RedisTestConfig::skip_if_redis_unavailable("test_expire_and_ttl_sentinels", Codec::default()).await else {
            return;
        };
        let key = RedisTestConfig::unique_key("keys", "ttl");
        let missing = RedisTestConfig::unique_key("keys", "ttl_missing");

        assert_eq!(util.get_expire(&missing).await.unwrap(), -2);
        assert!(!util.expire(&missing, 10).await.unwrap());

        util.set(&key, "x", None).await.unwrap();
        assert_eq!(util.get_expire(&key).await.unwrap(), -1);

        assert!(util.expire(&key, 1).await.unwrap());
        let remaining = util.get_expire(&key).await.unwrap();
        assert!((0..=1).contains(&remaining), "剩餘TTL {} 不在 [0, 1] 內", remaining);

        tokio::time::sleep(Duration::from_millis(1500)).await;
        assert!(!util.exists(&key).await.unwrap());
    }

    #[tokio::test]
    async fn test_scan_by_pattern() {
        let Some(util) = RedisTestConfig::skip_if_redis_unavailable("test_scan_by_pattern", Codec::default()).await else {
            return;
        };
        // 小的 COUNT 強制走多輪遊標
        let util = util.with_scan_count(5);
        let prefix = RedisTestConfig::unique_key("scan", "");
        let keys: Vec<String> = (0..25).map(|i| format!("{}item:{}", prefix, i)).collect();
        for key in &keys {
            util.set(key, &0, None).await.unwrap();
        }

        let found = util.scan(&format!("{}item:*", prefix)).await.expect("SCAN失敗");
        assert_eq!(found, keys.iter().cloned().collect::<HashSet<_>>());
        assert!(util.scan(&format!("{}none:*", prefix)).await.unwrap().is_empty());

        util.delete(&keys).await.unwrap();
    }
}
