use deadpool_redis::redis::{cmd, FromRedisValue, Pipeline};
use deadpool_redis::Connection;
use serde::de::DeserializeOwned;
use std::fmt;
use std::sync::Arc;
use tracing::{debug, error, warn};

use crate::codec::Codec;
use crate::redis::pool::RedisPool;
use crate::redis::util::{require_non_empty, run_on, RedisUtil, RedisUtilError, RedisUtilResult};

/// 樂觀鎖會話
///
/// WATCH 的狀態屬於單一連接，因此會話在整個生命週期內固定持有一個池連接。
/// 以 [`exec`](WatchSession::exec) 或 [`unwatch`](WatchSession::unwatch) 結束時連接歸還連接池；
/// 未結束就被丟棄時，連接會從池中移除，避免帶著 WATCH 狀態被其他任務取用。
pub struct WatchSession {
    conn: Option<Connection>,
    codec: Arc<Codec>,
    keys: Vec<String>,
}

impl WatchSession {
    async fn open(conn: Connection, codec: Arc<Codec>, key: &str) -> RedisUtilResult<Self> {
        let mut session = Self {
            conn: Some(conn),
            codec,
            keys: Vec::new(),
        };
        session.watch(key).await?;
        Ok(session)
    }

    /// 追加監視的鍵
    pub async fn watch(&mut self, key: &str) -> RedisUtilResult<()> {
        require_non_empty(key, "鍵")?;

        let mut command = cmd("WATCH");
        command.arg(self.codec.encode_key(key));
        let conn = self.connection()?;
        run_on::<()>(conn, "WATCH", key, &command).await?;

        self.keys.push(key.to_string());
        debug!("WATCH {}", key);
        Ok(())
    }

    /// 在固定的連接上讀取值
    pub async fn get<V>(&mut self, key: &str) -> RedisUtilResult<Option<V>>
    where
        V: DeserializeOwned + 'static,
    {
        require_non_empty(key, "鍵")?;

        let mut command = cmd("GET");
        command.arg(self.codec.encode_key(key));
        let conn = self.connection()?;
        let raw: Option<Vec<u8>> = run_on(conn, "GET", key, &command).await?;

        raw.map(|bytes| self.codec.decode_value(&bytes))
            .transpose()
            .map_err(RedisUtilError::Codec)
    }

    /// 以 MULTI/EXEC 執行管線
    ///
    /// 監視的鍵在 WATCH 之後被修改時返回 `None`，管線中的命令都不會生效。
    /// 無論成功與否，EXEC 都會清除監視狀態並結束會話。
    pub async fn exec<T>(mut self, mut pipeline: Pipeline) -> RedisUtilResult<Option<T>>
    where
        T: FromRedisValue,
    {
        let label = self.keys.join(",");
        let mut conn = self.take_connection()?;
        let result: Option<T> = match pipeline.atomic().query_async(&mut conn).await {
            Ok(result) => result,
            Err(e) => {
                // 連接狀態不明，不歸還連接池
                error!("EXEC 失敗 [{}]: {}", label, e);
                let _ = Connection::take(conn);
                return Err(RedisUtilError::Backend(e));
            }
        };

        if result.is_none() {
            debug!("監視的鍵已被修改，交易放棄: {}", label);
        }
        Ok(result)
    }

    /// 清除所有監視並歸還連接
    pub async fn unwatch(mut self) -> RedisUtilResult<()> {
        let label = self.keys.join(",");
        let mut conn = self.take_connection()?;
        let command = cmd("UNWATCH");
        if let Err(e) = command.query_async::<()>(&mut conn).await {
            error!("UNWATCH 失敗 [{}]: {}", label, e);
            let _ = Connection::take(conn);
            return Err(RedisUtilError::Backend(e));
        }
        debug!("UNWATCH {}", label);
        Ok(())
    }

    /// 正在監視的鍵
    pub fn keys(&self) -> &[String] {
        &self.keys
    }

    pub fn codec(&self) -> &Codec {
        &self.codec
    }

    fn connection(&mut self) -> RedisUtilResult<&mut Connection> {
        self.conn
            .as_mut()
            .ok_or_else(|| RedisUtilError::Usage("會話已結束".to_string()))
    }

    fn take_connection(&mut self) -> RedisUtilResult<Connection> {
        self.conn
            .take()
            .ok_or_else(|| RedisUtilError::Usage("會話已結束".to_string()))
    }
}

impl fmt::Debug for WatchSession {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("WatchSession")
            .field("keys", &self.keys)
            .field("active", &self.conn.is_some())
            .finish()
    }
}

impl Drop for WatchSession {
    fn drop(&mut self) {
        if let Some(conn) = self.conn.take() {
            warn!("會話未經 EXEC 或 UNWATCH 即被丟棄，移除連接: {}", self.keys.join(","));
            let _ = Connection::take(conn);
        }
    }
}

impl<P: RedisPool> RedisUtil<P> {
    /// 監視鍵並返回固定連接的會話
    pub async fn watch(&self, key: &str) -> RedisUtilResult<WatchSession> {
        require_non_empty(key, "鍵")?;
        let conn = self.conn().await?;
        WatchSession::open(conn, self.shared_codec(), key).await
    }

    /// 結束會話並清除其連接上的所有監視
    ///
    /// `key_hint` 只用於日誌；UNWATCH 總是清除該連接上的全部監視。
    pub async fn unwatch(&self, session: WatchSession, key_hint: &str) -> RedisUtilResult<()> {
        if !key_hint.is_empty() && !session.keys().iter().any(|k| k == key_hint) {
            debug!("{} 不在會話的監視列表中，仍清除全部監視", key_hint);
        }
        session.unwatch().await
    }
}
