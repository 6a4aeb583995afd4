use crate::codec::{Codec, CodecError};
use crate::config::ApplicationConfig;
use crate::redis::pool::{ConnectionPool, RedisPool, RedisPoolError};
use deadpool_redis::redis::{cmd, Cmd, FromRedisValue, RedisError};
use deadpool_redis::Connection;
use serde::de::DeserializeOwned;
use serde::Serialize;
use std::sync::Arc;
use thiserror::Error;
use tracing::{debug, error, warn};

/// 預設每次 SCAN 的 COUNT 提示
pub const DEFAULT_SCAN_COUNT: u32 = 100;

/// 門面操作錯誤
#[derive(Error, Debug)]
pub enum RedisUtilError {
    /// Redis返回錯誤、命令超時或連接中斷
    #[error("Redis操作錯誤: {0}")]
    Backend(#[from] RedisError),

    /// 無法從連接池取得連接
    #[error("Redis連接錯誤: {0}")]
    Pool(#[from] RedisPoolError),

    /// 值無法編碼或解碼
    #[error("編解碼錯誤: {0}")]
    Codec(#[from] CodecError),

    /// 調用方傳入的參數在結構上無效
    #[error("參數錯誤: {0}")]
    Usage(String),
}

impl RedisUtilError {
    /// 是否屬於伺服器或連接層面的失敗
    pub fn is_backend(&self) -> bool {
        matches!(self, RedisUtilError::Backend(_) | RedisUtilError::Pool(_))
    }
}

pub type RedisUtilResult<T> = Result<T, RedisUtilError>;

/// 檢查鍵、欄位或頻道名稱不為空
pub(crate) fn require_non_empty(value: &str, what: &str) -> RedisUtilResult<()> {
    if value.is_empty() {
        return Err(RedisUtilError::Usage(format!("{}不可為空", what)));
    }
    Ok(())
}

/// 檢查批量參數至少有一項
pub(crate) fn require_items<T>(items: &[T], what: &str) -> RedisUtilResult<()> {
    if items.is_empty() {
        return Err(RedisUtilError::Usage(format!("{}至少需要一項", what)));
    }
    Ok(())
}

/// 在指定連接上執行命令，失敗時記錄錯誤
pub(crate) async fn run_on<T>(
    conn: &mut Connection,
    op: &str,
    key: &str,
    command: &Cmd,
) -> RedisUtilResult<T>
where
    T: FromRedisValue + Send,
{
    match command.query_async::<T>(conn).await {
        Ok(value) => {
            debug!("Redis {} 成功: {}", op, key);
            Ok(value)
        }
        Err(e) => {
            error!("Redis {} 失敗: {}: {}", op, key, e);
            Err(RedisUtilError::Backend(e))
        }
    }
}

/// Redis 存取門面
///
/// 除了注入的連接池與編解碼器外不持有任何狀態，可在多個任務間共享。
/// 各資料類型的操作分別定義在 [`operations`](crate::redis::operations) 的 trait 中。
///
/// 沒有 TTL 的寫入不會延長既有的過期時間；SET 本身會清除過期時間，
/// 而 `hash_put_all` 等帶 TTL 的批量寫入是先寫入再 EXPIRE，之後任何不帶 TTL
/// 的覆寫都不會再設定過期時間。
pub struct RedisUtil<P: RedisPool> {
    pool: P,
    codec: Arc<Codec>,
    scan_count: u32,
}

impl<P: RedisPool> RedisUtil<P> {
    /// 創建門面
    pub fn new(pool: P, codec: Codec) -> Self {
        Self::with_shared_codec(pool, Arc::new(codec))
    }

    /// 與其他門面共用同一個編解碼器
    pub fn with_shared_codec(pool: P, codec: Arc<Codec>) -> Self {
        Self {
            pool,
            codec,
            scan_count: DEFAULT_SCAN_COUNT,
        }
    }

    /// 設定 SCAN 的 COUNT 提示
    pub fn with_scan_count(mut self, scan_count: u32) -> Self {
        self.scan_count = scan_count.max(1);
        self
    }

    pub fn codec(&self) -> &Codec {
        &self.codec
    }

    pub fn pool(&self) -> &P {
        &self.pool
    }

    pub(crate) fn shared_codec(&self) -> Arc<Codec> {
        Arc::clone(&self.codec)
    }

    pub(crate) fn scan_count(&self) -> u32 {
        self.scan_count
    }

    pub(crate) async fn conn(&self) -> RedisUtilResult<Connection> {
        Ok(self.pool.get_conn().await?)
    }

    pub(crate) fn encode<V>(&self, value: &V) -> RedisUtilResult<Vec<u8>>
    where
        V: Serialize + ?Sized + 'static,
    {
        Ok(self.codec.encode_value(value)?)
    }

    pub(crate) fn encode_all<V>(&self, values: &[V]) -> RedisUtilResult<Vec<Vec<u8>>>
    where
        V: Serialize + 'static,
    {
        values.iter().map(|value| self.encode(value)).collect()
    }

    pub(crate) fn decode<V>(&self, key: &str, bytes: &[u8]) -> RedisUtilResult<V>
    where
        V: DeserializeOwned + 'static,
    {
        self.codec.decode_value(bytes).map_err(|e| {
            warn!("值解碼失敗 [{}]: {}", key, e);
            RedisUtilError::Codec(e)
        })
    }

    pub(crate) fn decode_opt<V>(&self, key: &str, bytes: Option<Vec<u8>>) -> RedisUtilResult<Option<V>>
    where
        V: DeserializeOwned + 'static,
    {
        bytes.map(|b| self.decode(key, &b)).transpose()
    }

    pub(crate) fn decode_all<V>(&self, key: &str, items: Vec<Vec<u8>>) -> RedisUtilResult<Vec<V>>
    where
        V: DeserializeOwned + 'static,
    {
        items.iter().map(|b| self.decode(key, b)).collect()
    }

    /// 取得連接並執行單一命令
    pub(crate) async fn run<T>(&self, op: &str, key: &str, command: &Cmd) -> RedisUtilResult<T>
    where
        T: FromRedisValue + Send,
    {
        let mut conn = self.conn().await?;
        run_on(&mut conn, op, key, command).await
    }

    /// 寫入後套用過期時間；`None` 與 `Some(0)` 不改變過期時間
    pub(crate) async fn expire_after_write(
        conn: &mut Connection,
        key: &str,
        ttl_secs: Option<u64>,
    ) -> RedisUtilResult<()> {
        if let Some(ttl) = ttl_secs.filter(|ttl| *ttl > 0) {
            let mut command = cmd("EXPIRE");
            command.arg(key).arg(ttl);
            let _: bool = run_on(conn, "EXPIRE", key, &command).await?;
        }
        Ok(())
    }
}

impl RedisUtil<Arc<ConnectionPool>> {
    /// 依應用配置建立連接池、編解碼器與門面
    ///
    /// 連接在第一次操作時才建立，因此伺服器不可達不會在這裡失敗。
    pub fn from_config(config: &ApplicationConfig) -> RedisUtilResult<Self> {
        let pool = ConnectionPool::new(&config.connection)?;
        let codec = Codec::new(&config.codec);
        Ok(Self::new(Arc::new(pool), codec).with_scan_count(config.connection.scan_count))
    }
}
