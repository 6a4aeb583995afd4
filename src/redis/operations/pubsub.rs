use async_trait::async_trait;
use deadpool_redis::redis::cmd;
use serde::Serialize;
use tracing::debug;

use crate::redis::pool::RedisPool;
use crate::redis::util::{require_non_empty, RedisUtil, RedisUtilResult};

/// 發布操作；訂閱不在此門面的範圍內
#[async_trait]
pub trait PubSubOperations: Send + Sync + 'static {
    /// 將訊息經編碼後發布到頻道，返回收到訊息的訂閱者數量
    ///
    /// 不保證送達：沒有訂閱者時訊息直接丟棄。
    async fn publish<M>(&self, channel: &str, message: &M) -> RedisUtilResult<u64>
    where
        M: Serialize + ?Sized + Sync + 'static;
}

#[async_trait]
impl<P: RedisPool> PubSubOperations for RedisUtil<P> {
    async fn publish<M>(&self, channel: &str, message: &M) -> RedisUtilResult<u64>
    where
        M: Serialize + ?Sized + Sync + 'static,
    {
        require_non_empty(channel, "頻道")?;
        let payload = self.encode(message)?;

        let mut command = cmd("PUBLISH");
        command.arg(channel).arg(payload);
        let receivers: u64 = self.run("PUBLISH", channel, &command).await?;

        debug!("頻道 {} 的訊息送達 {} 個訂閱者", channel, receivers);
        Ok(receivers)
    }
}
