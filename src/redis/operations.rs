//! Redis操作模組
//!
//! 依資料類型把門面的操作分成多個 trait，全部由 [`RedisUtil`](crate::redis::util::RedisUtil) 實現。
//! 樂觀鎖不是 trait，而是固定連接的 [`WatchSession`]。

pub mod hash;
pub mod keys;
pub mod list;
pub mod lock;
pub mod pubsub;
pub mod set;
pub mod value;
pub mod zset;

pub use hash::HashOperations;
pub use keys::KeyOperations;
pub use list::ListOperations;
pub use lock::WatchSession;
pub use pubsub::PubSubOperations;
pub use set::SetOperations;
pub use value::ValueOperations;
pub use zset::ZSetOperations;
