//! 帶型別標籤編解碼的 Redis 存取門面
//!
//! - [`codec`]：把值編碼為 JSON，複合值附帶型別標籤，解碼時以允許清單檢查標籤
//! - [`redis`]：連接池與按資料類型劃分的門面操作
//! - [`config`]：分層載入的應用配置
//! - [`logging`]：tracing 訂閱器初始化

// 模組定義
pub mod codec;
pub mod config;
pub mod logging;
pub mod redis;

pub use codec::{Codec, CodecError, DynamicValue, TypePolicy};
pub use config::ApplicationConfig;
pub use redis::{ConnectionPool, RedisPool, RedisUtil, RedisUtilError, RedisUtilResult};
