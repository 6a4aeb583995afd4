//! Redis存取模組
//!
//! 包括連接池管理、帶型別標籤的值編解碼，以及按資料類型劃分的門面操作：
//! 鍵空間、字串值、雜湊、列表、集合、有序集合、發布與樂觀鎖。

pub mod operations;
pub mod pool;
pub mod util;

#[cfg(test)]
pub mod test_config;

pub use operations::*;
pub use pool::*;
pub use util::{RedisUtil, RedisUtilError, RedisUtilResult, DEFAULT_SCAN_COUNT};
