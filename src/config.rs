//! 配置管理模組
//!
//! 本模組負責加載與驗證連接、編解碼與日誌配置。
//! 配置值由調用方顯式傳入連接池與門面，不存在全局配置實例。
// 宣告子模組
pub mod loader;
pub mod types;
pub mod validation;

// 重新導出常用組件
pub use loader::{ConfigLoadError, ConfigLoader, Environment, ENV_PREFIX};
pub use types::*;
pub use validation::{ValidationError, ValidationUtils, Validator};
