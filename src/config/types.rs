use crate::config::validation::{ValidationError, ValidationUtils, Validator};
use serde::{Deserialize, Serialize};
use std::time::Duration;

/// 應用程序配置結構
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ApplicationConfig {
    pub connection: ConnectionConfig,
    pub codec: CodecConfig,
    pub log: LogConfig,
}

impl Validator for ApplicationConfig {
    fn validate(&self) -> Result<(), ValidationError> {
        self.connection.validate()?;
        self.codec.validate()?;
        self.log.validate()?;

        Ok(())
    }
}

/// Redis連接配置
///
/// 這些欄位原樣傳給連接池，門面本身不讀取它們。
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ConnectionConfig {
    pub host: String,
    pub port: u16,
    pub password: Option<String>,
    pub database: i64,
    #[serde(alias = "poolSize")]
    pub pool_size: u32,
    #[serde(alias = "connectionTimeoutSecs")]
    pub connection_timeout_secs: u64,
    /// 每次 SCAN 請求的 COUNT 提示
    #[serde(alias = "scanCount")]
    pub scan_count: u32,
}

impl Default for ConnectionConfig {
    fn default() -> Self {
        Self {
            host: "127.0.0.1".to_string(),
            port: 6379,
            password: None,
            database: 0,
            pool_size: 8,
            connection_timeout_secs: 5,
            scan_count: 100,
        }
    }
}

impl ConnectionConfig {
    /// 組合 redis:// 連接URL，密碼經百分號編碼
    pub fn url(&self) -> String {
        match self.password.as_deref().filter(|p| !p.is_empty()) {
            Some(password) => format!(
                "redis://:{}@{}:{}/{}",
                urlencoding::encode(password),
                self.host,
                self.port,
                self.database
            ),
            None => format!("redis://{}:{}/{}", self.host, self.port, self.database),
        }
    }

    /// 獲取連接超時持續時間
    pub fn connection_timeout(&self) -> Duration {
        Duration::from_secs(self.connection_timeout_secs)
    }
}

impl Validator for ConnectionConfig {
    fn validate(&self) -> Result<(), ValidationError> {
        ValidationUtils::not_empty(&self.host, "connection.host")?;
        ValidationUtils::in_range(self.port, 1, 65535, "connection.port")?;
        ValidationUtils::in_range(self.database, 0, 15, "connection.database")?;
        ValidationUtils::in_range(self.pool_size, 1, 100, "connection.pool_size")?;
        ValidationUtils::in_range(
            self.connection_timeout_secs,
            1,
            60,
            "connection.connection_timeout_secs",
        )?;
        ValidationUtils::in_range(self.scan_count, 1, 10_000, "connection.scan_count")?;

        Ok(())
    }
}

/// 類型標籤的命名方式
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TypeTagStyle {
    /// 完整路徑，例如 `my_app::model::User`
    #[default]
    #[serde(alias = "fullyQualified")]
    FullyQualified,
    /// 去除模組路徑，例如 `User`
    Short,
}

/// 值編解碼配置
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct CodecConfig {
    /// 為 true 時解碼任何類型標籤，不檢查允許清單
    #[serde(alias = "allowUntrustedTypes")]
    pub allow_untrusted_types: bool,
    #[serde(alias = "typeTagStyle")]
    pub type_tag_style: TypeTagStyle,
    /// 額外允許的類型標籤（已註冊的類型總是被允許）
    #[serde(alias = "allowedTypes")]
    pub allowed_types: Vec<String>,
}

impl Validator for CodecConfig {
    fn validate(&self) -> Result<(), ValidationError> {
        ValidationUtils::no_blank_items(&self.allowed_types, "codec.allowed_types")
    }
}

/// 日誌配置
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct LogConfig {
    pub level: String,
    pub format: String,
}

impl Default for LogConfig {
    fn default() -> Self {
        Self {
            level: "info".to_string(),
            format: "pretty".to_string(),
        }
    }
}

impl Validator for LogConfig {
    fn validate(&self) -> Result<(), ValidationError> {
        ValidationUtils::one_of(
            &self.level,
            &["trace", "debug", "info", "warn", "error"],
            "log.level",
        )?;
        ValidationUtils::one_of(&self.format, &["pretty", "json"], "log.format")?;

        Ok(())
    }
}
