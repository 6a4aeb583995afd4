//! 日誌初始化
//!
//! 依據 [`LogConfig`] 安裝全局 `tracing` 訂閱器。設置了 `RUST_LOG` 時以它為準。

use crate::config::LogConfig;
use thiserror::Error;
use tracing::info;
use tracing_subscriber::EnvFilter;

/// 日誌系統錯誤
#[derive(Error, Debug)]
pub enum LoggingError {
    /// 全局訂閱器已存在或安裝失敗
    #[error("設置日誌系統失敗: {0}")]
    Init(String),
}

/// 由配置的級別建立過濾器，`RUST_LOG` 優先
pub fn build_filter(log_config: &LogConfig) -> EnvFilter {
    EnvFilter::try_from_default_env().unwrap_or_else(|_| {
        let level = match log_config.level.to_lowercase().as_str() {
            "trace" => "trace",
            "debug" => "debug",
            "warn" => "warn",
            "error" => "error",
            _ => "info", // 默認為INFO
        };
        EnvFilter::new(level)
    })
}

/// 初始化日誌系統
pub fn init_logging(log_config: &LogConfig) -> Result<(), LoggingError> {
    let filter = build_filter(log_config);
    let builder = tracing_subscriber::fmt().with_env_filter(filter);

    let result = if log_config.format.eq_ignore_ascii_case("json") {
        builder.json().try_init()
    } else {
        builder.try_init()
    };
    result.map_err(|e| LoggingError::Init(e.to_string()))?;

    info!("日誌系統初始化完成");
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_second_init_fails() {
        let config = LogConfig {
            level: "debug".to_string(),
            format: "json".to_string(),
        };
        // 同一進程中只能有一個全局訂閱器
        let _ = init_logging(&config);
        assert!(matches!(init_logging(&config), Err(LoggingError::Init(_))));
    }

    #[test]
    fn test_build_filter_uses_configured_level() {
        if std::env::var("RUST_LOG").is_ok() {
            return;
        }
        let config = LogConfig {
            level: "WARN".to_string(),
            format: "pretty".to_string(),
        };
        assert_eq!(build_filter(&config).to_string(), "warn");
    }
}
