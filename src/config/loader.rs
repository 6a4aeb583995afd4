use crate::config::types::ApplicationConfig;
use crate::config::validation::{ValidationError, Validator};
use config::{Config, ConfigError, Environment as ConfigEnvironment, File, FileFormat};
use std::env;
use std::path::{Path, PathBuf};
use thiserror::Error;
use tracing::debug;

/// 環境變數前綴，例如 `REDIS_FACADE__CONNECTION__HOST`
pub const ENV_PREFIX: &str = "REDIS_FACADE";

/// 配置加載錯誤
#[derive(Error, Debug)]
pub enum ConfigLoadError {
    /// 配置來源讀取或反序列化失敗
    #[error("配置讀取失敗: {0}")]
    Source(#[from] ConfigError),

    /// 配置內容未通過驗證
    #[error("配置驗證失敗: {0}")]
    Invalid(#[from] ValidationError),
}

/// 環境類型枚舉
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Environment {
    Development,
    Production,
}

impl Environment {
    /// 從 `REDIS_FACADE_ENV` 取得當前環境設定
    pub fn from_env() -> Self {
        match env::var("REDIS_FACADE_ENV")
            .unwrap_or_else(|_| "development".into())
            .to_lowercase()
            .as_str()
        {
            "production" => Environment::Production,
            _ => Environment::Development,
        }
    }

    /// 轉換為配置文件名
    pub fn as_filename(&self) -> &'static str {
        match self {
            Environment::Development => "development.toml",
            Environment::Production => "production.toml",
        }
    }
}

/// 配置加載器
///
/// 來源優先級由低到高：內建預設值、`$CONFIG_DIR/<env>.toml`（可選）、
/// `REDIS_FACADE__` 前綴的環境變數。
pub struct ConfigLoader;

impl ConfigLoader {
    /// 指定環境的配置文件路徑
    pub fn config_path(env: Environment) -> PathBuf {
        let config_dir = env::var("CONFIG_DIR").unwrap_or_else(|_| "config".into());
        Path::new(&config_dir).join(env.as_filename())
    }

    /// 載入指定環境的原始配置
    pub fn load(env: Environment) -> Result<Config, ConfigError> {
        Self::load_file(&Self::config_path(env))
    }

    /// 從指定文件載入原始配置，文件不存在時只使用預設值與環境變數
    pub fn load_file(path: &Path) -> Result<Config, ConfigError> {
        debug!("載入配置文件: {}", path.display());

        Config::builder()
            .add_source(File::from(path).required(false))
            .add_source(Self::env_source())
            .build()
    }

    /// 從 TOML 字串載入原始配置
    pub fn load_str(toml: &str) -> Result<Config, ConfigError> {
        Config::builder()
            .add_source(File::from_str(toml, FileFormat::Toml))
            .add_source(Self::env_source())
            .build()
    }

    fn env_source() -> ConfigEnvironment {
        ConfigEnvironment::with_prefix(ENV_PREFIX)
            .prefix_separator("__")
            .separator("__")
            .try_parsing(true)
    }
}

/// ApplicationConfig 加載方法實現
impl ApplicationConfig {
    /// 從 `REDIS_FACADE_ENV` 指定的環境加載配置
    pub fn load_from_env() -> Result<Self, ConfigLoadError> {
        let env = Environment::from_env();
        debug!("從環境加載配置: {:?}", env);
        Self::from_source(ConfigLoader::load(env)?)
    }

    /// 從指定文件加載配置
    pub fn load_file(path: &Path) -> Result<Self, ConfigLoadError> {
        Self::from_source(ConfigLoader::load_file(path)?)
    }

    /// 從 TOML 字串加載配置
    pub fn from_toml_str(toml: &str) -> Result<Self, ConfigLoadError> {
        Self::from_source(ConfigLoader::load_str(toml)?)
    }

    fn from_source(source: Config) -> Result<Self, ConfigLoadError> {
        let app_config: ApplicationConfig = source.try_deserialize()?;
        app_config.validate()?;
        debug!("配置驗證通過");

        Ok(app_config)
    }
}
