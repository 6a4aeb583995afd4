//! 值編解碼模組
//!
//! 鍵以 UTF-8 字串寫入；值寫成自帶類型標籤的 JSON 文檔，使多型值在不提供
//! 類型提示的情況下也能還原。解碼時類型標籤必須通過准入策略，
//! 以免反序列化不受信任的載荷。

pub mod envelope;
mod finite;
pub mod policy;
pub mod registry;

pub use envelope::Document;
pub use policy::{AllowAll, AllowList, TypePolicy};
pub use registry::{style_tag, DynamicValue, Registration, TypeRegistry};

use crate::config::CodecConfig;
use serde::de::DeserializeOwned;
use serde::Serialize;
use serde_json::Value;
use std::any::TypeId;
use std::collections::HashMap;
use std::string::FromUtf8Error;
use std::sync::Arc;
use thiserror::Error;

/// 編解碼錯誤
#[derive(Error, Debug)]
pub enum CodecError {
    /// 值無法編碼為JSON
    #[error("數據序列化錯誤: {0}")]
    Encode(#[source] serde_json::Error),

    /// JSON 形狀與目標類型不符
    #[error("數據反序列化錯誤: {0}")]
    Decode(#[source] serde_json::Error),

    /// NaN 與 ±inf 無法以JSON數字表示
    #[error("無法編碼非有限浮點數: {0}")]
    NonFiniteNumber(f64),

    /// 載荷不是JSON
    #[error("無效的JSON文檔: {0}")]
    Malformed(String),

    /// 複合值缺少 `[typeTag, payload]` 封裝
    #[error("缺少類型標籤")]
    MissingTypeTag,

    /// 標籤未通過准入策略
    #[error("類型標籤不被允許: {0}")]
    DisallowedType(String),

    /// 標籤無法解析為本進程中的類型
    #[error("未註冊的類型標籤: {0}")]
    UnknownType(String),

    /// 標籤與調用方要求的類型不一致
    #[error("類型不符: 期望 {expected}，實際 {found}")]
    TypeMismatch { expected: String, found: String },

    /// 鍵不是有效的UTF-8
    #[error("無效的鍵編碼: {0}")]
    InvalidKey(#[from] FromUtf8Error),
}

/// 值編解碼器
///
/// 建立後不再變動，可由多個門面共享。
#[derive(Debug)]
pub struct Codec {
    registry: TypeRegistry,
    policy: Arc<dyn TypePolicy>,
}

impl Codec {
    /// 依配置建立編解碼器，並註冊內建的 JSON 容器類型
    pub fn new(config: &CodecConfig) -> Self {
        let policy: Arc<dyn TypePolicy> = if config.allow_untrusted_types {
            Arc::new(AllowAll)
        } else {
            Arc::new(AllowList::new(config.allowed_types.iter().cloned()))
        };

        let mut registry = TypeRegistry::new(config.type_tag_style);
        registry
            .register::<Value>()
            .register::<Vec<Value>>()
            .register::<HashMap<String, Value>>()
            .register::<Vec<String>>()
            .register::<Vec<i64>>()
            .register::<Vec<f64>>()
            .register::<HashMap<String, String>>();

        Self { registry, policy }
    }

    /// 替換准入策略
    ///
    /// 策略只決定註冊表以外的標籤；已註冊的類型總是可以解碼，
    /// 因此策略只能放寬允許範圍，不能撤銷已註冊的類型。
    pub fn with_policy(mut self, policy: impl TypePolicy + 'static) -> Self {
        self.policy = Arc::new(policy);
        self
    }

    /// 註冊可解碼的類型
    pub fn register<T>(mut self) -> Self
    where
        T: DeserializeOwned + Send + Sync + 'static,
    {
        self.registry.register::<T>();
        self
    }

    /// 以穩定標籤註冊類型
    pub fn register_as<T>(mut self, tag: impl Into<String>) -> Self
    where
        T: DeserializeOwned + Send + Sync + 'static,
    {
        self.registry.register_as::<T>(tag);
        self
    }

    pub fn registry(&self) -> &TypeRegistry {
        &self.registry
    }

    /// 標籤是否可被解碼：已註冊，或被准入策略接受
    pub fn is_permitted(&self, tag: &str) -> bool {
        self.registry.contains(tag) || self.policy.permits(tag)
    }

    pub fn encode_key<'a>(&self, key: &'a str) -> &'a [u8] {
        key.as_bytes()
    }

    pub fn decode_key(&self, bytes: Vec<u8>) -> Result<String, CodecError> {
        Ok(String::from_utf8(bytes)?)
    }

    /// 編碼值；複合值帶上其類型標籤
    ///
    /// 值中任何位置出現 NaN 或 ±inf 時返回 [`CodecError::NonFiniteNumber`]。
    pub fn encode_value<T>(&self, value: &T) -> Result<Vec<u8>, CodecError>
    where
        T: Serialize + ?Sized + 'static,
    {
        if let Some(n) = finite::first_non_finite(value) {
            return Err(CodecError::NonFiniteNumber(n));
        }
        let payload = serde_json::to_value(value).map_err(CodecError::Encode)?;
        Document::new(|| self.registry.tag_for::<T>(), payload).to_bytes()
    }

    /// 解碼為調用方指定的類型
    ///
    /// 目標為 `serde_json::Value` 時接受任何已准入的標籤。
    pub fn decode_value<T>(&self, bytes: &[u8]) -> Result<T, CodecError>
    where
        T: DeserializeOwned + 'static,
    {
        let payload = match Document::parse(bytes)? {
            Document::Bare(scalar) => scalar,
            Document::Tagged { tag, payload } => {
                self.check_permitted(&tag)?;
                if TypeId::of::<T>() != TypeId::of::<Value>() {
                    let expected = self.registry.tag_for::<T>();
                    if expected != tag {
                        return Err(CodecError::TypeMismatch {
                            expected,
                            found: tag,
                        });
                    }
                }
                payload
            }
        };
        serde_json::from_value(payload).map_err(CodecError::Decode)
    }

    /// 不指定類型的解碼，依標籤從註冊表還原具體類型
    ///
    /// 純量依其 JSON 類別還原為 `i64`、`u64`、`f64`、`String`、`bool` 或 `()`。
    pub fn decode_dynamic(&self, bytes: &[u8]) -> Result<DynamicValue, CodecError> {
        match Document::parse(bytes)? {
            Document::Bare(scalar) => Ok(self.scalar_value(scalar)),
            Document::Tagged { tag, payload } => {
                self.check_permitted(&tag)?;
                let registration = self
                    .registry
                    .resolve(&tag)
                    .ok_or_else(|| CodecError::UnknownType(tag.clone()))?;
                let value = registration.decode(payload).map_err(CodecError::Decode)?;
                Ok(DynamicValue::new(tag, value))
            }
        }
    }

    fn check_permitted(&self, tag: &str) -> Result<(), CodecError> {
        if self.is_permitted(tag) {
            Ok(())
        } else {
            Err(CodecError::DisallowedType(tag.to_string()))
        }
    }

    fn scalar_value(&self, scalar: Value) -> DynamicValue {
        let registry = &self.registry;
        match scalar {
            Value::Number(n) => {
                if let Some(i) = n.as_i64() {
                    DynamicValue::new(registry.tag_for::<i64>(), Box::new(i))
                } else if let Some(u) = n.as_u64() {
                    DynamicValue::new(registry.tag_for::<u64>(), Box::new(u))
                } else {
                    let f = n.as_f64().unwrap_or(f64::NAN);
                    DynamicValue::new(registry.tag_for::<f64>(), Box::new(f))
                }
            }
            Value::String(s) => DynamicValue::new(registry.tag_for::<String>(), Box::new(s)),
            Value::Bool(b) => DynamicValue::new(registry.tag_for::<bool>(), Box::new(b)),
            _ => DynamicValue::new(registry.tag_for::<()>(), Box::new(())),
        }
    }
}

impl Default for Codec {
    fn default() -> Self {
        Self::new(&CodecConfig::default())
    }
}
