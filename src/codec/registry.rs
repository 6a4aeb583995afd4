use crate::config::TypeTagStyle;
use once_cell::sync::Lazy;
use regex::Regex;
use serde::de::DeserializeOwned;
use serde_json::Value;
use std::any::{Any, TypeId};
use std::collections::HashMap;
use std::fmt;
use tracing::warn;

static MODULE_PATH: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"[A-Za-z_][A-Za-z0-9_]*::").expect("module path pattern"));

type DecodeFn = fn(Value) -> Result<Box<dyn Any + Send + Sync>, serde_json::Error>;

fn decode_boxed<T>(payload: Value) -> Result<Box<dyn Any + Send + Sync>, serde_json::Error>
where
    T: DeserializeOwned + Send + Sync + 'static,
{
    Ok(Box::new(serde_json::from_value::<T>(payload)?))
}

/// 依命名方式計算類型標籤
pub fn style_tag<T: ?Sized + 'static>(style: TypeTagStyle) -> String {
    let full = std::any::type_name::<T>();
    match style {
        TypeTagStyle::FullyQualified => full.to_string(),
        TypeTagStyle::Short => MODULE_PATH.replace_all(full, "").into_owned(),
    }
}

/// 已註冊類型的解碼入口
#[derive(Debug, Clone)]
pub struct Registration {
    pub tag: String,
    pub type_name: &'static str,
    type_id: TypeId,
    decode: DecodeFn,
}

impl Registration {
    /// 將 payload 解碼為註冊時的具體類型
    pub fn decode(&self, payload: Value) -> Result<Box<dyn Any + Send + Sync>, serde_json::Error> {
        (self.decode)(payload)
    }
}

/// 類型註冊表
///
/// 同時擔任兩個角色：多型解碼時把標籤解析為具體類型，
/// 以及作為預設允許清單的一部分。
pub struct TypeRegistry {
    style: TypeTagStyle,
    by_type: HashMap<TypeId, String>,
    by_tag: HashMap<String, Registration>,
}

impl TypeRegistry {
    pub fn new(style: TypeTagStyle) -> Self {
        Self {
            style,
            by_type: HashMap::new(),
            by_tag: HashMap::new(),
        }
    }

    pub fn style(&self) -> TypeTagStyle {
        self.style
    }

    /// 以命名方式產生的標籤註冊類型
    pub fn register<T>(&mut self) -> &mut Self
    where
        T: DeserializeOwned + Send + Sync + 'static,
    {
        let tag = style_tag::<T>(self.style);
        self.register_as::<T>(tag)
    }

    /// 以顯式標籤註冊類型，編碼時也使用此標籤
    pub fn register_as<T>(&mut self, tag: impl Into<String>) -> &mut Self
    where
        T: DeserializeOwned + Send + Sync + 'static,
    {
        let tag = tag.into();
        let type_id = TypeId::of::<T>();

        if let Some(existing) = self.by_tag.get(&tag) {
            if existing.type_id != type_id {
                warn!(
                    "類型標籤 {} 已綁定 {}，改為綁定 {}",
                    tag,
                    existing.type_name,
                    std::any::type_name::<T>()
                );
            }
        }
        if let Some(previous) = self.by_type.insert(type_id, tag.clone()) {
            if previous != tag {
                self.by_tag.remove(&previous);
            }
        }
        self.by_tag.insert(
            tag.clone(),
            Registration {
                tag,
                type_name: std::any::type_name::<T>(),
                type_id,
                decode: decode_boxed::<T>,
            },
        );
        self
    }

    /// 類型的標籤：顯式註冊的標籤優先，否則依命名方式產生
    pub fn tag_for<T: ?Sized + 'static>(&self) -> String {
        self.by_type
            .get(&TypeId::of::<T>())
            .cloned()
            .unwrap_or_else(|| style_tag::<T>(self.style))
    }

    pub fn resolve(&self, tag: &str) -> Option<&Registration> {
        self.by_tag.get(tag)
    }

    pub fn contains(&self, tag: &str) -> bool {
        self.by_tag.contains_key(tag)
    }

    pub fn tags(&self) -> impl Iterator<Item = &str> {
        self.by_tag.keys().map(String::as_str)
    }
}

impl fmt::Debug for TypeRegistry {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("TypeRegistry")
            .field("style", &self.style)
            .field("tags", &self.by_tag.keys().collect::<Vec<_>>())
            .finish()
    }
}

/// 多型解碼的結果：類型標籤加上具體值
pub struct DynamicValue {
    tag: String,
    value: Box<dyn Any + Send + Sync>,
}

impl DynamicValue {
    pub(crate) fn new(tag: String, value: Box<dyn Any + Send + Sync>) -> Self {
        Self { tag, value }
    }

    pub fn tag(&self) -> &str {
        &self.tag
    }

    pub fn is<T: 'static>(&self) -> bool {
        self.value.is::<T>()
    }

    pub fn downcast_ref<T: 'static>(&self) -> Option<&T> {
        self.value.downcast_ref::<T>()
    }

    /// 取出具體值，類型不符時原樣返回
    pub fn downcast<T: 'static>(self) -> Result<T, Self> {
        let DynamicValue { tag, value } = self;
        match value.downcast::<T>() {
            Ok(boxed) => Ok(*boxed),
            Err(value) => Err(DynamicValue { tag, value }),
        }
    }
}

impl fmt::Debug for DynamicValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("DynamicValue").field("tag", &self.tag).finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rstest::rstest;
    use serde::Deserialize;
    use serde_json::json;
    use std::collections::HashMap;

    #[derive(Debug, Deserialize, PartialEq)]
    struct Account {
        id: u32,
    }

    #[rstest]
    #[case(TypeTagStyle::FullyQualified, "alloc::string::String")]
    #[case(TypeTagStyle::Short, "String")]
    fn test_style_tag_for_string(#[case] style: TypeTagStyle, #[case] expected: &str) {
        assert_eq!(style_tag::<String>(style), expected);
    }

    #[test]
    fn test_short_style_strips_nested_paths() {
        assert_eq!(
            style_tag::<HashMap<String, Vec<i64>>>(TypeTagStyle::Short),
            "HashMap<String, Vec<i64>>"
        );
        assert_eq!(style_tag::<Account>(TypeTagStyle::Short), "Account");
        assert!(style_tag::<Account>(TypeTagStyle::FullyQualified).ends_with("::Account"));
    }

    #[test]
    fn test_register_as_overrides_style_tag() {
        let mut registry = TypeRegistry::new(TypeTagStyle::FullyQualified);
        registry.register::<Account>();
        let default_tag = registry.tag_for::<Account>();
        assert!(registry.contains(&default_tag));

        registry.register_as::<Account>("account.v1");
        assert_eq!(registry.tag_for::<Account>(), "account.v1");
        assert!(registry.contains("account.v1"));
        assert!(!registry.contains(&default_tag));
    }

    #[test]
    fn test_resolve_decodes_into_registered_type() {
        let mut registry = TypeRegistry::new(TypeTagStyle::Short);
        registry.register::<Account>();

        let registration = registry.resolve("Account").expect("Account 應已註冊");
        let boxed = registration.decode(json!({"id": 7})).unwrap();
        let value = DynamicValue::new(registration.tag.clone(), boxed);

        assert!(value.is::<Account>());
        assert_eq!(value.downcast_ref::<Account>(), Some(&Account { id: 7 }));
        let value = value.downcast::<String>().unwrap_err();
        assert_eq!(value.downcast::<Account>().unwrap(), Account { id: 7 });
    }

    #[test]
    fn test_unregistered_tag_is_not_resolved() {
        let registry = TypeRegistry::new(TypeTagStyle::Short);
        assert!(registry.resolve("Account").is_none());
        assert_eq!(registry.tags().count(), 0);
    }
}
