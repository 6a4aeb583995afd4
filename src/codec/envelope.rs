//! JSON 文檔層級的封裝格式
//!
//! 複合值（物件、陣列）寫成 `[typeTag, payload]`；純量（數字、字串、布林、null）
//! 直接寫出，讓 INCRBY / HINCRBYFLOAT 仍可作用於經過編碼的數值。
//! 因為複合值永遠帶封裝，頂層陣列必定是封裝。

use super::CodecError;
use serde_json::Value;

/// 解析後的儲存文檔
#[derive(Debug, Clone, PartialEq)]
pub enum Document {
    /// 無類型標籤的純量
    Bare(Value),
    /// 帶類型標籤的複合值
    Tagged { tag: String, payload: Value },
}

impl Document {
    /// 依 payload 的形狀決定是否加上類型標籤
    pub fn new(tag: impl FnOnce() -> String, payload: Value) -> Self {
        match payload {
            Value::Array(_) | Value::Object(_) => Document::Tagged {
                tag: tag(),
                payload,
            },
            scalar => Document::Bare(scalar),
        }
    }

    /// 從 Redis 取回的位元組解析文檔
    pub fn parse(bytes: &[u8]) -> Result<Self, CodecError> {
        let doc: Value =
            serde_json::from_slice(bytes).map_err(|e| CodecError::Malformed(e.to_string()))?;

        match doc {
            Value::Array(mut items) => {
                if items.len() != 2 {
                    return Err(CodecError::MissingTypeTag);
                }
                let payload = items.pop().unwrap_or(Value::Null);
                match items.pop() {
                    Some(Value::String(tag)) if !tag.is_empty() => {
                        Ok(Document::Tagged { tag, payload })
                    }
                    _ => Err(CodecError::MissingTypeTag),
                }
            }
            Value::Object(_) => Err(CodecError::MissingTypeTag),
            scalar => Ok(Document::Bare(scalar)),
        }
    }

    /// 序列化為 Redis 載荷
    pub fn to_bytes(&self) -> Result<Vec<u8>, CodecError> {
        let result = match self {
            Document::Bare(value) => serde_json::to_vec(value),
            Document::Tagged { tag, payload } => serde_json::to_vec(&(tag, payload)),
        };
        result.map_err(CodecError::Encode)
    }

    pub fn tag(&self) -> Option<&str> {
        match self {
            Document::Bare(_) => None,
            Document::Tagged { tag, .. } => Some(tag),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use assert_matches::assert_matches;
    use serde_json::json;

    #[test]
    fn test_scalars_stay_bare() {
        for scalar in [json!(30), json!(1.5), json!("hi"), json!(true), Value::Null] {
            let doc = Document::new(String::new, scalar.clone());
            assert_eq!(doc, Document::Bare(scalar.clone()));
            assert_eq!(doc.to_bytes().unwrap(), serde_json::to_vec(&scalar).unwrap());
        }
    }

    #[test]
    fn test_composites_are_wrapped() {
        let doc = Document::new(|| "app::User".to_string(), json!({"name": "A"}));
        assert_eq!(doc.tag(), Some("app::User"));
        assert_eq!(
            String::from_utf8(doc.to_bytes().unwrap()).unwrap(),
            r#"["app::User",{"name":"A"}]"#
        );
        assert_eq!(Document::parse(&doc.to_bytes().unwrap()).unwrap(), doc);
    }

    #[test]
    fn test_parse_rejects_untagged_shapes() {
        assert_matches!(Document::parse(br#"{"name":"A"}"#), Err(CodecError::MissingTypeTag));
        assert_matches!(Document::parse(br#"[1, 2]"#), Err(CodecError::MissingTypeTag));
        assert_matches!(Document::parse(br#"["", 2]"#), Err(CodecError::MissingTypeTag));
        assert_matches!(Document::parse(br#"["a", 2, 3]"#), Err(CodecError::MissingTypeTag));
        assert_matches!(Document::parse(b"[]"), Err(CodecError::MissingTypeTag));
        assert_matches!(Document::parse(b"not json"), Err(CodecError::Malformed(_)));
    }
}
