use thiserror::Error;

/// 配置驗證錯誤
#[derive(Error, Debug, PartialEq)]
pub enum ValidationError {
    #[error("缺少必要配置項: {0}")]
    MissingField(String),

    #[error("無效的配置值: {0}")]
    InvalidValue(String),

    #[error("配置範圍錯誤: {field} 的值 {value} 不在範圍 {min}..{max} 內")]
    RangeError {
        field: String,
        value: String,
        min: String,
        max: String,
    },
}

/// 配置驗證器trait
pub trait Validator {
    /// 驗證配置
    fn validate(&self) -> Result<(), ValidationError>;
}

/// 驗證工具函數
pub struct ValidationUtils;

impl ValidationUtils {
    /// 驗證配置值是否在指定範圍內（含邊界）
    pub fn in_range<T>(value: T, min: T, max: T, field_name: &str) -> Result<(), ValidationError>
    where
        T: PartialOrd + ToString,
    {
        if value < min || value > max {
            return Err(ValidationError::RangeError {
                field: field_name.to_string(),
                value: value.to_string(),
                min: min.to_string(),
                max: max.to_string(),
            });
        }
        Ok(())
    }

    /// 驗證字串是否為允許的選項之一（不區分大小寫）
    pub fn one_of(value: &str, options: &[&str], field_name: &str) -> Result<(), ValidationError> {
        let normalized = value.to_lowercase();
        if !options.iter().any(|option| *option == normalized) {
            return Err(ValidationError::InvalidValue(format!(
                "{} 的值 {} 不是有效選項: {:?}",
                field_name, value, options
            )));
        }
        Ok(())
    }

    /// 檢查必要的字串欄位是否有值
    pub fn not_empty(value: &str, field_name: &str) -> Result<(), ValidationError> {
        if value.trim().is_empty() {
            return Err(ValidationError::MissingField(field_name.to_string()));
        }
        Ok(())
    }

    /// 檢查列表中每一項都不是空字串
    pub fn no_blank_items(values: &[String], field_name: &str) -> Result<(), ValidationError> {
        if let Some(index) = values.iter().position(|v| v.trim().is_empty()) {
            return Err(ValidationError::InvalidValue(format!(
                "{}[{}] 不可為空字串",
                field_name, index
            )));
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use assert_matches::assert_matches;

    #[test]
    fn test_in_range() {
        assert!(ValidationUtils::in_range(6379, 1, 65535, "connection.port").is_ok());
        assert!(ValidationUtils::in_range(1, 1, 10, "edge").is_ok());
        assert!(ValidationUtils::in_range(10, 1, 10, "edge").is_ok());

        let err = ValidationUtils::in_range(0u32, 1, 100, "connection.pool_size").unwrap_err();
        assert_eq!(
            err,
            ValidationError::RangeError {
                field: "connection.pool_size".to_string(),
                value: "0".to_string(),
                min: "1".to_string(),
                max: "100".to_string(),
            }
        );
    }

    #[test]
    fn test_one_of_is_case_insensitive() {
        let levels = ["trace", "debug", "info"];
        assert!(ValidationUtils::one_of("INFO", &levels, "log.level").is_ok());
        assert_matches!(
            ValidationUtils::one_of("verbose", &levels, "log.level"),
            Err(ValidationError::InvalidValue(msg)) if msg.contains("log.level")
        );
    }

    #[test]
    fn test_not_empty() {
        assert!(ValidationUtils::not_empty("localhost", "connection.host").is_ok());
        assert_eq!(
            ValidationUtils::not_empty("   ", "connection.host"),
            Err(ValidationError::MissingField("connection.host".to_string()))
        );
    }

    #[test]
    fn test_no_blank_items() {
        let ok = vec!["app::User".to_string()];
        assert!(ValidationUtils::no_blank_items(&ok, "codec.allowed_types").is_ok());

        let bad = vec!["app::User".to_string(), " ".to_string()];
        assert_matches!(
            ValidationUtils::no_blank_items(&bad, "codec.allowed_types"),
            Err(ValidationError::InvalidValue(msg)) if msg.contains("[1]")
        );
    }
}
