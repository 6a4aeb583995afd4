use std::collections::HashSet;
use std::fmt::Debug;

/// 解碼時的類型標籤准入策略
///
/// 已註冊到 [`TypeRegistry`](super::TypeRegistry) 的標籤總是被允許；
/// 策略只決定其餘標籤的去留。
pub trait TypePolicy: Send + Sync + Debug {
    fn permits(&self, tag: &str) -> bool;
}

/// 只允許清單中的標籤
#[derive(Debug, Clone, Default)]
pub struct AllowList {
    tags: HashSet<String>,
}

impl AllowList {
    pub fn new<I, S>(tags: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            tags: tags.into_iter().map(Into::into).collect(),
        }
    }

    pub fn allow(&mut self, tag: impl Into<String>) {
        self.tags.insert(tag.into());
    }
}

impl TypePolicy for AllowList {
    fn permits(&self, tag: &str) -> bool {
        self.tags.contains(tag)
    }
}

/// 允許任何標籤，對應 `codec.allow_untrusted_types = true`
#[derive(Debug, Clone, Copy, Default)]
pub struct AllowAll;

impl TypePolicy for AllowAll {
    fn permits(&self, _tag: &str) -> bool {
        true
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_allow_list() {
        let mut policy = AllowList::new(["app::User"]);
        assert!(policy.permits("app::User"));
        assert!(!policy.permits("app::Admin"));

        policy.allow("app::Admin");
        assert!(policy.permits("app::Admin"));
        assert!(!AllowList::default().permits("app::User"));
    }

    #[test]
    fn test_allow_all() {
        assert!(AllowAll.permits("java.lang.Runtime"));
    }
}
