use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;

use crate::models::Provider;

/// 排序方向
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SortOrder {
    Ascending,
    Descending,
}

/// 批量搜索文件（lote.toml）
///
/// ```toml
/// queries = ["mouse sem fio", "teclado mecânico"]
/// providers = ["ml", "gs"]
/// strip_outliers = true
/// sort = "ascending"
/// ```
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct BatchFile {
    pub queries: Vec<String>,
    /// 为空时启用全部供应商
    #[serde(default)]
    pub providers: Vec<String>,
    #[serde(default)]
    pub strip_outliers: bool,
    #[serde(default)]
    pub sort: Option<SortOrder>,
    #[serde(skip)]
    pub file_path: Option<String>,
}

impl BatchFile {
    /// 解析启用的供应商，未知名称被忽略并返回给调用者记录
    pub fn enabled_providers(&self) -> (BTreeSet<Provider>, Vec<String>) {
        if self.providers.is_empty() {
            return (Provider::ALL.into_iter().collect(), Vec::new());
        }

        let mut enabled = BTreeSet::new();
        let mut unknown = Vec::new();
        for name in &self.providers {
            match name.parse::<Provider>() {
                Ok(provider) => {
                    enabled.insert(provider);
                }
                Err(_) => unknown.push(name.clone()),
            }
        }
        (enabled, unknown)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_enables_all_providers() {
        let file = BatchFile {
            queries: vec!["mouse".into()],
            ..Default::default()
        };
        let (enabled, unknown) = file.enabled_providers();
        assert_eq!(enabled.len(), 2);
        assert!(unknown.is_empty());
    }

    #[test]
    fn test_unknown_provider_reported() {
        let file = BatchFile {
            queries: vec!["mouse".into()],
            providers: vec!["gs".into(), "amazon".into()],
            ..Default::default()
        };
        let (enabled, unknown) = file.enabled_providers();
        assert_eq!(enabled.into_iter().collect::<Vec<_>>(), vec![Provider::GoogleShopping]);
        assert_eq!(unknown, vec!["amazon".to_string()]);
    }
}
