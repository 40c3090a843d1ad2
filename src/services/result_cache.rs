//! 搜索结果缓存 - 业务能力层
//!
//! 以 `<供应商>:<规范化查询>` 为键缓存供应商结果，TTL 内的相同查询不再访问网络。
//!
//! 过期条目在读取时惰性删除，并由 [`ResultCache::sweep`] 定期清理。
//! 底层存储的任何读写或解析失败都只记录日志并降级为未命中，不会阻断搜索。

use serde::{Deserialize, Serialize};
use std::sync::Arc;
use std::time::Duration;
use tracing::{debug, info, warn};

use crate::error::CacheError;
use crate::infrastructure::{Clock, KvStore};
use crate::models::{Offer, Provider};

/// 默认 TTL：24 小时
pub const DEFAULT_TTL: Duration = Duration::from_secs(24 * 60 * 60);

/// 存储中的缓存条目（字段名与已有缓存数据兼容）
#[derive(Debug, Clone, Serialize, Deserialize)]
struct CacheEntry {
    #[serde(rename = "dados")]
    data: Vec<Offer>,
    #[serde(rename = "expiracao")]
    expires_at: i64,
    #[serde(rename = "timestamp")]
    stored_at: i64,
}

/// 查询规范化：去掉首尾空白并转小写
pub fn normalize_query(query: &str) -> String {
    query.trim().to_lowercase()
}

/// 缓存键
pub fn cache_key(provider: Provider, query: &str) -> String {
    format!("{}:{}", provider.id(), normalize_query(query))
}

fn is_namespace_key(key: &str) -> bool {
    Provider::ALL
        .iter()
        .any(|p| key.strip_prefix(p.id()).is_some_and(|rest| rest.starts_with(':')))
}

/// 带过期时间的供应商结果缓存
pub struct ResultCache {
    store: Arc<dyn KvStore>,
    clock: Arc<dyn Clock>,
    ttl: Duration,
}

impl ResultCache {
    pub fn new(store: Arc<dyn KvStore>, clock: Arc<dyn Clock>) -> Self {
        Self::with_ttl(store, clock, DEFAULT_TTL)
    }

    pub fn with_ttl(store: Arc<dyn KvStore>, clock: Arc<dyn Clock>, ttl: Duration) -> Self {
        Self { store, clock, ttl }
    }

    pub fn ttl(&self) -> Duration {
        self.ttl
    }

    /// 读取缓存；过期、损坏或读取失败都返回 `None`
    pub fn get(&self, provider: Provider, query: &str) -> Option<Vec<Offer>> {
        let key = cache_key(provider, query);

        match self.read_entry(&key) {
            Ok(Some(entry)) => {
                if self.clock.now_millis() > entry.expires_at {
                    debug!("缓存已过期: {}", key);
                    self.remove(&key);
                    None
                } else {
                    debug!("缓存命中: {}", key);
                    Some(entry.data)
                }
            }
            Ok(None) => None,
            Err(e @ CacheError::Corrupted { .. }) => {
                warn!("{}，已删除", e);
                self.remove(&key);
                None
            }
            Err(e) => {
                warn!("读取缓存失败: {}", e);
                None
            }
        }
    }

    /// 写入缓存，覆盖同键的旧条目；失败只记录日志
    pub fn put(&self, provider: Provider, query: &str, data: &[Offer]) {
        let key = cache_key(provider, query);
        let now = self.clock.now_millis();
        let entry = CacheEntry {
            data: data.to_vec(),
            expires_at: now.saturating_add(self.ttl.as_millis() as i64),
            stored_at: now,
        };

        match self.write_entry(&key, &entry) {
            Ok(()) => debug!("缓存已保存: {} ({} 条)", key, data.len()),
            Err(e) => warn!("保存缓存失败: {}", e),
        }
    }

    /// 清理命名空间内所有过期或损坏的条目，返回删除数量
    pub fn sweep(&self) -> usize {
        let now = self.clock.now_millis();
        let mut removed = 0;

        for key in self.namespace_keys() {
            let stale = match self.read_entry(&key) {
                Ok(Some(entry)) => now > entry.expires_at,
                Ok(None) => false,
                Err(CacheError::Corrupted { .. }) => true,
                Err(e) => {
                    warn!("清理缓存时读取失败: {}", e);
                    false
                }
            };

            if stale && self.remove(&key) {
                removed += 1;
            }
        }

        if removed > 0 {
            info!("🧹 已清理 {} 个过期缓存", removed);
        }
        removed
    }

    /// 删除命名空间内全部条目，返回删除数量
    pub fn clear(&self) -> usize {
        let removed = self
            .namespace_keys()
            .into_iter()
            .filter(|key| self.remove(key))
            .count();
        info!("搜索缓存已清空 ({} 条)", removed);
        removed
    }

    /// 命名空间的大致占用字节数（键 + 序列化值），仅用于展示
    pub fn size_estimate_bytes(&self) -> u64 {
        self.namespace_keys()
            .into_iter()
            .map(|key| {
                let value_len = match self.store.get(&key) {
                    Ok(Some(value)) => value.len(),
                    _ => 0,
                };
                (key.len() + value_len) as u64
            })
            .sum()
    }

    pub fn size_estimate_mb(&self) -> f64 {
        self.size_estimate_bytes() as f64 / (1024.0 * 1024.0)
    }

    fn namespace_keys(&self) -> Vec<String> {
        match self.store.keys() {
            Ok(keys) => keys.into_iter().filter(|k| is_namespace_key(k)).collect(),
            Err(e) => {
                warn!("枚举缓存键失败: {}", e);
                Vec::new()
            }
        }
    }

    fn read_entry(&self, key: &str) -> Result<Option<CacheEntry>, CacheError> {
        let raw = self.store.get(key).map_err(|source| CacheError::Store {
            key: key.to_string(),
            source,
        })?;

        match raw {
            Some(raw) => serde_json::from_str(&raw)
                .map(Some)
                .map_err(|source| CacheError::Corrupted {
                    key: key.to_string(),
                    source,
                }),
            None => Ok(None),
        }
    }

    fn write_entry(&self, key: &str, entry: &CacheEntry) -> Result<(), CacheError> {
        let raw = serde_json::to_string(entry).map_err(|source| CacheError::Serialize {
            key: key.to_string(),
            source,
        })?;
        self.store.set(key, &raw).map_err(|source| CacheError::Store {
            key: key.to_string(),
            source,
        })
    }

    fn remove(&self, key: &str) -> bool {
        match self.store.delete(key) {
            Ok(()) => true,
            Err(e) => {
                warn!("删除缓存失败 ({}): {}", key, e);
                false
            }
        }
    }
}
