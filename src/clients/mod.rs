//! 供应商客户端
//!
//! 每个供应商只需要提供一个 [`PayloadMapper`]，缓存、网络请求、
//! 价格过滤和失败降级由通用的 [`SearchClient`] 统一处理。

pub mod google_shopping;
pub mod mercado_livre;
pub mod search_client;

use async_trait::async_trait;
use std::sync::Arc;

use crate::config::Config;
use crate::error::AppResult;
use crate::infrastructure::{HttpTransport, ImageProxy};
use crate::models::{Offer, Provider};
use crate::services::ResultCache;

pub use google_shopping::GoogleShoppingMapper;
pub use mercado_livre::MercadoLivreMapper;
pub use search_client::{PayloadMapper, SearchClient};

/// 一次供应商搜索的结果
#[derive(Debug, Clone, Default, PartialEq)]
pub struct SearchOutcome {
    pub offers: Vec<Offer>,
    /// 结果是否直接来自缓存（同一次读取既用于返回数据也用于命中统计）
    pub served_from_cache: bool,
}

impl SearchOutcome {
    pub fn cached(offers: Vec<Offer>) -> Self {
        Self {
            offers,
            served_from_cache: true,
        }
    }

    pub fn fetched(offers: Vec<Offer>) -> Self {
        Self {
            offers,
            served_from_cache: false,
        }
    }
}

/// 供应商搜索能力
///
/// 网络失败和数据格式异常必须在实现内部降级为空结果；
/// 返回 `Err` 表示意外错误，批量任务会因此中止。
#[async_trait]
pub trait ProviderClient: Send + Sync {
    fn provider(&self) -> Provider;

    async fn search(&self, query: &str) -> AppResult<SearchOutcome>;
}

/// 按配置创建所有内置供应商的客户端
pub fn build_clients(
    config: &Config,
    transport: Arc<dyn HttpTransport>,
    cache: Arc<ResultCache>,
    images: Arc<ImageProxy>,
) -> Vec<Arc<dyn ProviderClient>> {
    vec![
        Arc::new(SearchClient::new(
            MercadoLivreMapper,
            config.mercado_livre_url(),
            transport.clone(),
            cache.clone(),
            images.clone(),
            config.price_ceiling,
        )),
        Arc::new(SearchClient::new(
            GoogleShoppingMapper,
            config.google_shopping_url(),
            transport,
            cache,
            images,
            config.price_ceiling,
        )),
    ]
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::HttpError;
    use crate::infrastructure::{ManualClock, MemoryKvStore};
    use serde_json::{json, Value};
    use std::sync::Mutex;

    struct RecordingTransport {
        urls: Mutex<Vec<String>>,
    }

    #[async_trait]
    impl HttpTransport for RecordingTransport {
        async fn get_json(&self, url: &str) -> Result<Value, HttpError> {
            self.urls.lock().unwrap().push(url.to_string());
            Ok(json!({}))
        }
    }

    #[test]
    fn test_build_clients_uses_configured_endpoints() {
        let config = Config {
            api_base_url: "http://localhost:3000".to_string(),
            ..Config::default()
        };
        let transport = Arc::new(RecordingTransport {
            urls: Mutex::new(Vec::new()),
        });
        let cache = Arc::new(ResultCache::new(
            Arc::new(MemoryKvStore::new()),
            Arc::new(ManualClock::new(0)),
        ));
        let images = Arc::new(ImageProxy::new(
            &config.api_base_url,
            &config.image_proxy_path,
            config.image_placeholder.clone(),
        ));

        let clients = build_clients(&config, transport.clone(), cache, images);
        let providers: Vec<Provider> = clients.iter().map(|c| c.provider()).collect();
        assert_eq!(providers, Provider::ALL.to_vec());

        for client in &clients {
            let outcome = tokio_test::block_on(client.search("monitor")).unwrap();
            assert_eq!(outcome, SearchOutcome::fetched(Vec::new()));
        }

        let urls = transport.urls.lock().unwrap();
        assert_eq!(
            *urls,
            vec![
                "http://localhost:3000/api/mercadolivre/search?q=monitor".to_string(),
                "http://localhost:3000/api/google-shopping/search?q=monitor".to_string(),
            ]
        );
    }
}
