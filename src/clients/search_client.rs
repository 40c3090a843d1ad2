use async_trait::async_trait;
use serde_json::Value;
use std::sync::Arc;
use tracing::{debug, info, warn};

use crate::clients::{ProviderClient, SearchOutcome};
use crate::error::{AppResult, ProviderError};
use crate::infrastructure::{search_url, HttpTransport, ImageProxy};
use crate::models::{is_plausible_price, Offer, Provider};
use crate::services::ResultCache;

/// 把某个供应商的响应 JSON 映射为报价列表
pub trait PayloadMapper: Send + Sync {
    fn provider(&self) -> Provider;

    /// - `Ok(None)`：响应中没有结果数组，视为零结果
    /// - `Err(reason)`：响应结构异常
    ///
    /// 单个无法映射的条目直接丢弃，不算异常。
    fn map(&self, payload: &Value, images: &ImageProxy) -> Result<Option<Vec<Offer>>, String>;
}

/// 带缓存的通用供应商客户端
pub struct SearchClient<M> {
    mapper: M,
    base_url: String,
    transport: Arc<dyn HttpTransport>,
    cache: Arc<ResultCache>,
    images: Arc<ImageProxy>,
    price_ceiling: f64,
}

impl<M: PayloadMapper> SearchClient<M> {
    pub fn new(
        mapper: M,
        base_url: impl Into<String>,
        transport: Arc<dyn HttpTransport>,
        cache: Arc<ResultCache>,
        images: Arc<ImageProxy>,
        price_ceiling: f64,
    ) -> Self {
        Self {
            mapper,
            base_url: base_url.into(),
            transport,
            cache,
            images,
            price_ceiling,
        }
    }

    /// 请求并映射；`Ok(None)` 表示响应里没有结果数组
    async fn fetch(&self, query: &str) -> Result<Option<Vec<Offer>>, ProviderError> {
        let provider = self.mapper.provider();

        let url = search_url(&self.base_url, query)
            .map_err(|source| ProviderError::NetworkFailure { provider, source })?;
        let payload = self
            .transport
            .get_json(&url)
            .await
            .map_err(|source| ProviderError::NetworkFailure { provider, source })?;

        let mapped = self
            .mapper
            .map(&payload, &self.images)
            .map_err(|reason| ProviderError::MalformedPayload { provider, reason })?;

        Ok(mapped.map(|offers| {
            let total = offers.len();
            let kept: Vec<Offer> = offers
                .into_iter()
                .filter(|o| is_plausible_price(o.price, self.price_ceiling))
                .collect();
            if kept.len() < total {
                debug!("{} 过滤掉 {} 个价格异常的报价", provider, total - kept.len());
            }
            kept
        }))
    }
}

#[async_trait]
impl<M: PayloadMapper> ProviderClient for SearchClient<M> {
    fn provider(&self) -> Provider {
        self.mapper.provider()
    }

    async fn search(&self, query: &str) -> AppResult<SearchOutcome> {
        let provider = self.mapper.provider();

        if let Some(offers) = self.cache.get(provider, query) {
            info!("💾 使用 {} 缓存数据: {}", provider, query.trim());
            return Ok(SearchOutcome::cached(offers));
        }

        info!("🔍 正在 {} 搜索: {}", provider, query.trim());
        match self.fetch(query).await {
            Ok(Some(offers)) => {
                self.cache.put(provider, query, &offers);
                Ok(SearchOutcome::fetched(offers))
            }
            Ok(None) => {
                debug!("{} 响应中没有结果数组: {}", provider, query.trim());
                Ok(SearchOutcome::fetched(Vec::new()))
            }
            Err(e) => {
                warn!("⚠️ {}", e);
                Ok(SearchOutcome::fetched(Vec::new()))
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::clients::{GoogleShoppingMapper, MercadoLivreMapper};
    use crate::error::HttpError;
    use crate::infrastructure::{ManualClock, MemoryKvStore};
    use serde_json::json;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::sync::Mutex;

    /// 返回固定响应并记录请求 URL 的桩传输
    struct StubTransport {
        response: Mutex<Option<Result<Value, u16>>>,
        calls: AtomicUsize,
        urls: Mutex<Vec<String>>,
    }

    impl StubTransport {
        fn ok(payload: Value) -> Arc<Self> {
            Arc::new(Self {
                response: Mutex::new(Some(Ok(payload))),
                calls: AtomicUsize::new(0),
                urls: Mutex::new(Vec::new()),
            })
        }

        fn status(code: u16) -> Arc<Self> {
            Arc::new(Self {
                response: Mutex::new(Some(Err(code))),
                calls: AtomicUsize::new(0),
                urls: Mutex::new(Vec::new()),
            })
        }

        fn calls(&self) -> usize {
            self.calls.load(Ordering::SeqCst)
        }
    }

    #[async_trait]
    impl HttpTransport for StubTransport {
        async fn get_json(&self, url: &str) -> Result<Value, HttpError> {
            self.calls.fetch_add(1, Ordering::SeqCst);
            self.urls.lock().unwrap().push(url.to_string());
            match self.response.lock().unwrap().clone() {
                Some(Ok(v)) => Ok(v),
                Some(Err(status)) => Err(HttpError::Status {
                    url: url.to_string(),
                    status,
                }),
                None => Ok(Value::Null),
            }
        }
    }

    fn cache() -> Arc<ResultCache> {
        Arc::new(ResultCache::new(
            Arc::new(MemoryKvStore::new()),
            Arc::new(ManualClock::new(0)),
        ))
    }

    fn images() -> Arc<ImageProxy> {
        Arc::new(ImageProxy::new("https://b.example", "/api/image-proxy", "/assets/no-image.png"))
    }

    fn ml_client(transport: Arc<StubTransport>, cache: Arc<ResultCache>) -> SearchClient<MercadoLivreMapper> {
        SearchClient::new(
            MercadoLivreMapper,
            "https://b.example/api/mercadolivre",
            transport,
            cache,
            images(),
            10_000.0,
        )
    }

    fn ml_payload(prices: &[f64]) -> Value {
        let results: Vec<Value> = prices
            .iter()
            .enumerate()
            .map(|(i, p)| json!({"price": p, "title": format!("Item {}", i), "permalink": format!("https://ml/{}", i)}))
            .collect();
        json!({ "results": results })
    }

    #[tokio::test]
    async fn test_miss_fetches_filters_and_caches() {
        let transport = StubTransport::ok(ml_payload(&[50.0, 0.0, 15_000.0, 9_999.0]));
        let cache = cache();
        let client = ml_client(transport.clone(), cache.clone());

        let outcome = client.search("Mouse Gamer").await.unwrap();
        assert!(!outcome.served_from_cache);
        let prices: Vec<f64> = outcome.offers.iter().map(|o| o.price).collect();
        assert_eq!(prices, vec![50.0, 9_999.0]);
        assert!(outcome.offers.iter().all(|o| o.price > 0.0 && o.price < 10_000.0));

        // 原始查询编码后发送
        assert!(transport.urls.lock().unwrap()[0].ends_with("/search?q=Mouse+Gamer"));
        assert_eq!(cache.get(Provider::MercadoLivre, "mouse gamer").unwrap().len(), 2);
    }

    #[tokio::test]
    async fn test_hit_skips_network() {
        let transport = StubTransport::ok(ml_payload(&[50.0]));
        let client = ml_client(transport.clone(), cache());

        client.search("mouse").await.unwrap();
        let second = client.search("  MOUSE ").await.unwrap();

        assert!(second.served_from_cache);
        assert_eq!(second.offers.len(), 1);
        assert_eq!(transport.calls(), 1);
    }

    #[tokio::test]
    async fn test_implausible_only_payload_yields_empty_and_is_cached() {
        let transport = StubTransport::ok(ml_payload(&[0.0, 15_000.0]));
        let client = ml_client(transport.clone(), cache());

        assert!(client.search("teclado").await.unwrap().offers.is_empty());
        let again = client.search("teclado").await.unwrap();
        assert!(again.served_from_cache);
        assert!(again.offers.is_empty());
        assert_eq!(transport.calls(), 1);
    }

    #[tokio::test]
    async fn test_bad_status_degrades_to_empty_without_caching() {
        let transport = StubTransport::status(503);
        let cache = cache();
        let client = ml_client(transport.clone(), cache.clone());

        let outcome = client.search("mouse").await.unwrap();
        assert!(outcome.offers.is_empty());
        assert!(cache.get(Provider::MercadoLivre, "mouse").is_none());

        client.search("mouse").await.unwrap();
        assert_eq!(transport.calls(), 2);
    }

    #[tokio::test]
    async fn test_missing_results_array_is_zero_results() {
        let transport = StubTransport::ok(json!({"error": "quota"}));
        let cache = cache();
        let client = ml_client(transport, cache.clone());

        assert!(client.search("mouse").await.unwrap().offers.is_empty());
        assert!(cache.get(Provider::MercadoLivre, "mouse").is_none());
    }

    #[tokio::test]
    async fn test_malformed_payload_degrades_to_empty() {
        let transport = StubTransport::ok(json!({"shopping_results": "oops"}));
        let client = SearchClient::new(
            GoogleShoppingMapper,
            "https://b.example/api/google-shopping",
            transport,
            cache(),
            images(),
            10_000.0,
        );

        let outcome = client.search("mouse").await.unwrap();
        assert!(outcome.offers.is_empty());
        assert_eq!(client.provider(), Provider::GoogleShopping);
    }
}
