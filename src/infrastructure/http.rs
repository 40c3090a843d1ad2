//! HTTP 传输 - 基础设施层
//!
//! 供应商客户端只通过 [`HttpTransport`] 访问网络，测试中可替换为桩实现。

use async_trait::async_trait;
use serde_json::Value;
use std::time::Duration;
use tracing::debug;

use crate::error::HttpError;

/// GET 一个 URL 并把响应体解析为 JSON
#[async_trait]
pub trait HttpTransport: Send + Sync {
    async fn get_json(&self, url: &str) -> Result<Value, HttpError>;
}

/// 基于 reqwest 的实现
pub struct ReqwestTransport {
    client: reqwest::Client,
}

impl ReqwestTransport {
    pub fn new(timeout: Duration) -> Result<Self, HttpError> {
        let client = reqwest::Client::builder()
            .timeout(timeout)
            .build()
            .map_err(|source| HttpError::Request {
                url: String::new(),
                source,
            })?;
        Ok(Self { client })
    }
}

#[async_trait]
impl HttpTransport for ReqwestTransport {
    async fn get_json(&self, url: &str) -> Result<Value, HttpError> {
        debug!("GET {}", url);

        let response = self
            .client
            .get(url)
            .header("Accept", "application/json")
            .send()
            .await
            .map_err(|source| HttpError::Request {
                url: url.to_string(),
                source,
            })?;

        let status = response.status();
        if !status.is_success() {
            return Err(HttpError::Status {
                url: url.to_string(),
                status: status.as_u16(),
            });
        }

        response.json::<Value>().await.map_err(|source| HttpError::Decode {
            url: url.to_string(),
            source,
        })
    }
}

/// 构造 `<base>/search?q=<query>`，查询参数做 URL 编码
pub fn search_url(base_url: &str, query: &str) -> Result<String, HttpError> {
    let endpoint = format!("{}/search", base_url.trim_end_matches('/'));
    reqwest::Url::parse_with_params(&endpoint, &[("q", query)])
        .map(|url| url.to_string())
        .map_err(|e| HttpError::InvalidUrl(format!("{}: {}", endpoint, e)))
}
