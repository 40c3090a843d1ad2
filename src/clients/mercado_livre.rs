//! Mercado Livre 响应映射
//!
//! 响应格式：`{ "results": [{ "price": 89.9, "title", "permalink", "thumbnail" }] }`

use regex::Regex;
use serde::Deserialize;
use serde_json::Value;
use tracing::debug;

use crate::clients::search_client::PayloadMapper;
use crate::infrastructure::ImageProxy;
use crate::models::{Offer, Provider};

#[derive(Debug, Deserialize)]
struct MlItem {
    price: Option<f64>,
    #[serde(default)]
    title: String,
    #[serde(default)]
    permalink: String,
    thumbnail: Option<String>,
}

#[derive(Debug, Clone, Copy, Default)]
pub struct MercadoLivreMapper;

impl PayloadMapper for MercadoLivreMapper {
    fn provider(&self) -> Provider {
        Provider::MercadoLivre
    }

    fn map(&self, payload: &Value, images: &ImageProxy) -> Result<Option<Vec<Offer>>, String> {
        if !payload.is_object() {
            return Err("响应不是 JSON 对象".to_string());
        }
        let items = match payload.get("results") {
            None | Some(Value::Null) => return Ok(None),
            Some(Value::Array(items)) => items,
            Some(_) => return Err("results 字段不是数组".to_string()),
        };

        // 缩略图换成大图版本（"-I.jpg" → "-W.jpg"）
        let thumb_re = Regex::new(r"\w\.jpg").ok();

        let offers = items
            .iter()
            .filter_map(|item| match MlItem::deserialize(item) {
                Ok(MlItem {
                    price: Some(price),
                    title,
                    permalink,
                    thumbnail,
                }) => {
                    let thumbnail = match (thumbnail, &thumb_re) {
                        (Some(t), Some(re)) => Some(re.replace_all(&t, "W.jpg").into_owned()),
                        (t, _) => t,
                    };
                    Some(
                        Offer::new(Provider::MercadoLivre, price, title, permalink)
                            .with_image_url(images.rewrite(thumbnail.as_deref())),
                    )
                }
                Ok(_) => None,
                Err(e) => {
                    debug!("跳过无法解析的 Mercado Livre 条目: {}", e);
                    None
                }
            })
            .collect();

        Ok(Some(offers))
    }
}
