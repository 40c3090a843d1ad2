//! Google Shopping 响应映射
//!
//! 响应格式：`{ "shopping_results": [{ "price": "R$ 1.234,56", "title", "link", "source", "thumbnail" }] }`

use regex::Regex;
use serde::Deserialize;
use serde_json::Value;
use tracing::debug;

use crate::clients::search_client::PayloadMapper;
use crate::infrastructure::ImageProxy;
use crate::models::{Offer, Provider};

/// 没有商家名称时的默认值
const UNKNOWN_STORE: &str = "Loja não identificada";

#[derive(Debug, Deserialize)]
struct GsItem {
    #[serde(default)]
    price: Option<Value>,
    #[serde(default)]
    extracted_price: Option<f64>,
    #[serde(default)]
    title: String,
    #[serde(default)]
    link: String,
    #[serde(default)]
    source: Option<String>,
    #[serde(default)]
    thumbnail: Option<String>,
}

#[derive(Debug, Clone, Copy, Default)]
pub struct GoogleShoppingMapper;

impl PayloadMapper for GoogleShoppingMapper {
    fn provider(&self) -> Provider {
        Provider::GoogleShopping
    }

    fn map(&self, payload: &Value, images: &ImageProxy) -> Result<Option<Vec<Offer>>, String> {
        if !payload.is_object() {
            return Err("响应不是 JSON 对象".to_string());
        }
        let items = match payload.get("shopping_results") {
            None | Some(Value::Null) => return Ok(None),
            Some(Value::Array(items)) => items,
            Some(_) => return Err("shopping_results 字段不是数组".to_string()),
        };

        let cleaner = Regex::new(r"[^0-9,]").map_err(|e| e.to_string())?;

        let offers = items
            .iter()
            .filter_map(|item| {
                let item = match GsItem::deserialize(item) {
                    Ok(item) => item,
                    Err(e) => {
                        debug!("跳过无法解析的 Google Shopping 条目: {}", e);
                        return None;
                    }
                };

                let price = match &item.price {
                    Some(Value::String(text)) => parse_price_text(&cleaner, text),
                    Some(Value::Number(n)) => n.as_f64(),
                    _ => None,
                }
                .or(item.extracted_price)?;

                let source = item
                    .source
                    .filter(|s| !s.trim().is_empty())
                    .unwrap_or_else(|| UNKNOWN_STORE.to_string());

                Some(
                    Offer::new(Provider::GoogleShopping, price, item.title, item.link)
                        .with_source_label(source)
                        .with_image_url(images.rewrite(item.thumbnail.as_deref())),
                )
            })
            .collect();

        Ok(Some(offers))
    }
}

/// 解析价格文本：去掉数字和逗号以外的字符（货币符号、千分位点），
/// 第一个逗号视为小数点，然后取最长的合法数字前缀
fn parse_price_text(cleaner: &Regex, text: &str) -> Option<f64> {
    let cleaned = cleaner.replace_all(text, "").replacen(',', ".", 1);

    let mut seen_dot = false;
    let prefix: String = cleaned
        .chars()
        .take_while(|c| match c {
            '0'..='9' => true,
            '.' if !seen_dot => {
                seen_dot = true;
                true
            }
            _ => false,
        })
        .collect();

    prefix.parse::<f64>().ok()
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn images() -> ImageProxy {
        ImageProxy::new("https://b.example", "/api/image-proxy", "/assets/no-image.png")
    }

    fn parse(text: &str) -> Option<f64> {
        parse_price_text(&Regex::new(r"[^0-9,]").unwrap(), text)
    }

    #[test]
    fn test_parse_brazilian_prices() {
        assert_eq!(parse("R$ 1.234,56"), Some(1234.56));
        assert_eq!(parse("R$ 89,90"), Some(89.9));
        assert_eq!(parse("R$ 45"), Some(45.0));
        assert_eq!(parse("R$\u{a0}2.999,00 agora"), Some(2999.0));
    }

    #[test]
    fn test_parse_unusable_price() {
        assert_eq!(parse("Grátis"), None);
        assert_eq!(parse(""), None);
        assert_eq!(parse(",50"), Some(0.5));
    }

    #[test]
    fn test_maps_items() {
        let payload = json!({"shopping_results": [
            {"price": "R$ 199,90", "title": "Teclado", "link": "https://gs/1", "source": "Kabum",
             "thumbnail": "data:image/jpeg;base64,AAAA"},
            {"price": 75.5, "title": "Mouse", "link": "https://gs/2"},
            {"extracted_price": 30.0, "title": "Cabo", "link": "https://gs/3", "source": " "}
        ]});

        let offers = GoogleShoppingMapper.map(&payload, &images()).unwrap().unwrap();
        assert_eq!(offers.len(), 3);
        assert_eq!(offers[0].price, 199.9);
        assert_eq!(offers[0].source_label.as_deref(), Some("Kabum"));
        assert_eq!(offers[0].image_url.as_deref(), Some("data:image/jpeg;base64,AAAA"));
        assert_eq!(offers[1].price, 75.5);
        assert_eq!(offers[1].source_label.as_deref(), Some(UNKNOWN_STORE));
        assert_eq!(offers[2].price, 30.0);
        assert_eq!(offers[2].source_label.as_deref(), Some(UNKNOWN_STORE));
        assert!(offers.iter().all(|o| o.provider == Provider::GoogleShopping));
    }

    #[test]
    fn test_items_without_price_are_dropped() {
        let payload = json!({"shopping_results": [
            {"price": "Consulte", "title": "sem preço"},
            {"title": "nada"},
            "not an object"
        ]});
        let offers = GoogleShoppingMapper.map(&payload, &images()).unwrap().unwrap();
        assert!(offers.is_empty());
    }

    #[test]
    fn test_missing_results_is_none() {
        assert_eq!(GoogleShoppingMapper.map(&json!({"search_metadata": {}}), &images()).unwrap(), None);
    }

    #[test]
    fn test_malformed_payload() {
        assert!(GoogleShoppingMapper.map(&json!("html error page"), &images()).is_err());
    }
}
