//! 商品报价模型
//!
//! 序列化字段名沿用缓存中已有数据的格式（`preco`、`titulo` ...），
//! 这样旧的缓存条目可以直接读取。

use serde::{Deserialize, Serialize};
use std::fmt::{self, Display};
use std::str::FromStr;

/// 外部搜索供应商
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub enum Provider {
    #[serde(rename = "Mercado Livre")]
    MercadoLivre,
    #[serde(rename = "Google Shopping")]
    GoogleShopping,
}

impl Provider {
    /// 所有已知供应商
    pub const ALL: [Provider; 2] = [Provider::MercadoLivre, Provider::GoogleShopping];

    /// 短标识，用于缓存键和配置
    pub fn id(&self) -> &'static str {
        match self {
            Provider::MercadoLivre => "ml",
            Provider::GoogleShopping => "gs",
        }
    }

    /// 展示名称
    pub fn display_name(&self) -> &'static str {
        match self {
            Provider::MercadoLivre => "Mercado Livre",
            Provider::GoogleShopping => "Google Shopping",
        }
    }
}

impl Display for Provider {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.display_name())
    }
}

impl FromStr for Provider {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "ml" | "mercadolivre" | "mercado livre" => Ok(Provider::MercadoLivre),
            "gs" | "googleshopping" | "google shopping" => Ok(Provider::GoogleShopping),
            other => Err(format!("未知的供应商: {}", other)),
        }
    }
}

/// 单个供应商返回的一条报价
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Offer {
    #[serde(rename = "preco")]
    pub price: f64,
    #[serde(rename = "titulo")]
    pub title: String,
    pub link: String,
    #[serde(rename = "marketplace")]
    pub provider: Provider,
    /// 商家名称
    #[serde(rename = "fonte", default, skip_serializing_if = "Option::is_none")]
    pub source_label: Option<String>,
    #[serde(rename = "imagem", default, skip_serializing_if = "Option::is_none")]
    pub image_url: Option<String>,
}

impl Offer {
    pub fn new(provider: Provider, price: f64, title: impl Into<String>, link: impl Into<String>) -> Self {
        Self {
            price,
            title: title.into(),
            link: link.into(),
            provider,
            source_label: None,
            image_url: None,
        }
    }

    pub fn with_source_label(mut self, label: impl Into<String>) -> Self {
        self.source_label = Some(label.into());
        self
    }

    pub fn with_image_url(mut self, url: impl Into<String>) -> Self {
        self.image_url = Some(url.into());
        self
    }
}

/// 价格合理性检查：`0 < price < ceiling` 且为有限数
pub fn is_plausible_price(price: f64, ceiling: f64) -> bool {
    price.is_finite() && price > 0.0 && price < ceiling
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_provider_from_str() {
        assert_eq!("ml".parse::<Provider>(), Ok(Provider::MercadoLivre));
        assert_eq!(" GS ".parse::<Provider>(), Ok(Provider::GoogleShopping));
        assert!("amazon".parse::<Provider>().is_err());
    }

    #[test]
    fn test_offer_serializes_with_legacy_field_names() {
        let offer = Offer::new(Provider::GoogleShopping, 99.9, "Mouse", "https://x")
            .with_source_label("Loja A");
        let json = serde_json::to_value(&offer).unwrap();
        assert_eq!(json["preco"], 99.9);
        assert_eq!(json["titulo"], "Mouse");
        assert_eq!(json["marketplace"], "Google Shopping");
        assert_eq!(json["fonte"], "Loja A");
        assert!(json.get("imagem").is_none());
    }

    #[test]
    fn test_offer_reads_legacy_entry() {
        let json = r#"{"preco":120,"titulo":"Teclado","link":"https://ml/1","marketplace":"Mercado Livre","imagem":null}"#;
        let offer: Offer = serde_json::from_str(json).unwrap();
        assert_eq!(offer.provider, Provider::MercadoLivre);
        assert_eq!(offer.price, 120.0);
        assert_eq!(offer.image_url, None);
    }

    #[test]
    fn test_plausible_price() {
        assert!(is_plausible_price(0.01, 10_000.0));
        assert!(is_plausible_price(9_999.99, 10_000.0));
        assert!(!is_plausible_price(0.0, 10_000.0));
        assert!(!is_plausible_price(10_000.0, 10_000.0));
        assert!(!is_plausible_price(15_000.0, 10_000.0));
        assert!(!is_plausible_price(f64::NAN, 10_000.0));
        assert!(!is_plausible_price(-5.0, 10_000.0));
    }
}
