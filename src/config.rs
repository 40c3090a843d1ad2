use std::path::PathBuf;
use std::str::FromStr;
use std::time::Duration;

/// 程序配置
#[derive(Clone, Debug)]
pub struct Config {
    /// 后端代理服务地址
    pub api_base_url: String,
    /// Mercado Livre 搜索路径
    pub mercado_livre_path: String,
    /// Google Shopping 搜索路径
    pub google_shopping_path: String,
    /// 图片代理路径
    pub image_proxy_path: String,
    /// 缺图时的占位图
    pub image_placeholder: String,
    /// 结果缓存目录
    pub cache_dir: String,
    /// 缓存有效期（小时）
    pub cache_ttl_hours: u64,
    /// 价格上限，达到或超过视为异常数据
    pub price_ceiling: f64,
    /// 单次请求超时（秒）
    pub request_timeout_secs: u64,
    /// 批量搜索文件
    pub batch_file: String,
    /// 搜索历史文件
    pub history_file: String,
    /// 输出报告文件
    pub output_log_file: String,
    /// 是否显示详细日志
    pub verbose_logging: bool,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            api_base_url: "https://metapreco-backend.onrender.com".to_string(),
            mercado_livre_path: "/api/mercadolivre".to_string(),
            google_shopping_path: "/api/google-shopping".to_string(),
            image_proxy_path: "/api/image-proxy".to_string(),
            image_placeholder: "/assets/no-image.png".to_string(),
            cache_dir: ".metapreco/cache".to_string(),
            cache_ttl_hours: 24,
            price_ceiling: 10_000.0,
            request_timeout_secs: 20,
            batch_file: "lote.toml".to_string(),
            history_file: ".metapreco/historico.jsonl".to_string(),
            output_log_file: "relatorio.txt".to_string(),
            verbose_logging: false,
        }
    }
}

impl Config {
    pub fn from_env() -> Self {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// 从任意键值来源读取；无法解析的值回退到默认值
    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Self {
        let default = Self::default();
        Self {
            api_base_url: lookup("METAPRECO_API_BASE_URL").unwrap_or(default.api_base_url),
            mercado_livre_path: lookup("MERCADO_LIVRE_PATH").unwrap_or(default.mercado_livre_path),
            google_shopping_path: lookup("GOOGLE_SHOPPING_PATH").unwrap_or(default.google_shopping_path),
            image_proxy_path: lookup("IMAGE_PROXY_PATH").unwrap_or(default.image_proxy_path),
            image_placeholder: lookup("IMAGE_PLACEHOLDER").unwrap_or(default.image_placeholder),
            cache_dir: lookup("CACHE_DIR").unwrap_or(default.cache_dir),
            cache_ttl_hours: parse_var(&lookup, "CACHE_TTL_HOURS").unwrap_or(default.cache_ttl_hours),
            price_ceiling: parse_var(&lookup, "PRICE_CEILING")
                .filter(|v: &f64| v.is_finite() && *v > 0.0)
                .unwrap_or(default.price_ceiling),
            request_timeout_secs: parse_var(&lookup, "REQUEST_TIMEOUT_SECS").unwrap_or(default.request_timeout_secs),
            batch_file: lookup("BATCH_FILE").unwrap_or(default.batch_file),
            history_file: lookup("HISTORY_FILE").unwrap_or(default.history_file),
            output_log_file: lookup("OUTPUT_LOG_FILE").unwrap_or(default.output_log_file),
            verbose_logging: parse_var(&lookup, "VERBOSE_LOGGING").unwrap_or(default.verbose_logging),
        }
    }

    fn endpoint(&self, path: &str) -> String {
        format!("{}{}", self.api_base_url.trim_end_matches('/'), path)
    }

    pub fn mercado_livre_url(&self) -> String {
        self.endpoint(&self.mercado_livre_path)
    }

    pub fn google_shopping_url(&self) -> String {
        self.endpoint(&self.google_shopping_path)
    }

    pub fn cache_ttl(&self) -> Duration {
        Duration::from_secs(self.cache_ttl_hours * 60 * 60)
    }

    pub fn request_timeout(&self) -> Duration {
        Duration::from_secs(self.request_timeout_secs)
    }

    pub fn batch_path(&self) -> PathBuf {
        PathBuf::from(&self.batch_file)
    }
}

fn parse_var<T: FromStr>(lookup: &impl Fn(&str) -> Option<String>, key: &str) -> Option<T> {
    lookup(key).and_then(|v| v.trim().parse().ok())
}
