/// 图片地址改写
///
/// - 缺失 / 无法识别 → 占位图
/// - `data:` URI、已经走代理的地址 → 原样返回
/// - `http(s)` 绝对地址 → `<proxy>?url=<encoded>`，避免混合内容和防盗链
#[derive(Debug, Clone)]
pub struct ImageProxy {
    proxy_url: String,
    proxy_path: String,
    placeholder: String,
}

impl ImageProxy {
    pub fn new(base_url: &str, proxy_path: &str, placeholder: impl Into<String>) -> Self {
        Self {
            proxy_url: format!("{}{}", base_url.trim_end_matches('/'), proxy_path),
            proxy_path: proxy_path.to_string(),
            placeholder: placeholder.into(),
        }
    }

    pub fn placeholder(&self) -> &str {
        &self.placeholder
    }

    pub fn rewrite(&self, url: Option<&str>) -> String {
        let url = match url.map(str::trim) {
            Some(u) if !u.is_empty() => u,
            _ => return self.placeholder.clone(),
        };

        if url.starts_with(&self.proxy_path) || url.starts_with(&self.proxy_url) {
            return url.to_string();
        }
        if url.starts_with("data:") {
            return url.to_string();
        }
        if url.starts_with("http://") || url.starts_with("https://") {
            let proxied = reqwest::Url::parse_with_params(&self.proxy_url, &[("url", url)]);
            return match proxied {
                Ok(proxied) => proxied.to_string(),
                Err(_) => self.placeholder.clone(),
            };
        }

        self.placeholder.clone()
    }
}
