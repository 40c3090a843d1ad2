//! 商品处理上下文
//!
//! 封装"我正在处理批量中的第几个商品"这一信息

use std::fmt::Display;

/// 商品处理上下文
#[derive(Debug, Clone)]
pub struct ItemCtx {
    /// 在批量中的位置（从0开始）
    pub index: usize,

    /// 批量中非空查询的总数
    pub total: usize,

    /// 用户输入的原始查询
    pub query: String,
}

impl ItemCtx {
    pub fn new(index: usize, total: usize, query: impl Into<String>) -> Self {
        Self {
            index,
            total,
            query: query.into(),
        }
    }

    /// 本商品完成后的整体进度 `round((index+1)/total*100)`
    pub fn percent(&self) -> u8 {
        if self.total == 0 {
            return 100;
        }
        let pct = ((self.index + 1) as f64 / self.total as f64 * 100.0).round();
        pct.clamp(0.0, 100.0) as u8
    }
}

impl Display for ItemCtx {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "[商品 {}/{} \"{}\"]", self.index + 1, self.total, self.query.trim())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_percent() {
        assert_eq!(ItemCtx::new(0, 3, "a").percent(), 33);
        assert_eq!(ItemCtx::new(1, 3, "a").percent(), 67);
        assert_eq!(ItemCtx::new(2, 3, "a").percent(), 100);
        assert_eq!(ItemCtx::new(0, 1, "a").percent(), 100);
    }

    #[test]
    fn test_display() {
        assert_eq!(ItemCtx::new(1, 5, " mouse ").to_string(), "[商品 2/5 \"mouse\"]");
    }
}
