use serde::Serialize;

use crate::models::Offer;
use crate::services::statistics::{self, Statistics};

/// 一个商品查询的汇总记录
///
/// `statistics` 永远等于 `statistics::compute(results 的价格)`，
/// 只能通过构造函数整体生成，不做增量修改。
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct AggregateRecord {
    /// 用户输入的原始查询（保留大小写与空白）
    pub query: String,
    results: Vec<Offer>,
    statistics: Statistics,
}

impl AggregateRecord {
    /// 由搜索结果创建记录；没有结果时返回 `None`
    pub fn from_results(query: impl Into<String>, results: Vec<Offer>) -> Option<Self> {
        if results.is_empty() {
            return None;
        }
        Some(Self::with_results(query, results))
    }

    /// 用新的结果集重建记录（统计量完整重算）
    pub(crate) fn with_results(query: impl Into<String>, results: Vec<Offer>) -> Self {
        let statistics = statistics::compute(&prices_of(&results));
        Self {
            query: query.into(),
            results,
            statistics,
        }
    }

    pub fn results(&self) -> &[Offer] {
        &self.results
    }

    pub fn statistics(&self) -> &Statistics {
        &self.statistics
    }

    pub fn prices(&self) -> Vec<f64> {
        prices_of(&self.results)
    }

    /// 按当前统计围栏判断报价是否为离群值
    pub fn is_outlier(&self, offer: &Offer) -> bool {
        self.statistics.is_outlier(offer.price)
    }

    pub fn outlier_offers(&self) -> Vec<&Offer> {
        self.results.iter().filter(|o| self.is_outlier(o)).collect()
    }
}

fn prices_of(results: &[Offer]) -> Vec<f64> {
    results.iter().map(|o| o.price).collect()
}
