//! 价格统计服务 - 业务能力层
//!
//! 纯函数：价格列表 → 均值 / 中位数 / 众数 / 最值 / IQR 离群边界。
//! 四分位数采用简单位置法（不插值）：
//! `Q1 = sorted[floor(n * 0.25)]`，`Q3 = sorted[floor(n * 0.75)]`。

use serde::{Deserialize, Serialize};

/// IQR 围栏系数
const IQR_FENCE_FACTOR: f64 = 1.5;

/// 一组价格的统计摘要
///
/// 只由 [`compute`] 生成，始终与其对应的价格列表保持一致。
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Statistics {
    pub mean: f64,
    pub median: f64,
    pub mode: f64,
    pub min: f64,
    pub max: f64,
    pub lower_bound: f64,
    pub upper_bound: f64,
    /// 落在围栏外的价格（保持输入顺序）
    pub outliers: Vec<f64>,
}

impl Statistics {
    /// 价格是否在 `[lower_bound, upper_bound]` 之外
    pub fn is_outlier(&self, price: f64) -> bool {
        price < self.lower_bound || price > self.upper_bound
    }
}

/// 计算统计摘要
///
/// 空输入返回全零结果，不报错。
pub fn compute(prices: &[f64]) -> Statistics {
    if prices.is_empty() {
        return Statistics::default();
    }

    let mut sorted = prices.to_vec();
    sorted.sort_by(|a, b| a.total_cmp(b));
    let n = sorted.len();

    let q1 = sorted[(n as f64 * 0.25).floor() as usize];
    let q3 = sorted[(n as f64 * 0.75).floor() as usize];
    let iqr = q3 - q1;
    let lower_bound = q1 - IQR_FENCE_FACTOR * iqr;
    let upper_bound = q3 + IQR_FENCE_FACTOR * iqr;

    let outliers = prices
        .iter()
        .copied()
        .filter(|&p| p < lower_bound || p > upper_bound)
        .collect();

    let mean = prices.iter().sum::<f64>() / n as f64;

    let median = if n % 2 == 0 {
        (sorted[n / 2 - 1] + sorted[n / 2]) / 2.0
    } else {
        sorted[n / 2]
    };

    Statistics {
        mean,
        median,
        mode: mode_of(prices),
        min: sorted[0],
        max: sorted[n - 1],
        lower_bound,
        upper_bound,
        outliers,
    }
}

/// 众数：频率最高者；频率相同时取输入中最先出现的值
fn mode_of(prices: &[f64]) -> f64 {
    // (值, 次数)，按首次出现顺序
    let mut counts: Vec<(f64, usize)> = Vec::new();
    for &price in prices {
        match counts.iter_mut().find(|(value, _)| *value == price) {
            Some((_, count)) => *count += 1,
            None => counts.push((price, 1)),
        }
    }

    let mut mode = prices[0];
    let mut max_count = 1;
    for (value, count) in counts {
        if count > max_count {
            mode = value;
            max_count = count;
        }
    }
    mode
}
