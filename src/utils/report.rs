//! 纯文本比价报告

use anyhow::{Context, Result};
use std::fmt::Write as _;
use std::fs;

use crate::models::AggregateRecord;
use crate::orchestrator::BatchSummary;
use crate::services::StripReport;
use crate::utils::logging::truncate_text;

/// 生成报告文本
pub fn render_report(
    records: &[AggregateRecord],
    summary: &BatchSummary,
    stripped: Option<&StripReport>,
) -> String {
    let mut out = String::new();
    let rule = "=".repeat(60);

    let _ = writeln!(out, "{}", rule);
    let _ = writeln!(
        out,
        "比价报告 - {}",
        chrono::Local::now().format("%Y-%m-%d %H:%M:%S")
    );
    let _ = writeln!(out, "{}\n", rule);

    if records.is_empty() {
        let _ = writeln!(out, "没有任何商品找到结果");
    }

    for record in records {
        let stats = record.statistics();
        let _ = writeln!(
            out,
            "{} | {} 条 | 均价 {:.2} | 中位数 {:.2} | 众数 {:.2} | 最低 {:.2} | 最高 {:.2} | 离群 {}",
            truncate_text(record.query.trim(), 40),
            record.results().len(),
            stats.mean,
            stats.median,
            stats.mode,
            stats.min,
            stats.max,
            stats.outliers.len()
        );
    }

    let _ = writeln!(out, "\n{}", "─".repeat(60));
    let _ = writeln!(
        out,
        "商品: {}/{} 有结果, {} 个跳过",
        summary.records_created, summary.total_items, summary.skipped
    );
    let _ = writeln!(out, "缓存: {}", summary.cache);
    if let Some(report) = stripped {
        let _ = writeln!(
            out,
            "离群值: 处理 {} 个商品, 移除 {} 条报价",
            report.items_processed, report.outliers_removed
        );
    }
    out
}

/// 写入报告文件（覆盖已有内容）
pub fn write_report(path: &str, content: &str) -> Result<()> {
    fs::write(path, content).with_context(|| format!("写入报告失败: {}", path))
}
