/// 日志工具模块
///
/// 提供日志格式化和输出的辅助函数
use tracing::{info, warn};

use crate::config::Config;
use crate::orchestrator::{BatchEvent, BatchSummary};
use crate::services::HistorySummary;

/// 记录程序启动信息
pub fn log_startup(config: &Config) {
    info!("{}", "=".repeat(60));
    info!("🚀 程序启动 - 批量比价模式");
    info!("🌐 后端地址: {}", config.api_base_url);
    info!("💾 缓存目录: {} (有效期 {} 小时)", config.cache_dir, config.cache_ttl_hours);
    info!("{}", "=".repeat(60));
}

/// 记录批量文件加载信息
///
/// # 参数
/// - `total`: 非空查询数
/// - `providers`: 启用的来源名称
pub fn log_batch_loaded(total: usize, providers: &[String]) {
    info!("✓ 找到 {} 个待搜索的商品", total);
    info!("📋 搜索来源: {}", providers.join(", "));
    info!("💡 商品逐个处理，每个商品同时查询所有来源\n");
}

/// 把进度事件转成日志
pub fn log_event(event: &BatchEvent) {
    match event {
        BatchEvent::Started { total, .. } => {
            info!("\n{}", "=".repeat(60));
            info!("📦 开始批量搜索，共 {} 个商品", total);
            info!("{}", "=".repeat(60));
        }
        BatchEvent::ItemStarted { index, total, query } => {
            info!("\n[{}/{}] 🔍 {}", index + 1, total, truncate_text(query.trim(), 40));
        }
        BatchEvent::ItemCompleted {
            query,
            results,
            percent,
            ..
        } => {
            info!("✓ {} - {} 条结果 ({}%)", truncate_text(query.trim(), 40), results, percent);
        }
        BatchEvent::ItemSkipped { query, percent, .. } => {
            info!("⏭️ {} - 没有结果 ({}%)", truncate_text(query.trim(), 40), percent);
        }
        BatchEvent::Completed(summary) => {
            info!("\n{}", "─".repeat(60));
            info!(
                "✓ 批量搜索完成: {}/{} 个商品有结果",
                summary.records_created, summary.total_items
            );
            info!("{}", "─".repeat(60));
        }
        BatchEvent::Failed { query, message } => {
            warn!("❌ 搜索 \"{}\" 时中断: {}", query.trim(), message);
        }
    }
}

/// 打印最终统计信息
///
/// # 参数
/// - `summary`: 本次批量汇总
/// - `history`: 历史搜索统计
/// - `cache_mb`: 缓存占用（MB）
/// - `log_file_path`: 报告文件路径
pub fn print_final_stats(
    summary: &BatchSummary,
    history: &HistorySummary,
    cache_mb: f64,
    log_file_path: &str,
) {
    info!("\n{}", "=".repeat(60));
    info!("📊 全部处理完成统计");
    info!(
        "完成时间: {}",
        chrono::Local::now().format("%Y-%m-%d %H:%M:%S")
    );
    info!("{}", "=".repeat(60));
    info!("✅ 有结果: {}/{}", summary.records_created, summary.total_items);
    info!("⏭️ 无结果: {}", summary.skipped);
    info!("🏷️ 报价总数: {}", summary.total_results);
    info!("💾 {}", summary.cache);
    info!("⏱️ 耗时: {:.1}s", summary.elapsed.as_secs_f64());
    info!(
        "🕘 历史: {} 次搜索, {} 个商品, 最常搜索: {}",
        history.total_searches,
        history.total_products,
        history.popular_term.as_deref().unwrap_or("-")
    );
    info!("📦 缓存占用: {:.2} MB", cache_mb);
    info!("{}", "=".repeat(60));
    info!("\n报告已保存至: {}", log_file_path);
}

/// 截断长文本用于日志显示
///
/// # 参数
/// - `text`: 原始文本
/// - `max_len`: 最大长度（按字符计）
pub fn truncate_text(text: &str, max_len: usize) -> String {
    if text.chars().count() > max_len {
        text.chars().take(max_len).collect::<String>() + "..."
    } else {
        text.to_string()
    }
}
