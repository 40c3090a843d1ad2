//! 业务能力层（Services）
//!
//! 每个模块只描述"我能做什么"，不关心批量流程。

pub mod aggregate_store;
pub mod edit_operations;
pub mod history;
pub mod result_cache;
pub mod statistics;

pub use aggregate_store::{AggregateStore, SharedAggregateStore};
pub use edit_operations::StripReport;
pub use history::{filter_history, HistorySummary};
pub use result_cache::{cache_key, normalize_query, ResultCache};
pub use statistics::Statistics;
