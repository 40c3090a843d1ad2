//! 批量任务的进度事件与汇总
//!
//! 编排层只负责发出事件，不关心由谁消费（日志、界面、测试）。

use std::fmt;
use std::time::Duration;

use crate::models::Provider;

/// 批量任务状态机：`Idle → Running → {Completed | Failed}`
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BatchState {
    Idle,
    Running,
    Completed,
    Failed,
}

impl BatchState {
    pub fn is_running(&self) -> bool {
        matches!(self, BatchState::Running)
    }
}

/// 缓存命中统计（"X/Y 次查询来自缓存"）
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct CacheUsage {
    pub lookups: usize,
    pub hits: usize,
}

impl CacheUsage {
    pub fn record(&mut self, lookups: usize, hits: usize) {
        self.lookups += lookups;
        self.hits += hits;
    }

    pub fn misses(&self) -> usize {
        self.lookups - self.hits
    }

    pub fn percent(&self) -> f64 {
        if self.lookups == 0 {
            return 0.0;
        }
        self.hits as f64 / self.lookups as f64 * 100.0
    }
}

impl fmt::Display for CacheUsage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{}/{} 次查询来自缓存 ({:.0}%)",
            self.hits,
            self.lookups,
            self.percent()
        )
    }
}

/// 一次批量任务的汇总
#[derive(Debug, Clone, Default, PartialEq)]
pub struct BatchSummary {
    /// 非空查询数
    pub total_items: usize,
    /// 生成了记录的商品数
    pub records_created: usize,
    /// 没有任何结果、被跳过的商品数
    pub skipped: usize,
    /// 所有新记录的报价总数
    pub total_results: usize,
    pub cache: CacheUsage,
    pub elapsed: Duration,
}

/// 批量任务进度事件
#[derive(Debug, Clone, PartialEq)]
pub enum BatchEvent {
    Started {
        total: usize,
        providers: Vec<Provider>,
    },
    ItemStarted {
        index: usize,
        total: usize,
        query: String,
    },
    ItemCompleted {
        index: usize,
        query: String,
        results: usize,
        percent: u8,
    },
    /// 过滤后没有结果，不生成记录，但进度照常推进
    ItemSkipped {
        index: usize,
        query: String,
        percent: u8,
    },
    Completed(BatchSummary),
    Failed {
        query: String,
        message: String,
    },
}

impl BatchEvent {
    /// 携带进度百分比的事件返回其百分比
    pub fn percent(&self) -> Option<u8> {
        match self {
            BatchEvent::ItemCompleted { percent, .. } | BatchEvent::ItemSkipped { percent, .. } => {
                Some(*percent)
            }
            _ => None,
        }
    }
}
