//! 交互编辑操作 - 业务能力层
//!
//! 每个操作都在结果集的副本上修改，然后用完整重算的统计量整条替换记录，
//! 保证操作返回后 `record.statistics == statistics::compute(record.results)`。

use tracing::{debug, info};

use crate::error::{AppResult, EditError};
use crate::models::{AggregateRecord, Offer, SortOrder};
use crate::services::aggregate_store::AggregateStore;

/// 批量去除离群值的结果
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct StripReport {
    pub items_processed: usize,
    pub outliers_removed: usize,
}

impl AggregateStore {
    /// 删除某条记录中的一个报价
    pub fn remove_result(&mut self, record_index: usize, result_index: usize) -> AppResult<Offer> {
        self.check_index(record_index)?;
        let record = &self.records[record_index];

        let mut results = record.results().to_vec();
        if result_index >= results.len() {
            return Err(EditError::ResultOutOfRange {
                index: result_index,
                len: results.len(),
            }
            .into());
        }
        let removed = results.remove(result_index);

        let updated = AggregateRecord::with_results(record.query.clone(), results);
        debug!("[{}] 删除报价 \"{}\"，剩余 {} 条", updated.query, removed.title, updated.results().len());
        self.replace(record_index, updated);
        Ok(removed)
    }

    /// 按当前统计围栏去除某条记录的离群值，返回删除数量
    pub fn strip_outliers(&mut self, record_index: usize) -> AppResult<usize> {
        self.check_index(record_index)?;
        let (updated, removed) = strip_record(&self.records[record_index]);
        self.replace(record_index, updated);
        Ok(removed)
    }

    /// 对所有记录去除离群值（没有报价的记录跳过）
    pub fn strip_outliers_all(&mut self) -> StripReport {
        let mut report = StripReport::default();

        for index in 0..self.records.len() {
            if self.records[index].results().is_empty() {
                continue;
            }
            let (updated, removed) = strip_record(&self.records[index]);
            self.replace(index, updated);
            report.items_processed += 1;
            report.outliers_removed += removed;
        }

        info!(
            "离群值处理完成: 处理 {} 个商品, 删除 {} 个离群报价",
            report.items_processed, report.outliers_removed
        );
        report
    }

    /// 按均价稳定排序所有记录
    pub fn sort_records(&mut self, order: SortOrder) {
        self.records.sort_by(|a, b| {
            let (a, b) = (a.statistics().mean, b.statistics().mean);
            match order {
                SortOrder::Ascending => a.total_cmp(&b),
                SortOrder::Descending => b.total_cmp(&a),
            }
        });
    }

    /// 按价格稳定排序某条记录内的报价
    pub fn sort_results_within_record(&mut self, record_index: usize, order: SortOrder) -> AppResult<()> {
        self.check_index(record_index)?;
        let record = &self.records[record_index];

        let mut results = record.results().to_vec();
        results.sort_by(|a, b| match order {
            SortOrder::Ascending => a.price.total_cmp(&b.price),
            SortOrder::Descending => b.price.total_cmp(&a.price),
        });

        // 离群值列表按结果顺序排列，所以排序后同样要重算
        let updated = AggregateRecord::with_results(record.query.clone(), results);
        self.replace(record_index, updated);
        Ok(())
    }
}

/// 用过滤前的围栏筛选，再对剩余结果完整重算
fn strip_record(record: &AggregateRecord) -> (AggregateRecord, usize) {
    let stats = record.statistics();
    let (lower, upper) = (stats.lower_bound, stats.upper_bound);

    let kept: Vec<Offer> = record
        .results()
        .iter()
        .filter(|o| o.price >= lower && o.price <= upper)
        .cloned()
        .collect();
    let removed = record.results().len() - kept.len();

    (AggregateRecord::with_results(record.query.clone(), kept), removed)
}
