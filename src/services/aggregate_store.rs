//! 会话汇总存储 - 业务能力层
//!
//! 按顺序保存每个商品的 [`AggregateRecord`]。批量编排只追加，
//! 交互编辑（见 `edit_operations`）整条替换记录，读者不会看到半更新的状态。

use std::sync::Arc;
use tokio::sync::RwLock;

use crate::error::{EditError, AppResult};
use crate::models::AggregateRecord;

/// 会话内共享的汇总存储句柄
pub type SharedAggregateStore = Arc<RwLock<AggregateStore>>;

#[derive(Debug, Default, Clone)]
pub struct AggregateStore {
    pub(crate) records: Vec<AggregateRecord>,
}

impl AggregateStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn shared() -> SharedAggregateStore {
        Arc::new(RwLock::new(Self::new()))
    }

    pub fn records(&self) -> &[AggregateRecord] {
        &self.records
    }

    pub fn get(&self, index: usize) -> Option<&AggregateRecord> {
        self.records.get(index)
    }

    /// 按原始查询查找记录
    pub fn find(&self, query: &str) -> Option<(usize, &AggregateRecord)> {
        self.records.iter().enumerate().find(|(_, r)| r.query == query)
    }

    pub fn len(&self) -> usize {
        self.records.len()
    }

    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }

    pub fn push(&mut self, record: AggregateRecord) {
        self.records.push(record);
    }

    pub fn clear(&mut self) {
        self.records.clear();
    }

    /// 所有记录的报价总数
    pub fn total_results(&self) -> usize {
        self.records.iter().map(|r| r.results().len()).sum()
    }

    pub(crate) fn check_index(&self, index: usize) -> AppResult<()> {
        if index >= self.records.len() {
            return Err(EditError::RecordOutOfRange {
                index,
                len: self.records.len(),
            }
            .into());
        }
        Ok(())
    }

    /// 整条替换
    pub(crate) fn replace(&mut self, index: usize, record: AggregateRecord) {
        self.records[index] = record;
    }
}
