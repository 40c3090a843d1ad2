//! 编排层（Orchestration Layer）
//!
//! ## 职责
//!
//! 本层负责批量搜索的调度，是整个系统的"指挥中心"。
//!
//! ## 模块划分
//!
//! ### `batch_processor` - 批量搜索编排器
//! - 状态机（Idle → Running → Completed / Failed），同一时间只运行一个批量任务
//! - 按顺序遍历商品，委托 `ItemFlow` 并发查询
//! - 把有结果的商品写入汇总存储，记录搜索历史
//! - 统计缓存命中
//!
//! ### `events` - 进度事件
//! - `BatchEvent`：开始 / 单个商品完成或跳过 / 完成 / 失败
//! - `BatchSummary`、`CacheUsage`：任务结束后的汇总
//!
//! ## 层次关系
//!
//! ```text
//! batch_processor (处理 Vec<String>)
//!     ↓
//! workflow::ItemFlow (处理单个商品，扇出到多个来源)
//!     ↓
//! clients (ProviderClient：缓存 → 网络 → 映射 → 过滤)
//!     ↓
//! services / infrastructure (缓存、统计、存储、HTTP)
//! ```

pub mod batch_processor;
pub mod events;

pub use batch_processor::{BatchHandle, BatchOrchestrator, BatchRequest};
pub use events::{BatchEvent, BatchState, BatchSummary, CacheUsage};
