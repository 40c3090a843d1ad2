//! # MetaPreço
//!
//! 批量比价工具：把一批商品名同时发给多个电商搜索来源，缓存结果，
//! 汇总价格统计并自动识别离群值。
//!
//! ## 架构设计
//!
//! 本系统采用分层架构：
//!
//! ### ① 基础设施层（Infrastructure）
//! - `infrastructure/` - 持有外部资源，只暴露能力
//! - `KvStore` - 缓存底层的键值存储（文件 / 内存）
//! - `HttpTransport` - 发起 GET 请求并解析 JSON
//! - `ImageProxy` - 图片地址改写
//! - `HistoryStore` - 搜索历史的追加与查询
//!
//! ### ② 业务能力层（Services）
//! - `services/` - 描述"我能做什么"
//! - `statistics` - 均值 / 中位数 / 众数 / IQR 离群围栏
//! - `ResultCache` - 带 TTL 的供应商结果缓存
//! - `AggregateStore` + 编辑操作 - 会话内的汇总记录
//!
//! ### ③ 客户端层（Clients）
//! - `clients/` - 每个供应商一个响应映射，统一由 `SearchClient` 处理缓存与降级
//!
//! ### ④ 流程层（Workflow）
//! - `workflow/` - 定义"一个商品"的处理流程（并发扇出到所有来源）
//!
//! ### ⑤ 编排层（Orchestration）
//! - `orchestrator/` - 批量任务状态机、顺序遍历、进度事件
//!
//! ## 模块结构

pub mod app;
pub mod clients;
pub mod config;
pub mod error;
pub mod infrastructure;
pub mod logger;
pub mod models;
pub mod orchestrator;
pub mod services;
pub mod utils;
pub mod workflow;

// 重新导出常用类型
pub use app::App;
pub use clients::{ProviderClient, SearchOutcome};
pub use config::Config;
pub use error::{AppError, AppResult};
pub use models::{AggregateRecord, Offer, Provider, SortOrder};
pub use orchestrator::{BatchEvent, BatchOrchestrator, BatchRequest, BatchState, BatchSummary};
pub use services::{AggregateStore, ResultCache, Statistics};
pub use workflow::{ItemCtx, ItemFlow};
