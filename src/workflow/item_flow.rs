//! 商品处理流程 - 流程层
//!
//! 核心职责：定义"一个商品"的完整处理流程
//!
//! 1. 对每个启用的供应商同时发起 search（并发扇出）
//! 2. 等待全部完成后按供应商顺序合并结果
//! 3. 统计缓存命中情况，交给编排层汇总

use futures::future::join_all;
use std::sync::Arc;
use tracing::{debug, info};

use crate::clients::ProviderClient;
use crate::error::AppResult;
use crate::models::{Offer, Provider};
use crate::workflow::item_ctx::ItemCtx;

/// 单个商品的扇出结果
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ItemOutcome {
    /// 所有供应商的报价（已过滤，按供应商顺序拼接）
    pub offers: Vec<Offer>,
    /// 发起的供应商查询次数
    pub lookups: usize,
    /// 其中直接由缓存返回的次数
    pub cache_hits: usize,
}

/// 商品处理流程
///
/// - 只负责一个商品的扇出与合并
/// - 不持有汇总存储，不做统计计算
pub struct ItemFlow {
    clients: Vec<Arc<dyn ProviderClient>>,
}

impl ItemFlow {
    pub fn new(clients: Vec<Arc<dyn ProviderClient>>) -> Self {
        Self { clients }
    }

    pub fn providers(&self) -> Vec<Provider> {
        self.clients.iter().map(|c| c.provider()).collect()
    }

    /// 执行扇出。任一供应商返回意外错误时整体返回该错误，
    /// 但仍会等所有请求结束后才返回。
    pub async fn run(&self, ctx: &ItemCtx) -> AppResult<ItemOutcome> {
        info!("{} 🔍 同时查询 {} 个来源", ctx, self.clients.len());

        let searches = self.clients.iter().map(|client| client.search(&ctx.query));
        let results = join_all(searches).await;

        let mut outcome = ItemOutcome::default();
        for (client, result) in self.clients.iter().zip(results) {
            let found = result?;
            outcome.lookups += 1;
            if found.served_from_cache {
                outcome.cache_hits += 1;
            }
            debug!(
                "{} {} 返回 {} 条{}",
                ctx,
                client.provider(),
                found.offers.len(),
                if found.served_from_cache { "（缓存）" } else { "" }
            );
            outcome.offers.extend(found.offers);
        }

        Ok(outcome)
    }
}
