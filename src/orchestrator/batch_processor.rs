//! 批量搜索编排器 - 编排层
//!
//! ## 职责
//!
//! 1. **前置校验**：同一时间只允许一个批量任务；空查询、空来源直接拒绝
//! 2. **顺序遍历**：商品之间严格串行，进度和缓存命中可以归属到单个商品
//! 3. **组内并发**：每个商品委托 [`ItemFlow`] 向所有启用来源并发扇出
//! 4. **写入汇总**：有结果的商品生成 [`AggregateRecord`] 追加到汇总存储
//! 5. **中止语义**：意外错误中止任务，已写入的记录保留
//!
//! 取消不受支持：任务只会以完成或失败结束。如果运行中的 future 被丢弃，
//! 状态会记为 `Failed`，避免卡在 `Running`。

use std::collections::{BTreeMap, BTreeSet};
use std::sync::{Arc, Mutex};
use std::time::Instant;

use chrono::Utc;
use tokio::sync::mpsc::{self, UnboundedReceiver, UnboundedSender};
use tokio::task::JoinHandle;
use tracing::{debug, error, info, warn};

use crate::clients::ProviderClient;
use crate::error::{AppResult, BatchError};
use crate::infrastructure::{HistoryStore, SearchHistoryEntry, SearchSources};
use crate::models::{AggregateRecord, Provider};
use crate::orchestrator::events::{BatchEvent, BatchState, BatchSummary, CacheUsage};
use crate::services::SharedAggregateStore;
use crate::workflow::{ItemCtx, ItemFlow, ItemOutcome};

/// 一次批量搜索请求
#[derive(Debug, Clone, Default)]
pub struct BatchRequest {
    /// 按用户输入顺序；空白查询会被忽略
    pub queries: Vec<String>,
    pub providers: BTreeSet<Provider>,
}

impl BatchRequest {
    pub fn new<I, S>(queries: I, providers: impl IntoIterator<Item = Provider>) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            queries: queries.into_iter().map(Into::into).collect(),
            providers: providers.into_iter().collect(),
        }
    }
}

/// 后台运行中的批量任务
pub struct BatchHandle {
    pub events: UnboundedReceiver<BatchEvent>,
    pub task: JoinHandle<AppResult<BatchSummary>>,
}

/// 已通过校验、即将执行的任务
struct PreparedRun {
    guard: RunGuard,
    flow: ItemFlow,
    queries: Vec<String>,
    providers: BTreeSet<Provider>,
}

/// 持有 `Running` 状态；未正常结束就被丢弃时记为 `Failed`
struct RunGuard {
    state: Arc<Mutex<BatchState>>,
    finished: bool,
}

impl RunGuard {
    fn finish(mut self, outcome: BatchState) {
        set_state(&self.state, outcome);
        self.finished = true;
    }
}

impl Drop for RunGuard {
    fn drop(&mut self) {
        if !self.finished {
            set_state(&self.state, BatchState::Failed);
        }
    }
}

fn set_state(state: &Mutex<BatchState>, value: BatchState) {
    *state.lock().unwrap_or_else(|p| p.into_inner()) = value;
}

fn emit(events: Option<&UnboundedSender<BatchEvent>>, event: BatchEvent) {
    if let Some(tx) = events {
        // 接收端已关闭不影响任务本身
        let _ = tx.send(event);
    }
}

/// 批量搜索编排器
pub struct BatchOrchestrator {
    clients: BTreeMap<Provider, Arc<dyn ProviderClient>>,
    store: SharedAggregateStore,
    history: Option<Arc<dyn HistoryStore>>,
    state: Arc<Mutex<BatchState>>,
}

impl BatchOrchestrator {
    pub fn new(clients: Vec<Arc<dyn ProviderClient>>, store: SharedAggregateStore) -> Self {
        Self {
            clients: clients.into_iter().map(|c| (c.provider(), c)).collect(),
            store,
            history: None,
            state: Arc::new(Mutex::new(BatchState::Idle)),
        }
    }

    /// 每个商品完成后向历史库追加一条记录
    pub fn with_history(mut self, history: Arc<dyn HistoryStore>) -> Self {
        self.history = Some(history);
        self
    }

    pub fn store(&self) -> SharedAggregateStore {
        self.store.clone()
    }

    pub fn state(&self) -> BatchState {
        *self.state.lock().unwrap_or_else(|p| p.into_inner())
    }

    /// 在当前任务中执行批量搜索，直到完成或失败
    pub async fn run_batch(
        &self,
        request: BatchRequest,
        events: Option<UnboundedSender<BatchEvent>>,
    ) -> AppResult<BatchSummary> {
        let prepared = self.prepare(request)?;
        self.execute(prepared, events.as_ref()).await
    }

    /// 校验后在后台任务中执行，立即返回事件接收端
    ///
    /// 校验失败（包括已有任务在运行）时直接返回错误，不会启动任务。
    pub fn start_batch(self: &Arc<Self>, request: BatchRequest) -> AppResult<BatchHandle> {
        let prepared = self.prepare(request)?;
        let (tx, rx) = mpsc::unbounded_channel();
        let this = Arc::clone(self);
        let task = tokio::spawn(async move { this.execute(prepared, Some(&tx)).await });
        Ok(BatchHandle { events: rx, task })
    }

    /// 前置校验并切换到 `Running`，全程持有状态锁
    fn prepare(&self, request: BatchRequest) -> AppResult<PreparedRun> {
        let mut state = self.state.lock().unwrap_or_else(|p| p.into_inner());
        if state.is_running() {
            warn!("⚠️ 已有批量搜索正在进行，拒绝新的请求");
            return Err(BatchError::AlreadyRunning.into());
        }

        let queries: Vec<String> = request
            .queries
            .into_iter()
            .filter(|q| !q.trim().is_empty())
            .collect();
        if queries.is_empty() {
            return Err(BatchError::EmptyQueries.into());
        }
        if request.providers.is_empty() {
            return Err(BatchError::NoProviders.into());
        }

        let mut clients = Vec::with_capacity(request.providers.len());
        for provider in &request.providers {
            match self.clients.get(provider) {
                Some(client) => clients.push(client.clone()),
                None => return Err(BatchError::ProviderUnavailable(*provider).into()),
            }
        }

        *state = BatchState::Running;
        Ok(PreparedRun {
            guard: RunGuard {
                state: self.state.clone(),
                finished: false,
            },
            flow: ItemFlow::new(clients),
            queries,
            providers: request.providers,
        })
    }

    async fn execute(
        &self,
        prepared: PreparedRun,
        events: Option<&UnboundedSender<BatchEvent>>,
    ) -> AppResult<BatchSummary> {
        let PreparedRun {
            guard,
            flow,
            queries,
            providers,
        } = prepared;

        let started = Instant::now();
        let total = queries.len();
        let mut summary = BatchSummary {
            total_items: total,
            ..Default::default()
        };
        let mut cache = CacheUsage::default();

        info!("🚀 开始批量搜索: {} 个商品, 来源 {:?}", total, flow.providers());
        emit(
            events,
            BatchEvent::Started {
                total,
                providers: flow.providers(),
            },
        );

        // 新的批量任务替换上一批的记录
        self.store.write().await.clear();

        for (index, query) in queries.into_iter().enumerate() {
            let ctx = ItemCtx::new(index, total, query);
            emit(
                events,
                BatchEvent::ItemStarted {
                    index,
                    total,
                    query: ctx.query.clone(),
                },
            );

            let outcome = match flow.run(&ctx).await {
                Ok(outcome) => outcome,
                Err(e) => {
                    error!("{} ❌ 批量搜索中断: {}", ctx, e);
                    guard.finish(BatchState::Failed);
                    emit(
                        events,
                        BatchEvent::Failed {
                            query: ctx.query.clone(),
                            message: e.to_string(),
                        },
                    );
                    return Err(BatchError::Aborted {
                        query: ctx.query,
                        source: Box::new(e),
                    }
                    .into());
                }
            };

            cache.record(outcome.lookups, outcome.cache_hits);
            self.append_history(&ctx, &outcome, &providers);

            let found = outcome.offers.len();
            match AggregateRecord::from_results(ctx.query.clone(), outcome.offers) {
                Some(record) => {
                    info!(
                        "{} ✓ {} 条结果, 均价 {:.2}",
                        ctx,
                        found,
                        record.statistics().mean
                    );
                    self.store.write().await.push(record);
                    summary.records_created += 1;
                    summary.total_results += found;
                    emit(
                        events,
                        BatchEvent::ItemCompleted {
                            index,
                            query: ctx.query.clone(),
                            results: found,
                            percent: ctx.percent(),
                        },
                    );
                }
                None => {
                    info!("{} ⏭️ 没有找到结果，跳过", ctx);
                    summary.skipped += 1;
                    emit(
                        events,
                        BatchEvent::ItemSkipped {
                            index,
                            query: ctx.query.clone(),
                            percent: ctx.percent(),
                        },
                    );
                }
            }
        }

        summary.cache = cache;
        summary.elapsed = started.elapsed();
        guard.finish(BatchState::Completed);

        info!("✅ 批量搜索完成: {} 条记录, {}", summary.records_created, summary.cache);
        emit(events, BatchEvent::Completed(summary.clone()));
        Ok(summary)
    }

    /// 历史写入失败只记日志，不影响批量任务
    fn append_history(&self, ctx: &ItemCtx, outcome: &ItemOutcome, providers: &BTreeSet<Provider>) {
        let Some(history) = &self.history else {
            return;
        };

        let entry = SearchHistoryEntry {
            search_term: ctx.query.trim().to_string(),
            timestamp: Utc::now(),
            result_count: outcome.offers.len(),
            sources: SearchSources {
                mercado_livre: providers.contains(&Provider::MercadoLivre),
                google_shopping: providers.contains(&Provider::GoogleShopping),
            },
        };

        match history.append(&entry) {
            Ok(()) => debug!("{} 已写入搜索历史", ctx),
            Err(e) => warn!("{} ⚠️ 写入搜索历史失败: {}", ctx, e),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::clients::SearchOutcome;
    use crate::error::AppError;
    use crate::infrastructure::MemoryHistoryStore;
    use crate::models::Offer;
    use crate::services::AggregateStore;
    use async_trait::async_trait;
    use std::collections::HashMap;
    use std::time::Duration;
    use tokio::sync::Notify;

    /// 按查询返回固定价格；`fail_on` 命中时返回意外错误
    struct ScriptedClient {
        provider: Provider,
        prices: HashMap<String, Vec<f64>>,
        fail_on: Option<String>,
    }

    impl ScriptedClient {
        fn new(provider: Provider, script: &[(&str, &[f64])]) -> Arc<Self> {
            Arc::new(Self {
                provider,
                prices: script
                    .iter()
                    .map(|(q, p)| (q.to_string(), p.to_vec()))
                    .collect(),
                fail_on: None,
            })
        }

        fn failing_on(provider: Provider, script: &[(&str, &[f64])], query: &str) -> Arc<Self> {
            Arc::new(Self {
                provider,
                prices: script
                    .iter()
                    .map(|(q, p)| (q.to_string(), p.to_vec()))
                    .collect(),
                fail_on: Some(query.to_string()),
            })
        }
    }

    #[async_trait]
    impl ProviderClient for ScriptedClient {
        fn provider(&self) -> Provider {
            self.provider
        }

        async fn search(&self, query: &str) -> AppResult<SearchOutcome> {
            if self.fail_on.as_deref() == Some(query.trim()) {
                return Err(AppError::provider_unexpected(self.provider, "boom"));
            }
            let offers = self
                .prices
                .get(query.trim())
                .map(|prices| {
                    prices
                        .iter()
                        .map(|&p| Offer::new(self.provider, p, query, "https://x"))
                        .collect()
                })
                .unwrap_or_default();
            Ok(SearchOutcome::fetched(offers))
        }
    }

    /// 等到收到通知才返回
    struct BlockingClient {
        release: Arc<Notify>,
    }

    #[async_trait]
    impl ProviderClient for BlockingClient {
        fn provider(&self) -> Provider {
            Provider::MercadoLivre
        }

        async fn search(&self, _query: &str) -> AppResult<SearchOutcome> {
            self.release.notified().await;
            Ok(SearchOutcome::cached(vec![Offer::new(
                Provider::MercadoLivre,
                42.0,
                "item",
                "https://x",
            )]))
        }
    }

    fn both() -> BTreeSet<Provider> {
        Provider::ALL.into_iter().collect()
    }

    fn drain(rx: &mut UnboundedReceiver<BatchEvent>) -> Vec<BatchEvent> {
        let mut events = Vec::new();
        while let Ok(event) = rx.try_recv() {
            events.push(event);
        }
        events
    }

    #[tokio::test]
    async fn test_validation_errors_before_any_work() {
        let orchestrator = BatchOrchestrator::new(
            vec![ScriptedClient::new(Provider::MercadoLivre, &[])],
            AggregateStore::shared(),
        );

        let err = orchestrator
            .run_batch(BatchRequest::new(["  ", ""], both()), None)
            .await
            .unwrap_err();
        assert!(matches!(err, AppError::Batch(BatchError::EmptyQueries)));

        let err = orchestrator
            .run_batch(BatchRequest::new(["mouse"], []), None)
            .await
            .unwrap_err();
        assert!(matches!(err, AppError::Batch(BatchError::NoProviders)));

        let err = orchestrator
            .run_batch(BatchRequest::new(["mouse"], [Provider::GoogleShopping]), None)
            .await
            .unwrap_err();
        assert!(matches!(
            err,
            AppError::Batch(BatchError::ProviderUnavailable(Provider::GoogleShopping))
        ));

        assert_eq!(orchestrator.state(), BatchState::Idle);
    }

    #[tokio::test]
    async fn test_progress_and_records() {
        let orchestrator = BatchOrchestrator::new(
            vec![
                ScriptedClient::new(Provider::MercadoLivre, &[("mouse", &[10.0, 12.0]), ("cabo", &[5.0])]),
                ScriptedClient::new(Provider::GoogleShopping, &[("mouse", &[11.0])]),
            ],
            AggregateStore::shared(),
        );
        let (tx, mut rx) = mpsc::unbounded_channel();

        let summary = orchestrator
            .run_batch(BatchRequest::new(["mouse", " ", "teclado", "cabo"], both()), Some(tx))
            .await
            .unwrap();

        assert_eq!(summary.total_items, 3);
        assert_eq!(summary.records_created, 2);
        assert_eq!(summary.skipped, 1);
        assert_eq!(summary.total_results, 4);
        assert_eq!(summary.cache, CacheUsage { lookups: 6, hits: 0 });
        assert_eq!(orchestrator.state(), BatchState::Completed);

        let store = orchestrator.store();
        let store = store.read().await;
        let queries: Vec<&str> = store.records().iter().map(|r| r.query.as_str()).collect();
        assert_eq!(queries, vec!["mouse", "cabo"]);
        assert_eq!(store.records()[0].results().len(), 3);

        let events = drain(&mut rx);
        let percents: Vec<u8> = events.iter().filter_map(BatchEvent::percent).collect();
        assert_eq!(percents, vec![33, 67, 100]);
        assert!(matches!(events.first(), Some(BatchEvent::Started { total: 3, .. })));
        assert!(matches!(events.last(), Some(BatchEvent::Completed(_))));
    }

    #[tokio::test]
    async fn test_new_batch_replaces_previous_records() {
        let orchestrator = BatchOrchestrator::new(
            vec![ScriptedClient::new(Provider::MercadoLivre, &[("mouse", &[10.0]), ("cabo", &[5.0])])],
            AggregateStore::shared(),
        );

        orchestrator
            .run_batch(BatchRequest::new(["mouse"], [Provider::MercadoLivre]), None)
            .await
            .unwrap();
        orchestrator
            .run_batch(BatchRequest::new(["cabo"], [Provider::MercadoLivre]), None)
            .await
            .unwrap();

        let store = orchestrator.store();
        let store = store.read().await;
        assert_eq!(store.len(), 1);
        assert_eq!(store.records()[0].query, "cabo");
    }

    #[tokio::test]
    async fn test_abort_keeps_partial_results() {
        let orchestrator = BatchOrchestrator::new(
            vec![ScriptedClient::failing_on(
                Provider::MercadoLivre,
                &[("mouse", &[10.0, 20.0]), ("cabo", &[5.0])],
                "teclado",
            )],
            AggregateStore::shared(),
        );
        let (tx, mut rx) = mpsc::unbounded_channel();

        let err = orchestrator
            .run_batch(
                BatchRequest::new(["mouse", "teclado", "cabo"], [Provider::MercadoLivre]),
                Some(tx),
            )
            .await
            .unwrap_err();

        match err {
            AppError::Batch(BatchError::Aborted { query, .. }) => assert_eq!(query, "teclado"),
            other => panic!("unexpected error: {other}"),
        }
        assert_eq!(orchestrator.state(), BatchState::Failed);

        let store = orchestrator.store();
        let store = store.read().await;
        assert_eq!(store.len(), 1);
        assert_eq!(store.records()[0].query, "mouse");

        let events = drain(&mut rx);
        assert!(matches!(events.last(), Some(BatchEvent::Failed { query, .. }) if query == "teclado"));
    }

    #[tokio::test]
    async fn test_second_batch_is_rejected_while_running() {
        let release = Arc::new(Notify::new());
        let orchestrator = Arc::new(BatchOrchestrator::new(
            vec![Arc::new(BlockingClient {
                release: release.clone(),
            })],
            AggregateStore::shared(),
        ));

        let handle = orchestrator
            .start_batch(BatchRequest::new(["mouse"], [Provider::MercadoLivre]))
            .unwrap();
        assert_eq!(orchestrator.state(), BatchState::Running);

        let err = orchestrator
            .run_batch(BatchRequest::new(["cabo"], [Provider::MercadoLivre]), None)
            .await
            .unwrap_err();
        assert!(matches!(err, AppError::Batch(BatchError::AlreadyRunning)));
        assert!(orchestrator
            .start_batch(BatchRequest::new(["cabo"], [Provider::MercadoLivre]))
            .is_err());

        release.notify_one();
        let summary = handle.task.await.unwrap().unwrap();
        assert_eq!(summary.records_created, 1);
        assert_eq!(summary.cache, CacheUsage { lookups: 1, hits: 1 });
        assert_eq!(orchestrator.state(), BatchState::Completed);
    }

    #[tokio::test]
    async fn test_dropped_run_is_marked_failed() {
        let orchestrator = BatchOrchestrator::new(
            vec![Arc::new(BlockingClient {
                release: Arc::new(Notify::new()),
            })],
            AggregateStore::shared(),
        );

        let run = orchestrator.run_batch(BatchRequest::new(["mouse"], [Provider::MercadoLivre]), None);
        assert!(tokio::time::timeout(Duration::from_millis(20), run).await.is_err());
        assert_eq!(orchestrator.state(), BatchState::Failed);
    }

    #[tokio::test]
    async fn test_history_appended_per_item() {
        let history = Arc::new(MemoryHistoryStore::new());
        let orchestrator = BatchOrchestrator::new(
            vec![ScriptedClient::new(Provider::GoogleShopping, &[("mouse", &[10.0, 20.0])])],
            AggregateStore::shared(),
        )
        .with_history(history.clone());

        orchestrator
            .run_batch(BatchRequest::new([" mouse ", "teclado"], [Provider::GoogleShopping]), None)
            .await
            .unwrap();

        let entries = history.entries().unwrap();
        assert_eq!(entries.len(), 2);
        let find = |term: &str| entries.iter().find(|e| e.search_term == term).unwrap();
        assert_eq!(find("teclado").result_count, 0);
        let mouse = find("mouse");
        assert_eq!(mouse.result_count, 2);
        assert!(mouse.sources.google_shopping);
        assert!(!mouse.sources.mercado_livre);
    }
}
