use anyhow::{Context, Result};
use std::sync::Arc;
use tracing::{error, info, warn};

use crate::clients::build_clients;
use crate::config::Config;
use crate::infrastructure::{
    FileKvStore, HistoryStore, ImageProxy, JsonlHistoryStore, ReqwestTransport, SystemClock,
};
use crate::models::{load_batch_file, BatchFile};
use crate::orchestrator::{BatchOrchestrator, BatchRequest, BatchSummary};
use crate::services::{AggregateStore, HistorySummary, ResultCache, StripReport};
use crate::utils::logging::{log_batch_loaded, log_event, log_startup, print_final_stats};
use crate::utils::{render_report, write_report};

/// 应用主结构
pub struct App {
    config: Config,
    cache: Arc<ResultCache>,
    history: Arc<dyn HistoryStore>,
    orchestrator: Arc<BatchOrchestrator>,
}

impl App {
    /// 初始化应用：打开缓存并清理过期条目，创建客户端与编排器
    pub async fn initialize(config: Config) -> Result<Self> {
        log_startup(&config);

        let kv = FileKvStore::open(&config.cache_dir)
            .with_context(|| format!("无法打开缓存目录: {}", config.cache_dir))?;
        let cache = Arc::new(ResultCache::with_ttl(
            Arc::new(kv),
            Arc::new(SystemClock),
            config.cache_ttl(),
        ));
        let swept = cache.sweep();
        if swept > 0 {
            info!("🧹 已清理 {} 条过期缓存", swept);
        }

        let transport = Arc::new(ReqwestTransport::new(config.request_timeout())?);
        let images = Arc::new(ImageProxy::new(
            &config.api_base_url,
            &config.image_proxy_path,
            config.image_placeholder.clone(),
        ));
        let clients = build_clients(&config, transport, cache.clone(), images);

        let history: Arc<dyn HistoryStore> =
            Arc::new(JsonlHistoryStore::new(config.history_file.clone()));
        let orchestrator = Arc::new(
            BatchOrchestrator::new(clients, AggregateStore::shared()).with_history(history.clone()),
        );

        Ok(Self {
            config,
            cache,
            history,
            orchestrator,
        })
    }

    /// 运行应用主逻辑
    pub async fn run(&self) -> Result<()> {
        let batch = self.load_batch().await?;

        let (providers, unknown) = batch.enabled_providers();
        for name in &unknown {
            warn!("⚠️ 未知的搜索来源 \"{}\"，已忽略", name);
        }

        let total = batch.queries.iter().filter(|q| !q.trim().is_empty()).count();
        if total == 0 {
            warn!("⚠️ 批量文件中没有待搜索的商品，程序结束");
            return Ok(());
        }
        let names: Vec<String> = providers.iter().map(|p| p.to_string()).collect();
        log_batch_loaded(total, &names);

        let mut handle = self.orchestrator.start_batch(BatchRequest {
            queries: batch.queries.clone(),
            providers,
        })?;
        while let Some(event) = handle.events.recv().await {
            log_event(&event);
        }

        let summary = match handle.task.await.context("批量任务异常退出")? {
            Ok(summary) => summary,
            Err(e) => {
                // 已完成的商品照常写入报告
                error!("❌ {}", e);
                self.write_report(&self.partial_summary(total).await, None).await?;
                return Err(e.into());
            }
        };

        let stripped = self.post_process(&batch).await;
        self.write_report(&summary, stripped.as_ref()).await?;

        print_final_stats(
            &summary,
            &self.history_summary(),
            self.cache.size_estimate_mb(),
            &self.config.output_log_file,
        );

        Ok(())
    }

    async fn load_batch(&self) -> Result<BatchFile> {
        info!("\n📁 正在读取批量文件...");
        load_batch_file(&self.config.batch_path()).await
    }

    /// 按批量文件的设置去除离群值、排序
    async fn post_process(&self, batch: &BatchFile) -> Option<StripReport> {
        let store = self.orchestrator.store();
        let mut store = store.write().await;

        let stripped = if batch.strip_outliers {
            let report = store.strip_outliers_all();
            info!(
                "🧹 去除离群值: 处理 {} 个商品, 移除 {} 条报价",
                report.items_processed, report.outliers_removed
            );
            Some(report)
        } else {
            None
        };

        if let Some(order) = batch.sort {
            store.sort_records(order);
            info!("↕️ 已按均价排序 ({:?})", order);
        }

        stripped
    }

    async fn partial_summary(&self, total: usize) -> BatchSummary {
        let store = self.orchestrator.store();
        let store = store.read().await;
        BatchSummary {
            total_items: total,
            records_created: store.len(),
            total_results: store.total_results(),
            ..Default::default()
        }
    }

    async fn write_report(&self, summary: &BatchSummary, stripped: Option<&StripReport>) -> Result<()> {
        let store = self.orchestrator.store();
        let store = store.read().await;
        let content = render_report(store.records(), summary, stripped);
        write_report(&self.config.output_log_file, &content)
    }

    fn history_summary(&self) -> HistorySummary {
        match self.history.entries() {
            Ok(entries) => HistorySummary::from_entries(&entries),
            Err(e) => {
                warn!("⚠️ 读取搜索历史失败: {}", e);
                HistorySummary::default()
            }
        }
    }
}
