//! 日志初始化

use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

/// 安装全局 tracing 订阅者
///
/// 优先使用 `RUST_LOG`；未设置时默认 `info`，详细模式下为 `debug`。
pub fn init(verbose: bool) {
    let default_level = if verbose { "debug" } else { "info" };
    let _ = tracing_subscriber::registry()
        .with(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_level)))
        .with(tracing_subscriber::fmt::layer().with_target(false))
        .try_init();
}
