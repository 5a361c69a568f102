//! 日志初始化
//!
//! `RUST_LOG` 优先；未设置时默认 `info`，详细模式下为 `debug`。

use tracing_subscriber::EnvFilter;

/// 安装全局日志订阅者，重复调用时静默忽略
pub fn init(verbose: bool) {
    let default_level = if verbose { "debug" } else { "info" };
    let filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_level));

    let _ = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(false)
        .try_init();
}
