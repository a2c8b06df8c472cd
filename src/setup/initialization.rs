// 启动初始化
//
// 顺序：读取全局配置 → 初始化日志 → 加载通道表 → 组装任务中继

use std::sync::Arc;

use tokio::runtime::Handle;

use task_relay::error::AppResult;
use task_relay::services::{install_channels, load_channels, ShellTaskRunner, TaskRelay};
use task_relay::utils::{config_dir, load_global_config};

/// 返回组装好的任务中继，由 main 交给 Tauri 管理
pub fn initialize_app(runtime: Handle) -> AppResult<TaskRelay> {
    let (config, config_error) = load_global_config();

    let log_dir = config_dir()?.join("logs");
    task_relay::init_logger(&config.log_config, Some(&log_dir))?;

    tracing::info!(
        version = env!("CARGO_PKG_VERSION"),
        release = !cfg!(debug_assertions),
        "应用启动"
    );
    if let Some(e) = config_error {
        tracing::warn!(error = %e, "读取全局配置失败，使用默认配置");
    }

    let channels = install_channels(load_channels(&config)?)?;

    TaskRelay::with_local_worker(&config, channels, runtime, Arc::new(ShellTaskRunner::new()))
}
