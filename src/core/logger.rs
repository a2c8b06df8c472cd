// 日志系统
//
// 基于 tracing-subscriber：级别过滤放在 reload 层后面以支持热重载，
// 文件输出使用 tracing-appender 按天滚动

use std::path::Path;
use std::sync::Mutex;

use once_cell::sync::{Lazy, OnceCell};
use tracing::Subscriber;
use tracing_appender::non_blocking::WorkerGuard;
use tracing_subscriber::fmt::MakeWriter;
use tracing_subscriber::layer::SubscriberExt;
use tracing_subscriber::registry::LookupSpan;
use tracing_subscriber::util::SubscriberInitExt;
use tracing_subscriber::{fmt, reload, EnvFilter, Layer, Registry};

use crate::error::{AppError, AppResult};
use crate::models::{LogConfig, LogFormat, LogLevel, LogOutput};

pub const LOG_FILE_PREFIX: &str = "task-relay.log";

/// webview 相关 crate 的日志过于冗长，统一压到 warn
const NOISY_TARGETS: &[&str] = &["tao", "wry", "tauri", "hyper"];

static RELOAD_HANDLE: OnceCell<reload::Handle<EnvFilter, Registry>> = OnceCell::new();

static LOG_GUARD: Lazy<Mutex<Option<WorkerGuard>>> = Lazy::new(|| Mutex::new(None));

type BoxedLayer<S> = Box<dyn Layer<S> + Send + Sync + 'static>;

/// 初始化全局日志
///
/// `log_dir` 仅在输出包含文件时使用。设置了 `RUST_LOG` 时以环境变量为准。
pub fn init_logger(config: &LogConfig, log_dir: Option<&Path>) -> AppResult<()> {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| build_filter(config.level));
    let (filter_layer, handle) = reload::Layer::new(filter);

    let mut layers = Vec::new();
    let mut guard = None;

    if matches!(config.output, LogOutput::Console | LogOutput::Both) {
        layers.push(fmt_layer(config.format, std::io::stdout, true));
    }

    if matches!(config.output, LogOutput::File | LogOutput::Both) {
        match log_dir {
            Some(dir) => {
                let appender = tracing_appender::rolling::daily(dir, LOG_FILE_PREFIX);
                let (writer, worker_guard) = tracing_appender::non_blocking(appender);
                layers.push(fmt_layer(config.format, writer, false));
                guard = Some(worker_guard);
            }
            None => eprintln!("未指定日志目录，跳过文件日志输出"),
        }
    }

    tracing_subscriber::registry()
        .with(filter_layer)
        .with(layers)
        .try_init()
        .map_err(|e| AppError::config(format!("日志系统初始化失败: {}", e)))?;

    let _ = RELOAD_HANDLE.set(handle);
    if let Ok(mut slot) = LOG_GUARD.lock() {
        *slot = guard;
    }

    tracing::info!(
        level = config.level.as_str(),
        format = ?config.format,
        output = ?config.output,
        "日志系统已初始化"
    );
    Ok(())
}

/// 热重载日志级别
pub fn set_log_level(level: LogLevel) -> AppResult<()> {
    let handle = RELOAD_HANDLE
        .get()
        .ok_or_else(|| AppError::config("日志系统尚未初始化"))?;

    handle
        .reload(build_filter(level))
        .map_err(|e| AppError::config(format!("更新日志级别失败: {}", e)))?;

    tracing::info!(level = level.as_str(), "日志级别已更新");
    Ok(())
}

/// 刷新并关闭文件日志写入线程
pub fn shutdown_logger() {
    if let Ok(mut slot) = LOG_GUARD.lock() {
        slot.take();
    }
}

fn build_filter(level: LogLevel) -> EnvFilter {
    let mut directives = level.as_str().to_string();
    for target in NOISY_TARGETS {
        directives.push_str(&format!(",{}=warn", target));
    }
    EnvFilter::new(directives)
}

fn fmt_layer<S, W>(format: LogFormat, writer: W, ansi: bool) -> BoxedLayer<S>
where
    S: Subscriber + for<'a> LookupSpan<'a>,
    W: for<'w> MakeWriter<'w> + Send + Sync + 'static,
{
    match format {
        LogFormat::Text => fmt::layer()
            .with_writer(writer)
            .with_ansi(ansi)
            .with_target(true)
            .boxed(),
        LogFormat::Json => fmt::layer()
            .json()
            .with_writer(writer)
            .with_current_span(false)
            .boxed(),
    }
}
