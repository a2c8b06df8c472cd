// 任务中继的组装与生命周期
//
// 进程启动时创建一次，退出时 shutdown

use std::sync::Arc;

use tokio::runtime::Handle;

use super::boundary::TaskBoundary;
use super::channels::ChannelSet;
use super::context::{AppContext, UiTarget};
use super::dispatch::Dispatcher;
use super::worker::{LocalWorkerAgent, TaskRunner, WorkerAgent};
use crate::error::AppResult;
use crate::models::GlobalConfig;

/// 根据配置生成通道表：内置表 + 配置覆盖
pub fn load_channels(config: &GlobalConfig) -> AppResult<ChannelSet> {
    ChannelSet::builtin()?.with_overrides(&config.channels)
}

pub struct TaskRelay {
    context: Arc<AppContext>,
    worker: Arc<dyn WorkerAgent>,
    boundary: Arc<TaskBoundary>,
    dispatcher: Dispatcher,
    channels: &'static ChannelSet,
}

impl TaskRelay {
    /// `channels` 通常是 `install_channels` 返回的进程级通道表
    pub fn new(worker: Arc<dyn WorkerAgent>, channels: &'static ChannelSet) -> Self {
        let context = Arc::new(AppContext::new());
        let boundary = Arc::new(TaskBoundary::new(context.clone(), worker.clone()));
        let dispatcher = Dispatcher::new(boundary.clone(), channels);

        Self {
            context,
            worker,
            boundary,
            dispatcher,
            channels,
        }
    }

    /// 使用进程内 worker 组装
    pub fn with_local_worker(
        config: &GlobalConfig,
        channels: &'static ChannelSet,
        runtime: Handle,
        runner: Arc<dyn TaskRunner>,
    ) -> Self {
        let worker = Arc::new(LocalWorkerAgent::new(
            runtime,
            runner,
            config.worker.max_concurrent_tasks,
        ));
        Self::new(worker, channels)
    }

    pub fn boundary(&self) -> &Arc<TaskBoundary> {
        &self.boundary
    }

    pub fn dispatcher(&self) -> &Dispatcher {
        &self.dispatcher
    }

    /// 分发器与 UI 推送共用的通道表
    pub fn channels(&self) -> &'static ChannelSet {
        self.channels
    }

    pub fn attach_ui(&self, target: Arc<dyn UiTarget>) {
        self.context.attach_ui(target);
    }

    pub fn detach_ui(&self) -> bool {
        self.context.detach_ui()
    }

    /// 卸下 UI 并通知 worker 退出
    pub fn shutdown(&self) {
        tracing::info!("任务中继关闭中");
        self.context.detach_ui();
        self.worker.shutdown();
    }
}
