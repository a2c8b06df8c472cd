// 前端事件推送
//
// 任务状态通知以 NOTIFY_TASK_STATUS 通道名作为事件名发送到主窗口

use tauri::{AppHandle, Emitter, Runtime};

use crate::error::AppResult;
use crate::models::TaskStatusEvent;
use crate::services::channels::{ChannelKind, ChannelSet};
use crate::services::context::UiTarget;

/// 主窗口标签
pub const MAIN_WINDOW_LABEL: &str = "main";

/// 把任务状态推送到主窗口 webview
pub struct WebviewUiTarget<R: Runtime> {
    app: AppHandle<R>,
    event_name: String,
}

impl<R: Runtime> WebviewUiTarget<R> {
    /// 事件名取自中继持有的通道表
    pub fn new(app: AppHandle<R>, channels: &ChannelSet) -> Self {
        Self {
            app,
            event_name: channels.name(ChannelKind::NotifyTaskStatus).to_string(),
        }
    }
}

impl<R: Runtime> UiTarget for WebviewUiTarget<R> {
    fn notify_task_status(&self, event: &TaskStatusEvent) -> AppResult<()> {
        self.app
            .emit_to(MAIN_WINDOW_LABEL, &self.event_name, event.clone())?;
        Ok(())
    }
}
