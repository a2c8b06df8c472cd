// 应用上下文
//
// 持有当前的 UI 目标（取代模块级窗口句柄），由边界层在推送通知时使用

use std::sync::{Arc, PoisonError, RwLock};

use crate::error::AppResult;
use crate::models::TaskStatusEvent;

/// 可以接收任务状态推送的 UI 目标
pub trait UiTarget: Send + Sync {
    fn notify_task_status(&self, event: &TaskStatusEvent) -> AppResult<()>;
}

#[derive(Default)]
pub struct AppContext {
    ui: RwLock<Option<Arc<dyn UiTarget>>>,
}

impl AppContext {
    pub fn new() -> Self {
        Self::default()
    }

    /// 挂接 UI 目标，替换已有目标
    pub fn attach_ui(&self, target: Arc<dyn UiTarget>) {
        let mut slot = self.ui.write().unwrap_or_else(PoisonError::into_inner);
        let replaced = slot.replace(target).is_some();
        tracing::debug!(replaced, "UI 目标已挂接");
    }

    /// 卸下 UI 目标，返回之前是否有目标
    pub fn detach_ui(&self) -> bool {
        let mut slot = self.ui.write().unwrap_or_else(PoisonError::into_inner);
        let detached = slot.take().is_some();
        if detached {
            tracing::debug!("UI 目标已卸下");
        }
        detached
    }

    pub fn has_ui(&self) -> bool {
        self.ui
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .is_some()
    }

    /// 推送给当前 UI 目标，返回是否有目标接收
    ///
    /// 没有目标时直接丢弃，不缓存。推送失败只记录日志。
    pub fn notify(&self, event: &TaskStatusEvent) -> bool {
        let target = {
            let slot = self.ui.read().unwrap_or_else(PoisonError::into_inner);
            slot.clone()
        };

        let Some(target) = target else {
            tracing::trace!(task_id = %event.task_id, "无 UI 目标，丢弃状态通知");
            return false;
        };

        if let Err(e) = target.notify_task_status(event) {
            tracing::warn!(task_id = %event.task_id, error = %e, "推送任务状态失败");
        }
        true
    }
}

#[cfg(test)]
pub(crate) mod testing {
    use super::*;
    use std::sync::Mutex;

    /// 记录收到的通知
    #[derive(Default)]
    pub struct RecordingUi {
        pub events: Mutex<Vec<TaskStatusEvent>>,
    }

    impl RecordingUi {
        pub fn events(&self) -> Vec<TaskStatusEvent> {
            self.events.lock().unwrap().clone()
        }
    }

    impl UiTarget for RecordingUi {
        fn notify_task_status(&self, event: &TaskStatusEvent) -> AppResult<()> {
            self.events.lock().unwrap().push(event.clone());
            Ok(())
        }
    }
}
