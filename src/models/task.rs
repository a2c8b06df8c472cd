// 任务模型
//
// UI 与 worker 子系统之间传递的任务、确认结果与状态

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fmt;
use std::sync::Arc;

/// 状态回调：worker 在任务状态变化时调用 `(task_id, status)`
pub type StatusCallback = Arc<dyn Fn(&str, TaskStatus) + Send + Sync>;

/// 任务 id → 当前状态（有序，便于快照比较）
pub type StatusMap = BTreeMap<String, TaskStatus>;

/// 任务记录
///
/// `payload` 由具体任务自行解释；`fn_update_status` 由边界层在转发前注入，
/// 不参与序列化。
#[derive(Clone, Default, Serialize, Deserialize)]
pub struct Task {
    pub id: String,
    #[serde(default)]
    pub payload: serde_json::Value,
    #[serde(skip)]
    pub fn_update_status: Option<StatusCallback>,
}

impl Task {
    pub fn new(id: impl Into<String>, payload: serde_json::Value) -> Self {
        Self {
            id: id.into(),
            payload,
            fn_update_status: None,
        }
    }

    /// 通过注入的回调上报状态，未注入时忽略
    pub fn report(&self, status: TaskStatus) {
        if let Some(callback) = &self.fn_update_status {
            callback(&self.id, status);
        }
    }
}

impl fmt::Debug for Task {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Task")
            .field("id", &self.id)
            .field("payload", &self.payload)
            .field("fn_update_status", &self.fn_update_status.is_some())
            .finish()
    }
}

/// 任务状态
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "state", rename_all = "camelCase")]
pub enum TaskStatus {
    Queued,
    Running,
    Succeeded,
    Failed { reason: String },
    Stopped,
}

impl TaskStatus {
    /// 是否仍在排队或运行
    pub fn is_active(&self) -> bool {
        matches!(self, TaskStatus::Queued | TaskStatus::Running)
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            TaskStatus::Queued => "queued",
            TaskStatus::Running => "running",
            TaskStatus::Succeeded => "succeeded",
            TaskStatus::Failed { .. } => "failed",
            TaskStatus::Stopped => "stopped",
        }
    }
}

/// attach/detach 的同步确认结果
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TaskAck {
    pub success: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub message: Option<String>,
}

impl TaskAck {
    pub fn ok(message: impl Into<String>) -> Self {
        Self {
            success: true,
            message: Some(message.into()),
        }
    }

    pub fn fail(message: impl Into<String>) -> Self {
        Self {
            success: false,
            message: Some(message.into()),
        }
    }
}

/// 推送给 UI 的状态通知
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TaskStatusEvent {
    pub task_id: String,
    pub status: TaskStatus,
}
