// 任务控制命令
//
// 前端通过 invoke 调用，均为同步请求；状态变化经 NOTIFY_TASK_STATUS 事件推送

use serde_json::Value;
use tauri::{command, State};

use task_relay::models::{StatusMap, Task, TaskAck};
use task_relay::TaskRelay;

/// START_TASK
#[command]
pub fn start_task(task: Task, relay: State<'_, TaskRelay>) -> TaskAck {
    relay.boundary().start_task(task)
}

/// STOP_TASK
#[command]
pub fn stop_task(task: Task, relay: State<'_, TaskRelay>) -> TaskAck {
    relay.boundary().stop_task(task)
}

/// SUBSCRIBE_TASKS_STATUS
#[command]
pub fn subscribe_tasks_status(relay: State<'_, TaskRelay>) -> StatusMap {
    relay.boundary().subscribe_status()
}

/// 按通道名发送同步请求
///
/// # 参数
/// - `channel`: 通道名（见 channels.json 或配置覆盖）
/// - `args`: 请求参数，START_TASK/STOP_TASK 为 `{ task }`
#[command]
pub fn ipc_send_sync(
    channel: String,
    args: Option<Value>,
    relay: State<'_, TaskRelay>,
) -> Result<Value, String> {
    relay
        .dispatcher()
        .dispatch(&channel, args.unwrap_or(Value::Null))
        .map_err(|e| {
            tracing::warn!(channel = %channel, error = %e, "通道请求失败");
            e.to_string()
        })
}
