// 按通道名分发同步请求
//
// 供以通道名通信的前端使用：`dispatch("START_TASK", { task })`

use std::sync::Arc;

use serde::Deserialize;
use serde_json::Value;

use super::boundary::TaskBoundary;
use super::channels::{ChannelKind, ChannelSet};
use crate::error::{AppError, AppResult};
use crate::models::Task;

#[derive(Deserialize)]
struct TaskArgs {
    task: Task,
}

pub struct Dispatcher {
    boundary: Arc<TaskBoundary>,
    channels: &'static ChannelSet,
}

impl Dispatcher {
    pub fn new(boundary: Arc<TaskBoundary>, channels: &'static ChannelSet) -> Self {
        Self { boundary, channels }
    }

    /// 处理一条同步请求，返回序列化后的 worker 结果
    ///
    /// 通道不存在、推送通道或参数格式错误时返回错误；任务本身的成败
    /// 包含在返回值里。
    pub fn dispatch(&self, channel: &str, args: Value) -> AppResult<Value> {
        let kind = self
            .channels
            .resolve(channel)
            .ok_or_else(|| AppError::channel(format!("未知通道: {}", channel)))?;

        let result = match kind {
            ChannelKind::StartTask => {
                let TaskArgs { task } = serde_json::from_value(args)?;
                serde_json::to_value(self.boundary.start_task(task))?
            }
            ChannelKind::StopTask => {
                let TaskArgs { task } = serde_json::from_value(args)?;
                serde_json::to_value(self.boundary.stop_task(task))?
            }
            ChannelKind::SubscribeTasksStatus => {
                serde_json::to_value(self.boundary.subscribe_status())?
            }
            // NOTIFY_TASK_STATUS 只用于向 UI 推送
            ChannelKind::NotifyTaskStatus => {
                return Err(AppError::channel(format!(
                    "{} 为推送通道，不接受请求",
                    channel
                )));
            }
        };

        Ok(result)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::{TaskAck, TaskStatus};
    use crate::services::context::AppContext;
    use crate::services::worker::testing::FakeWorker;
    use serde_json::json;
    use std::collections::BTreeMap;

    fn leak(set: ChannelSet) -> &'static ChannelSet {
        Box::leak(Box::new(set))
    }

    fn dispatcher(ack: TaskAck) -> (Dispatcher, Arc<FakeWorker>) {
        let worker = Arc::new(FakeWorker::new(ack));
        let boundary = Arc::new(TaskBoundary::new(
            Arc::new(AppContext::new()),
            worker.clone(),
        ));
        (
            Dispatcher::new(boundary, leak(ChannelSet::builtin().unwrap())),
            worker,
        )
    }

    #[test]
    fn test_start_task_passes_result_through() {
        let (dispatcher, worker) = dispatcher(TaskAck {
            success: true,
            message: None,
        });

        let result = dispatcher
            .dispatch("START_TASK", json!({ "task": { "id": "t1", "payload": { "n": 1 } } }))
            .unwrap();
        assert_eq!(result, json!({ "success": true }));

        let attached = worker.attached.lock().unwrap();
        assert_eq!(attached[0].id, "t1");
        assert_eq!(attached[0].payload, json!({ "n": 1 }));
    }

    #[test]
    fn test_stop_task_failure_is_not_an_error() {
        let (dispatcher, _worker) = dispatcher(TaskAck::fail("任务 t1 不存在"));

        let result = dispatcher
            .dispatch("STOP_TASK", json!({ "task": { "id": "t1" } }))
            .unwrap();
        assert_eq!(
            result,
            json!({ "success": false, "message": "任务 t1 不存在" })
        );
    }

    #[test]
    fn test_subscribe_ignores_args() {
        let (dispatcher, worker) = dispatcher(TaskAck::ok("ok"));
        worker.set_status("t1", TaskStatus::Queued);

        let result = dispatcher
            .dispatch("SUBSCRIBE_TASKS_STATUS", Value::Null)
            .unwrap();
        assert_eq!(result, json!({ "t1": { "state": "queued" } }));
    }

    #[test]
    fn test_unknown_and_push_channels_rejected() {
        let (dispatcher, _worker) = dispatcher(TaskAck::ok("ok"));

        let err = dispatcher.dispatch("PAUSE_TASK", Value::Null).unwrap_err();
        assert!(matches!(err, AppError::Channel(_)));

        let err = dispatcher
            .dispatch("NOTIFY_TASK_STATUS", Value::Null)
            .unwrap_err();
        assert!(matches!(err, AppError::Channel(_)));
    }

    #[test]
    fn test_malformed_args() {
        let (dispatcher, worker) = dispatcher(TaskAck::ok("ok"));

        let err = dispatcher
            .dispatch("START_TASK", json!({ "id": "t1" }))
            .unwrap_err();
        assert!(matches!(err, AppError::Json(_)));
        assert!(worker.attached.lock().unwrap().is_empty());
    }

    #[test]
    fn test_overridden_channel_names() {
        let worker = Arc::new(FakeWorker::new(TaskAck::ok("ok")));
        let boundary = Arc::new(TaskBoundary::new(
            Arc::new(AppContext::new()),
            worker.clone(),
        ));
        let mut overrides = BTreeMap::new();
        overrides.insert("START_TASK".to_string(), "task:start".to_string());
        let channels = ChannelSet::builtin()
            .unwrap()
            .with_overrides(&overrides)
            .unwrap();
        let dispatcher = Dispatcher::new(boundary, leak(channels));

        assert!(dispatcher
            .dispatch("task:start", json!({ "task": { "id": "t1" } }))
            .is_ok());
        assert!(dispatcher
            .dispatch("START_TASK", json!({ "task": { "id": "t1" } }))
            .is_err());
        assert_eq!(worker.attached.lock().unwrap().len(), 1);
    }
}
