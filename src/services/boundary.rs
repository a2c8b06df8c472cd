// 任务控制边界
//
// UI 与 worker 子系统之间的无状态中继：请求原样转发、结果原样返回，
// 状态变化通过注入到任务上的回调推送给 UI

use std::sync::Arc;

use super::context::AppContext;
use super::worker::WorkerAgent;
use crate::models::{StatusCallback, StatusMap, Task, TaskAck, TaskStatus, TaskStatusEvent};

pub struct TaskBoundary {
    context: Arc<AppContext>,
    worker: Arc<dyn WorkerAgent>,
}

impl TaskBoundary {
    pub fn new(context: Arc<AppContext>, worker: Arc<dyn WorkerAgent>) -> Self {
        Self { context, worker }
    }

    /// 注入状态回调后交给 worker attach，返回值不做任何处理
    pub fn start_task(&self, mut task: Task) -> TaskAck {
        tracing::info!(task_id = %task.id, "START_TASK");
        task.fn_update_status = Some(self.status_callback());

        let ack = self.worker.attach(task);
        tracing::info!(success = ack.success, message = ?ack.message, "START_TASK 结果");
        ack
    }

    /// 注入状态回调后交给 worker detach；重复停止同样转发
    pub fn stop_task(&self, mut task: Task) -> TaskAck {
        tracing::info!(task_id = %task.id, "STOP_TASK");
        task.fn_update_status = Some(self.status_callback());

        let ack = self.worker.detach(task);
        tracing::info!(success = ack.success, message = ?ack.message, "STOP_TASK 结果");
        ack
    }

    pub fn subscribe_status(&self) -> StatusMap {
        let snapshot = self.worker.snapshot();
        tracing::info!(tasks = snapshot.len(), "SUBSCRIBE_TASKS_STATUS");
        snapshot
    }

    /// worker 上报状态变化；没有 UI 时静默丢弃
    pub fn notify_task_updated(&self, task_id: &str, status: TaskStatus) {
        relay_status(&self.context, task_id, status);
    }

    fn status_callback(&self) -> StatusCallback {
        let context = self.context.clone();
        Arc::new(move |task_id: &str, status: TaskStatus| relay_status(&context, task_id, status))
    }
}

fn relay_status(context: &AppContext, task_id: &str, status: TaskStatus) {
    let event = TaskStatusEvent {
        task_id: task_id.to_string(),
        status,
    };
    context.notify(&event);
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::services::context::testing::RecordingUi;
    use crate::services::worker::testing::FakeWorker;

    fn boundary(ack: TaskAck) -> (TaskBoundary, Arc<FakeWorker>, Arc<AppContext>) {
        let context = Arc::new(AppContext::new());
        let worker = Arc::new(FakeWorker::new(ack));
        let boundary = TaskBoundary::new(context.clone(), worker.clone());
        (boundary, worker, context)
    }

    fn success() -> TaskAck {
        TaskAck {
            success: true,
            message: None,
        }
    }

    #[test]
    fn test_start_injects_callback_routed_to_notify() {
        let (boundary, worker, context) = boundary(success());
        let ui = Arc::new(RecordingUi::default());
        context.attach_ui(ui.clone());

        boundary.start_task(Task::new("t1", serde_json::Value::Null));

        let attached = worker.attached.lock().unwrap();
        assert_eq!(attached.len(), 1);
        assert!(attached[0].fn_update_status.is_some());

        attached[0].report(TaskStatus::Running);
        assert_eq!(
            ui.events(),
            vec![TaskStatusEvent {
                task_id: "t1".to_string(),
                status: TaskStatus::Running,
            }]
        );
    }

    #[test]
    fn test_start_overrides_existing_callback() {
        let (boundary, worker, context) = boundary(success());
        let ui = Arc::new(RecordingUi::default());
        context.attach_ui(ui.clone());

        let mut task = Task::new("t1", serde_json::Value::Null);
        task.fn_update_status = Some(Arc::new(|_: &str, _: TaskStatus| panic!("调用方回调不应被保留")));
        boundary.start_task(task);

        worker.attached.lock().unwrap()[0].report(TaskStatus::Queued);
        assert_eq!(ui.events().len(), 1);
    }

    #[test]
    fn test_start_returns_worker_ack_unchanged() {
        let (boundary, _worker, _context) = boundary(success());
        let ack = boundary.start_task(Task::new("t1", serde_json::Value::Null));
        assert_eq!(ack, success());

        let failure = TaskAck::fail("名额已满");
        let (boundary, _worker, _context) = self::boundary(failure.clone());
        assert_eq!(
            boundary.start_task(Task::new("t2", serde_json::Value::Null)),
            failure
        );
    }

    #[test]
    fn test_stop_forwarded_without_ui() {
        let (boundary, worker, _context) = boundary(TaskAck::ok("已请求停止"));

        let ack = boundary.stop_task(Task::new("t1", serde_json::Value::Null));
        assert_eq!(ack, TaskAck::ok("已请求停止"));

        let detached = worker.detached.lock().unwrap();
        assert_eq!(detached.len(), 1);
        assert_eq!(detached[0].id, "t1");
        assert!(detached[0].fn_update_status.is_some());
    }

    #[test]
    fn test_stop_twice_forwarded_twice() {
        let (boundary, worker, _context) = boundary(success());
        boundary.stop_task(Task::new("t1", serde_json::Value::Null));
        boundary.stop_task(Task::new("t1", serde_json::Value::Null));
        assert_eq!(worker.detached.lock().unwrap().len(), 2);
    }

    #[test]
    fn test_subscribe_returns_equal_snapshots() {
        let (boundary, worker, _context) = boundary(success());
        worker.set_status("t1", TaskStatus::Running);
        worker.set_status(
            "t2",
            TaskStatus::Failed {
                reason: "超时".to_string(),
            },
        );

        let first = boundary.subscribe_status();
        let second = boundary.subscribe_status();
        assert_eq!(first, second);
        assert_eq!(first.len(), 2);
    }

    #[test]
    fn test_notify_without_ui_is_not_replayed() {
        let (boundary, _worker, context) = boundary(success());
        boundary.notify_task_updated("t1", TaskStatus::Running);

        let ui = Arc::new(RecordingUi::default());
        context.attach_ui(ui.clone());
        assert!(ui.events().is_empty());
    }

    #[test]
    fn test_notify_after_ui_reattaches() {
        let (boundary, _worker, context) = boundary(success());
        let ui = Arc::new(RecordingUi::default());

        context.attach_ui(ui.clone());
        context.detach_ui();
        boundary.notify_task_updated("t1", TaskStatus::Running);

        context.attach_ui(ui.clone());
        boundary.notify_task_updated("t1", TaskStatus::Succeeded);

        assert_eq!(
            ui.events(),
            vec![TaskStatusEvent {
                task_id: "t1".to_string(),
                status: TaskStatus::Succeeded,
            }]
        );
    }
}
