// Worker 子系统
//
// 边界层只依赖 WorkerAgent 能力接口；LocalWorkerAgent 是进程内实现

mod local;
mod runner;

pub use local::LocalWorkerAgent;
pub use runner::{RunOutcome, ShellTaskRunner, TaskRunner};

use crate::models::{StatusMap, Task, TaskAck};

/// 任务执行方的能力接口
///
/// attach/detach 同步返回确认结果，状态变化通过任务上注入的回调异步上报。
pub trait WorkerAgent: Send + Sync {
    fn attach(&self, task: Task) -> TaskAck;

    fn detach(&self, task: Task) -> TaskAck;

    fn snapshot(&self) -> StatusMap;

    /// 进程退出前调用
    fn shutdown(&self) {}
}
