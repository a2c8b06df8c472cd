// 进程内 Worker
//
// 每个任务一个 tokio 任务，并发数由信号量限制；停止是建议性的，
// 通过 CancellationToken 通知 runner

use std::collections::HashMap;
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};

use tokio::runtime::Handle;
use tokio::sync::Semaphore;
use tokio_util::sync::CancellationToken;

use super::runner::{RunOutcome, TaskRunner};
use super::WorkerAgent;
use crate::models::{StatusMap, Task, TaskAck, TaskStatus};

struct TaskEntry {
    status: TaskStatus,
    generation: u64,
    cancel: Option<CancellationToken>,
}

#[derive(Default)]
struct TaskTable {
    entries: HashMap<String, TaskEntry>,
    next_generation: u64,
}

struct Shared {
    runner: Arc<dyn TaskRunner>,
    permits: Arc<Semaphore>,
    table: Mutex<TaskTable>,
}

impl Shared {
    fn table(&self) -> MutexGuard<'_, TaskTable> {
        self.table.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// 记录状态并通过任务回调上报；过期的任务实例不再更新
    ///
    /// 上报在持有任务表锁期间完成，同一 id 的上报顺序与状态变更顺序一致。
    /// 回调里不能再调用本 worker。
    fn record(&self, task: &Task, generation: u64, status: TaskStatus) {
        let mut table = self.table();
        match table.entries.get_mut(&task.id) {
            Some(entry) if entry.generation == generation => {
                entry.status = status.clone();
                if !status.is_active() {
                    entry.cancel = None;
                }
            }
            _ => return,
        }

        tracing::debug!(task_id = %task.id, status = status.as_str(), "任务状态变更");
        task.report(status);
    }

    async fn execute(self: Arc<Self>, task: Task, generation: u64, cancel: CancellationToken) {
        let permit = tokio::select! {
            permit = self.permits.clone().acquire_owned() => permit.ok(),
            _ = cancel.cancelled() => None,
        };

        let Some(_permit) = permit else {
            self.record(&task, generation, TaskStatus::Stopped);
            return;
        };

        self.record(&task, generation, TaskStatus::Running);

        let status = match self.runner.run(&task, cancel.clone()).await {
            Ok(RunOutcome::Completed) => TaskStatus::Succeeded,
            Ok(RunOutcome::Cancelled) => TaskStatus::Stopped,
            Err(e) => {
                tracing::warn!(task_id = %task.id, error = %format!("{:#}", e), "任务执行失败");
                TaskStatus::Failed {
                    reason: format!("{:#}", e),
                }
            }
        };

        self.record(&task, generation, status);
    }
}

pub struct LocalWorkerAgent {
    runtime: Handle,
    shared: Arc<Shared>,
    shutdown: CancellationToken,
}

impl LocalWorkerAgent {
    pub fn new(runtime: Handle, runner: Arc<dyn TaskRunner>, max_concurrent_tasks: usize) -> Self {
        let permits = max_concurrent_tasks.max(1);
        tracing::info!(max_concurrent_tasks = permits, "本地 Worker 已创建");

        Self {
            runtime,
            shared: Arc::new(Shared {
                runner,
                permits: Arc::new(Semaphore::new(permits)),
                table: Mutex::new(TaskTable::default()),
            }),
            shutdown: CancellationToken::new(),
        }
    }
}

impl WorkerAgent for LocalWorkerAgent {
    fn attach(&self, task: Task) -> TaskAck {
        if self.shutdown.is_cancelled() {
            return TaskAck::fail("Worker 已关闭");
        }

        let cancel = self.shutdown.child_token();
        let generation = {
            let mut table = self.shared.table();
            if let Some(entry) = table.entries.get(&task.id) {
                if entry.status.is_active() {
                    return TaskAck::fail(format!("任务 {} 已在运行", task.id));
                }
            }

            table.next_generation += 1;
            let generation = table.next_generation;
            table.entries.insert(
                task.id.clone(),
                TaskEntry {
                    status: TaskStatus::Queued,
                    generation,
                    cancel: Some(cancel.clone()),
                },
            );
            // 与 record 相同，在锁内上报
            task.report(TaskStatus::Queued);
            generation
        };

        let shared = self.shared.clone();
        self.runtime
            .spawn(async move { shared.execute(task, generation, cancel).await });

        TaskAck::ok("任务已启动")
    }

    fn detach(&self, task: Task) -> TaskAck {
        let table = self.shared.table();
        match table.entries.get(&task.id) {
            None => TaskAck::fail(format!("任务 {} 不存在", task.id)),
            Some(entry) if entry.status.is_active() => {
                if let Some(cancel) = &entry.cancel {
                    cancel.cancel();
                }
                TaskAck::ok("已请求停止")
            }
            Some(_) => TaskAck::ok("任务已结束"),
        }
    }

    fn snapshot(&self) -> StatusMap {
        self.shared
            .table()
            .entries
            .iter()
            .map(|(id, entry)| (id.clone(), entry.status.clone()))
            .collect()
    }

    fn shutdown(&self) {
        let active = self
            .shared
            .table()
            .entries
            .values()
            .filter(|entry| entry.status.is_active())
            .count();
        tracing::info!(active, "本地 Worker 关闭中，取消所有任务");
        self.shutdown.cancel();
    }
}
