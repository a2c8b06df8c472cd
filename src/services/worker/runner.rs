// 任务执行器
//
// 通过系统 shell 执行任务命令，取消时终止进程

use std::process::Stdio;
use std::time::Duration;

use anyhow::{bail, Context, Result};
use async_trait::async_trait;
use tokio::io::AsyncReadExt;
use tokio::process::Command;
use tokio_util::sync::CancellationToken;

use crate::models::Task;

// 进程退出后等待 stderr 读完的上限；后台子进程可能一直持有管道
const STDERR_DRAIN_TIMEOUT: Duration = Duration::from_millis(500);

#[cfg(target_os = "windows")]
const CREATE_NO_WINDOW: u32 = 0x0800_0000;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RunOutcome {
    Completed,
    Cancelled,
}

/// 执行单个任务
///
/// 实现方需要响应 `cancel`，收到取消后尽快返回 `RunOutcome::Cancelled`。
#[async_trait]
pub trait TaskRunner: Send + Sync {
    async fn run(&self, task: &Task, cancel: CancellationToken) -> Result<RunOutcome>;
}

/// 通过系统 shell 执行 `payload.command`
#[derive(Debug, Default)]
pub struct ShellTaskRunner;

impl ShellTaskRunner {
    pub fn new() -> Self {
        Self
    }

    fn command_line(task: &Task) -> Result<&str> {
        let command = task
            .payload
            .get("command")
            .and_then(|value| value.as_str())
            .context("任务缺少 command 字段")?;

        if command.trim().is_empty() {
            bail!("任务 command 为空");
        }
        Ok(command)
    }

    fn build_command(command: &str) -> Command {
        #[cfg(target_os = "windows")]
        {
            let mut cmd = Command::new("cmd");
            cmd.arg("/C").arg(command).creation_flags(CREATE_NO_WINDOW);
            cmd
        }

        #[cfg(not(target_os = "windows"))]
        {
            let mut cmd = Command::new("sh");
            cmd.arg("-c").arg(command);
            cmd
        }
    }
}

#[async_trait]
impl TaskRunner for ShellTaskRunner {
    async fn run(&self, task: &Task, cancel: CancellationToken) -> Result<RunOutcome> {
        let command = Self::command_line(task)?;

        let mut child = Self::build_command(command)
            .stdin(Stdio::null())
            .stdout(Stdio::null())
            .stderr(Stdio::piped())
            .kill_on_drop(true)
            .spawn()
            .with_context(|| format!("启动命令失败: {}", command))?;

        tracing::debug!(task_id = %task.id, pid = ?child.id(), "任务进程已启动");

        // stderr 需要并发读取，避免管道写满阻塞子进程
        let stderr = child.stderr.take();
        let task_id = task.id.clone();
        let mut stderr_reader = tokio::spawn(async move {
            let mut buf = Vec::new();
            if let Some(mut pipe) = stderr {
                if let Err(e) = pipe.read_to_end(&mut buf).await {
                    tracing::warn!(task_id = %task_id, error = %e, "读取任务 stderr 失败");
                }
            }
            buf
        });

        let status = tokio::select! {
            status = child.wait() => Some(status),
            _ = cancel.cancelled() => None,
        };

        let Some(status) = status else {
            if let Err(e) = child.kill().await {
                tracing::warn!(task_id = %task.id, error = %e, "终止任务进程失败");
            }
            stderr_reader.abort();
            return Ok(RunOutcome::Cancelled);
        };

        let status = match status.context("等待任务进程失败") {
            Ok(status) => status,
            Err(e) => {
                stderr_reader.abort();
                return Err(e);
            }
        };
        if status.success() {
            stderr_reader.abort();
            return Ok(RunOutcome::Completed);
        }

        let drained = tokio::select! {
            joined = tokio::time::timeout(STDERR_DRAIN_TIMEOUT, &mut stderr_reader) => Some(joined),
            _ = cancel.cancelled() => None,
        };

        let Some(joined) = drained else {
            stderr_reader.abort();
            return Ok(RunOutcome::Cancelled);
        };

        let stderr = match joined {
            Ok(Ok(bytes)) => String::from_utf8_lossy(&bytes).into_owned(),
            Ok(Err(e)) => {
                tracing::warn!(task_id = %task.id, error = %e, "stderr 读取任务异常退出");
                String::new()
            }
            Err(_) => {
                tracing::debug!(task_id = %task.id, "进程退出后 stderr 仍未关闭，放弃读取");
                stderr_reader.abort();
                String::new()
            }
        };
        let code = status
            .code()
            .map(|c| c.to_string())
            .unwrap_or_else(|| "signal".to_string());
        let detail = stderr.trim();
        if detail.is_empty() {
            bail!("命令退出码 {}", code);
        }
        bail!("命令退出码 {}: {}", code, detail)
    }
}

#[cfg(all(test, unix))]
mod tests {
    use super::*;
    use serde_json::json;

    fn shell_task(command: &str) -> Task {
        Task::new("shell", json!({ "command": command }))
    }

    #[tokio::test]
    async fn test_successful_command() {
        let outcome = ShellTaskRunner::new()
            .run(&shell_task("exit 0"), CancellationToken::new())
            .await
            .unwrap();
        assert_eq!(outcome, RunOutcome::Completed);
    }

    #[tokio::test]
    async fn test_failing_command_reports_stderr() {
        let err = ShellTaskRunner::new()
            .run(&shell_task("echo boom 1>&2; exit 3"), CancellationToken::new())
            .await
            .unwrap_err();

        let message = err.to_string();
        assert!(message.contains('3'), "{}", message);
        assert!(message.contains("boom"), "{}", message);
    }

    #[tokio::test]
    async fn test_non_utf8_stderr_is_kept() {
        let err = ShellTaskRunner::new()
            .run(
                &shell_task(r"printf 'boom\377' 1>&2; exit 2"),
                CancellationToken::new(),
            )
            .await
            .unwrap_err();

        let message = err.to_string();
        assert!(message.contains('2'), "{}", message);
        assert!(message.contains("boom"), "{}", message);
    }

    #[tokio::test]
    async fn test_background_child_holding_stderr_does_not_block() {
        // 后台 sleep 继承 stderr，shell 退出后管道仍未关闭
        let outcome = tokio::time::timeout(
            Duration::from_secs(3),
            ShellTaskRunner::new().run(
                &shell_task("sleep 5 >/dev/null & exit 1"),
                CancellationToken::new(),
            ),
        )
        .await
        .expect("进程退出后应尽快返回");

        let message = outcome.unwrap_err().to_string();
        assert!(message.contains('1'), "{}", message);
    }

    #[tokio::test]
    async fn test_cancel_while_draining_stderr() {
        let cancel = CancellationToken::new();
        let trigger = cancel.clone();
        tokio::spawn(async move {
            tokio::time::sleep(Duration::from_millis(200)).await;
            trigger.cancel();
        });

        let result = tokio::time::timeout(
            Duration::from_secs(3),
            ShellTaskRunner::new().run(&shell_task("sleep 5 >/dev/null & exit 1"), cancel),
        )
        .await;
        assert!(result.is_ok(), "取消后应尽快返回");
    }

    #[tokio::test]
    async fn test_missing_command() {
        let task = Task::new("shell", json!({}));
        let err = ShellTaskRunner::new()
            .run(&task, CancellationToken::new())
            .await
            .unwrap_err();
        assert!(err.to_string().contains("command"));
    }

    #[tokio::test]
    async fn test_cancel_kills_process() {
        let cancel = CancellationToken::new();
        let trigger = cancel.clone();
        tokio::spawn(async move {
            tokio::time::sleep(Duration::from_millis(100)).await;
            trigger.cancel();
        });

        let outcome = tokio::time::timeout(
            Duration::from_secs(5),
            ShellTaskRunner::new().run(&shell_task("sleep 30"), cancel),
        )
        .await
        .expect("取消后应尽快返回")
        .unwrap();
        assert_eq!(outcome, RunOutcome::Cancelled);
    }
}
