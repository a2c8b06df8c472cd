pub mod config;
pub mod task;

pub use config::{GlobalConfig, LogConfig, LogFormat, LogLevel, LogOutput, WorkerConfig};
pub use task::{StatusCallback, StatusMap, Task, TaskAck, TaskStatus, TaskStatusEvent};
