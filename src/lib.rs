pub mod core;
pub mod error;
pub mod models;
pub mod services;
pub mod utils;

#[cfg(feature = "desktop")]
pub mod ui;

pub use crate::core::{init_logger, set_log_level, shutdown_logger};
pub use error::{AppError, AppResult};
pub use models::{GlobalConfig, LogConfig, Task, TaskAck, TaskStatus, TaskStatusEvent};
pub use services::{TaskBoundary, TaskRelay, WorkerAgent};
