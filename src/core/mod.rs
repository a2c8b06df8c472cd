pub mod logger;

// 导出核心类型
pub use crate::error::{AppError, AppResult};
pub use logger::{init_logger, set_log_level, shutdown_logger};

// 重新导出 tracing 核心功能
pub use tracing::{debug, error, info, instrument, trace, warn, Level};
