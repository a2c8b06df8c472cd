use std::fmt::Display;

use thiserror::Error;

pub type AppResult<T> = Result<T, AppError>;

#[derive(Debug, Error)]
pub enum AppError {
    #[error("IO错误: {0}")]
    Io(#[from] std::io::Error),
    #[error("JSON 解析错误: {0}")]
    Json(#[from] serde_json::Error),
    #[cfg(feature = "desktop")]
    #[error("Tauri 错误: {0}")]
    Tauri(#[from] tauri::Error),
    #[error("通道错误: {0}")]
    Channel(String),
    #[error("配置错误: {0}")]
    Config(String),
    #[error("{0}")]
    Other(String),
}

impl AppError {
    pub fn channel<E: Display>(err: E) -> Self {
        Self::Channel(err.to_string())
    }

    pub fn config<E: Display>(err: E) -> Self {
        Self::Config(err.to_string())
    }
}
