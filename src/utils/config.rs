// 全局配置读写
//
// 配置文件位于 `<config_dir>/config.json`，写入时先写临时文件再替换

use std::env;
use std::fs;
use std::path::{Path, PathBuf};

use crate::error::{AppError, AppResult};
use crate::models::GlobalConfig;

/// 覆盖配置目录的环境变量
pub const CONFIG_DIR_ENV: &str = "TASK_RELAY_CONFIG_DIR";

const CONFIG_DIR_NAME: &str = ".task-relay";
const CONFIG_FILE_NAME: &str = "config.json";

/// 获取配置目录（不存在时创建）
pub fn config_dir() -> AppResult<PathBuf> {
    let dir = match env::var_os(CONFIG_DIR_ENV) {
        Some(dir) if !dir.is_empty() => PathBuf::from(dir),
        _ => dirs::home_dir()
            .ok_or_else(|| AppError::config("无法获取用户主目录"))?
            .join(CONFIG_DIR_NAME),
    };

    fs::create_dir_all(&dir)?;
    Ok(dir)
}

pub fn global_config_path() -> AppResult<PathBuf> {
    Ok(config_dir()?.join(CONFIG_FILE_NAME))
}

/// 读取全局配置，文件不存在时返回 `None`
pub fn read_global_config() -> AppResult<Option<GlobalConfig>> {
    read_config_file(&global_config_path()?)
}

pub fn write_global_config(config: &GlobalConfig) -> AppResult<()> {
    write_config_file(&global_config_path()?, config)
}

/// 读取配置，不存在时返回默认值
///
/// 启动时日志尚未初始化，读取失败的错误随默认配置一起返回，由调用方
/// 在日志就绪后记录。
pub fn load_global_config() -> (GlobalConfig, Option<AppError>) {
    match read_global_config() {
        Ok(config) => (config.unwrap_or_default(), None),
        Err(e) => (GlobalConfig::default(), Some(e)),
    }
}

fn read_config_file(path: &Path) -> AppResult<Option<GlobalConfig>> {
    if !path.exists() {
        return Ok(None);
    }

    let content = fs::read_to_string(path)?;
    if content.trim().is_empty() {
        return Ok(None);
    }

    let config = serde_json::from_str(&content)?;
    Ok(Some(config))
}

fn write_config_file(path: &Path, config: &GlobalConfig) -> AppResult<()> {
    if let Some(parent) = path.parent() {
        fs::create_dir_all(parent)?;
    }

    let tmp_path = path.with_extension("tmp");
    let content = serde_json::to_string_pretty(config)?;
    fs::write(&tmp_path, content)?;

    if path.exists() {
        fs::remove_file(path)?;
    }
    fs::rename(tmp_path, path)?;
    Ok(())
}
