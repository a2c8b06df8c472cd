// 日志配置管理命令
// 提供前端查询和更新日志配置的接口

use tauri::command;
use task_relay::models::LogConfig;
use task_relay::utils::{read_global_config, write_global_config};

/// 检测当前是否为 Release 构建
#[command]
pub fn is_release_build() -> bool {
    !cfg!(debug_assertions)
}

/// 获取当前日志配置
///
/// 配置文件不存在时返回默认配置
#[command]
pub async fn get_log_config() -> Result<LogConfig, String> {
    let global_config = read_global_config().map_err(|e| e.to_string())?;
    Ok(global_config
        .map(|config| config.log_config)
        .unwrap_or_default())
}

/// 更新日志配置
///
/// 仅日志级别变更可以热重载，格式和输出目标需要重启应用生效。
#[command]
pub async fn update_log_config(new_config: LogConfig) -> Result<String, String> {
    tracing::info!(
        level = new_config.level.as_str(),
        format = ?new_config.format,
        output = ?new_config.output,
        "更新日志配置"
    );

    let mut global_config = read_global_config()
        .map_err(|e| format!("读取配置失败: {}", e))?
        .unwrap_or_default();

    let can_hot_reload = global_config.log_config.can_hot_reload(&new_config);

    global_config.log_config = new_config.clone();
    write_global_config(&global_config).map_err(|e| format!("保存配置失败: {}", e))?;

    if can_hot_reload {
        task_relay::set_log_level(new_config.level).map_err(|e| format!("热重载失败: {}", e))?;

        tracing::info!("日志配置已热重载");
        Ok("日志配置已更新并生效".to_string())
    } else {
        tracing::warn!("日志配置已保存，但需要重启应用生效");
        Ok("日志配置已保存，需要重启应用后生效".to_string())
    }
}
