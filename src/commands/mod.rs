// 前端命令，按模块完整路径注册到 generate_handler!
pub mod log_commands;
pub mod task_commands;
