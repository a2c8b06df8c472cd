pub mod events;

// 导出事件常量和 UI 目标
pub use events::{WebviewUiTarget, MAIN_WINDOW_LABEL};
