// IPC 通道名
//
// 通道类型固定为四种；实际使用的名称来自内置的 channels.json，
// 可被全局配置覆盖。进程启动时加载一次，此后只读。

use std::collections::{BTreeMap, HashSet};
use std::fmt;

use once_cell::sync::OnceCell;

use crate::error::{AppError, AppResult};

const BUILTIN_CHANNELS: &str = include_str!("../../resources/channels.json");

static CHANNELS: OnceCell<ChannelSet> = OnceCell::new();

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum ChannelKind {
    StartTask,
    StopTask,
    SubscribeTasksStatus,
    NotifyTaskStatus,
}

impl ChannelKind {
    pub const ALL: [ChannelKind; 4] = [
        ChannelKind::StartTask,
        ChannelKind::StopTask,
        ChannelKind::SubscribeTasksStatus,
        ChannelKind::NotifyTaskStatus,
    ];

    /// channels.json 中的键
    pub fn key(&self) -> &'static str {
        match self {
            ChannelKind::StartTask => "START_TASK",
            ChannelKind::StopTask => "STOP_TASK",
            ChannelKind::SubscribeTasksStatus => "SUBSCRIBE_TASKS_STATUS",
            ChannelKind::NotifyTaskStatus => "NOTIFY_TASK_STATUS",
        }
    }

    pub fn from_key(key: &str) -> Option<Self> {
        Self::ALL.into_iter().find(|kind| kind.key() == key)
    }
}

impl fmt::Display for ChannelKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.key())
    }
}

/// 通道类型 → 通道名，四种类型都必须有且名称互不相同
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ChannelSet {
    names: BTreeMap<ChannelKind, String>,
}

impl ChannelSet {
    /// 解析 `{ "START_TASK": "...", ... }` 格式的通道表
    pub fn from_json(content: &str) -> AppResult<Self> {
        let raw: BTreeMap<String, String> = serde_json::from_str(content)?;
        let mut names = BTreeMap::new();

        for (key, name) in raw {
            let kind = ChannelKind::from_key(&key)
                .ok_or_else(|| AppError::channel(format!("未知的通道类型: {}", key)))?;
            names.insert(kind, name);
        }

        let set = Self { names };
        set.validate()?;
        Ok(set)
    }

    /// 内置通道表
    pub fn builtin() -> AppResult<Self> {
        Self::from_json(BUILTIN_CHANNELS)
    }

    /// 用配置中的覆盖项替换通道名
    pub fn with_overrides(mut self, overrides: &BTreeMap<String, String>) -> AppResult<Self> {
        for (key, name) in overrides {
            let kind = ChannelKind::from_key(key)
                .ok_or_else(|| AppError::channel(format!("未知的通道类型: {}", key)))?;
            self.names.insert(kind, name.clone());
        }
        self.validate()?;
        Ok(self)
    }

    pub fn name(&self, kind: ChannelKind) -> &str {
        self.names.get(&kind).map(String::as_str).unwrap_or(kind.key())
    }

    /// 根据通道名反查通道类型
    pub fn resolve(&self, name: &str) -> Option<ChannelKind> {
        self.names
            .iter()
            .find(|(_, candidate)| candidate.as_str() == name)
            .map(|(kind, _)| *kind)
    }

    fn validate(&self) -> AppResult<()> {
        let mut seen = HashSet::new();
        for kind in ChannelKind::ALL {
            let name = self
                .names
                .get(&kind)
                .ok_or_else(|| AppError::channel(format!("缺少通道定义: {}", kind)))?;
            if name.trim().is_empty() {
                return Err(AppError::channel(format!("通道名不能为空: {}", kind)));
            }
            if !seen.insert(name.as_str()) {
                return Err(AppError::channel(format!("通道名重复: {}", name)));
            }
        }
        Ok(())
    }
}

/// 安装进程级通道表，只能调用一次
///
/// 返回的引用由中继持有，分发器与 UI 推送都从这一份表取名。
pub fn install_channels(set: ChannelSet) -> AppResult<&'static ChannelSet> {
    CHANNELS
        .set(set)
        .map_err(|_| AppError::channel("通道表已加载，不能重复设置"))?;
    let installed = CHANNELS
        .get()
        .ok_or_else(|| AppError::channel("通道表加载失败"))?;
    tracing::debug!(channels = ?installed, "IPC 通道表已加载");
    Ok(installed)
}
