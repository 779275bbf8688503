use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::time::Duration;

/// 设备指令（接收后不再修改）
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Default)]
pub struct Command {
    /// 设备 ID
    pub device_id: String,

    /// 指令类型（不区分大小写）
    pub command_type: String,

    /// 指令参数
    #[serde(default)]
    pub parameters: HashMap<String, String>,
}

impl Command {
    pub fn new(device_id: impl Into<String>, command_type: impl Into<String>) -> Self {
        Self {
            device_id: device_id.into(),
            command_type: command_type.into(),
            parameters: HashMap::new(),
        }
    }

    /// 设置参数
    pub fn with_param(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.parameters.insert(key.into(), value.into());
        self
    }

    pub fn param(&self, key: &str) -> Option<&str> {
        self.parameters.get(key).map(String::as_str)
    }
}

/// 指令类型
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum CommandType {
    Restart,
    Calibrate,
    UpdateInterval,
    Sleep,
    Wake,
    SetConfig,
}

impl CommandType {
    pub const ALL: [CommandType; 6] = [
        CommandType::Restart,
        CommandType::Calibrate,
        CommandType::UpdateInterval,
        CommandType::Sleep,
        CommandType::Wake,
        CommandType::SetConfig,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            CommandType::Restart => "RESTART",
            CommandType::Calibrate => "CALIBRATE",
            CommandType::UpdateInterval => "UPDATE_INTERVAL",
            CommandType::Sleep => "SLEEP",
            CommandType::Wake => "WAKE",
            CommandType::SetConfig => "SET_CONFIG",
        }
    }

    /// 按 Unicode 规则转大写后匹配，未知类型返回 None
    pub fn parse(s: &str) -> Option<Self> {
        let upper = s.to_uppercase();
        Self::ALL.into_iter().find(|t| t.as_str() == upper)
    }

    /// 模拟设备往返耗时
    pub fn simulated_latency(&self) -> Duration {
        match self {
            CommandType::Restart => Duration::from_millis(2000),
            CommandType::Calibrate => Duration::from_millis(5000),
            CommandType::UpdateInterval | CommandType::SetConfig => Duration::from_millis(500),
            CommandType::Sleep | CommandType::Wake => Duration::from_millis(1000),
        }
    }
}

impl std::fmt::Display for CommandType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// 通过校验的指令，参数已解析
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ValidatedCommand {
    Restart,
    Calibrate { sensor_type: String },
    /// `raw` 保留调用方提交的原始参数，用于结果消息
    UpdateInterval { interval: u32, raw: String },
    Sleep,
    Wake,
    SetConfig { key: String, value: String },
}

impl ValidatedCommand {
    pub fn command_type(&self) -> CommandType {
        match self {
            ValidatedCommand::Restart => CommandType::Restart,
            ValidatedCommand::Calibrate { .. } => CommandType::Calibrate,
            ValidatedCommand::UpdateInterval { .. } => CommandType::UpdateInterval,
            ValidatedCommand::Sleep => CommandType::Sleep,
            ValidatedCommand::Wake => CommandType::Wake,
            ValidatedCommand::SetConfig { .. } => CommandType::SetConfig,
        }
    }

    /// 执行成功后的结果描述
    pub fn result_message(&self) -> String {
        match self {
            ValidatedCommand::Restart => "Device restarted successfully".to_string(),
            ValidatedCommand::Calibrate { sensor_type } => {
                format!("Calibration completed for {}", sensor_type)
            }
            ValidatedCommand::UpdateInterval { raw, .. } => {
                format!("Sampling interval updated to {} seconds", raw)
            }
            ValidatedCommand::Sleep => "Device entered sleep mode".to_string(),
            ValidatedCommand::Wake => "Device woken up".to_string(),
            ValidatedCommand::SetConfig { key, value } => {
                format!("Configuration updated: {}={}", key, value)
            }
        }
    }
}

/// 指令处理结果，每条指令恰好一个
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct CommandOutcome {
    pub device_id: String,
    pub success: bool,
    pub message: String,
}

impl CommandOutcome {
    pub fn success(device_id: impl Into<String>, message: impl Into<String>) -> Self {
        Self {
            device_id: device_id.into(),
            success: true,
            message: message.into(),
        }
    }

    pub fn failure(device_id: impl Into<String>, message: impl Into<String>) -> Self {
        Self {
            device_id: device_id.into(),
            success: false,
            message: message.into(),
        }
    }
}
