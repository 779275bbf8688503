use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// 设备信息
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Device {
    /// 设备 ID（全局唯一，由注册方分配）
    pub id: String,

    /// 设备名称
    pub name: String,

    /// 设备类型标签
    pub device_type: String,

    /// 注册时的设备状态
    pub status: DeviceStatus,

    /// 注册时间
    pub registered_at: DateTime<Utc>,
}

impl Device {
    /// 创建新设备，初始状态为在线
    pub fn new(id: impl Into<String>, name: impl Into<String>, device_type: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            name: name.into(),
            device_type: device_type.into(),
            status: DeviceStatus::Online,
            registered_at: Utc::now(),
        }
    }

    /// 设置初始状态
    pub fn with_status(mut self, status: DeviceStatus) -> Self {
        self.status = status;
        self
    }
}

/// 设备状态
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
#[repr(u8)]
pub enum DeviceStatus {
    /// 在线
    Online = 0,
    /// 离线
    Offline = 1,
    /// 故障
    Error = 2,
    /// 维护中
    Maintenance = 3,
}

impl DeviceStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            DeviceStatus::Online => "ONLINE",
            DeviceStatus::Offline => "OFFLINE",
            DeviceStatus::Error => "ERROR",
            DeviceStatus::Maintenance => "MAINTENANCE",
        }
    }

    pub(crate) fn from_u8(value: u8) -> Self {
        match value {
            0 => DeviceStatus::Online,
            2 => DeviceStatus::Error,
            3 => DeviceStatus::Maintenance,
            _ => DeviceStatus::Offline,
        }
    }
}

impl std::fmt::Display for DeviceStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// 状态通知
///
/// 每个监控周期推送一次，不做持久化
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct StatusNotification {
    pub device_id: String,
    pub status: DeviceStatus,
    pub message: String,
    /// 毫秒时间戳
    pub timestamp: i64,
}

impl StatusNotification {
    pub fn new(device_id: impl Into<String>, status: DeviceStatus, message: impl Into<String>) -> Self {
        Self {
            device_id: device_id.into(),
            status,
            message: message.into(),
            timestamp: Utc::now().timestamp_millis(),
        }
    }
}
