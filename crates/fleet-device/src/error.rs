use thiserror::Error;

/// 设备管理错误类型
#[derive(Error, Debug)]
pub enum DeviceError {
    /// 设备未找到
    #[error("Device not found: {0}")]
    NotFound(String),

    /// 设备已存在
    #[error("Device already exists: {0}")]
    AlreadyExists(String),

    /// 调度器无法接受新的监控任务
    #[error("Scheduling failed: {0}")]
    Scheduling(String),
}

/// 通知推送错误
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum SinkError {
    /// 订阅方已关闭
    #[error("notification sink is closed")]
    Closed,

    /// 订阅方拒绝
    #[error("notification rejected: {0}")]
    Rejected(String),
}

/// 设备管理结果类型
pub type Result<T> = std::result::Result<T, DeviceError>;

impl DeviceError {
    /// 创建调度错误
    pub fn scheduling(msg: impl Into<String>) -> Self {
        DeviceError::Scheduling(msg.into())
    }

    pub fn is_not_found(&self) -> bool {
        matches!(self, DeviceError::NotFound(_))
    }
}
