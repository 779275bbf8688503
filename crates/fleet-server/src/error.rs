use fleet_device::DeviceError;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum ServiceError {
    #[error(transparent)]
    Device(#[from] DeviceError),

    #[error("Device not found: {0}")]
    UnknownDevice(String),

    #[error("Service is shutting down")]
    ShuttingDown,
}

impl ServiceError {
    /// 设备不存在（包括调度器返回的 NotFound）
    pub fn is_not_found(&self) -> bool {
        match self {
            ServiceError::UnknownDevice(_) => true,
            ServiceError::Device(e) => e.is_not_found(),
            ServiceError::ShuttingDown => false,
        }
    }
}

pub type Result<T> = std::result::Result<T, ServiceError>;
