use async_trait::async_trait;
use fleet_device::{SinkError, StatusNotification, StatusSink};
use tracing::{error, info};

/// 将状态通知写入日志的订阅方，用于没有外部订阅者的演示设备
#[derive(Debug, Default, Clone)]
pub struct LoggingSink;

#[async_trait]
impl StatusSink for LoggingSink {
    async fn send(&self, notification: StatusNotification) -> Result<(), SinkError> {
        info!(
            device_id = %notification.device_id,
            status = %notification.status,
            timestamp = notification.timestamp,
            "{}",
            notification.message
        );
        Ok(())
    }

    async fn fail(&self, error: String) {
        error!(error = %error, "Monitoring stream failed");
    }
}
