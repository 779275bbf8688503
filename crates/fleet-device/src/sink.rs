use crate::error::SinkError;
use crate::StatusNotification;
use async_trait::async_trait;
use tokio::sync::mpsc;
use tracing::debug;

/// 状态通知订阅方
///
/// 监控任务只向其推送，从不读取
#[async_trait]
pub trait StatusSink: Send + Sync {
    /// 推送一条状态通知
    async fn send(&self, notification: StatusNotification) -> Result<(), SinkError>;

    /// 推送终止错误
    async fn fail(&self, error: String);
}

/// 通道订阅方收到的事件
#[derive(Debug, Clone, PartialEq)]
pub enum SinkEvent {
    Status(StatusNotification),
    Error(String),
}

/// 基于 mpsc 通道的订阅方
#[derive(Clone)]
pub struct ChannelSink {
    tx: mpsc::Sender<SinkEvent>,
}

impl ChannelSink {
    pub fn new(buffer: usize) -> (Self, mpsc::Receiver<SinkEvent>) {
        let (tx, rx) = mpsc::channel(buffer);
        (Self { tx }, rx)
    }
}

#[async_trait]
impl StatusSink for ChannelSink {
    async fn send(&self, notification: StatusNotification) -> Result<(), SinkError> {
        self.tx
            .send(SinkEvent::Status(notification))
            .await
            .map_err(|_| SinkError::Closed)
    }

    async fn fail(&self, error: String) {
        if self.tx.send(SinkEvent::Error(error)).await.is_err() {
            debug!("Sink closed before error could be delivered");
        }
    }
}
