use std::io;
use tokio::signal;
use tokio::sync::broadcast;
use tracing::info;

/// 关闭信号类型
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ShutdownSignal {
    /// SIGTERM
    Term,

    /// SIGINT - Ctrl+C
    Interrupt,

    /// 手动触发
    Manual,
}

/// 信号处理器
///
/// 系统信号与手动触发都通过同一个广播通道分发，克隆后共享同一通道。
#[derive(Clone)]
pub struct SignalHandler {
    shutdown_tx: broadcast::Sender<ShutdownSignal>,
}

impl SignalHandler {
    pub fn new() -> (Self, broadcast::Receiver<ShutdownSignal>) {
        let (tx, rx) = broadcast::channel(16);
        (Self { shutdown_tx: tx }, rx)
    }

    /// 监听 SIGINT / SIGTERM 并转发给订阅者
    pub async fn wait_for_system_signal(&self) -> io::Result<ShutdownSignal> {
        let received = tokio::select! {
            result = signal::ctrl_c() => {
                result?;
                ShutdownSignal::Interrupt
            }
            result = terminate() => {
                result?;
                ShutdownSignal::Term
            }
        };

        info!(signal = ?received, "Received system signal");
        let _ = self.shutdown_tx.send(received);
        Ok(received)
    }

    /// 手动触发关闭
    pub fn trigger_shutdown(&self) {
        info!("Manual shutdown triggered");
        let _ = self.shutdown_tx.send(ShutdownSignal::Manual);
    }

    /// 订阅关闭信号
    pub fn subscribe(&self) -> broadcast::Receiver<ShutdownSignal> {
        self.shutdown_tx.subscribe()
    }
}

#[cfg(unix)]
async fn terminate() -> io::Result<()> {
    signal::unix::signal(signal::unix::SignalKind::terminate())?
        .recv()
        .await;
    Ok(())
}

// 非 unix 平台只有 Ctrl+C
#[cfg(not(unix))]
async fn terminate() -> io::Result<()> {
    std::future::pending().await
}

impl Default for SignalHandler {
    fn default() -> Self {
        Self::new().0
    }
}
