use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use tokio::sync::watch;
use tracing::{debug, info};

/// 活跃指令流跟踪器
///
/// 每个打开的指令流持有一个 [`StreamGuard`]，关闭时等待所有守卫释放。
#[derive(Clone)]
pub struct StreamTracker {
    inner: Arc<Inner>,
}

struct Inner {
    active: watch::Sender<usize>,
    closing: AtomicBool,
}

impl StreamTracker {
    pub fn new() -> Self {
        let (active, _) = watch::channel(0);
        Self {
            inner: Arc::new(Inner {
                active,
                closing: AtomicBool::new(false),
            }),
        }
    }

    /// 登记一个新的指令流，关闭开始后返回 None
    pub fn acquire(&self) -> Option<StreamGuard> {
        if self.inner.closing.load(Ordering::SeqCst) {
            debug!("Rejecting new command stream: shutting down");
            return None;
        }

        self.inner.active.send_modify(|n| *n += 1);
        debug!(active = self.active_count(), "Command stream acquired");

        Some(StreamGuard {
            inner: self.inner.clone(),
        })
    }

    /// 停止接受新的指令流
    pub fn close(&self) {
        if !self.inner.closing.swap(true, Ordering::SeqCst) {
            info!(active = self.active_count(), "Stopped accepting command streams");
        }
    }

    /// 停止接受并等待所有指令流结束，调用方负责超时
    pub async fn drain(&self) {
        self.close();

        let mut rx = self.inner.active.subscribe();
        // 发送端由 self 持有，wait_for 不会因通道关闭而失败
        let _ = rx.wait_for(|n| *n == 0).await;

        info!("All command streams drained");
    }

    pub fn active_count(&self) -> usize {
        *self.inner.active.borrow()
    }

    pub fn is_closing(&self) -> bool {
        self.inner.closing.load(Ordering::SeqCst)
    }
}

impl Default for StreamTracker {
    fn default() -> Self {
        Self::new()
    }
}

/// 指令流守卫，释放时计数减一
pub struct StreamGuard {
    inner: Arc<Inner>,
}

impl Drop for StreamGuard {
    fn drop(&mut self) {
        self.inner.active.send_modify(|n| *n = n.saturating_sub(1));
        debug!(active = *self.inner.active.borrow(), "Command stream released");
    }
}
