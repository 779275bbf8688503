use crate::resource::{CleanupReport, ResourceManager};
use crate::signal::{ShutdownSignal, SignalHandler};
use crate::tracker::StreamTracker;
use std::time::Duration;
use tokio::sync::broadcast;
use tokio::time::{timeout, Instant};
use tracing::{info, warn};

/// 关闭阶段
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ShutdownPhase {
    Cleaning,
    Complete,
}

/// 关闭结果
#[derive(Debug)]
pub struct ShutdownReport {
    pub signal: ShutdownSignal,
    /// 结束时所处阶段，清理超时则停留在 Cleaning
    pub phase: ShutdownPhase,
    pub streams_drained: bool,
    pub cleanup: CleanupReport,
    pub elapsed: Duration,
}

/// 关闭协调器
///
/// 等待信号 -> 排空指令流 -> 按优先级清理资源。
pub struct ShutdownCoordinator {
    // 持有发送端，未注入处理器时通道不会立即关闭
    _signal_handler: SignalHandler,
    signal_rx: broadcast::Receiver<ShutdownSignal>,
    stream_tracker: Option<StreamTracker>,
    resource_manager: Option<ResourceManager>,
    shutdown_timeout: Duration,
    drain_timeout: Duration,
}

impl ShutdownCoordinator {
    pub fn builder() -> ShutdownCoordinatorBuilder {
        ShutdownCoordinatorBuilder::new()
    }

    /// 运行关闭流程
    pub async fn run(mut self) -> ShutdownReport {
        info!("Shutdown coordinator started, waiting for signal...");

        // 通道关闭视为手动关闭
        let signal = self.signal_rx.recv().await.unwrap_or(ShutdownSignal::Manual);
        info!("Received shutdown signal: {:?}", signal);

        let start = Instant::now();

        let mut streams_drained = true;
        if let Some(tracker) = &self.stream_tracker {
            info!(active = tracker.active_count(), "Draining command streams...");

            if timeout(self.drain_timeout, tracker.drain()).await.is_err() {
                warn!(
                    remaining = tracker.active_count(),
                    "Command stream drain timed out after {:?}", self.drain_timeout
                );
                streams_drained = false;
            }
        }

        let mut phase = ShutdownPhase::Complete;
        let mut cleanup = CleanupReport::default();
        if let Some(manager) = &mut self.resource_manager {
            info!("Cleaning up resources...");

            match timeout(self.shutdown_timeout, manager.cleanup_all()).await {
                Ok(report) => cleanup = report,
                Err(_) => {
                    warn!("Resource cleanup timed out after {:?}", self.shutdown_timeout);
                    phase = ShutdownPhase::Cleaning;
                }
            }
        }

        let elapsed = start.elapsed();
        info!("Shutdown finished in {:?}", elapsed);

        ShutdownReport {
            signal,
            phase,
            streams_drained,
            cleanup,
            elapsed,
        }
    }
}

/// 关闭协调器构建器
pub struct ShutdownCoordinatorBuilder {
    signal_handler: Option<SignalHandler>,
    stream_tracker: Option<StreamTracker>,
    resource_manager: Option<ResourceManager>,
    shutdown_timeout: Duration,
    drain_timeout: Duration,
}

impl ShutdownCoordinatorBuilder {
    pub fn new() -> Self {
        Self {
            signal_handler: None,
            stream_tracker: None,
            resource_manager: None,
            shutdown_timeout: Duration::from_secs(30),
            drain_timeout: Duration::from_secs(10),
        }
    }

    pub fn with_signal_handler(mut self, handler: SignalHandler) -> Self {
        self.signal_handler = Some(handler);
        self
    }

    pub fn with_stream_tracker(mut self, tracker: StreamTracker) -> Self {
        self.stream_tracker = Some(tracker);
        self
    }

    pub fn with_resource_manager(mut self, manager: ResourceManager) -> Self {
        self.resource_manager = Some(manager);
        self
    }

    pub fn with_shutdown_timeout(mut self, timeout: Duration) -> Self {
        self.shutdown_timeout = timeout;
        self
    }

    pub fn with_drain_timeout(mut self, timeout: Duration) -> Self {
        self.drain_timeout = timeout;
        self
    }

    /// 构建时即订阅信号，之后触发的信号不会丢失
    pub fn build(self) -> ShutdownCoordinator {
        let signal_handler = self.signal_handler.unwrap_or_default();
        let signal_rx = signal_handler.subscribe();

        ShutdownCoordinator {
            _signal_handler: signal_handler,
            signal_rx,
            stream_tracker: self.stream_tracker,
            resource_manager: self.resource_manager,
            shutdown_timeout: self.shutdown_timeout,
            drain_timeout: self.drain_timeout,
        }
    }
}

impl Default for ShutdownCoordinatorBuilder {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::resource::{Resource, ResourceError};
    use async_trait::async_trait;
    use std::sync::Arc;

    struct TestResource {
        name: String,
        delay: Duration,
    }

    #[async_trait]
    impl Resource for TestResource {
        async fn cleanup(&self) -> Result<(), ResourceError> {
            tokio::time::sleep(self.delay).await;
            Ok(())
        }

        fn name(&self) -> &str {
            &self.name
        }
    }

    fn resource(name: &str, delay: Duration) -> Arc<TestResource> {
        Arc::new(TestResource {
            name: name.to_string(),
            delay,
        })
    }

    #[tokio::test(start_paused = true)]
    async fn test_full_shutdown_sequence() {
        let handler = SignalHandler::default();
        let tracker = StreamTracker::new();
        let guard = tracker.acquire().unwrap();

        let mut manager = ResourceManager::new();
        manager.register(resource("monitors", Duration::from_millis(10)));

        let coordinator = ShutdownCoordinator::builder()
            .with_signal_handler(handler.clone())
            .with_stream_tracker(tracker.clone())
            .with_resource_manager(manager)
            .with_drain_timeout(Duration::from_secs(5))
            .build();

        handler.trigger_shutdown();
        tokio::spawn(async move {
            tokio::time::sleep(Duration::from_millis(200)).await;
            drop(guard);
        });

        let report = coordinator.run().await;
        assert_eq!(report.signal, ShutdownSignal::Manual);
        assert_eq!(report.phase, ShutdownPhase::Complete);
        assert!(report.streams_drained);
        assert_eq!(report.cleanup.cleaned, vec!["monitors"]);
        assert!(tracker.acquire().is_none());
    }

    #[tokio::test(start_paused = true)]
    async fn test_drain_timeout_still_cleans() {
        let handler = SignalHandler::default();
        let tracker = StreamTracker::new();
        let _stuck = tracker.acquire().unwrap();

        let mut manager = ResourceManager::new();
        manager.register(resource("pipeline", Duration::ZERO));

        let coordinator = ShutdownCoordinator::builder()
            .with_signal_handler(handler.clone())
            .with_stream_tracker(tracker)
            .with_resource_manager(manager)
            .with_drain_timeout(Duration::from_secs(1))
            .build();

        handler.trigger_shutdown();
        let report = coordinator.run().await;

        assert!(!report.streams_drained);
        assert_eq!(report.phase, ShutdownPhase::Complete);
        assert_eq!(report.cleanup.cleaned, vec!["pipeline"]);
    }

    #[tokio::test(start_paused = true)]
    async fn test_cleanup_timeout() {
        let handler = SignalHandler::default();
        let mut manager = ResourceManager::new();
        manager.register(resource("slow", Duration::from_secs(60)));

        let coordinator = ShutdownCoordinator::builder()
            .with_signal_handler(handler.clone())
            .with_resource_manager(manager)
            .with_shutdown_timeout(Duration::from_secs(2))
            .build();

        handler.trigger_shutdown();
        let report = coordinator.run().await;

        assert_eq!(report.phase, ShutdownPhase::Cleaning);
        assert!(report.cleanup.cleaned.is_empty());
        assert!(report.elapsed < Duration::from_secs(3));
    }
}
