use async_trait::async_trait;
use std::sync::Arc;
use thiserror::Error;
use tracing::{error, info};

#[derive(Debug, Error)]
pub enum ResourceError {
    #[error("Cleanup failed: {0}")]
    CleanupFailed(String),

    #[error("Cleanup forced: {0}")]
    Forced(String),
}

/// 资源接口
#[async_trait]
pub trait Resource: Send + Sync {
    /// 清理资源
    async fn cleanup(&self) -> Result<(), ResourceError>;

    /// 资源名称
    fn name(&self) -> &str;

    /// 清理优先级（数字越小越先清理）
    fn priority(&self) -> u32 {
        100
    }
}

/// 清理结果
#[derive(Debug, Default, Clone, PartialEq, Eq)]
pub struct CleanupReport {
    /// 按清理顺序排列的资源名称
    pub cleaned: Vec<String>,
    /// 失败的资源及原因
    pub failed: Vec<(String, String)>,
}

impl CleanupReport {
    pub fn is_clean(&self) -> bool {
        self.failed.is_empty()
    }
}

/// 资源管理器
pub struct ResourceManager {
    resources: Vec<Arc<dyn Resource>>,
}

impl ResourceManager {
    pub fn new() -> Self {
        Self {
            resources: Vec::new(),
        }
    }

    /// 注册资源
    pub fn register(&mut self, resource: Arc<dyn Resource>) {
        info!("Registering resource: {}", resource.name());
        self.resources.push(resource);
    }

    /// 按优先级清理所有资源，单个失败不影响后续资源
    pub async fn cleanup_all(&mut self) -> CleanupReport {
        // 稳定排序，同优先级保持注册顺序
        self.resources.sort_by_key(|r| r.priority());

        info!("Cleaning up {} resources", self.resources.len());

        let mut report = CleanupReport::default();
        for resource in &self.resources {
            info!("Cleaning up resource: {}", resource.name());

            match resource.cleanup().await {
                Ok(()) => {
                    info!("Successfully cleaned up: {}", resource.name());
                    report.cleaned.push(resource.name().to_string());
                }
                Err(e) => {
                    error!("Failed to cleanup {}: {}", resource.name(), e);
                    report.failed.push((resource.name().to_string(), e.to_string()));
                }
            }
        }

        info!("Resource cleanup complete");
        report
    }

    /// 获取资源数量
    pub fn count(&self) -> usize {
        self.resources.len()
    }
}

impl Default for ResourceManager {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    struct TestResource {
        name: String,
        priority: u32,
        should_fail: bool,
    }

    impl TestResource {
        fn new(name: &str, priority: u32) -> Arc<Self> {
            Arc::new(Self {
                name: name.to_string(),
                priority,
                should_fail: false,
            })
        }

        fn failing(name: &str) -> Arc<Self> {
            Arc::new(Self {
                name: name.to_string(),
                priority: 100,
                should_fail: true,
            })
        }
    }

    #[async_trait]
    impl Resource for TestResource {
        async fn cleanup(&self) -> Result<(), ResourceError> {
            if self.should_fail {
                Err(ResourceError::CleanupFailed("Test failure".to_string()))
            } else {
                Ok(())
            }
        }

        fn name(&self) -> &str {
            &self.name
        }

        fn priority(&self) -> u32 {
            self.priority
        }
    }

    #[tokio::test]
    async fn test_priority_ordering() {
        let mut manager = ResourceManager::new();
        manager.register(TestResource::new("pipeline", 20));
        manager.register(TestResource::new("monitors", 10));
        manager.register(TestResource::new("logging", 20));

        assert_eq!(manager.count(), 3);

        let report = manager.cleanup_all().await;
        assert_eq!(report.cleaned, vec!["monitors", "pipeline", "logging"]);
        assert!(report.is_clean());
    }

    #[tokio::test]
    async fn test_cleanup_continues_after_failure() {
        let mut manager = ResourceManager::new();
        manager.register(TestResource::failing("broken"));
        manager.register(TestResource::new("after", 200));

        let report = manager.cleanup_all().await;
        assert_eq!(report.cleaned, vec!["after"]);
        assert_eq!(report.failed.len(), 1);
        assert_eq!(report.failed[0].0, "broken");
        assert_eq!(report.failed[0].1, "Cleanup failed: Test failure");
    }
}
