use crate::service::FleetService;
use async_trait::async_trait;
use fleet_device::ShutdownOutcome;
use fleet_shutdown::{Resource, ResourceError};
use std::sync::Arc;

/// 关闭时停止指令流水线和所有监控任务
pub struct FleetResource {
    service: Arc<FleetService>,
}

impl FleetResource {
    pub fn new(service: Arc<FleetService>) -> Self {
        Self { service }
    }
}

#[async_trait]
impl Resource for FleetResource {
    async fn cleanup(&self) -> Result<(), ResourceError> {
        match self.service.shutdown().await {
            ShutdownOutcome::Graceful => Ok(()),
            ShutdownOutcome::Forced => Err(ResourceError::Forced(
                "monitoring tasks aborted after grace period".to_string(),
            )),
        }
    }

    fn name(&self) -> &str {
        "fleet-service"
    }

    fn priority(&self) -> u32 {
        10
    }
}
