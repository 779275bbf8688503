use crate::resource::FleetResource;
use crate::service::FleetService;
use crate::sink::LoggingSink;
use fleet_config::FleetConfig;
use fleet_shutdown::{ResourceManager, ShutdownCoordinator, ShutdownReport, SignalHandler};
use std::sync::Arc;
use tracing::{info, warn};

/// 启动服务并运行到收到关闭信号
///
/// 系统信号需由调用方通过 `handler` 转发。
pub async fn run(config: FleetConfig, handler: SignalHandler) -> anyhow::Result<ShutdownReport> {
    let service = Arc::new(FleetService::from_config(&config.monitor));
    run_service(service, &config, handler).await
}

/// 使用已构造的服务运行，便于调用方在关闭前后查询服务状态
pub async fn run_service(
    service: Arc<FleetService>,
    config: &FleetConfig,
    handler: SignalHandler,
) -> anyhow::Result<ShutdownReport> {
    info!(name = %config.system.name, "Starting fleet control plane");

    // 协调器在 build 时订阅信号，需早于设备启动
    let grace = config.monitor.shutdown_grace();
    let mut resources = ResourceManager::new();
    resources.register(Arc::new(FleetResource::new(service.clone())));

    let coordinator = ShutdownCoordinator::builder()
        .with_signal_handler(handler)
        .with_stream_tracker(service.stream_tracker().clone())
        .with_resource_manager(resources)
        .with_drain_timeout(grace)
        .with_shutdown_timeout(grace * 2)
        .build();

    seed_demo_devices(&service, config)?;

    info!(
        devices = service.devices().len(),
        interval = ?config.monitor.interval(),
        "Fleet control plane running"
    );

    let report = coordinator.run().await;
    for (name, reason) in &report.cleanup.failed {
        warn!(resource = %name, reason = %reason, "Resource did not shut down cleanly");
    }

    Ok(report)
}

/// 注册配置中的演示设备并以日志方式订阅其状态
pub fn seed_demo_devices(service: &FleetService, config: &FleetConfig) -> anyhow::Result<()> {
    for demo in &config.demo.devices {
        let device = service.register_device(&demo.name, &demo.device_type)?;
        service.monitor_device(&device.id, Arc::new(LoggingSink))?;
    }
    Ok(())
}
