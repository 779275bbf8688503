use crate::error::{Result, ServiceError};
use crate::sensor::{SensorProcessor, SensorReading};
use fleet_config::MonitorConfig;
use fleet_control::{Command, CommandOutcome, CommandPipeline, CommandStream, DeviceDirectory};
use fleet_device::{
    Device, DeviceStatus, MonitorScheduler, SchedulerOptions, ShutdownOutcome, StatusSink,
};
use fleet_shutdown::{StreamGuard, StreamTracker};
use std::sync::Arc;
use tokio::sync::mpsc;
use tracing::{info, warn};
use uuid::Uuid;

/// 指令流默认缓冲区大小
pub const COMMAND_STREAM_BUFFER: usize = 32;

/// 由监控配置构造调度参数
pub fn scheduler_options(config: &MonitorConfig) -> SchedulerOptions {
    SchedulerOptions {
        interval: config.interval(),
        max_concurrent_ticks: config.worker_count(),
        shutdown_grace: config.shutdown_grace(),
        cancel_on_sink_error: config.cancel_on_sink_error,
        maintenance_interval: config.maintenance_interval(),
    }
}

/// 以调度器的设备表作为指令流的设备目录
struct SchedulerDirectory(Arc<MonitorScheduler>);

impl DeviceDirectory for SchedulerDirectory {
    fn contains(&self, device_id: &str) -> bool {
        self.0.contains(device_id)
    }
}

/// 设备群控制面服务
///
/// 对外提供设备注册、状态订阅、指令下发和传感器数据接入。
pub struct FleetService {
    scheduler: Arc<MonitorScheduler>,
    pipeline: Arc<CommandPipeline>,
    streams: StreamTracker,
    sensors: SensorProcessor,
}

impl FleetService {
    pub fn new(options: SchedulerOptions) -> Self {
        Self::with_pipeline(options, CommandPipeline::simulated())
    }

    pub fn with_pipeline(options: SchedulerOptions, pipeline: CommandPipeline) -> Self {
        Self {
            scheduler: Arc::new(MonitorScheduler::new(options)),
            pipeline: Arc::new(pipeline),
            streams: StreamTracker::new(),
            sensors: SensorProcessor::new(),
        }
    }

    pub fn from_config(config: &MonitorConfig) -> Self {
        Self::new(scheduler_options(config))
    }

    pub fn scheduler(&self) -> &Arc<MonitorScheduler> {
        &self.scheduler
    }

    pub fn stream_tracker(&self) -> &StreamTracker {
        &self.streams
    }

    // ========== 设备注册 ==========

    /// 注册新设备，分配随机 ID，初始状态为 ONLINE
    pub fn register_device(&self, name: &str, device_type: &str) -> Result<Device> {
        info!(name = %name, device_type = %device_type, "Received registration request");

        let device = Device::new(Uuid::new_v4().to_string(), name, device_type);
        self.scheduler.register(device.clone())?;

        info!(device_id = %device.id, "Device registered successfully");
        Ok(device)
    }

    pub fn device(&self, device_id: &str) -> Result<Device> {
        self.scheduler
            .device(device_id)
            .ok_or_else(|| ServiceError::UnknownDevice(device_id.to_string()))
    }

    pub fn devices(&self) -> Vec<Device> {
        self.scheduler
            .device_ids()
            .iter()
            .filter_map(|id| self.scheduler.device(id))
            .collect()
    }

    pub fn status(&self, device_id: &str) -> Result<DeviceStatus> {
        self.ensure_known(device_id)?;
        Ok(self.scheduler.status(device_id)?)
    }

    // ========== 状态订阅 ==========

    /// 订阅设备状态，重复订阅会替换之前的订阅
    pub fn monitor_device(&self, device_id: &str, sink: Arc<dyn StatusSink>) -> Result<()> {
        info!(device_id = %device_id, "Starting monitoring for device");
        self.ensure_known(device_id)?;
        self.scheduler.start_monitoring(device_id, sink)?;
        Ok(())
    }

    pub fn stop_monitoring(&self, device_id: &str) -> Result<()> {
        self.ensure_known(device_id)?;
        self.scheduler.stop_monitoring(device_id);
        Ok(())
    }

    // ========== 指令下发 ==========

    /// 下发单条指令，设备未注册时直接返回错误
    ///
    /// 设备 ID 为空的指令交给流水线校验，得到校验失败的结果。
    pub async fn submit_command(&self, command: Command) -> Result<CommandOutcome> {
        if !command.device_id.is_empty() {
            self.ensure_known(&command.device_id)?;
        }
        Ok(self.pipeline.process(&command).await)
    }

    /// 打开一条指令流，按提交顺序逐条返回结果
    pub fn open_command_stream(&self) -> Result<CommandStreamHandle> {
        let guard = self.streams.acquire().ok_or(ServiceError::ShuttingDown)?;
        let directory: Arc<dyn DeviceDirectory> = Arc::new(SchedulerDirectory(self.scheduler.clone()));
        let stream = CommandStream::open(self.pipeline.clone(), Some(directory), COMMAND_STREAM_BUFFER);

        Ok(CommandStreamHandle {
            stream,
            _guard: guard,
        })
    }

    // ========== 传感器数据 ==========

    /// 处理一条传感器读数，返回是否接受
    pub fn process_sensor_reading(&self, reading: &SensorReading) -> bool {
        self.sensors.process(reading)
    }

    /// 处理一批读数
    ///
    /// 每条被拒绝的读数产生一个失败结果，最后追加一个批次完成结果。
    pub fn ingest_sensor_readings<I>(&self, readings: I) -> Vec<CommandOutcome>
    where
        I: IntoIterator<Item = SensorReading>,
    {
        let mut outcomes: Vec<CommandOutcome> = readings
            .into_iter()
            .filter(|reading| !self.sensors.process(reading))
            .map(|reading| CommandOutcome::failure(reading.device_id, "Failed to process sensor data"))
            .collect();

        outcomes.push(CommandOutcome::success("", "Sensor data stream completed"));
        info!("Sensor data stream completed");
        outcomes
    }

    // ========== 关闭 ==========

    /// 停止接受新指令流，中断等待中的指令，再关闭监控调度器
    pub async fn shutdown(&self) -> ShutdownOutcome {
        self.streams.close();
        self.pipeline.shutdown();
        let outcome = self.scheduler.shutdown().await;
        if outcome == ShutdownOutcome::Forced {
            warn!("Fleet service shut down forcibly");
        }
        outcome
    }

    fn ensure_known(&self, device_id: &str) -> Result<()> {
        if self.scheduler.contains(device_id) {
            Ok(())
        } else {
            warn!(device_id = %device_id, "Device not found");
            Err(ServiceError::UnknownDevice(device_id.to_string()))
        }
    }
}

impl Default for FleetService {
    fn default() -> Self {
        Self::new(SchedulerOptions::default())
    }
}

/// 打开的指令流，释放后计入关闭排空
pub struct CommandStreamHandle {
    stream: CommandStream,
    _guard: StreamGuard,
}

impl CommandStreamHandle {
    pub async fn submit(&self, command: Command) -> Result<()> {
        self.stream
            .submit(command)
            .await
            .map_err(|_| ServiceError::ShuttingDown)
    }

    pub async fn next_outcome(&mut self) -> Option<CommandOutcome> {
        self.stream.next_outcome().await
    }

    /// 关闭输入端，剩余指令处理完后输出结束
    pub fn close(self) -> ClosedCommandStream {
        ClosedCommandStream {
            outcomes: self.stream.close(),
            _guard: self._guard,
        }
    }
}

/// 已关闭输入的指令流，守卫随输出一起释放
pub struct ClosedCommandStream {
    outcomes: mpsc::Receiver<CommandOutcome>,
    _guard: StreamGuard,
}

impl ClosedCommandStream {
    pub async fn next_outcome(&mut self) -> Option<CommandOutcome> {
        self.outcomes.recv().await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use fleet_device::ChannelSink;

    #[tokio::test]
    async fn test_register_assigns_uuid() {
        let service = FleetService::default();
        let device = service.register_device("Boiler", "TEMPERATURE_SENSOR").unwrap();

        assert!(Uuid::parse_str(&device.id).is_ok());
        assert_eq!(device.status, DeviceStatus::Online);
        assert_eq!(service.status(&device.id).unwrap(), DeviceStatus::Online);
        assert_eq!(service.devices().len(), 1);
    }

    #[tokio::test]
    async fn test_unknown_device_errors() {
        let service = FleetService::default();
        let (sink, _rx) = ChannelSink::new(4);

        let err = service.monitor_device("ghost", Arc::new(sink)).unwrap_err();
        assert!(matches!(err, ServiceError::UnknownDevice(ref id) if id == "ghost"));
        assert!(service.stop_monitoring("ghost").unwrap_err().is_not_found());
        assert!(service.status("ghost").is_err());
        assert!(service.device("ghost").is_err());
    }

    #[tokio::test(start_paused = true)]
    async fn test_empty_device_id_is_validated() {
        let service = FleetService::default();
        let outcome = service.submit_command(Command::new("", "RESTART")).await.unwrap();
        assert!(!outcome.success);
        assert_eq!(outcome.message, fleet_control::INVALID_COMMAND_MESSAGE);
    }

    #[test]
    fn test_scheduler_options_from_config() {
        let config = MonitorConfig {
            interval_secs: 7,
            max_concurrent_ticks: 1,
            ..Default::default()
        };
        let options = scheduler_options(&config);
        assert_eq!(options.interval, std::time::Duration::from_secs(7));
        assert_eq!(options.max_concurrent_ticks, 2);
        assert!(options.cancel_on_sink_error);
    }

    #[test]
    fn test_sensor_batch_outcomes() {
        let service = FleetService::default();
        let readings = vec![
            SensorReading {
                device_id: "dev-1".to_string(),
                sensor_type: "TEMPERATURE".to_string(),
                value: 21.5,
                timestamp: 1,
            },
            SensorReading {
                device_id: "dev-2".to_string(),
                sensor_type: "HUMIDITY".to_string(),
                value: 140.0,
                timestamp: 1,
            },
        ];

        let outcomes = service.ingest_sensor_readings(readings);
        assert_eq!(outcomes.len(), 2);
        assert_eq!(outcomes[0], CommandOutcome::failure("dev-2", "Failed to process sensor data"));
        assert_eq!(outcomes[1].message, "Sensor data stream completed");
        assert!(outcomes[1].success);
    }
}
