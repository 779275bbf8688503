use crate::health::{HealthReading, HealthSampler, USAGE_THRESHOLD};
use crate::{Device, DeviceStatus};
use parking_lot::Mutex;
use std::sync::atomic::{AtomicBool, AtomicU8, Ordering};
use tracing::info;

/// 根据健康读数计算设备状态
///
/// 按优先级依次判断：不可达 > 资源过载 > 需要维护 > 在线
pub fn determine_status(health: &HealthReading) -> DeviceStatus {
    if !health.reachable {
        return DeviceStatus::Offline;
    }
    if health.cpu_usage > USAGE_THRESHOLD || health.memory_usage > USAGE_THRESHOLD {
        return DeviceStatus::Error;
    }
    if health.needs_maintenance {
        return DeviceStatus::Maintenance;
    }
    DeviceStatus::Online
}

/// 单个设备的运行时状态
///
/// 状态与监控标志均为原子字段，可被查询路径和监控任务并发读写。
pub struct DeviceState {
    device: Device,
    status: AtomicU8,
    monitoring: AtomicBool,
    sampler: Mutex<HealthSampler>,
    // 同一设备的监控周期互斥执行
    tick_lock: tokio::sync::Mutex<()>,
}

impl DeviceState {
    pub fn new(device: Device) -> Self {
        Self::with_sampler(device, HealthSampler::new())
    }

    pub fn with_sampler(device: Device, sampler: HealthSampler) -> Self {
        let status = AtomicU8::new(device.status as u8);
        Self {
            device,
            status,
            monitoring: AtomicBool::new(false),
            sampler: Mutex::new(sampler),
            tick_lock: tokio::sync::Mutex::new(()),
        }
    }

    pub fn device(&self) -> &Device {
        &self.device
    }

    pub fn device_id(&self) -> &str {
        &self.device.id
    }

    pub fn current_status(&self) -> DeviceStatus {
        DeviceStatus::from_u8(self.status.load(Ordering::Acquire))
    }

    /// 更新状态（幂等，不做校验）
    pub fn update_status(&self, status: DeviceStatus) {
        self.status.store(status as u8, Ordering::Release);
        info!(device_id = %self.device.id, status = %status, "Device status updated");
    }

    /// 仅在状态变化时写入，返回是否发生了变化
    pub fn apply_status(&self, status: DeviceStatus) -> bool {
        let previous = self.status.swap(status as u8, Ordering::AcqRel);
        if previous == status as u8 {
            return false;
        }
        info!(
            device_id = %self.device.id,
            old_status = %DeviceStatus::from_u8(previous),
            new_status = %status,
            "Device status changed"
        );
        true
    }

    pub fn set_monitoring(&self, monitoring: bool) {
        self.monitoring.store(monitoring, Ordering::Release);
    }

    pub fn is_monitoring(&self) -> bool {
        self.monitoring.load(Ordering::Acquire)
    }

    pub(crate) async fn begin_tick(&self) -> tokio::sync::MutexGuard<'_, ()> {
        self.tick_lock.lock().await
    }

    /// 执行一次健康检查
    pub fn check_health(&self) -> HealthReading {
        self.sampler.lock().sample()
    }
}
