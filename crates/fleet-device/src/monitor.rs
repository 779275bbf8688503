use crate::health::{HealthSampler, DEFAULT_MAINTENANCE_INTERVAL};
use crate::sink::StatusSink;
use crate::state::{determine_status, DeviceState};
use crate::{Device, DeviceError, DeviceStatus, Result, StatusNotification};
use dashmap::mapref::entry::Entry;
use dashmap::DashMap;
use parking_lot::Mutex;
use std::collections::HashMap;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::Semaphore;
use tokio::task::JoinHandle;
use tokio::time::{interval, timeout, MissedTickBehavior};
use tokio_util::sync::CancellationToken;
use tokio_util::task::TaskTracker;
use tracing::{debug, error, info, warn};

/// 监控调度参数
#[derive(Debug, Clone)]
pub struct SchedulerOptions {
    /// 监控周期
    pub interval: Duration,

    /// 同时执行的监控周期上限（至少为 2）
    pub max_concurrent_ticks: usize,

    /// 关闭时等待任务退出的宽限期
    pub shutdown_grace: Duration,

    /// 推送失败后是否取消该设备的监控任务
    pub cancel_on_sink_error: bool,

    /// 新注册设备的维护间隔
    pub maintenance_interval: Duration,
}

impl Default for SchedulerOptions {
    fn default() -> Self {
        Self {
            interval: Duration::from_secs(5),
            max_concurrent_ticks: 2,
            shutdown_grace: Duration::from_secs(5),
            cancel_on_sink_error: true,
            maintenance_interval: DEFAULT_MAINTENANCE_INTERVAL,
        }
    }
}

/// 关闭结果
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ShutdownOutcome {
    /// 所有任务在宽限期内退出
    Graceful,
    /// 超时后强制终止
    Forced,
}

struct MonitorTask {
    generation: u64,
    token: CancellationToken,
    handle: JoinHandle<()>,
}

type TaskTable = Arc<Mutex<HashMap<String, MonitorTask>>>;

/// 设备监控调度器
///
/// 持有设备注册表和每个设备的周期监控任务。
/// 每个设备最多只有一个活动任务，重复启动会替换旧任务。
pub struct MonitorScheduler {
    devices: DashMap<String, Arc<DeviceState>>,
    tasks: TaskTable,
    tick_permits: Arc<Semaphore>,
    tracker: TaskTracker,
    shutdown: CancellationToken,
    generation: AtomicU64,
    options: SchedulerOptions,
}

impl MonitorScheduler {
    pub fn new(options: SchedulerOptions) -> Self {
        let permits = options.max_concurrent_ticks.max(2);
        info!(
            interval = ?options.interval,
            max_concurrent_ticks = permits,
            "Monitor scheduler created"
        );

        Self {
            devices: DashMap::new(),
            tasks: Arc::new(Mutex::new(HashMap::new())),
            tick_permits: Arc::new(Semaphore::new(permits)),
            tracker: TaskTracker::new(),
            shutdown: CancellationToken::new(),
            generation: AtomicU64::new(0),
            options,
        }
    }

    pub fn options(&self) -> &SchedulerOptions {
        &self.options
    }

    // ========== 设备注册 ==========

    /// 注册设备
    ///
    /// # 错误
    /// * `AlreadyExists` - 设备 ID 已被注册
    pub fn register(&self, device: Device) -> Result<Arc<DeviceState>> {
        let sampler = HealthSampler::new().with_maintenance_interval(self.options.maintenance_interval);
        self.register_state(DeviceState::with_sampler(device, sampler))
    }

    /// 注册一个已构造好的设备状态
    pub fn register_state(&self, state: DeviceState) -> Result<Arc<DeviceState>> {
        match self.devices.entry(state.device_id().to_string()) {
            Entry::Occupied(entry) => Err(DeviceError::AlreadyExists(entry.key().clone())),
            Entry::Vacant(entry) => {
                let state = Arc::new(state);
                info!(device_id = %state.device_id(), "Device registered in scheduler");
                entry.insert(state.clone());
                Ok(state)
            }
        }
    }

    pub fn contains(&self, device_id: &str) -> bool {
        self.devices.contains_key(device_id)
    }

    pub fn device_state(&self, device_id: &str) -> Option<Arc<DeviceState>> {
        self.devices.get(device_id).map(|entry| entry.value().clone())
    }

    pub fn device(&self, device_id: &str) -> Option<Device> {
        self.devices.get(device_id).map(|entry| entry.device().clone())
    }

    pub fn device_ids(&self) -> Vec<String> {
        self.devices.iter().map(|entry| entry.key().clone()).collect()
    }

    // ========== 状态查询 ==========

    pub fn status(&self, device_id: &str) -> Result<DeviceStatus> {
        Ok(self.lookup(device_id)?.current_status())
    }

    /// 手动覆盖设备状态
    pub fn override_status(&self, device_id: &str, status: DeviceStatus) -> Result<()> {
        self.lookup(device_id)?.update_status(status);
        Ok(())
    }

    pub fn is_monitoring(&self, device_id: &str) -> Result<bool> {
        Ok(self.lookup(device_id)?.is_monitoring())
    }

    /// 当前活动的监控任务数量
    pub fn active_task_count(&self) -> usize {
        self.tasks.lock().len()
    }

    // ========== 监控任务 ==========

    /// 启动设备监控
    ///
    /// 已有任务时先取消旧任务（不等待正在执行的周期结束），再安装新任务。
    /// 新任务立即执行第一个周期，之后按固定间隔执行。
    ///
    /// # 错误
    /// * `NotFound` - 设备不存在
    /// * `Scheduling` - 调度器已关闭或不在运行时内
    pub fn start_monitoring(&self, device_id: &str, sink: Arc<dyn StatusSink>) -> Result<()> {
        let state = self.lookup(device_id)?;

        if self.shutdown.is_cancelled() {
            return Err(DeviceError::scheduling("monitor scheduler is shut down"));
        }
        let runtime = tokio::runtime::Handle::try_current()
            .map_err(|e| DeviceError::scheduling(e.to_string()))?;

        let generation = self.generation.fetch_add(1, Ordering::Relaxed);
        let token = self.shutdown.child_token();

        let ctx = TickContext {
            state: state.clone(),
            sink,
            token: token.clone(),
            permits: self.tick_permits.clone(),
            tasks: self.tasks.clone(),
            generation,
            period: self.options.interval,
            cancel_on_sink_error: self.options.cancel_on_sink_error,
        };

        // 持锁完成替换，保证并发启动时只留下一个任务
        let mut tasks = self.tasks.lock();
        let handle = self.tracker.spawn_on(run_monitor_loop(ctx), &runtime);
        let previous = tasks.insert(
            device_id.to_string(),
            MonitorTask {
                generation,
                token,
                handle,
            },
        );
        if let Some(previous) = previous {
            previous.token.cancel();
            debug!(device_id = %device_id, "Superseded previous monitoring task");
        }
        state.set_monitoring(true);
        drop(tasks);

        info!(device_id = %device_id, "Started monitoring device");
        Ok(())
    }

    /// 停止设备监控，没有任务时什么也不做
    pub fn stop_monitoring(&self, device_id: &str) {
        let mut tasks = self.tasks.lock();
        if let Some(task) = tasks.remove(device_id) {
            task.token.cancel();
            if let Some(state) = self.device_state(device_id) {
                state.set_monitoring(false);
            }
            drop(tasks);
            info!(device_id = %device_id, "Stopped monitoring device");
        }
    }

    /// 关闭调度器
    ///
    /// 取消所有任务并在宽限期内等待退出，超时则强制终止。
    pub async fn shutdown(&self) -> ShutdownOutcome {
        let drained: Vec<(String, MonitorTask)> = self.tasks.lock().drain().collect();
        info!(tasks = drained.len(), "Shutting down monitor scheduler");

        self.shutdown.cancel();
        self.tick_permits.close();
        self.tracker.close();

        for (device_id, _) in &drained {
            if let Some(state) = self.device_state(device_id) {
                state.set_monitoring(false);
            }
        }

        match timeout(self.options.shutdown_grace, self.tracker.wait()).await {
            Ok(()) => {
                info!("Monitor scheduler stopped");
                ShutdownOutcome::Graceful
            }
            Err(_) => {
                warn!(
                    grace = ?self.options.shutdown_grace,
                    "Monitoring tasks did not stop in time, aborting"
                );
                for (_, task) in drained {
                    task.handle.abort();
                }
                ShutdownOutcome::Forced
            }
        }
    }

    fn lookup(&self, device_id: &str) -> Result<Arc<DeviceState>> {
        self.device_state(device_id)
            .ok_or_else(|| DeviceError::NotFound(device_id.to_string()))
    }
}

impl Default for MonitorScheduler {
    fn default() -> Self {
        Self::new(SchedulerOptions::default())
    }
}

struct TickContext {
    state: Arc<DeviceState>,
    sink: Arc<dyn StatusSink>,
    token: CancellationToken,
    permits: Arc<Semaphore>,
    tasks: TaskTable,
    generation: u64,
    period: Duration,
    cancel_on_sink_error: bool,
}

async fn run_monitor_loop(ctx: TickContext) {
    let device_id = ctx.state.device_id().to_string();
    let mut ticker = interval(ctx.period);
    ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);
    let mut last_timestamp = 0i64;

    loop {
        tokio::select! {
            biased;
            _ = ctx.token.cancelled() => break,
            _ = ticker.tick() => {}
        }

        let permit = tokio::select! {
            biased;
            _ = ctx.token.cancelled() => break,
            permit = ctx.permits.clone().acquire_owned() => match permit {
                Ok(permit) => permit,
                Err(_) => break,
            },
        };

        let guard = ctx.state.begin_tick().await;
        // 等锁期间可能已被替换
        if ctx.token.is_cancelled() {
            break;
        }
        let notification = tick(&ctx.state, &mut last_timestamp);
        drop(guard);
        drop(permit);

        // 推送不占用并发名额，订阅方阻塞时仍可被取消
        let status = notification.status;
        let result = tokio::select! {
            biased;
            _ = ctx.token.cancelled() => break,
            result = ctx.sink.send(notification) => result,
        };

        match result {
            Ok(()) => debug!(device_id = %device_id, status = %status, "Sent status update"),
            Err(e) => {
                error!(device_id = %device_id, error = %e, "Error sending status update");
                tokio::select! {
                    biased;
                    _ = ctx.token.cancelled() => break,
                    _ = ctx.sink.fail(e.to_string()) => {}
                }

                if ctx.cancel_on_sink_error {
                    ctx.token.cancel();
                    retire(&ctx, &device_id);
                    break;
                }
            }
        }
    }

    debug!(device_id = %device_id, generation = ctx.generation, "Monitoring task exited");
}

/// 执行一次健康检查并更新状态，返回待推送的通知
fn tick(state: &DeviceState, last_timestamp: &mut i64) -> StatusNotification {
    let health = state.check_health();
    let status = determine_status(&health);

    if status != state.current_status() {
        state.apply_status(status);
    }

    let mut notification = StatusNotification::new(state.device_id(), status, health.message);
    // 同一设备的时间戳单调不减
    notification.timestamp = notification.timestamp.max(*last_timestamp);
    *last_timestamp = notification.timestamp;
    notification
}

/// 推送失败后从任务表中移除自身（仅当仍是当前任务时）
fn retire(ctx: &TickContext, device_id: &str) {
    let mut tasks = ctx.tasks.lock();
    let current = tasks
        .get(device_id)
        .map(|task| task.generation == ctx.generation)
        .unwrap_or(false);
    if current {
        tasks.remove(device_id);
        ctx.state.set_monitoring(false);
        warn!(device_id = %device_id, "Monitoring cancelled after sink failure");
    }
}
