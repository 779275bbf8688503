/// fleet-device 基本使用示例
///
/// 注册两台设备，订阅状态通知 12 秒后关闭调度器

use fleet_device::{ChannelSink, Device, MonitorScheduler, SchedulerOptions, SinkEvent};
use std::sync::Arc;
use tokio::time::{sleep, Duration};

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    println!("=== Fleet 设备监控示例 ===\n");

    let scheduler = MonitorScheduler::new(SchedulerOptions {
        interval: Duration::from_secs(2),
        ..Default::default()
    });

    scheduler.register(Device::new("sensor-01", "温度传感器", "TEMPERATURE_SENSOR"))?;
    scheduler.register(Device::new("gateway-01", "网关", "GATEWAY"))?;
    println!("✓ 已注册设备: {:?}\n", scheduler.device_ids());

    let (sink, mut rx) = ChannelSink::new(64);
    let sink = Arc::new(sink);
    scheduler.start_monitoring("sensor-01", sink.clone())?;
    scheduler.start_monitoring("gateway-01", sink)?;

    let printer = tokio::spawn(async move {
        while let Some(event) = rx.recv().await {
            match event {
                SinkEvent::Status(n) => {
                    println!("[{}] {} {:<11} {}", n.timestamp, n.device_id, n.status.as_str(), n.message)
                }
                SinkEvent::Error(e) => println!("✗ 推送失败: {}", e),
            }
        }
    });

    sleep(Duration::from_secs(12)).await;

    let outcome = scheduler.shutdown().await;
    println!("\n✓ 调度器已关闭: {:?}", outcome);

    drop(scheduler);
    printer.await?;

    Ok(())
}
