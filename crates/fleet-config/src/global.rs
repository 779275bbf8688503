use serde::{Deserialize, Serialize};
use std::time::Duration;

/// 全局配置
#[derive(Debug, Clone, Default, Deserialize, Serialize, PartialEq)]
#[serde(default)]
pub struct FleetConfig {
    pub system: SystemConfig,
    pub monitor: MonitorConfig,
    pub logging: LoggingConfig,
    pub demo: DemoConfig,
}

/// 系统配置
#[derive(Debug, Clone, Deserialize, Serialize, PartialEq)]
#[serde(default)]
pub struct SystemConfig {
    pub name: String,
}

impl Default for SystemConfig {
    fn default() -> Self {
        Self {
            name: "Fleet Control Plane".to_string(),
        }
    }
}

/// 监控配置
#[derive(Debug, Clone, Deserialize, Serialize, PartialEq)]
#[serde(default)]
pub struct MonitorConfig {
    /// 监控周期（秒）
    pub interval_secs: u64,
    /// 同时执行的监控周期上限，小于 2 时按 2 处理
    pub max_concurrent_ticks: usize,
    /// 维护间隔（秒）
    pub maintenance_interval_secs: u64,
    /// 关闭宽限期（秒）
    pub shutdown_grace_secs: u64,
    /// 推送失败后取消监控任务
    pub cancel_on_sink_error: bool,
}

impl Default for MonitorConfig {
    fn default() -> Self {
        Self {
            interval_secs: 5,
            max_concurrent_ticks: 2,
            maintenance_interval_secs: 24 * 60 * 60,
            shutdown_grace_secs: 5,
            cancel_on_sink_error: true,
        }
    }
}

impl MonitorConfig {
    pub fn interval(&self) -> Duration {
        Duration::from_secs(self.interval_secs)
    }

    pub fn maintenance_interval(&self) -> Duration {
        Duration::from_secs(self.maintenance_interval_secs)
    }

    pub fn shutdown_grace(&self) -> Duration {
        Duration::from_secs(self.shutdown_grace_secs)
    }

    pub fn worker_count(&self) -> usize {
        self.max_concurrent_ticks.max(2)
    }
}

/// 日志配置
#[derive(Debug, Clone, Deserialize, Serialize, PartialEq)]
#[serde(default)]
pub struct LoggingConfig {
    /// 默认日志级别，RUST_LOG 优先
    pub level: String,
    /// 输出 JSON 格式
    pub json: bool,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: "info".to_string(),
            json: false,
        }
    }
}

/// 启动时预注册的演示设备
#[derive(Debug, Clone, Default, Deserialize, Serialize, PartialEq)]
#[serde(default)]
pub struct DemoConfig {
    pub devices: Vec<DemoDevice>,
}

#[derive(Debug, Clone, Deserialize, Serialize, PartialEq)]
pub struct DemoDevice {
    pub name: String,
    pub device_type: String,
}

impl FleetConfig {
    /// 序列化为 TOML，用于生成示例配置文件
    pub fn to_toml_string(&self) -> anyhow::Result<String> {
        Ok(toml::to_string_pretty(self)?)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_config() {
        let config = FleetConfig::default();
        assert_eq!(config.system.name, "Fleet Control Plane");
        assert_eq!(config.monitor.interval(), Duration::from_secs(5));
        assert_eq!(config.monitor.maintenance_interval(), Duration::from_secs(86_400));
        assert!(config.monitor.cancel_on_sink_error);
        assert!(config.demo.devices.is_empty());
    }

    #[test]
    fn test_worker_count_minimum() {
        let config = MonitorConfig {
            max_concurrent_ticks: 0,
            ..Default::default()
        };
        assert_eq!(config.worker_count(), 2);
    }

    #[test]
    fn test_toml_roundtrip_keeps_sections() {
        let toml = FleetConfig::default().to_toml_string().unwrap();
        assert!(toml.contains("[monitor]"));
        assert!(toml.contains("interval_secs = 5"));
    }
}
