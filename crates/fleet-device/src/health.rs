use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use serde::{Deserialize, Serialize};
use std::time::Duration;
use tokio::time::Instant;

/// 默认维护间隔（24 小时）
pub const DEFAULT_MAINTENANCE_INTERVAL: Duration = Duration::from_secs(24 * 60 * 60);

/// CPU / 内存告警阈值（百分比）
pub const USAGE_THRESHOLD: f64 = 90.0;

/// 一次健康检查的结果
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct HealthReading {
    pub reachable: bool,
    pub cpu_usage: f64,
    pub memory_usage: f64,
    pub needs_maintenance: bool,
    pub message: String,
}

impl HealthReading {
    /// 根据各项指标构造读数，消息按优先级自动生成
    pub fn new(reachable: bool, cpu_usage: f64, memory_usage: f64, needs_maintenance: bool) -> Self {
        let message = describe(reachable, cpu_usage, memory_usage, needs_maintenance);
        Self {
            reachable,
            cpu_usage,
            memory_usage,
            needs_maintenance,
            message,
        }
    }
}

fn describe(reachable: bool, cpu: f64, memory: f64, maintenance: bool) -> String {
    if !reachable {
        return "Device is unreachable".to_string();
    }
    if cpu > USAGE_THRESHOLD {
        return format!("High CPU usage: {:.1}%", cpu);
    }
    if memory > USAGE_THRESHOLD {
        return format!("High memory usage: {:.1}%", memory);
    }
    if maintenance {
        return "Routine maintenance required".to_string();
    }
    "Device operating normally".to_string()
}

/// 健康采样器
///
/// 生成模拟健康读数。唯一的跨调用状态是维护时钟：
/// 距上次维护确认超过维护间隔时报告需要维护，并同时重置时钟。
pub struct HealthSampler<R = StdRng> {
    rng: R,
    maintenance_interval: Duration,
    last_maintenance: Instant,
}

impl HealthSampler<StdRng> {
    pub fn new() -> Self {
        Self::with_rng(StdRng::from_entropy())
    }
}

impl Default for HealthSampler<StdRng> {
    fn default() -> Self {
        Self::new()
    }
}

impl<R: Rng> HealthSampler<R> {
    pub fn with_rng(rng: R) -> Self {
        Self {
            rng,
            maintenance_interval: DEFAULT_MAINTENANCE_INTERVAL,
            last_maintenance: Instant::now(),
        }
    }

    pub fn with_maintenance_interval(mut self, interval: Duration) -> Self {
        self.maintenance_interval = interval;
        self
    }

    /// 采样一次
    pub fn sample(&mut self) -> HealthReading {
        // 1% 概率不可达
        let reachable = self.rng.gen_bool(0.99);
        let cpu_usage = self.rng.gen_range(40.0..100.0);
        let memory_usage = self.rng.gen_range(30.0..100.0);

        let needs_maintenance = self.last_maintenance.elapsed() > self.maintenance_interval;
        if needs_maintenance {
            self.last_maintenance = Instant::now();
        }

        HealthReading::new(reachable, cpu_usage, memory_usage, needs_maintenance)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn seeded() -> HealthSampler<StdRng> {
        HealthSampler::with_rng(StdRng::seed_from_u64(42))
    }

    #[test]
    fn test_sample_ranges() {
        let mut sampler = seeded();
        for _ in 0..1000 {
            let reading = sampler.sample();
            assert!((40.0..100.0).contains(&reading.cpu_usage));
            assert!((30.0..100.0).contains(&reading.memory_usage));
            assert!(!reading.needs_maintenance);
        }
    }

    #[test]
    fn test_mostly_reachable() {
        let mut sampler = seeded();
        let unreachable = (0..10_000).filter(|_| !sampler.sample().reachable).count();
        // 期望约 100 次
        assert!(unreachable > 20 && unreachable < 300, "unreachable = {}", unreachable);
    }

    #[test]
    fn test_message_precedence() {
        assert_eq!(HealthReading::new(false, 99.0, 99.0, true).message, "Device is unreachable");
        assert_eq!(HealthReading::new(true, 95.0, 99.0, true).message, "High CPU usage: 95.0%");
        assert_eq!(HealthReading::new(true, 50.0, 92.3, true).message, "High memory usage: 92.3%");
        assert_eq!(HealthReading::new(true, 50.0, 50.0, true).message, "Routine maintenance required");
        assert_eq!(HealthReading::new(true, 90.0, 90.0, false).message, "Device operating normally");
    }

    #[tokio::test(start_paused = true)]
    async fn test_maintenance_clock_resets() {
        let mut sampler = seeded().with_maintenance_interval(Duration::from_secs(60));
        assert!(!sampler.sample().needs_maintenance);

        tokio::time::advance(Duration::from_secs(61)).await;
        assert!(sampler.sample().needs_maintenance);

        // 已确认，时钟重置
        assert!(!sampler.sample().needs_maintenance);

        tokio::time::advance(Duration::from_secs(30)).await;
        assert!(!sampler.sample().needs_maintenance);
    }
}
