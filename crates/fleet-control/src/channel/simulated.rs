use super::trait_def::CommandChannel;
use crate::command::ValidatedCommand;
use crate::error::CommandError;
use async_trait::async_trait;
use tokio_util::sync::CancellationToken;
use tracing::{debug, info};

/// 模拟通道
///
/// 按指令类型等待固定的设备往返耗时，关闭时中断等待
#[derive(Clone, Default)]
pub struct SimulatedChannel {
    shutdown: CancellationToken,
}

impl SimulatedChannel {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_shutdown(shutdown: CancellationToken) -> Self {
        Self { shutdown }
    }
}

#[async_trait]
impl CommandChannel for SimulatedChannel {
    async fn send_command(&self, device_id: &str, command: &ValidatedCommand) -> Result<(), CommandError> {
        let latency = command.command_type().simulated_latency();
        debug!(device_id = %device_id, latency = ?latency, "Simulating device round trip");

        tokio::select! {
            _ = self.shutdown.cancelled() => return Err(CommandError::Interrupted),
            _ = tokio::time::sleep(latency) => {}
        }

        match command {
            ValidatedCommand::Restart => info!(device_id = %device_id, "Executing restart command"),
            ValidatedCommand::Calibrate { sensor_type } => {
                info!(device_id = %device_id, sensor_type = %sensor_type, "Calibrating sensor")
            }
            ValidatedCommand::UpdateInterval { interval, .. } => {
                info!(device_id = %device_id, interval, "Updating sampling interval")
            }
            ValidatedCommand::Sleep => info!(device_id = %device_id, "Executing sleep command"),
            ValidatedCommand::Wake => info!(device_id = %device_id, "Executing wake command"),
            ValidatedCommand::SetConfig { key, value } => {
                info!(device_id = %device_id, key = %key, value = %value, "Setting config")
            }
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tokio::time::{Duration, Instant};

    #[tokio::test(start_paused = true)]
    async fn test_latency_per_command() {
        let channel = SimulatedChannel::new();

        let start = Instant::now();
        channel.send_command("dev-001", &ValidatedCommand::Restart).await.unwrap();
        let elapsed = start.elapsed();
        assert!(elapsed >= Duration::from_millis(2000) && elapsed < Duration::from_millis(2100));

        let start = Instant::now();
        let cmd = ValidatedCommand::Calibrate {
            sensor_type: "thermal".to_string(),
        };
        channel.send_command("dev-001", &cmd).await.unwrap();
        let elapsed = start.elapsed();
        assert!(elapsed >= Duration::from_millis(5000) && elapsed < Duration::from_millis(5100));
    }

    #[tokio::test(start_paused = true)]
    async fn test_interrupted_by_shutdown() {
        let token = CancellationToken::new();
        let channel = SimulatedChannel::with_shutdown(token.clone());

        let task = tokio::spawn(async move { channel.send_command("dev-001", &ValidatedCommand::Sleep).await });
        tokio::time::sleep(Duration::from_millis(100)).await;
        token.cancel();

        let result = task.await.unwrap();
        assert!(matches!(result, Err(CommandError::Interrupted)));
    }
}
