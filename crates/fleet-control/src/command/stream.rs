use super::executor::CommandPipeline;
use super::model::{Command, CommandOutcome};
use crate::error::CommandError;
use std::sync::Arc;
use tokio::sync::mpsc;
use tracing::{debug, info, warn};

/// 指令流中设备不存在时的结果消息
pub const DEVICE_NOT_FOUND_MESSAGE: &str = "Device not found";

/// 设备目录，用于在执行前确认设备已注册
pub trait DeviceDirectory: Send + Sync {
    fn contains(&self, device_id: &str) -> bool;
}

/// 指令流
///
/// 在独立任务中按提交顺序逐条处理指令，每条指令产生一个结果。
/// 关闭输入端后，处理完剩余指令即结束输出。
pub struct CommandStream {
    commands: mpsc::Sender<Command>,
    outcomes: mpsc::Receiver<CommandOutcome>,
}

impl CommandStream {
    pub fn open(
        pipeline: Arc<CommandPipeline>,
        directory: Option<Arc<dyn DeviceDirectory>>,
        buffer: usize,
    ) -> Self {
        let (command_tx, command_rx) = mpsc::channel(buffer);
        let (outcome_tx, outcome_rx) = mpsc::channel(buffer);

        tokio::spawn(run_stream(pipeline, directory, command_rx, outcome_tx));
        debug!("Command stream opened");

        Self {
            commands: command_tx,
            outcomes: outcome_rx,
        }
    }

    /// 提交指令
    pub async fn submit(&self, command: Command) -> Result<(), CommandError> {
        self.commands
            .send(command)
            .await
            .map_err(|_| CommandError::StreamClosed)
    }

    /// 获取下一个结果，流结束时返回 None
    pub async fn next_outcome(&mut self) -> Option<CommandOutcome> {
        self.outcomes.recv().await
    }

    /// 关闭输入端，返回的接收端会在剩余指令处理完后结束
    pub fn close(self) -> mpsc::Receiver<CommandOutcome> {
        self.outcomes
    }
}

async fn run_stream(
    pipeline: Arc<CommandPipeline>,
    directory: Option<Arc<dyn DeviceDirectory>>,
    mut commands: mpsc::Receiver<Command>,
    outcomes: mpsc::Sender<CommandOutcome>,
) {
    while let Some(command) = commands.recv().await {
        info!(
            device_id = %command.device_id,
            command_type = %command.command_type,
            "Received command"
        );

        let known = directory
            .as_ref()
            .map(|d| d.contains(&command.device_id))
            .unwrap_or(true);

        let outcome = if known {
            pipeline.process(&command).await
        } else {
            warn!(device_id = %command.device_id, "Command for unknown device");
            CommandOutcome::failure(command.device_id.clone(), DEVICE_NOT_FOUND_MESSAGE)
        };

        if outcomes.send(outcome).await.is_err() {
            warn!("Outcome receiver dropped, closing command stream");
            break;
        }
    }

    info!("Command stream completed");
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::command::INVALID_COMMAND_MESSAGE;
    use std::collections::HashSet;

    struct Known(HashSet<String>);

    impl DeviceDirectory for Known {
        fn contains(&self, device_id: &str) -> bool {
            self.0.contains(device_id)
        }
    }

    #[tokio::test(start_paused = true)]
    async fn test_outcomes_in_submission_order() {
        let pipeline = Arc::new(CommandPipeline::simulated());
        let mut stream = CommandStream::open(pipeline, None, 8);

        // 慢指令在前，结果顺序仍与提交顺序一致
        stream
            .submit(Command::new("dev-001", "CALIBRATE").with_param("sensor_type", "ph"))
            .await
            .unwrap();
        stream.submit(Command::new("dev-001", "WAKE")).await.unwrap();
        stream.submit(Command::new("dev-001", "NOPE")).await.unwrap();

        let first = stream.next_outcome().await.unwrap();
        assert_eq!(first.message, "Calibration completed for ph");
        let second = stream.next_outcome().await.unwrap();
        assert_eq!(second.message, "Device woken up");
        let third = stream.next_outcome().await.unwrap();
        assert_eq!(third.message, INVALID_COMMAND_MESSAGE);
    }

    #[tokio::test(start_paused = true)]
    async fn test_unknown_device_soft_outcome() {
        let directory = Arc::new(Known(HashSet::from(["dev-001".to_string()])));
        let pipeline = Arc::new(CommandPipeline::simulated());
        let mut stream = CommandStream::open(pipeline, Some(directory), 8);

        stream.submit(Command::new("ghost", "RESTART")).await.unwrap();
        let outcome = stream.next_outcome().await.unwrap();
        assert!(!outcome.success);
        assert_eq!(outcome.message, DEVICE_NOT_FOUND_MESSAGE);
        assert_eq!(outcome.device_id, "ghost");
    }

    #[tokio::test(start_paused = true)]
    async fn test_closing_input_completes_output() {
        let pipeline = Arc::new(CommandPipeline::simulated());
        let stream = CommandStream::open(pipeline, None, 8);
        stream.submit(Command::new("dev-001", "SLEEP")).await.unwrap();

        let mut outcomes = stream.close();
        assert!(outcomes.recv().await.unwrap().success);
        assert_eq!(outcomes.recv().await, None);
    }
}
