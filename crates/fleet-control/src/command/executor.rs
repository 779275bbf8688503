use super::model::{Command, CommandOutcome, ValidatedCommand};
use super::validator::validate;
use crate::channel::{CommandChannel, SimulatedChannel};
use crate::error::CommandError;
use std::sync::Arc;
use tokio_util::sync::CancellationToken;
use tracing::{debug, error, info, warn};

/// 校验失败时返回的消息
pub const INVALID_COMMAND_MESSAGE: &str = "Invalid command or parameters";

/// 指令处理流水线
///
/// 校验 -> 投递（含模拟耗时）-> 生成结果。校验和执行失败都转换为
/// `success = false` 的结果，不会向调用方抛出错误。
pub struct CommandPipeline {
    /// 指令通道
    channel: Arc<dyn CommandChannel>,

    shutdown: CancellationToken,
}

impl CommandPipeline {
    pub fn new(channel: Arc<dyn CommandChannel>) -> Self {
        Self {
            channel,
            shutdown: CancellationToken::new(),
        }
    }

    /// 使用模拟通道，关闭流水线时会中断正在等待的指令
    pub fn simulated() -> Self {
        let shutdown = CancellationToken::new();
        Self {
            channel: Arc::new(SimulatedChannel::with_shutdown(shutdown.clone())),
            shutdown,
        }
    }

    /// 处理一条指令
    pub async fn process(&self, command: &Command) -> CommandOutcome {
        let device_id = command.device_id.clone();

        let validated = match validate(command) {
            Ok(validated) => validated,
            Err(e) => {
                warn!(
                    device_id = %device_id,
                    command_type = %command.command_type,
                    reason = %e,
                    "Rejected invalid command"
                );
                return CommandOutcome::failure(device_id, INVALID_COMMAND_MESSAGE);
            }
        };

        info!(
            device_id = %device_id,
            command_type = %validated.command_type(),
            "Executing command"
        );

        match self.execute(&device_id, validated).await {
            Ok(message) => {
                debug!(device_id = %device_id, message = %message, "Command completed");
                CommandOutcome::success(device_id, message)
            }
            Err(e) => {
                error!(device_id = %device_id, error = %e, "Error executing command");
                CommandOutcome::failure(device_id, format!("Command execution failed: {}", e))
            }
        }
    }

    /// 在独立任务中执行，任务 panic 也只影响本条指令
    async fn execute(&self, device_id: &str, command: ValidatedCommand) -> Result<String, CommandError> {
        let channel = self.channel.clone();
        let device_id = device_id.to_string();

        let handle = tokio::spawn(async move {
            channel.send_command(&device_id, &command).await?;
            Ok::<_, CommandError>(command.result_message())
        });

        match handle.await {
            Ok(result) => result,
            Err(join_error) => Err(CommandError::Delivery(anyhow::anyhow!(join_error.to_string()))),
        }
    }

    /// 中断所有等待中的模拟指令
    pub fn shutdown(&self) {
        self.shutdown.cancel();
    }
}

impl Default for CommandPipeline {
    fn default() -> Self {
        Self::simulated()
    }
}
