use crate::command::ValidatedCommand;
use crate::error::CommandError;
use async_trait::async_trait;

/// 指令通道 trait
///
/// 负责把已校验的指令送达设备并等待其完成
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait CommandChannel: Send + Sync {
    /// 发送指令到设备，返回时设备已执行完毕
    async fn send_command(&self, device_id: &str, command: &ValidatedCommand) -> Result<(), CommandError>;
}
