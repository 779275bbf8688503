use thiserror::Error;

/// 指令执行错误
#[derive(Debug, Error)]
pub enum CommandError {
    /// 执行过程中被中断（如关闭）
    #[error("Command execution interrupted")]
    Interrupted,

    /// 设备通道投递失败
    #[error("{0}")]
    Delivery(#[from] anyhow::Error),

    /// 指令流已关闭
    #[error("command stream is closed")]
    StreamClosed,
}
