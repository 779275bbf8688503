pub mod channel;
pub mod command;
pub mod error;

pub use channel::{CommandChannel, SimulatedChannel};
pub use command::{
    validate, Command, CommandOutcome, CommandPipeline, CommandStream, CommandType,
    DeviceDirectory, ValidatedCommand, ValidationError, DEVICE_NOT_FOUND_MESSAGE,
    INVALID_COMMAND_MESSAGE,
};
pub use error::CommandError;
