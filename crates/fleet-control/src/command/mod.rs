pub mod executor;
pub mod model;
pub mod stream;
pub mod validator;

pub use executor::{CommandPipeline, INVALID_COMMAND_MESSAGE};
pub use model::{Command, CommandOutcome, CommandType, ValidatedCommand};
pub use stream::{CommandStream, DeviceDirectory, DEVICE_NOT_FOUND_MESSAGE};
pub use validator::{validate, ValidationError};
