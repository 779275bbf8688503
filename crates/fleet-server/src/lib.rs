pub mod app;
pub mod error;
pub mod logging;
pub mod resource;
pub mod sensor;
pub mod service;
pub mod sink;

pub use error::{Result, ServiceError};
pub use resource::FleetResource;
pub use sensor::{SensorProcessor, SensorReading, SensorType};
pub use service::{scheduler_options, ClosedCommandStream, CommandStreamHandle, FleetService};
pub use sink::LoggingSink;
