pub mod error;
pub mod health;
pub mod model;
pub mod monitor;
pub mod sink;
pub mod state;

pub use error::{DeviceError, Result, SinkError};
pub use health::{HealthReading, HealthSampler};
pub use model::{Device, DeviceStatus, StatusNotification};
pub use monitor::{MonitorScheduler, SchedulerOptions, ShutdownOutcome};
pub use sink::{ChannelSink, SinkEvent, StatusSink};
pub use state::{determine_status, DeviceState};
