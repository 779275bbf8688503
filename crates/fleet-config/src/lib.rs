pub mod global;
pub mod loader;

pub use global::{DemoConfig, DemoDevice, FleetConfig, LoggingConfig, MonitorConfig, SystemConfig};
pub use loader::ConfigLoader;
