pub mod coordinator;
pub mod resource;
pub mod signal;
pub mod tracker;

pub use coordinator::{ShutdownCoordinator, ShutdownCoordinatorBuilder, ShutdownPhase, ShutdownReport};
pub use resource::{CleanupReport, Resource, ResourceError, ResourceManager};
pub use signal::{ShutdownSignal, SignalHandler};
pub use tracker::{StreamGuard, StreamTracker};
