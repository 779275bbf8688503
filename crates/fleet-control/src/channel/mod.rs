pub mod simulated;
pub mod trait_def;

pub use simulated::SimulatedChannel;
pub use trait_def::CommandChannel;

#[cfg(test)]
pub use trait_def::MockCommandChannel;
