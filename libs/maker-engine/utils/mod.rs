//! Process utilities for the engine binary

pub mod heartbeat;
pub mod shutdown;

pub use heartbeat::Heartbeat;
pub use shutdown::ShutdownManager;
