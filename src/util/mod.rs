//! Shared utilities.

pub mod clock;
pub mod telemetry;

pub use clock::{Clock, SharedClock, SystemClock, VirtualClock};
pub use telemetry::init_tracing;
