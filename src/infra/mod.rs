//! Infrastructure adapters: trace sinks and the scenario file loader.

pub mod loader;
pub mod sink;

pub use loader::parse_scenario;
pub use sink::{ChannelSink, MemorySink, WriterSink};
