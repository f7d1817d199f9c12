//! Trace sink backends.

pub mod channel;
pub mod memory;
pub mod writer;

pub use channel::ChannelSink;
pub use memory::MemorySink;
pub use writer::WriterSink;
