//! Trace sink writing report lines to any `io::Write`.

use std::io::Write;

use crate::core::{SchedulerError, Snapshot, TraceSink};
use crate::report::trace_line;

/// Writes one report trace line per snapshot.
#[derive(Debug)]
pub struct WriterSink<W> {
    out: W,
}

impl<W: Write + Send> WriterSink<W> {
    /// Wrap a writer.
    pub const fn new(out: W) -> Self {
        Self { out }
    }

    /// Unwrap the writer.
    pub fn into_inner(self) -> W {
        self.out
    }
}

impl<W: Write + Send> TraceSink for WriterSink<W> {
    fn append(&mut self, snapshot: &Snapshot) -> Result<(), SchedulerError> {
        writeln!(self.out, "{}", trace_line(snapshot))
            .and_then(|()| self.out.flush())
            .map_err(|e| SchedulerError::Sink(e.to_string()))
    }
}
