use crate::trace::events::TraceEvent;
use crate::trace::format;
use std::fs::{self, File};
use std::io::{BufWriter, Write};
use std::path::Path;

/// Sink for encoded trace records.
pub trait TraceWriter: Send {
    fn write_event(&mut self, event: &TraceEvent) -> std::io::Result<()>;
    fn write_batch(&mut self, events: &[TraceEvent]) -> std::io::Result<()> {
        for event in events {
            self.write_event(event)?;
        }
        Ok(())
    }
    fn flush(&mut self) -> std::io::Result<()>;
}

/// Writes records to one append-only file through a `BufWriter`.
pub struct SimpleBinaryWriter {
    writer: BufWriter<File>,
    bytes_written: u64,
}

impl SimpleBinaryWriter {
    /// Creates (or truncates) `path`, creating missing parent directories.
    pub fn new(path: impl AsRef<Path>) -> std::io::Result<Self> {
        let path = path.as_ref();
        if let Some(parent) = path.parent()
            && !parent.as_os_str().is_empty()
        {
            fs::create_dir_all(parent)?;
        }
        let file = File::create(path)?;
        Ok(Self {
            writer: BufWriter::new(file),
            bytes_written: 0,
        })
    }

    /// Number of bytes handed to the buffer so far.
    pub fn bytes_written(&self) -> u64 {
        self.bytes_written
    }
}

impl TraceWriter for SimpleBinaryWriter {
    fn write_event(&mut self, event: &TraceEvent) -> std::io::Result<()> {
        format::write_event(&mut self.writer, event)?;
        self.bytes_written += format::wire_event_size(event) as u64;
        Ok(())
    }

    fn flush(&mut self) -> std::io::Result<()> {
        self.writer.flush()
    }
}

/// A writer that discards all events. Useful for benchmarking instrumentation
/// overhead without I/O costs.
pub struct NullWriter;

impl TraceWriter for NullWriter {
    fn write_event(&mut self, _event: &TraceEvent) -> std::io::Result<()> {
        Ok(())
    }
    fn write_batch(&mut self, _events: &[TraceEvent]) -> std::io::Result<()> {
        Ok(())
    }
    fn flush(&mut self) -> std::io::Result<()> {
        Ok(())
    }
}
