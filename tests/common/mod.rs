#![allow(dead_code)]

use easyview_trace::trace::{TraceEvent, TraceRecorder, TraceWriter};
use std::sync::{Arc, Mutex};

/// A [`TraceWriter`] that accumulates all events into a shared `Vec`.
///
/// ```rust,ignore
/// let (writer, events) = CapturingWriter::new();
/// let rec = RecorderBuilder::new(2).build(Box::new(writer))?;
/// let captured = events.lock().unwrap();
/// ```
pub struct CapturingWriter(Arc<Mutex<Vec<TraceEvent>>>);

impl CapturingWriter {
    /// Create a new writer and return a handle to the shared event buffer.
    pub fn new() -> (Self, Arc<Mutex<Vec<TraceEvent>>>) {
        let events = Arc::new(Mutex::new(Vec::new()));
        (Self(events.clone()), events)
    }
}

impl TraceWriter for CapturingWriter {
    fn write_event(&mut self, event: &TraceEvent) -> std::io::Result<()> {
        self.0.lock().unwrap().push(event.clone());
        Ok(())
    }

    fn write_batch(&mut self, events: &[TraceEvent]) -> std::io::Result<()> {
        self.0.lock().unwrap().extend_from_slice(events);
        Ok(())
    }

    fn flush(&mut self) -> std::io::Result<()> {
        Ok(())
    }
}

/// Shape of one synthetic task: processor, offset from iteration start,
/// duration, tile.
#[derive(Debug, Clone, Copy)]
pub struct TaskSpec {
    pub processor: u32,
    pub offset: i64,
    pub duration: i64,
    pub tile: (u32, u32, u32, u32),
}

/// Record iterations back to back on `rec` with explicit timestamps.
///
/// Iteration `i` starts at `origin + i * period` and lasts `iteration_len`;
/// tasks of one processor must not overlap within an iteration.
pub fn record_iterations(
    rec: &TraceRecorder,
    origin: i64,
    period: i64,
    iteration_len: i64,
    iterations: &[Vec<TaskSpec>],
) {
    for (i, tasks) in iterations.iter().enumerate() {
        let start = origin + i as i64 * period;
        rec.start_iteration(start).unwrap();
        for t in tasks {
            let (x, y, w, h) = t.tile;
            rec.start_task(start + t.offset, t.processor).unwrap();
            rec.end_task(start + t.offset + t.duration, t.processor, x, y, w, h)
                .unwrap();
        }
        rec.end_iteration(start + iteration_len).unwrap();
    }
}
