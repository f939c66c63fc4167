use crate::trace::events::TraceEvent;
use crate::trace::writer::{NullWriter, SimpleBinaryWriter, TraceWriter};
use std::io;
use std::path::Path;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};
use std::time::Instant;

/// State shared by every clone of a [`TraceRecorder`].
///
/// The enabled flag is read without the lock so a disabled recorder costs one
/// relaxed load per call. Appends go through the mutex: records from different
/// worker threads may interleave, but each record lands whole.
struct SharedState {
    enabled: AtomicBool,
    start_time: Instant,
    writer: Mutex<Box<dyn TraceWriter>>,
}

impl SharedState {
    fn writer(&self) -> MutexGuard<'_, Box<dyn TraceWriter>> {
        // A panic while holding the lock leaves at most one record half-buffered;
        // keep recording rather than poisoning every worker thread.
        self.writer.lock().unwrap_or_else(PoisonError::into_inner)
    }

    fn record(&self, event: TraceEvent) -> io::Result<()> {
        if !self.enabled.load(Ordering::Relaxed) {
            return Ok(());
        }
        self.writer().write_event(&event)
    }
}

impl Drop for SharedState {
    fn drop(&mut self) {
        if let Err(e) = self.writer().flush() {
            tracing::warn!(error = %e, "failed to flush trace on drop");
        }
    }
}

/// Appends instrumentation records for one run.
///
/// Only timeline records can be appended here: the processor count, dimension
/// and label are written once by [`RecorderBuilder::build`]. Cheap to clone; all clones write to the same log. The last clone to be
/// dropped flushes the writer.
#[derive(Clone)]
pub struct TraceRecorder {
    shared: Arc<SharedState>,
}

impl TraceRecorder {
    /// Opens `path` (creating parent directories) and writes the setup records
    /// described by `builder`.
    pub fn create(path: impl AsRef<Path>, builder: RecorderBuilder) -> io::Result<Self> {
        let writer = SimpleBinaryWriter::new(path)?;
        builder.build(Box::new(writer))
    }

    /// A recorder that never records and never touches a file.
    pub fn disabled() -> Self {
        Self::with_writer(Box::new(NullWriter), false)
    }

    fn with_writer(writer: Box<dyn TraceWriter>, enabled: bool) -> Self {
        Self {
            shared: Arc::new(SharedState {
                enabled: AtomicBool::new(enabled),
                start_time: Instant::now(),
                writer: Mutex::new(writer),
            }),
        }
    }

    /// Start recording instrumentation calls.
    pub fn enable(&self) {
        self.shared.enabled.store(true, Ordering::Relaxed);
    }

    /// Stop recording and flush what has been buffered so far.
    pub fn disable(&self) -> io::Result<()> {
        self.shared.enabled.store(false, Ordering::Relaxed);
        self.finish()
    }

    pub fn is_enabled(&self) -> bool {
        self.shared.enabled.load(Ordering::Relaxed)
    }

    /// Monotonic microseconds since this recorder was created.
    pub fn now_micros(&self) -> i64 {
        self.shared.start_time.elapsed().as_micros() as i64
    }

    pub fn start_iteration(&self, timestamp_micros: i64) -> io::Result<()> {
        self.shared
            .record(TraceEvent::BeginIteration { timestamp_micros })
    }

    pub fn end_iteration(&self, timestamp_micros: i64) -> io::Result<()> {
        self.shared.record(TraceEvent::EndIteration { timestamp_micros })
    }

    pub fn start_task(&self, timestamp_micros: i64, processor: u32) -> io::Result<()> {
        self.shared.record(TraceEvent::BeginTask {
            timestamp_micros,
            processor,
        })
    }

    pub fn end_task(
        &self,
        timestamp_micros: i64,
        processor: u32,
        x: u32,
        y: u32,
        width: u32,
        height: u32,
    ) -> io::Result<()> {
        self.shared.record(TraceEvent::EndTask {
            timestamp_micros,
            processor,
            x,
            y,
            width,
            height,
        })
    }

    /// Flush buffered records to the underlying file.
    pub fn finish(&self) -> io::Result<()> {
        self.shared.writer().flush()
    }
}

/// One-time description of the run, written before any timeline record.
#[derive(Debug, Clone)]
pub struct RecorderBuilder {
    processor_count: u32,
    dimension: u32,
    label: Option<String>,
    enabled: bool,
}

impl RecorderBuilder {
    pub fn new(processor_count: u32) -> Self {
        Self {
            processor_count,
            dimension: 0,
            label: None,
            enabled: true,
        }
    }

    /// Side of the (square) image the kernel computes.
    pub fn with_dimension(mut self, dimension: u32) -> Self {
        self.dimension = dimension;
        self
    }

    pub fn with_label(mut self, label: impl Into<String>) -> Self {
        self.label = Some(label.into());
        self
    }

    /// Whether instrumentation calls record from the start. Setup records
    /// are written either way so the log stays loadable after a later
    /// [`TraceRecorder::enable`].
    pub fn with_enabled(mut self, enabled: bool) -> Self {
        self.enabled = enabled;
        self
    }

    pub fn build(self, mut writer: Box<dyn TraceWriter>) -> io::Result<TraceRecorder> {
        writer.write_event(&TraceEvent::SetProcessorCount {
            count: self.processor_count,
        })?;
        writer.write_event(&TraceEvent::SetDimension {
            dimension: self.dimension,
        })?;
        if let Some(label) = self.label {
            writer.write_event(&TraceEvent::SetLabel { label })?;
        }
        Ok(TraceRecorder::with_writer(writer, self.enabled))
    }
}
