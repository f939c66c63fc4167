//! Turns a recorded log into a [`Trace`].
//!
//! Loading is a single forward pass. All scratch state for that pass lives in
//! [`LoaderState`], so several files can be loaded at once from different
//! threads.

use crate::trace::config::{LoaderConfig, MAX_PROCESSORS};
use crate::trace::data::{Task, Trace};
use crate::trace::error::{Result, TraceError};
use crate::trace::events::TraceEvent;
use crate::trace::format::{self, Record};
use crate::trace::overhead::OverheadCorrector;
use std::fs::File;
use std::io::{BufReader, ErrorKind, Read};
use std::path::Path;

/// Ingestion state for one log.
pub struct LoaderState {
    trace: Trace,
    corrector: OverheadCorrector,
    /// Number of END_ITERATION records seen so far.
    current_iteration: usize,
    open_iteration: bool,
    /// Raw BEGIN_TASK timestamp pending per processor.
    last_start: Vec<Option<i64>>,
    skipped_records: usize,
}

impl LoaderState {
    pub fn new(id: usize, config: LoaderConfig) -> Self {
        Self {
            trace: Trace::new(id),
            corrector: OverheadCorrector::new(&config),
            current_iteration: 0,
            open_iteration: false,
            last_start: Vec::new(),
            skipped_records: 0,
        }
    }

    /// Fold one record into the trace under construction.
    pub fn ingest(&mut self, event: &TraceEvent) -> Result<()> {
        match event {
            TraceEvent::SetProcessorCount { count } => {
                if self.trace.processor_count_declared().is_some() {
                    return Err(TraceError::ProcessorCountAlreadySet);
                }
                if *count as usize > MAX_PROCESSORS {
                    return Err(TraceError::TooManyProcessors {
                        count: *count,
                        max: MAX_PROCESSORS,
                    });
                }
                let count = *count as usize;
                tracing::debug!(count, "processor count");
                self.trace.set_processor_count(count);
                self.last_start = vec![None; count];
            }
            TraceEvent::SetDimension { dimension } => {
                tracing::debug!(dimension, "dimension");
                self.trace.set_dimension(*dimension);
            }
            TraceEvent::SetLabel { label } => {
                tracing::debug!(label = %label, "label");
                self.trace.set_label(label.clone());
            }
            TraceEvent::BeginIteration { timestamp_micros } => {
                self.require_processor_count(event)?;
                if self.open_iteration {
                    return Err(TraceError::IterationAlreadyOpen {
                        index: self.current_iteration,
                    });
                }
                let start = self.corrector.begin_iteration(*timestamp_micros);
                self.trace.push_iteration(start);
                self.open_iteration = true;
            }
            TraceEvent::EndIteration { timestamp_micros } => {
                if !self.open_iteration {
                    return Err(TraceError::NoOpenIteration {
                        event: event.name(),
                    });
                }
                let end = self.corrector.end_iteration(*timestamp_micros);
                self.trace.iterations_mut()[self.current_iteration].end_time = end;
                self.open_iteration = false;
                self.current_iteration += 1;
            }
            TraceEvent::BeginTask {
                timestamp_micros,
                processor,
            } => {
                let p = self.tile_processor(event, *processor)?;
                self.last_start[p] = Some(*timestamp_micros);
            }
            TraceEvent::EndTask {
                timestamp_micros,
                processor,
                x,
                y,
                width,
                height,
            } => {
                let p = self.tile_processor(event, *processor)?;
                let Some(raw_start) = self.last_start[p].take() else {
                    return Err(TraceError::UnmatchedTaskEnd {
                        processor: *processor,
                    });
                };
                // Both ends use the offset current now, like the iteration bounds.
                self.trace.push_task(Task {
                    start_time: self.corrector.shift(raw_start),
                    end_time: self.corrector.shift(*timestamp_micros),
                    x: *x,
                    y: *y,
                    width: *width,
                    height: *height,
                    iteration: self.current_iteration,
                    processor: p,
                });
            }
        }
        Ok(())
    }

    fn require_processor_count(&self, event: &TraceEvent) -> Result<usize> {
        self.trace
            .processor_count_declared()
            .ok_or(TraceError::ProcessorCountUnset {
                event: event.name(),
            })
    }

    /// Validate a tile record and return its processor index.
    fn tile_processor(&self, event: &TraceEvent, processor: u32) -> Result<usize> {
        let count = self.require_processor_count(event)?;
        if processor as usize >= count {
            return Err(TraceError::ProcessorOutOfRange { processor, count });
        }
        if !self.open_iteration {
            return Err(TraceError::NoOpenIteration {
                event: event.name(),
            });
        }
        Ok(processor as usize)
    }

    pub(crate) fn skip_unknown(&mut self, opcode: u16, payload_len: u16) {
        self.skipped_records += 1;
        tracing::warn!(payload_len, "skipping unknown trace record {opcode:#x}");
    }

    /// The log stopped in the middle of a record.
    pub fn mark_truncated(&mut self) {
        self.trace.set_truncated();
    }

    /// Records that were skipped because their opcode is unknown.
    pub fn skipped_records(&self) -> usize {
        self.skipped_records
    }

    /// Close any iteration left open, back-fill the index and hand out the trace.
    pub fn finish(mut self) -> Trace {
        if self.open_iteration {
            let index = self.current_iteration;
            let latest_task_end = self
                .trace
                .chains()
                .iter()
                .filter_map(|chain| chain.last())
                .filter(|task| task.iteration == index)
                .map(|task| task.end_time)
                .max();
            let it = &mut self.trace.iterations_mut()[index];
            it.end_time = latest_task_end.unwrap_or(it.start_time).max(it.start_time);
            self.trace.set_truncated();
        }
        self.trace.no_more_data();
        self.trace
    }
}

/// Load a trace file. When the log carries no label, the file name (without
/// extension) is used.
pub fn load_trace(path: impl AsRef<Path>, id: usize, config: LoaderConfig) -> Result<Trace> {
    let path = path.as_ref();
    let file = File::open(path).map_err(|source| TraceError::Open {
        path: path.to_path_buf(),
        source,
    })?;
    let mut trace = load_trace_from_reader(BufReader::new(file), id, config)?;
    if trace.label().is_empty()
        && let Some(stem) = path.file_stem()
    {
        trace.set_label(stem.to_string_lossy().into_owned());
    }
    tracing::info!(
        id = trace.id(),
        label = %trace.label(),
        iterations = trace.iteration_count(),
        processors = trace.processor_count(),
        path = %path.display(),
        "trace loaded"
    );
    Ok(trace)
}

/// Load a trace from any byte stream.
pub fn load_trace_from_reader(
    mut reader: impl Read,
    id: usize,
    config: LoaderConfig,
) -> Result<Trace> {
    let mut state = LoaderState::new(id, config);
    let mut scratch = Vec::new();
    loop {
        match format::read_record(&mut reader, &mut scratch) {
            Ok(Some(Record::Event(event))) => state.ingest(&event)?,
            Ok(Some(Record::Unknown {
                opcode,
                payload_len,
            })) => state.skip_unknown(opcode, payload_len),
            Ok(None) => break,
            Err(e) if e.kind() == ErrorKind::UnexpectedEof => {
                state.mark_truncated();
                break;
            }
            Err(e) => return Err(e.into()),
        }
    }
    let trace = state.finish();
    if trace.is_truncated() {
        tracing::warn!(
            id = trace.id(),
            iterations = trace.iteration_count(),
            "trace stops before a clean end; keeping the complete prefix"
        );
    }
    Ok(trace)
}
