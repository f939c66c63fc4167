use crate::trace::events::TraceEvent;
use crate::trace::format::{self, Record};
use crate::trace::query::TraceView;
use serde::Serialize;
use std::fs::File;
use std::io::{BufReader, Result, Write};
use std::path::Path;

/// Record-level reader over a trace file, for tools that want the raw log
/// rather than a reconstructed [`Trace`](crate::trace::Trace).
pub struct TraceReader {
    reader: BufReader<File>,
    scratch: Vec<u8>,
    skipped_records: usize,
}

impl TraceReader {
    pub fn new(path: impl AsRef<Path>) -> Result<Self> {
        let file = File::open(path)?;
        Ok(Self {
            reader: BufReader::new(file),
            scratch: Vec::new(),
            skipped_records: 0,
        })
    }

    /// Next known record; unknown opcodes are skipped and counted.
    pub fn read_event(&mut self) -> Result<Option<TraceEvent>> {
        loop {
            match format::read_record(&mut self.reader, &mut self.scratch)? {
                Some(Record::Event(event)) => return Ok(Some(event)),
                Some(Record::Unknown {
                    opcode,
                    payload_len,
                }) => {
                    tracing::warn!(payload_len, "skipping unknown trace record {opcode:#x}");
                    self.skipped_records += 1;
                }
                None => return Ok(None),
            }
        }
    }

    pub fn read_all(&mut self) -> Result<Vec<TraceEvent>> {
        let mut events = Vec::new();
        while let Some(event) = self.read_event()? {
            events.push(event);
        }
        Ok(events)
    }

    pub fn skipped_records(&self) -> usize {
        self.skipped_records
    }
}

#[derive(Debug, Default, Clone, PartialEq, Serialize)]
pub struct ProcessorStats {
    pub task_count: usize,
    pub busy_time: i64,
    pub longest_task: i64,
    /// Busy time over the summed iteration durations, in `[0, 1]` for a
    /// well-formed trace.
    pub utilization: f64,
}

#[derive(Debug, Clone, Serialize)]
pub struct TraceSummary {
    pub id: usize,
    pub label: String,
    pub dimension: u32,
    pub iterations: usize,
    pub processors: usize,
    pub duration: i64,
    pub mean_iteration_duration: f64,
    pub truncated: bool,
    pub processor_stats: Vec<ProcessorStats>,
}

/// Per-processor statistics of a trace, read under the view's align mode.
pub fn summarize(view: TraceView<'_>) -> TraceSummary {
    let trace = view.trace();
    let iterations = trace.iteration_count();
    let active_time: i64 = trace.iterations().iter().map(|it| it.duration()).sum();

    let processor_stats = trace
        .chains()
        .iter()
        .map(|chain| {
            let mut stats = ProcessorStats::default();
            for task in chain {
                let d = task.duration();
                stats.task_count += 1;
                stats.busy_time += d;
                stats.longest_task = stats.longest_task.max(d);
            }
            stats.utilization = if active_time > 0 {
                stats.busy_time as f64 / active_time as f64
            } else {
                0.0
            };
            stats
        })
        .collect();

    TraceSummary {
        id: trace.id(),
        label: trace.label().to_string(),
        dimension: trace.dimension(),
        iterations,
        processors: trace.processor_count(),
        duration: view.duration(),
        mean_iteration_duration: if iterations > 0 {
            active_time as f64 / iterations as f64
        } else {
            0.0
        },
        truncated: trace.is_truncated(),
        processor_stats,
    }
}

pub fn print_summary(summary: &TraceSummary) {
    println!("\n=== Trace #{} \"{}\" ===", summary.id, summary.label);
    println!(
        "{} iterations on {} CPUs, dimension {}",
        summary.iterations, summary.processors, summary.dimension
    );
    println!("Duration: {:.3}ms", summary.duration as f64 / 1000.0);
    println!(
        "Mean iteration: {:.1}µs",
        summary.mean_iteration_duration
    );
    if summary.truncated {
        println!("WARNING: trace is truncated");
    }

    println!("\n=== Processor Statistics ===");
    for (cpu, stats) in summary.processor_stats.iter().enumerate() {
        println!("\nCPU {cpu}:");
        println!("  Tasks: {}", stats.task_count);
        println!("  Busy: {:.3}ms", stats.busy_time as f64 / 1000.0);
        println!(
            "  Avg task: {:.1}µs",
            if stats.task_count > 0 {
                stats.busy_time as f64 / stats.task_count as f64
            } else {
                0.0
            }
        );
        println!("  Longest task: {}µs", stats.longest_task);
        println!("  Utilization: {:.1}%", stats.utilization * 100.0);
    }
}

/// Write every iteration and, per processor, the tasks it ran, resuming each
/// scan from the iteration's first-task index.
pub fn dump_tasks(view: TraceView<'_>, out: &mut impl Write) -> Result<()> {
    let trace = view.trace();
    for i in 0..trace.iteration_count() {
        let Some((start, end, gap)) = view.iteration_bounds(i) else {
            break;
        };
        writeln!(out, "iteration {i}: [{start}, {end}] gap {gap}")?;
        for cpu in 0..trace.processor_count() {
            let mut tasks = view.tasks_in_iteration(cpu, i).peekable();
            if tasks.peek().is_none() {
                continue;
            }
            write!(out, "  cpu {cpu}:")?;
            for task in tasks {
                write!(
                    out,
                    " [{}, {}] ({},{} {}x{})",
                    view.task_start(task),
                    view.task_end(task),
                    task.x,
                    task.y,
                    task.width,
                    task.height
                )?;
            }
            writeln!(out)?;
        }
    }
    Ok(())
}
