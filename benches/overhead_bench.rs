//! Instrumentation and analysis cost.
//!
//! Usage:
//!   cargo bench --bench overhead_bench
//!
//! Groups:
//!   record – one BEGIN_TASK/END_TASK pair: disabled, NullWriter, encoded in memory
//!   load   – parse and index an in-memory log of 200 iterations × 8 CPUs
//!   query  – timestamp lookups and window scans on that trace

use criterion::{Criterion, black_box, criterion_group, criterion_main};
use easyview_trace::trace::format::write_event;
use easyview_trace::trace::{
    LoaderConfig, NullWriter, RecorderBuilder, Trace, TraceEvent, TraceRecorder, TraceView,
    TraceWriter, load_trace_from_reader,
};
use std::io::Cursor;

/// Encodes like the file writer but into a buffer that is recycled, so long
/// runs do not fill the disk.
struct EncodeOnlyWriter(Vec<u8>);

impl TraceWriter for EncodeOnlyWriter {
    fn write_event(&mut self, event: &TraceEvent) -> std::io::Result<()> {
        if self.0.len() > 1 << 20 {
            self.0.clear();
        }
        write_event(&mut self.0, event)
    }

    fn flush(&mut self) -> std::io::Result<()> {
        Ok(())
    }
}

const ITERATIONS: i64 = 200;
const CPUS: u32 = 8;
const TASKS_PER_CPU: i64 = 16;

fn synthetic_log() -> Vec<u8> {
    let mut events = vec![
        TraceEvent::SetProcessorCount { count: CPUS },
        TraceEvent::SetDimension { dimension: 1024 },
    ];
    let mut t = 0;
    for _ in 0..ITERATIONS {
        events.push(TraceEvent::BeginIteration {
            timestamp_micros: t,
        });
        for k in 0..TASKS_PER_CPU {
            for cpu in 0..CPUS {
                let start = t + k * 10 + i64::from(cpu);
                events.push(TraceEvent::BeginTask {
                    timestamp_micros: start,
                    processor: cpu,
                });
                events.push(TraceEvent::EndTask {
                    timestamp_micros: start + 8,
                    processor: cpu,
                    x: k as u32 * 32,
                    y: cpu * 32,
                    width: 32,
                    height: 32,
                });
            }
        }
        t += TASKS_PER_CPU * 10 + 20;
        events.push(TraceEvent::EndIteration {
            timestamp_micros: t,
        });
        t += 350;
    }
    let mut bytes = Vec::new();
    for e in &events {
        write_event(&mut bytes, e).unwrap();
    }
    bytes
}

fn bench_record(c: &mut Criterion) {
    let mut group = c.benchmark_group("record");

    let disabled = TraceRecorder::disabled();
    group.bench_function("disabled", |b| {
        b.iter(|| {
            disabled.start_task(black_box(10), 0).unwrap();
            disabled.end_task(black_box(20), 0, 0, 0, 32, 32).unwrap();
        });
    });

    let null = RecorderBuilder::new(1).build(Box::new(NullWriter)).unwrap();
    group.bench_function("null_writer", |b| {
        b.iter(|| {
            null.start_task(black_box(10), 0).unwrap();
            null.end_task(black_box(20), 0, 0, 0, 32, 32).unwrap();
        });
    });

    let encoded = RecorderBuilder::new(1)
        .build(Box::new(EncodeOnlyWriter(Vec::with_capacity(2 << 20))))
        .unwrap();
    group.bench_function("encoded", |b| {
        b.iter(|| {
            encoded.start_task(black_box(10), 0).unwrap();
            encoded.end_task(black_box(20), 0, 0, 0, 32, 32).unwrap();
        });
    });
    group.finish();
}

fn bench_load(c: &mut Criterion) {
    let log = synthetic_log();
    c.bench_function("load/200x8", |b| {
        b.iter(|| {
            let trace =
                load_trace_from_reader(Cursor::new(black_box(&log)), 0, LoaderConfig::default())
                    .unwrap();
            black_box(trace.task_count());
        });
    });
}

fn bench_query(c: &mut Criterion) {
    let trace: Trace =
        load_trace_from_reader(Cursor::new(synthetic_log()), 0, LoaderConfig::default()).unwrap();
    let view = TraceView::raw(&trace);
    let end = view.duration();

    let mut group = c.benchmark_group("query");
    group.bench_function("find_iteration", |b| {
        let mut t = 0;
        b.iter(|| {
            t = (t + 7_919) % end;
            black_box(view.find_iteration(black_box(t)));
        });
    });
    group.bench_function("tasks_in_window", |b| {
        let mut t = 0;
        b.iter(|| {
            t = (t + 7_919) % end;
            let visible: usize = (0..CPUS as usize)
                .map(|cpu| view.tasks_in_window(cpu, t, t + 2_000).count())
                .sum();
            black_box(visible);
        });
    });
    group.finish();
}

criterion_group!(benches, bench_record, bench_load, bench_query);
criterion_main!(benches);
