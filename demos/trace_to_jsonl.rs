//! Dump every record of a trace file as one JSON object per line.

use easyview_trace::trace::{TraceReader, default_trace_path};
use std::io::Write;
use std::path::PathBuf;
use tracing_subscriber::EnvFilter;

fn main() -> Result<(), Box<dyn std::error::Error>> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env())
        .with_writer(std::io::stderr)
        .init();

    let path = std::env::args()
        .nth(1)
        .map(PathBuf::from)
        .unwrap_or_else(default_trace_path);

    let mut reader = TraceReader::new(&path)?;
    let stdout = std::io::stdout();
    let mut out = stdout.lock();
    let mut count = 0usize;
    while let Some(event) = reader.read_event()? {
        serde_json::to_writer(&mut out, &event)?;
        writeln!(out)?;
        count += 1;
    }
    tracing::info!(
        records = count,
        skipped = reader.skipped_records(),
        path = %path.display(),
        "done"
    );
    Ok(())
}
