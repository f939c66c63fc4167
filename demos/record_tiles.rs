//! Record a synthetic tiled kernel: worker threads pull tiles from a shared
//! counter, one iteration at a time, and log each tile to a trace file.
//!
//! ```bash
//! cargo run --example record_tiles -- --workers 4 --iterations 5 out.evt
//! cargo run --example summarize_trace -- out.evt
//! ```

use clap::Parser;
use easyview_trace::trace::{RecorderBuilder, TraceRecorder, default_trace_path};
use std::path::PathBuf;
use std::sync::atomic::{AtomicU32, Ordering};
use std::time::Duration;
use tracing_subscriber::EnvFilter;

#[derive(Parser)]
#[command(about = "Record a synthetic tiled computation")]
struct Args {
    #[arg(help = "Output trace file")]
    output: Option<PathBuf>,

    #[arg(long, default_value = "4", help = "Number of worker threads")]
    workers: u32,

    #[arg(long, default_value = "3", help = "Number of iterations")]
    iterations: u32,

    #[arg(long, default_value = "256", help = "Image side, in pixels")]
    dim: u32,

    #[arg(long, default_value = "64", help = "Tile side, in pixels")]
    tile: u32,

    #[arg(long, default_value = "synthetic", help = "Trace label")]
    label: String,
}

fn main() -> Result<(), Box<dyn std::error::Error>> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .init();

    let args = Args::parse();
    let path = args.output.unwrap_or_else(default_trace_path);
    let rec = TraceRecorder::create(
        &path,
        RecorderBuilder::new(args.workers)
            .with_dimension(args.dim)
            .with_label(args.label),
    )?;

    let tiles_per_row = args.dim.div_ceil(args.tile);
    let tile_count = tiles_per_row * tiles_per_row;

    for iteration in 0..args.iterations {
        rec.start_iteration(rec.now_micros())?;
        let next = AtomicU32::new(0);
        std::thread::scope(|s| -> std::io::Result<()> {
            let handles: Vec<_> = (0..args.workers)
                .map(|cpu| {
                    let (rec, next) = (&rec, &next);
                    s.spawn(move || -> std::io::Result<()> {
                        loop {
                            let tile = next.fetch_add(1, Ordering::Relaxed);
                            if tile >= tile_count {
                                return Ok(());
                            }
                            let x = (tile % tiles_per_row) * args.tile;
                            let y = (tile / tiles_per_row) * args.tile;
                            rec.start_task(rec.now_micros(), cpu)?;
                            // Uneven work: tiles far from the diagonal cost more.
                            let cost = 50 + 10 * u64::from(x.abs_diff(y) / args.tile)
                                + u64::from(iteration);
                            std::thread::sleep(Duration::from_micros(cost));
                            rec.end_task(rec.now_micros(), cpu, x, y, args.tile, args.tile)?;
                        }
                    })
                })
                .collect();
            for h in handles {
                h.join().map_err(|_| std::io::Error::other("worker panicked"))??;
            }
            Ok(())
        })?;
        rec.end_iteration(rec.now_micros())?;
    }
    rec.finish()?;

    tracing::info!(
        path = %path.display(),
        iterations = args.iterations,
        workers = args.workers,
        "trace recorded"
    );
    Ok(())
}
