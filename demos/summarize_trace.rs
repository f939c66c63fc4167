//! Load one or two trace files and print per-processor statistics.
//!
//! ```bash
//! cargo run --example summarize_trace -- a.evt b.evt --align
//! RUST_LOG=debug cargo run --example summarize_trace -- --dump
//! ```

use clap::Parser;
use easyview_trace::trace::{
    AlignMode, DEFAULT_FIXED_GAP, LoaderConfig, TraceSet, default_trace_path, dump_tasks,
    print_summary, summarize,
};
use std::path::PathBuf;
use tracing_subscriber::EnvFilter;

#[derive(Parser)]
#[command(about = "Summarize one trace, or compare two on an aligned timeline")]
struct Args {
    #[arg(help = "Trace files (at most two); defaults to traces/data/ezv_trace_current.evt")]
    traces: Vec<PathBuf>,

    #[arg(long, help = "Read iterations on the synchronized timeline")]
    align: bool,

    #[arg(long, help = "Keep recorded timestamps instead of removing overhead")]
    raw: bool,

    #[arg(long, default_value_t = DEFAULT_FIXED_GAP, help = "Pause kept between iterations, in µs")]
    fixed_gap: i64,

    #[arg(long, help = "Print every task, iteration by iteration")]
    dump: bool,

    #[arg(long, help = "Print summaries as JSON")]
    json: bool,
}

fn main() -> Result<(), Box<dyn std::error::Error>> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .with_writer(std::io::stderr)
        .init();

    let args = Args::parse();
    let paths = if args.traces.is_empty() {
        vec![default_trace_path()]
    } else {
        args.traces
    };
    let config = LoaderConfig::default()
        .with_fixed_gap(args.fixed_gap)
        .with_remove_overhead(!args.raw);

    let mut set = TraceSet::new();
    for path in &paths {
        set.load(path, config)?;
    }
    set.set_align_mode(if args.align {
        AlignMode::Aligned
    } else {
        AlignMode::Raw
    });

    let stdout = std::io::stdout();
    for i in 0..set.len() {
        let Some(view) = set.view(i) else { continue };
        let summary = summarize(view);
        if args.json {
            println!("{}", serde_json::to_string_pretty(&summary)?);
        } else {
            print_summary(&summary);
        }
        if args.dump {
            dump_tasks(view, &mut stdout.lock())?;
        }
    }

    if set.len() == 2 && !args.json {
        println!(
            "\nLongest run: {:.3}ms ({:?} timeline)",
            set.max_duration() as f64 / 1000.0,
            set.align_mode()
        );
    }
    Ok(())
}
