pub mod align;
pub mod analysis;
pub mod config;
pub mod data;
pub mod error;
pub mod events;
pub mod format;
pub mod index;
pub mod loader;
pub mod overhead;
pub mod query;
pub mod recorder;
pub mod writer;

pub use align::{MAX_TRACES, TraceSet, synchronize};
pub use analysis::{
    ProcessorStats, TraceReader, TraceSummary, dump_tasks, print_summary, summarize,
};
pub use config::{
    DEFAULT_FIXED_GAP, LoaderConfig, MAX_PROCESSORS, default_trace_path, rank_trace_path,
};
pub use data::{Iteration, Task, Trace};
pub use error::{Result, TraceError};
pub use events::TraceEvent;
pub use loader::{LoaderState, load_trace, load_trace_from_reader};
pub use overhead::OverheadCorrector;
pub use query::{AlignMode, TraceView};
pub use recorder::{RecorderBuilder, TraceRecorder};
pub use writer::{NullWriter, SimpleBinaryWriter, TraceWriter};
