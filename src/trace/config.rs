use std::path::{Path, PathBuf};

/// Assumed minimal pause between two iterations, in microseconds.
///
/// A heuristic baseline: the overhead corrector never shrinks an inter-iteration
/// gap below this. Override it through [`LoaderConfig::with_fixed_gap`].
pub const DEFAULT_FIXED_GAP: i64 = 200;

/// Largest processor count a log may declare. Every iteration carries one
/// first-task slot per processor, so the count bounds memory per record.
pub const MAX_PROCESSORS: usize = 4096;

pub const DEFAULT_TRACE_DIR: &str = "traces/data";
pub const DEFAULT_TRACE_BASENAME: &str = "ezv_trace_current";
pub const TRACE_EXTENSION: &str = "evt";

/// Options controlling how a log is turned into a [`Trace`](crate::trace::Trace).
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct LoaderConfig {
    /// Baseline inter-iteration pause the corrector preserves.
    pub fixed_gap: i64,
    /// When false, timestamps are kept exactly as recorded.
    pub remove_overhead: bool,
}

impl Default for LoaderConfig {
    fn default() -> Self {
        Self {
            fixed_gap: DEFAULT_FIXED_GAP,
            remove_overhead: true,
        }
    }
}

impl LoaderConfig {
    pub fn with_fixed_gap(mut self, fixed_gap: i64) -> Self {
        self.fixed_gap = fixed_gap;
        self
    }

    pub fn with_remove_overhead(mut self, remove_overhead: bool) -> Self {
        self.remove_overhead = remove_overhead;
        self
    }

    /// Keep raw timestamps.
    pub fn raw() -> Self {
        Self::default().with_remove_overhead(false)
    }
}

/// `traces/data/ezv_trace_current.evt`
pub fn default_trace_path() -> PathBuf {
    Path::new(DEFAULT_TRACE_DIR).join(format!("{DEFAULT_TRACE_BASENAME}.{TRACE_EXTENSION}"))
}

/// Per-rank file name used when several processes record the same run.
pub fn rank_trace_path(dir: impl AsRef<Path>, rank: u32) -> PathBuf {
    dir.as_ref()
        .join(format!("{DEFAULT_TRACE_BASENAME}.{rank}.{TRACE_EXTENSION}"))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_paths() {
        assert_eq!(
            default_trace_path(),
            PathBuf::from("traces/data/ezv_trace_current.evt")
        );
        assert_eq!(
            rank_trace_path("/tmp/run", 3),
            PathBuf::from("/tmp/run/ezv_trace_current.3.evt")
        );
    }

    #[test]
    fn test_loader_config_builders() {
        let cfg = LoaderConfig::default();
        assert_eq!(cfg.fixed_gap, 200);
        assert!(cfg.remove_overhead);

        let cfg = LoaderConfig::default().with_fixed_gap(0);
        assert_eq!(cfg.fixed_gap, 0);
        assert!(!LoaderConfig::raw().remove_overhead);
    }
}
