//! Iteration-by-iteration alignment of two runs.
//!
//! For every iteration both runs share, the run that finished the iteration
//! sooner is held back by the difference (its `gap`), and every later iteration
//! of that run is shifted by the accumulated holds (its `correction`). Read in
//! [`AlignMode::Aligned`], iteration `i` then starts at the same instant in
//! both runs, provided the runs start together.
//!
//! Equal durations put the zero gap on the second trace.

use crate::trace::config::LoaderConfig;
use crate::trace::data::Trace;
use crate::trace::error::{Result, TraceError};
use crate::trace::loader::load_trace;
use crate::trace::query::{AlignMode, TraceView};
use std::path::Path;

pub const MAX_TRACES: usize = 2;

/// Compute corrections and gaps for `a` and `b`. Previous alignment values
/// are discarded first, so calling this twice gives the same result.
pub fn synchronize(a: &mut Trace, b: &mut Trace) {
    reset(a);
    reset(b);

    let shared = a.iteration_count().min(b.iteration_count());
    let (its_a, its_b) = (a.iterations_mut(), b.iterations_mut());
    let (mut cur_a, mut cur_b) = (0i64, 0i64);

    for (ia, ib) in its_a.iter_mut().zip(its_b.iter_mut()) {
        ia.correction = cur_a;
        ib.correction = cur_b;
        let (da, db) = (ia.duration(), ib.duration());
        if da < db {
            ia.gap = db - da;
            cur_a += ia.gap;
        } else {
            ib.gap = da - db;
            cur_b += ib.gap;
        }
    }

    // Iterations only one run has keep the last correction.
    for it in &mut its_a[shared..] {
        it.correction = cur_a;
    }
    for it in &mut its_b[shared..] {
        it.correction = cur_b;
    }
}

fn reset(trace: &mut Trace) {
    for it in trace.iterations_mut() {
        it.correction = 0;
        it.gap = 0;
    }
}

/// The traces under comparison, numbered by load order, and the align mode
/// they are read with.
#[derive(Debug, Default)]
pub struct TraceSet {
    traces: Vec<Trace>,
    align_mode: AlignMode,
}

impl TraceSet {
    pub fn new() -> Self {
        Self::default()
    }

    /// Load `path` as the next trace and re-synchronize.
    pub fn load(&mut self, path: impl AsRef<Path>, config: LoaderConfig) -> Result<usize> {
        self.check_capacity()?;
        let trace = load_trace(path, self.traces.len(), config)?;
        self.push(trace)
    }

    /// Add an already loaded trace and re-synchronize. Returns its position.
    pub fn push(&mut self, trace: Trace) -> Result<usize> {
        self.check_capacity()?;
        self.traces.push(trace);
        self.synchronize();
        Ok(self.traces.len() - 1)
    }

    fn check_capacity(&self) -> Result<()> {
        if self.traces.len() >= MAX_TRACES {
            return Err(TraceError::TooManyTraces { max: MAX_TRACES });
        }
        Ok(())
    }

    /// Align the loaded traces. A single trace has nothing to align against:
    /// align mode is switched on and its corrections stay at zero.
    pub fn synchronize(&mut self) {
        match self.traces.as_mut_slice() {
            [a, b] => synchronize(a, b),
            [only] => {
                reset(only);
                self.align_mode = AlignMode::Aligned;
            }
            _ => {}
        }
    }

    pub fn len(&self) -> usize {
        self.traces.len()
    }

    pub fn is_empty(&self) -> bool {
        self.traces.is_empty()
    }

    pub fn get(&self, index: usize) -> Option<&Trace> {
        self.traces.get(index)
    }

    pub fn traces(&self) -> &[Trace] {
        &self.traces
    }

    pub fn align_mode(&self) -> AlignMode {
        self.align_mode
    }

    pub fn set_align_mode(&mut self, mode: AlignMode) {
        self.align_mode = mode;
    }

    pub fn toggle_align_mode(&mut self) -> AlignMode {
        self.align_mode = self.align_mode.toggled();
        self.align_mode
    }

    /// Trace `index` read under the current align mode.
    pub fn view(&self, index: usize) -> Option<TraceView<'_>> {
        self.traces
            .get(index)
            .map(|trace| TraceView::new(trace, self.align_mode))
    }

    /// Longest effective duration among the loaded traces.
    pub fn max_duration(&self) -> i64 {
        (0..self.len())
            .filter_map(|i| self.view(i))
            .map(|v| v.duration())
            .max()
            .unwrap_or(0)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::trace::events::TraceEvent;
    use crate::trace::loader::LoaderState;

    /// Raw trace with one iteration per duration, 200 apart.
    fn trace_with_durations(id: usize, durations: &[i64]) -> Trace {
        let mut state = LoaderState::new(id, LoaderConfig::raw());
        state
            .ingest(&TraceEvent::SetProcessorCount { count: 1 })
            .unwrap();
        let mut t = 0;
        for d in durations {
            state
                .ingest(&TraceEvent::BeginIteration {
                    timestamp_micros: t,
                })
                .unwrap();
            state
                .ingest(&TraceEvent::EndIteration {
                    timestamp_micros: t + d,
                })
                .unwrap();
            t += d + 200;
        }
        state.finish()
    }

    fn gaps(trace: &Trace) -> Vec<i64> {
        trace.iterations().iter().map(|it| it.gap).collect()
    }

    fn corrections(trace: &Trace) -> Vec<i64> {
        trace.iterations().iter().map(|it| it.correction).collect()
    }

    #[test]
    fn test_shorter_iteration_gets_the_gap() {
        let mut a = trace_with_durations(0, &[10, 10, 10]);
        let mut b = trace_with_durations(1, &[12, 8, 15]);
        synchronize(&mut a, &mut b);

        assert_eq!(gaps(&a), vec![2, 0, 5]);
        assert_eq!(gaps(&b), vec![0, 2, 0]);
        assert_eq!(corrections(&a), vec![0, 2, 2]);
        assert_eq!(corrections(&b), vec![0, 0, 2]);
    }

    #[test]
    fn test_equal_durations_tie_goes_to_second_trace() {
        let mut a = trace_with_durations(0, &[10]);
        let mut b = trace_with_durations(1, &[10]);
        synchronize(&mut a, &mut b);
        assert_eq!(gaps(&a), vec![0]);
        assert_eq!(gaps(&b), vec![0]);

        // Argument order only matters on ties.
        let mut a = trace_with_durations(0, &[10, 7]);
        let mut b = trace_with_durations(1, &[10, 9]);
        synchronize(&mut b, &mut a);
        assert_eq!(gaps(&a), vec![0, 2]);
        assert_eq!(gaps(&b), vec![0, 0]);
    }

    #[test]
    fn test_extra_iterations_carry_final_correction() {
        let mut a = trace_with_durations(0, &[10, 10, 10, 10, 10]);
        let mut b = trace_with_durations(1, &[15, 20]);
        synchronize(&mut a, &mut b);
        assert_eq!(corrections(&a), vec![0, 5, 15, 15, 15]);
        assert_eq!(gaps(&a), vec![5, 10, 0, 0, 0]);
        assert_eq!(corrections(&b), vec![0, 0]);
    }

    #[test]
    fn test_aligned_iterations_start_together() {
        let mut a = trace_with_durations(0, &[10, 30, 10]);
        let mut b = trace_with_durations(1, &[25, 5, 40]);
        synchronize(&mut a, &mut b);
        let (va, vb) = (
            TraceView::new(&a, AlignMode::Aligned),
            TraceView::new(&b, AlignMode::Aligned),
        );
        for i in 0..3 {
            assert_eq!(va.iteration_end(i), vb.iteration_end(i), "iteration {i}");
        }
        for i in 1..3 {
            assert_eq!(va.iteration_start(i), vb.iteration_start(i), "iteration {i}");
        }
    }

    #[test]
    fn test_synchronize_is_idempotent() {
        let mut a = trace_with_durations(0, &[10, 10]);
        let mut b = trace_with_durations(1, &[12, 8]);
        synchronize(&mut a, &mut b);
        let (ga, ca) = (gaps(&a), corrections(&a));
        synchronize(&mut a, &mut b);
        assert_eq!(gaps(&a), ga);
        assert_eq!(corrections(&a), ca);
    }

    #[test]
    fn test_empty_trace_is_a_noop() {
        let mut a = Trace::new(0);
        let mut b = trace_with_durations(1, &[10, 10]);
        synchronize(&mut a, &mut b);
        assert_eq!(corrections(&b), vec![0, 0]);
        assert_eq!(gaps(&b), vec![0, 0]);
    }

    #[test]
    fn test_trace_set_single_trace_turns_align_on() {
        let mut set = TraceSet::new();
        assert_eq!(set.align_mode(), AlignMode::Raw);
        set.push(trace_with_durations(0, &[10, 20])).unwrap();
        assert_eq!(set.align_mode(), AlignMode::Aligned);
        assert_eq!(gaps(set.get(0).unwrap()), vec![0, 0]);
    }

    #[test]
    fn test_trace_set_capacity_and_modes() {
        let mut set = TraceSet::new();
        set.push(trace_with_durations(0, &[10, 10, 10])).unwrap();
        assert_eq!(set.push(trace_with_durations(1, &[12, 8, 15])).unwrap(), 1);
        assert!(matches!(
            set.push(Trace::new(2)),
            Err(TraceError::TooManyTraces { max: 2 })
        ));
        assert_eq!(set.len(), 2);
        assert_eq!(gaps(set.get(0).unwrap()), vec![2, 0, 5]);

        // Aligned: both runs end together.
        assert_eq!(set.view(0).unwrap().duration(), set.view(1).unwrap().duration());
        assert_eq!(set.toggle_align_mode(), AlignMode::Raw);
        assert_eq!(set.view(0).unwrap().duration(), 30 + 400);
        assert_eq!(set.max_duration(), 35 + 400);
        assert!(set.view(2).is_none());
    }
}
