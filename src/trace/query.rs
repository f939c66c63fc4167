//! Timestamp lookups over a finalized trace.
//!
//! Every lookup goes through a [`TraceView`], which decides whether iteration
//! bounds are read raw or shifted by the alignment fields:
//!
//! ```text
//! raw:      start = start_time               end = end_time
//! aligned:  start = start_time + correction  end = end_time + correction + gap
//! ```
//!
//! Iterations are sorted and do not overlap in either mode, so all three
//! searches are binary searches over iteration indices.

use crate::trace::data::{Iteration, Task, Trace};
use serde::Serialize;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum AlignMode {
    #[default]
    Raw,
    Aligned,
}

impl AlignMode {
    pub fn toggled(self) -> Self {
        match self {
            AlignMode::Raw => AlignMode::Aligned,
            AlignMode::Aligned => AlignMode::Raw,
        }
    }
}

/// A trace read under one align mode.
#[derive(Debug, Clone, Copy)]
pub struct TraceView<'a> {
    trace: &'a Trace,
    mode: AlignMode,
}

impl<'a> TraceView<'a> {
    pub fn new(trace: &'a Trace, mode: AlignMode) -> Self {
        Self { trace, mode }
    }

    pub fn raw(trace: &'a Trace) -> Self {
        Self::new(trace, AlignMode::Raw)
    }

    pub fn trace(&self) -> &'a Trace {
        self.trace
    }

    pub fn mode(&self) -> AlignMode {
        self.mode
    }

    fn it(&self, index: usize) -> &'a Iteration {
        &self.trace.iterations()[index]
    }

    /// Effective start of iteration `index`. Panics if out of range.
    pub fn iteration_start(&self, index: usize) -> i64 {
        let it = self.it(index);
        match self.mode {
            AlignMode::Raw => it.start_time,
            AlignMode::Aligned => it.start_time + it.correction,
        }
    }

    /// Effective end of iteration `index`. Panics if out of range.
    pub fn iteration_end(&self, index: usize) -> i64 {
        let it = self.it(index);
        match self.mode {
            AlignMode::Raw => it.end_time,
            AlignMode::Aligned => it.end_time + it.correction + it.gap,
        }
    }

    /// Gap appended to iteration `index` in aligned mode, 0 in raw mode.
    pub fn iteration_gap(&self, index: usize) -> i64 {
        match self.mode {
            AlignMode::Raw => 0,
            AlignMode::Aligned => self.it(index).gap,
        }
    }

    /// Effective `(start, end, gap)` of iteration `index`, or `None` if the
    /// trace has no such iteration.
    pub fn iteration_bounds(&self, index: usize) -> Option<(i64, i64, i64)> {
        (index < self.trace.iteration_count()).then(|| {
            (
                self.iteration_start(index),
                self.iteration_end(index),
                self.iteration_gap(index),
            )
        })
    }

    fn task_shift(&self, task: &Task) -> i64 {
        match self.mode {
            AlignMode::Raw => 0,
            AlignMode::Aligned => self
                .trace
                .iteration(task.iteration)
                .map_or(0, |it| it.correction),
        }
    }

    pub fn task_start(&self, task: &Task) -> i64 {
        task.start_time + self.task_shift(task)
    }

    pub fn task_end(&self, task: &Task) -> i64 {
        task.end_time + self.task_shift(task)
    }

    /// Number of leading iterations for which `pred` holds; `pred` must be
    /// monotone (true then false).
    fn partition_point(&self, pred: impl Fn(usize) -> bool) -> usize {
        let (mut first, mut last) = (0, self.trace.iteration_count());
        while first < last {
            let mid = first + (last - first) / 2;
            if pred(mid) {
                first = mid + 1;
            } else {
                last = mid;
            }
        }
        first
    }

    /// Iteration containing `t`, or `None` if `t` falls between iterations or
    /// outside the trace.
    pub fn find_iteration(&self, t: i64) -> Option<usize> {
        let i = self.partition_point(|i| self.iteration_end(i) < t);
        (i < self.trace.iteration_count() && self.iteration_start(i) <= t).then_some(i)
    }

    /// Smallest `i` with `t <= end(i)`.
    ///
    /// Clamps to the last iteration when `t` is past the end of the trace;
    /// callers compare against [`duration`](Self::duration) to detect that.
    /// `None` only for a trace without iterations.
    pub fn find_next_iteration(&self, t: i64) -> Option<usize> {
        let n = self.trace.iteration_count();
        if n == 0 {
            return None;
        }
        let i = self.partition_point(|i| self.iteration_end(i) < t);
        Some(i.min(n - 1))
    }

    /// Largest `i` with `start(i) <= t`.
    ///
    /// Clamps to the first iteration when `t` precedes the trace.
    /// `None` only for a trace without iterations.
    pub fn find_prev_iteration(&self, t: i64) -> Option<usize> {
        if self.trace.iteration_count() == 0 {
            return None;
        }
        let i = self.partition_point(|i| self.iteration_start(i) <= t);
        Some(i.saturating_sub(1))
    }

    /// Iterations overlapping the window `[start, end]`, clamped to the trace.
    pub fn iteration_range(&self, start: i64, end: i64) -> Option<(usize, usize)> {
        Some((self.find_next_iteration(start)?, self.find_prev_iteration(end)?))
    }

    /// Effective end of the last iteration, 0 for an empty trace.
    pub fn duration(&self) -> i64 {
        match self.trace.iteration_count() {
            0 => 0,
            n => self.iteration_end(n - 1),
        }
    }

    fn chain_from(&self, processor: usize, iteration: usize) -> &'a [Task] {
        let chain = self.trace.chain(processor);
        match self
            .trace
            .iteration(iteration)
            .and_then(|it| it.first_task(processor))
        {
            Some(first) => &chain[first..],
            None => &[],
        }
    }

    /// Tasks run by `processor` during iteration `iteration`.
    pub fn tasks_in_iteration(
        self,
        processor: usize,
        iteration: usize,
    ) -> impl Iterator<Item = &'a Task> + 'a {
        self.chain_from(processor, iteration)
            .iter()
            .take_while(move |task| task.iteration == iteration)
    }

    /// Tasks run by `processor` that overlap the window `[start, end]`.
    pub fn tasks_in_window(
        self,
        processor: usize,
        start: i64,
        end: i64,
    ) -> impl Iterator<Item = &'a Task> + 'a {
        let view = self;
        let tasks: &'a [Task] = match self.find_next_iteration(start) {
            Some(first) => self.chain_from(processor, first),
            None => &[],
        };
        tasks
            .iter()
            .skip_while(move |task| view.task_end(task) < start)
            .take_while(move |task| view.task_start(task) <= end)
    }
}
