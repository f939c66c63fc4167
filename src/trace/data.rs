//! In-memory trace model.
//!
//! Tasks live in one growable array per processor (the processor's *chain*),
//! in completion order. Iterations refer into those arrays by index:
//! `Iteration::first_tasks[p]` is the position in chain `p` of the earliest task
//! at or after that iteration, so a scan can resume there without walking the
//! chain from the start.

use serde::Serialize;

/// One processor's execution of one tile.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct Task {
    pub start_time: i64,
    pub end_time: i64,
    pub x: u32,
    pub y: u32,
    #[serde(rename = "w")]
    pub width: u32,
    #[serde(rename = "h")]
    pub height: u32,
    pub iteration: usize,
    #[serde(rename = "cpu")]
    pub processor: usize,
}

impl Task {
    pub fn duration(&self) -> i64 {
        self.end_time - self.start_time
    }
}

/// One sweep of the computation.
///
/// `correction` and `gap` are zero until two traces are synchronized.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Iteration {
    pub start_time: i64,
    pub end_time: i64,
    pub correction: i64,
    pub gap: i64,
    #[serde(skip)]
    pub first_tasks: Vec<Option<usize>>,
}

impl Iteration {
    pub(crate) fn new(start_time: i64, processor_count: usize) -> Self {
        Self {
            start_time,
            end_time: start_time,
            correction: 0,
            gap: 0,
            first_tasks: vec![None; processor_count],
        }
    }

    /// Raw duration, before any alignment.
    pub fn duration(&self) -> i64 {
        self.end_time - self.start_time
    }

    /// Index into chain `processor` where a scan of this iteration starts.
    pub fn first_task(&self, processor: usize) -> Option<usize> {
        self.first_tasks.get(processor).copied().flatten()
    }
}

/// A reconstructed run. Read-only once the loader hands it out, except for the
/// alignment fields the aligner rewrites.
#[derive(Debug, Clone)]
pub struct Trace {
    id: usize,
    processor_count: Option<usize>,
    dimension: u32,
    label: String,
    iterations: Vec<Iteration>,
    chains: Vec<Vec<Task>>,
    truncated: bool,
}

impl Trace {
    /// An empty trace, before any record has been ingested.
    pub fn new(id: usize) -> Self {
        Self {
            id,
            processor_count: None,
            dimension: 0,
            label: String::new(),
            iterations: Vec::new(),
            chains: Vec::new(),
            truncated: false,
        }
    }

    pub fn id(&self) -> usize {
        self.id
    }

    /// Declared processor count, or 0 if the log never declared one.
    pub fn processor_count(&self) -> usize {
        self.processor_count.unwrap_or(0)
    }

    pub fn dimension(&self) -> u32 {
        self.dimension
    }

    pub fn label(&self) -> &str {
        &self.label
    }

    pub fn iterations(&self) -> &[Iteration] {
        &self.iterations
    }

    pub fn iteration(&self, index: usize) -> Option<&Iteration> {
        self.iterations.get(index)
    }

    pub fn iteration_count(&self) -> usize {
        self.iterations.len()
    }

    /// Tasks run by `processor`, in completion order. Empty for unknown ids.
    pub fn chain(&self, processor: usize) -> &[Task] {
        self.chains.get(processor).map(Vec::as_slice).unwrap_or(&[])
    }

    pub fn chains(&self) -> &[Vec<Task>] {
        &self.chains
    }

    pub fn task_count(&self) -> usize {
        self.chains.iter().map(Vec::len).sum()
    }

    /// True when the log ended before the last iteration was closed.
    pub fn is_truncated(&self) -> bool {
        self.truncated
    }

    /// Back-fill the per-iteration first-task index. Called once ingestion is
    /// complete; running it again changes nothing.
    pub fn no_more_data(&mut self) {
        crate::trace::index::finalize(self);
    }

    pub(crate) fn processor_count_declared(&self) -> Option<usize> {
        self.processor_count
    }

    pub(crate) fn set_processor_count(&mut self, count: usize) {
        self.processor_count = Some(count);
        self.chains = vec![Vec::new(); count];
    }

    pub(crate) fn set_dimension(&mut self, dimension: u32) {
        self.dimension = dimension;
    }

    pub(crate) fn set_label(&mut self, label: String) {
        self.label = label;
    }

    pub(crate) fn set_truncated(&mut self) {
        self.truncated = true;
    }

    pub(crate) fn push_iteration(&mut self, start_time: i64) -> usize {
        self.iterations
            .push(Iteration::new(start_time, self.processor_count()));
        self.iterations.len() - 1
    }

    pub(crate) fn iterations_mut(&mut self) -> &mut [Iteration] {
        &mut self.iterations
    }

    /// Append `task` to its processor's chain and record it as the iteration's
    /// first task on that processor if none is set yet.
    pub(crate) fn push_task(&mut self, task: Task) {
        let chain = &mut self.chains[task.processor];
        let index = chain.len();
        chain.push(task);
        let slot = &mut self.iterations[task.iteration].first_tasks[task.processor];
        if slot.is_none() {
            *slot = Some(index);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn task(iteration: usize, processor: usize, start: i64, end: i64) -> Task {
        Task {
            start_time: start,
            end_time: end,
            x: 0,
            y: 0,
            width: 16,
            height: 16,
            iteration,
            processor,
        }
    }

    #[test]
    fn test_empty_trace() {
        let trace = Trace::new(0);
        assert_eq!(trace.processor_count(), 0);
        assert_eq!(trace.iteration_count(), 0);
        assert!(trace.chain(3).is_empty());
        assert!(!trace.is_truncated());
    }

    #[test]
    fn test_push_task_sets_first_task_once() {
        let mut trace = Trace::new(0);
        trace.set_processor_count(2);
        trace.push_iteration(0);
        trace.push_task(task(0, 1, 5, 10));
        trace.push_task(task(0, 1, 12, 20));

        let it = trace.iteration(0).unwrap();
        assert_eq!(it.first_task(0), None);
        assert_eq!(it.first_task(1), Some(0));
        assert_eq!(trace.chain(1).len(), 2);
        assert_eq!(trace.task_count(), 2);
    }

    #[test]
    fn test_first_task_out_of_range_processor() {
        let it = Iteration::new(0, 2);
        assert_eq!(it.first_task(7), None);
    }

    #[test]
    fn test_task_serializes_short_names() {
        let json = serde_json::to_value(task(2, 1, 100, 150)).unwrap();
        assert_eq!(json["cpu"], 1);
        assert_eq!(json["w"], 16);
        assert_eq!(json["iteration"], 2);
    }
}
