use crate::trace::data::{Iteration, Trace};

/// Finalize a fully ingested trace: every iteration gets, for every processor,
/// the chain position of the nearest task at or after it.
pub fn finalize(trace: &mut Trace) {
    backfill(trace.iterations_mut());
}

/// Walk iterations from last to first, copying each empty slot from the next
/// iteration. A processor idle for several iterations inherits the first task
/// of the iteration where it becomes busy again.
pub(crate) fn backfill(iterations: &mut [Iteration]) {
    for i in (0..iterations.len().saturating_sub(1)).rev() {
        let (head, tail) = iterations.split_at_mut(i + 1);
        let current = &mut head[i];
        let next = &tail[0];
        for (slot, later) in current.first_tasks.iter_mut().zip(&next.first_tasks) {
            if slot.is_none() {
                *slot = *later;
            }
        }
    }
}
