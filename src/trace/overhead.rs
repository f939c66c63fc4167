//! Removal of instrumentation bias from iteration boundaries.
//!
//! Logging adds latency between the end of one iteration and the recorded start
//! of the next. That latency cannot be measured per call, only observed as the
//! distance between consecutive boundaries, so the corrector keeps a running
//! offset: each BEGIN_ITERATION moves the offset so the new iteration starts
//! exactly `fixed_gap` after the previous one ended. Every timestamp is shifted
//! by the offset current when it is ingested.
//!
//! The first iteration is pulled to time zero; `fixed_gap` only applies from
//! the second one on.

use crate::trace::config::LoaderConfig;

#[derive(Debug, Clone)]
pub struct OverheadCorrector {
    enabled: bool,
    overhead: i64,
    end_of_last_iteration: i64,
    fixed_gap: i64,
    configured_gap: i64,
}

impl OverheadCorrector {
    pub fn new(config: &LoaderConfig) -> Self {
        Self {
            enabled: config.remove_overhead,
            overhead: 0,
            end_of_last_iteration: 0,
            fixed_gap: 0,
            // A negative baseline would let iterations overlap.
            configured_gap: config.fixed_gap.max(0),
        }
    }

    /// Shift a raw timestamp by the current offset. Saturates at the `i64`
    /// bounds.
    pub fn shift(&self, raw: i64) -> i64 {
        if self.enabled {
            raw.saturating_sub(self.overhead)
        } else {
            raw
        }
    }

    /// Update the offset for a new iteration and return its corrected start.
    pub fn begin_iteration(&mut self, raw: i64) -> i64 {
        if self.enabled {
            let drift = self
                .shift(raw)
                .saturating_sub(self.end_of_last_iteration)
                .saturating_sub(self.fixed_gap);
            self.overhead = self.overhead.saturating_add(drift);
        }
        self.shift(raw)
    }

    /// Return the corrected end of the current iteration and remember it.
    pub fn end_iteration(&mut self, raw: i64) -> i64 {
        let end = self.shift(raw);
        self.end_of_last_iteration = end;
        self.fixed_gap = self.configured_gap;
        end
    }

    /// Offset currently subtracted from raw timestamps.
    pub fn overhead(&self) -> i64 {
        if self.enabled { self.overhead } else { 0 }
    }
}
