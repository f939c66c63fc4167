use serde::Serialize;

/// In-memory form of one trace record.
///
/// Records are only materialized transiently: the recorder encodes them straight
/// to the wire and the loader folds them into a [`Trace`](crate::trace::Trace)
/// as soon as they are read.
///
/// NOTE: the `Serialize` impl exists for JSON export and does NOT reflect the
/// wire format.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "event")]
pub enum TraceEvent {
    SetProcessorCount {
        count: u32,
    },
    SetDimension {
        dimension: u32,
    },
    SetLabel {
        label: String,
    },
    BeginIteration {
        #[serde(rename = "timestamp_us")]
        timestamp_micros: i64,
    },
    EndIteration {
        #[serde(rename = "timestamp_us")]
        timestamp_micros: i64,
    },
    BeginTask {
        #[serde(rename = "timestamp_us")]
        timestamp_micros: i64,
        #[serde(rename = "cpu")]
        processor: u32,
    },
    EndTask {
        #[serde(rename = "timestamp_us")]
        timestamp_micros: i64,
        #[serde(rename = "cpu")]
        processor: u32,
        x: u32,
        y: u32,
        #[serde(rename = "w")]
        width: u32,
        #[serde(rename = "h")]
        height: u32,
    },
}

impl TraceEvent {
    /// Returns the timestamp in microseconds, if this record carries one.
    ///
    /// Setup records (processor count, dimension, label) have no timestamp.
    pub fn timestamp_micros(&self) -> Option<i64> {
        match self {
            TraceEvent::BeginIteration { timestamp_micros }
            | TraceEvent::EndIteration { timestamp_micros }
            | TraceEvent::BeginTask {
                timestamp_micros, ..
            }
            | TraceEvent::EndTask {
                timestamp_micros, ..
            } => Some(*timestamp_micros),
            TraceEvent::SetProcessorCount { .. }
            | TraceEvent::SetDimension { .. }
            | TraceEvent::SetLabel { .. } => None,
        }
    }

    /// Returns the processor id for tile records.
    pub fn processor(&self) -> Option<u32> {
        match self {
            TraceEvent::BeginTask { processor, .. } | TraceEvent::EndTask { processor, .. } => {
                Some(*processor)
            }
            _ => None,
        }
    }

    /// Returns true for the one-time records that describe the run
    /// rather than its timeline.
    pub fn is_setup_record(&self) -> bool {
        self.timestamp_micros().is_none()
    }

    /// Short name used in log lines and error messages.
    pub fn name(&self) -> &'static str {
        match self {
            TraceEvent::SetProcessorCount { .. } => "SET_PROCESSOR_COUNT",
            TraceEvent::SetDimension { .. } => "SET_DIMENSION",
            TraceEvent::SetLabel { .. } => "SET_LABEL",
            TraceEvent::BeginIteration { .. } => "BEGIN_ITERATION",
            TraceEvent::EndIteration { .. } => "END_ITERATION",
            TraceEvent::BeginTask { .. } => "BEGIN_TASK",
            TraceEvent::EndTask { .. } => "END_TASK",
        }
    }
}
