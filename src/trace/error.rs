use std::path::PathBuf;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum TraceError {
    #[error("cannot open trace file {}: {source}", path.display())]
    Open {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("processor count declared twice")]
    ProcessorCountAlreadySet,

    #[error("trace declares {count} processors, at most {max} are supported")]
    TooManyProcessors { count: u32, max: usize },

    #[error("{event} record before the processor count is known")]
    ProcessorCountUnset { event: &'static str },

    #[error("processor {processor} out of range (trace declares {count} processors)")]
    ProcessorOutOfRange { processor: u32, count: usize },

    #[error("{event} record outside of an iteration")]
    NoOpenIteration { event: &'static str },

    #[error("BEGIN_ITERATION while iteration {index} is still open")]
    IterationAlreadyOpen { index: usize },

    #[error("END_TASK on processor {processor} without a matching BEGIN_TASK")]
    UnmatchedTaskEnd { processor: u32 },

    #[error("at most {max} traces can be compared at once")]
    TooManyTraces { max: usize },
}

pub type Result<T> = std::result::Result<T, TraceError>;

impl TraceError {
    /// True for errors caused by the record stream itself rather than by I/O.
    pub fn is_ordering_error(&self) -> bool {
        !matches!(
            self,
            TraceError::Open { .. } | TraceError::Io(_) | TraceError::TooManyTraces { .. }
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_messages_name_the_offending_record() {
        let err = TraceError::ProcessorCountUnset { event: "END_TASK" };
        assert_eq!(
            err.to_string(),
            "END_TASK record before the processor count is known"
        );

        let err = TraceError::ProcessorOutOfRange {
            processor: 9,
            count: 4,
        };
        assert_eq!(
            err.to_string(),
            "processor 9 out of range (trace declares 4 processors)"
        );
    }

    #[test]
    fn test_open_error_keeps_source() {
        let err = TraceError::Open {
            path: PathBuf::from("traces/data/missing.evt"),
            source: std::io::Error::from(std::io::ErrorKind::NotFound),
        };
        assert!(err.to_string().contains("traces/data/missing.evt"));
        assert!(std::error::Error::source(&err).is_some());
        assert!(!err.is_ordering_error());
    }

    #[test]
    fn test_ordering_errors() {
        assert!(TraceError::ProcessorCountAlreadySet.is_ordering_error());
        assert!(TraceError::UnmatchedTaskEnd { processor: 0 }.is_ordering_error());
        assert!(
            TraceError::TooManyProcessors {
                count: u32::MAX,
                max: 4096
            }
            .is_ordering_error()
        );
        assert!(!TraceError::TooManyTraces { max: 2 }.is_ordering_error());
    }
}
