//! Unified error handling for ForgeBench
//!
//! Every failure in a timed code path invalidates the measurement, so the
//! benchmark never retries: each variant here is fatal for the current run.
//! Engine failures carry the phase and window row range in which they
//! occurred so the aborted window can be identified from the error alone.

use std::path::PathBuf;

use crate::bench::Phase;
use crate::engine::EngineError;

/// Unified error type for ForgeBench
#[derive(Debug, thiserror::Error)]
pub enum ForgeBenchError {
    /// Missing or inconsistent benchmark configuration
    #[error("invalid configuration: {0}")]
    Config(String),

    /// Dataset file does not exist
    #[error("dataset file not found: {0}")]
    DatasetMissing(PathBuf),

    /// Dataset file exists but could not be parsed
    #[error("malformed dataset record: {0}")]
    DatasetMalformed(String),

    /// Dataset parsed to an empty request list
    #[error("dataset contains no requests")]
    DatasetEmpty,

    /// An engine capability call failed inside a timed phase
    #[error("engine compute failed in {phase} over rows [{start}:{end}): {source}")]
    EngineCompute {
        phase: Phase,
        start: usize,
        end: usize,
        #[source]
        source: EngineError,
    },

    /// An engine capability call failed outside the timed phases
    /// (parameter loading, decode-state creation, tokenization)
    #[error("engine {operation} failed: {source}")]
    EngineSetup {
        operation: &'static str,
        #[source]
        source: EngineError,
    },

    /// Window larger than the engine's concurrent decode capacity; two rows
    /// would collide on the same slot and the earlier in-flight state would
    /// be silently overwritten before being read
    #[error("window of {batch} rows exceeds {slots} concurrent decode slots")]
    SlotOverflow { batch: usize, slots: usize },

    /// File I/O error
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

/// Result alias used throughout the crate
pub type BenchResult<T> = std::result::Result<T, ForgeBenchError>;

impl ForgeBenchError {
    /// Wrap an engine failure with the phase and window it occurred in.
    pub fn compute(phase: Phase, window: crate::dataset::Window, source: EngineError) -> Self {
        ForgeBenchError::EngineCompute {
            phase,
            start: window.start,
            end: window.end,
            source,
        }
    }

    /// Wrap an engine failure from outside the timed phases.
    pub fn setup(operation: &'static str, source: EngineError) -> Self {
        ForgeBenchError::EngineSetup { operation, source }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::dataset::Window;

    #[test]
    fn compute_error_names_phase_and_window() {
        let err = ForgeBenchError::compute(
            Phase::Autoregressive,
            Window { start: 8, end: 12 },
            EngineError::new("device lost"),
        );
        let msg = err.to_string();
        assert!(msg.contains("autoregressive"));
        assert!(msg.contains("[8:12)"));
        assert!(msg.contains("device lost"));
    }

    #[test]
    fn slot_overflow_reports_both_sizes() {
        let err = ForgeBenchError::SlotOverflow { batch: 9, slots: 8 };
        assert_eq!(
            err.to_string(),
            "window of 9 rows exceeds 8 concurrent decode slots"
        );
    }

    #[test]
    fn io_error_converts() {
        let io = std::io::Error::new(std::io::ErrorKind::NotFound, "gone");
        let err: ForgeBenchError = io.into();
        assert!(matches!(err, ForgeBenchError::Io(_)));
    }
}
