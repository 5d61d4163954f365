//! Dataset loading and window partitioning
//!
//! The dataset file is a JSON array of request records produced by the
//! dataset-preparation tooling. Loading is fail-fast: a missing file or a
//! malformed record aborts the run before any engine work starts.

use std::path::Path;

use serde::Deserialize;
use tracing::info;

use crate::error::{BenchResult, ForgeBenchError};
use crate::stats::Summary;

/// One request in the benchmark dataset. Immutable once loaded.
#[derive(Debug, Clone, Deserialize)]
pub struct DatasetRecord {
    /// Prompt text fed to the engine
    pub prompt: String,
    /// Reference output used for quality scoring
    pub output: String,
    /// Prompt length in tokens, as counted by the dataset tooling
    pub len_prompt_tokens: usize,
    /// Reference output length in tokens
    pub len_output_tokens: usize,
}

/// A contiguous half-open row range `[start, end)` processed together in
/// one pass of the three-phase pipeline.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Window {
    pub start: usize,
    pub end: usize,
}

impl Window {
    /// Realized window size. Always computed from the range itself; the
    /// final window of a dataset may be shorter than the configured stride.
    pub fn len(&self) -> usize {
        self.end - self.start
    }

    pub fn is_empty(&self) -> bool {
        self.end == self.start
    }

    /// Dataset row for a position inside the window
    pub fn row(&self, index_in_window: usize) -> usize {
        self.start + index_in_window
    }
}

impl std::fmt::Display for Window {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "[{}:{})", self.start, self.end)
    }
}

/// Iterator over the fixed-stride windows covering `[0, dataset_size)`.
///
/// The stride is the configured batch size and never changes mid-run; only
/// the last window shrinks to the dataset boundary.
pub fn windows(dataset_size: usize, batch_size: usize) -> Windows {
    debug_assert!(batch_size > 0);
    Windows {
        next_start: 0,
        dataset_size,
        stride: batch_size,
    }
}

#[derive(Debug, Clone)]
pub struct Windows {
    next_start: usize,
    dataset_size: usize,
    stride: usize,
}

impl Iterator for Windows {
    type Item = Window;

    fn next(&mut self) -> Option<Window> {
        if self.next_start >= self.dataset_size {
            return None;
        }
        let start = self.next_start;
        let end = (start + self.stride).min(self.dataset_size);
        self.next_start = end;
        Some(Window { start, end })
    }
}

/// Descriptive token-length statistics computed at load time.
#[derive(Debug, Clone)]
pub struct DatasetSummary {
    pub num_requests: usize,
    pub len_prompt_tokens: Summary,
    pub len_output_tokens: Summary,
    pub len_total_tokens: Summary,
}

impl std::fmt::Display for DatasetSummary {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        writeln!(f, "Num requests: {}", self.num_requests)?;
        writeln!(f, "len_prompt_tokens - {}", self.len_prompt_tokens)?;
        writeln!(f, "len_output_tokens - {}", self.len_output_tokens)?;
        write!(f, "len_total_tokens - {}", self.len_total_tokens)
    }
}

/// The loaded benchmark dataset.
#[derive(Debug, Clone)]
pub struct Dataset {
    records: Vec<DatasetRecord>,
}

impl Dataset {
    /// Load a dataset file, failing fast on a missing file, a malformed
    /// record, or an empty request list.
    pub fn load(path: &Path) -> BenchResult<Self> {
        if !path.exists() {
            return Err(ForgeBenchError::DatasetMissing(path.to_path_buf()));
        }
        let contents = std::fs::read_to_string(path)?;
        let records: Vec<DatasetRecord> = serde_json::from_str(&contents)
            .map_err(|e| ForgeBenchError::DatasetMalformed(e.to_string()))?;
        if records.is_empty() {
            return Err(ForgeBenchError::DatasetEmpty);
        }
        let dataset = Dataset { records };
        let summary = dataset.summary();
        info!(
            file = %path.display(),
            num_requests = summary.num_requests,
            "dataset loaded"
        );
        Ok(dataset)
    }

    /// Build a dataset directly from records (tests, generators).
    pub fn from_records(records: Vec<DatasetRecord>) -> BenchResult<Self> {
        if records.is_empty() {
            return Err(ForgeBenchError::DatasetEmpty);
        }
        Ok(Dataset { records })
    }

    pub fn len(&self) -> usize {
        self.records.len()
    }

    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }

    pub fn records(&self) -> &[DatasetRecord] {
        &self.records
    }

    pub fn get(&self, row: usize) -> &DatasetRecord {
        &self.records[row]
    }

    /// Descriptive statistics over prompt/output token lengths.
    pub fn summary(&self) -> DatasetSummary {
        let prompt: Vec<f64> = self
            .records
            .iter()
            .map(|r| r.len_prompt_tokens as f64)
            .collect();
        let output: Vec<f64> = self
            .records
            .iter()
            .map(|r| r.len_output_tokens as f64)
            .collect();
        let total: Vec<f64> = self
            .records
            .iter()
            .map(|r| (r.len_prompt_tokens + r.len_output_tokens) as f64)
            .collect();
        DatasetSummary {
            num_requests: self.records.len(),
            len_prompt_tokens: Summary::describe(&prompt),
            len_output_tokens: Summary::describe(&output),
            len_total_tokens: Summary::describe(&total),
        }
    }
}
