//! Benchmark run configuration

use std::path::PathBuf;

use crate::error::{BenchResult, ForgeBenchError};

/// Configuration for a benchmark run.
///
/// `max_prefill_predict_length` doubles as the padded prompt length handed
/// to the tokenizer; the autoregressive phase always runs exactly
/// `max_target_length - max_prefill_predict_length` steps regardless of
/// dataset content, so the measurement reflects worst-case steady-state cost.
#[derive(Debug, Clone)]
pub struct BenchConfig {
    /// Path to the dataset JSON file
    pub dataset_path: PathBuf,

    /// Padded prompt length; prefill compute covers exactly this many tokens
    pub max_prefill_predict_length: usize,

    /// Total sequence length (prompt padding + generated tokens)
    pub max_target_length: usize,

    /// Number of windows run through the pipeline to trigger lazy
    /// compilation/caching before any measurement; results discarded
    pub warmup_windows: usize,

    /// Number of windows run with tracing enabled; results discarded
    /// except for the trace artifact
    pub profile_windows: usize,

    /// Rows per window; defaults to the engine's concurrent decode capacity
    pub batch_size: Option<usize>,
}

impl Default for BenchConfig {
    fn default() -> Self {
        BenchConfig {
            dataset_path: PathBuf::new(),
            max_prefill_predict_length: 1024,
            max_target_length: 2048,
            warmup_windows: 2,
            profile_windows: 0,
            batch_size: None,
        }
    }
}

impl BenchConfig {
    /// Create a config for the given dataset file with default lengths
    pub fn new(dataset_path: impl Into<PathBuf>) -> Self {
        BenchConfig {
            dataset_path: dataset_path.into(),
            ..Default::default()
        }
    }

    /// Set the padded prompt length
    pub fn with_max_prefill_predict_length(mut self, len: usize) -> Self {
        self.max_prefill_predict_length = len;
        self
    }

    /// Set the total sequence length
    pub fn with_max_target_length(mut self, len: usize) -> Self {
        self.max_target_length = len;
        self
    }

    /// Set the number of warmup windows
    pub fn with_warmup_windows(mut self, n: usize) -> Self {
        self.warmup_windows = n;
        self
    }

    /// Set the number of profiled windows
    pub fn with_profile_windows(mut self, n: usize) -> Self {
        self.profile_windows = n;
        self
    }

    /// Override the window size instead of using the engine's slot count
    pub fn with_batch_size(mut self, batch_size: usize) -> Self {
        self.batch_size = Some(batch_size);
        self
    }

    /// Number of autoregressive steps per window
    pub fn decode_steps(&self) -> usize {
        self.max_target_length - self.max_prefill_predict_length
    }

    /// Validate the configuration before any engine work starts.
    pub fn validate(&self) -> BenchResult<()> {
        if self.dataset_path.as_os_str().is_empty() {
            return Err(ForgeBenchError::Config(
                "dataset file path not set".to_string(),
            ));
        }
        if self.max_target_length <= self.max_prefill_predict_length {
            return Err(ForgeBenchError::Config(format!(
                "max_target_length ({}) must exceed max_prefill_predict_length ({})",
                self.max_target_length, self.max_prefill_predict_length
            )));
        }
        if self.batch_size == Some(0) {
            return Err(ForgeBenchError::Config(
                "batch_size must be at least 1".to_string(),
            ));
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_match_benchmark_constants() {
        let config = BenchConfig::default();
        assert_eq!(config.max_prefill_predict_length, 1024);
        assert_eq!(config.max_target_length, 2048);
        assert_eq!(config.warmup_windows, 2);
        assert_eq!(config.profile_windows, 0);
        assert_eq!(config.batch_size, None);
        assert_eq!(config.decode_steps(), 1024);
    }

    #[test]
    fn builder_chain() {
        let config = BenchConfig::new("data.json")
            .with_max_prefill_predict_length(8)
            .with_max_target_length(12)
            .with_warmup_windows(0)
            .with_profile_windows(1)
            .with_batch_size(4);
        assert_eq!(config.decode_steps(), 4);
        assert_eq!(config.batch_size, Some(4));
        assert!(config.validate().is_ok());
    }

    #[test]
    fn validate_rejects_missing_path() {
        let config = BenchConfig::default();
        assert!(matches!(
            config.validate(),
            Err(ForgeBenchError::Config(_))
        ));
    }

    #[test]
    fn validate_rejects_non_positive_decode_steps() {
        let config = BenchConfig::new("data.json")
            .with_max_prefill_predict_length(2048)
            .with_max_target_length(2048);
        assert!(matches!(config.validate(), Err(ForgeBenchError::Config(_))));
    }

    #[test]
    fn validate_rejects_zero_batch() {
        let config = BenchConfig::new("data.json").with_batch_size(0);
        assert!(matches!(config.validate(), Err(ForgeBenchError::Config(_))));
    }
}
