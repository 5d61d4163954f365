//! Benchmark run orchestration
//!
//! Drives the dataset through three sequential stages, each walking the
//! dataset from row 0 in fixed-stride windows: warmup (primes lazy
//! compilation and caches, results discarded), profile (tracing enabled,
//! results discarded except the trace artifact), and measure (stats
//! accumulated, generated text decoded and scored). A fresh decode state is
//! created for every window and released at window end; it never leaks
//! across windows.

use std::fmt;

use tracing::{debug, info};

use crate::bench::{BatchStats, PhaseRunner};
use crate::config::BenchConfig;
use crate::dataset::{windows, Dataset, Window};
use crate::engine::{DecodeEngine, PaddedPrompt, PromptTokenizer, QualityScorer, TraceSink};
use crate::error::{BenchResult, ForgeBenchError};
use crate::report::{char_lengths, RunReport};
use crate::stats::{StatsAccumulator, Summary};
use crate::text::TextReconstructor;

/// The stage a window executes under. Stages are sequential; the stage and
/// each window's realized size are carried explicitly rather than through
/// mutable countdown state shared across loops.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum RunStage {
    Warmup,
    Profile,
    Measure,
}

impl fmt::Display for RunStage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            RunStage::Warmup => "warmup",
            RunStage::Profile => "profile",
            RunStage::Measure => "measure",
        })
    }
}

/// Owns one benchmark run end to end.
pub struct BenchmarkOrchestrator<'a, E: DecodeEngine, Q: QualityScorer> {
    engine: &'a E,
    scorer: &'a Q,
    config: &'a BenchConfig,
    tracer: Option<&'a mut dyn TraceSink>,
}

impl<'a, E: DecodeEngine, Q: QualityScorer> BenchmarkOrchestrator<'a, E, Q> {
    pub fn new(engine: &'a E, scorer: &'a Q, config: &'a BenchConfig) -> Self {
        BenchmarkOrchestrator {
            engine,
            scorer,
            config,
            tracer: None,
        }
    }

    /// Attach the trace capability used during the profile stage.
    pub fn with_tracer(mut self, tracer: &'a mut dyn TraceSink) -> Self {
        self.tracer = Some(tracer);
        self
    }

    /// Execute warmup, profile, and measure over the dataset and assemble
    /// the final report. Any failure aborts the run; stats from windows
    /// that completed before the failure are lost with it by design, since
    /// a partial report would not be comparable.
    pub fn run(mut self, dataset: &Dataset) -> BenchResult<RunReport> {
        self.config.validate()?;

        let params = self
            .engine
            .load_params()
            .map_err(|e| ForgeBenchError::setup("load_params", e))?;
        let tokenizer = self
            .engine
            .get_tokenizer()
            .map_err(|e| ForgeBenchError::setup("get_tokenizer", e))?;
        let total_slots = self.engine.max_concurrent_decodes();
        if total_slots == 0 {
            return Err(ForgeBenchError::Config(
                "engine reports zero concurrent decode slots".to_string(),
            ));
        }
        let batch_size = self.config.batch_size.unwrap_or(total_slots);
        let dataset_size = dataset.len();

        // Warmup: trigger lazy compilation/caching, discard results.
        let mut remaining = self.config.warmup_windows;
        for window in windows(dataset_size, batch_size) {
            if remaining == 0 {
                break;
            }
            remaining -= 1;
            info!(stage = %RunStage::Warmup, window = %window, batch = window.len(), "running window");
            self.run_one_window(RunStage::Warmup, window, &params, &tokenizer, dataset)?;
        }

        // Profile: tracing enabled, results discarded.
        let mut remaining = self.config.profile_windows;
        for window in windows(dataset_size, batch_size) {
            if remaining == 0 {
                break;
            }
            remaining -= 1;
            info!(stage = %RunStage::Profile, window = %window, batch = window.len(), "running window");
            self.run_one_window(RunStage::Profile, window, &params, &tokenizer, dataset)?;
        }

        // Measure: every window contributes stats and scored text.
        info!(
            dataset_size,
            prefill_length = self.config.max_prefill_predict_length,
            batch_size,
            "benchmarks started"
        );
        let mut stats = StatsAccumulator::new();
        let mut output_text: Vec<String> = Vec::with_capacity(dataset_size);
        let mut output_text_stop: Vec<String> = Vec::with_capacity(dataset_size);
        let reconstructor = TextReconstructor::new(&tokenizer);
        for window in windows(dataset_size, batch_size) {
            info!(stage = %RunStage::Measure, window = %window, batch = window.len(), "running window");
            let (batch_stats, sampled) =
                self.run_one_window(RunStage::Measure, window, &params, &tokenizer, dataset)?;
            let decoded = reconstructor.decode_window(&sampled, window.len());
            let references: Vec<String> = (window.start..window.end)
                .map(|row| dataset.get(row).output.clone())
                .collect();
            let window_accuracy = self.scorer.score(&decoded.full, &references);
            let window_accuracy_stop = self.scorer.score(&decoded.truncated, &references);
            debug!(window = %window, ?window_accuracy, ?window_accuracy_stop, "window accuracy");
            stats.record_batch(&batch_stats);
            output_text.extend(decoded.full);
            output_text_stop.extend(decoded.truncated);
        }

        info!("aggregating stats");
        let num_predictions = output_text.len();
        let target_text: Vec<String> = dataset.records()[..num_predictions]
            .iter()
            .map(|r| r.output.clone())
            .collect();
        let prompt_text: Vec<String> = dataset.records()[..num_predictions]
            .iter()
            .map(|r| r.prompt.clone())
            .collect();
        let accuracy = self.scorer.score(&output_text, &target_text);
        let accuracy_stop = self.scorer.score(&output_text_stop, &target_text);

        Ok(RunReport {
            aggregated: RunReport::aggregated_from(stats.summarize()),
            num_predictions,
            accuracy,
            accuracy_stop,
            predicted_str_len: Summary::describe(&char_lengths(&output_text)),
            predicted_str_len_stop: Summary::describe(&char_lengths(&output_text_stop)),
            target_str_len: Summary::describe(&char_lengths(&target_text)),
            prompt_str_len: Summary::describe(&char_lengths(&prompt_text)),
        })
    }

    /// Tokenize, create a fresh decode state, and run the three phases for
    /// one window. The state is consumed by the runner and released inside
    /// the autoregressive phase.
    fn run_one_window(
        &mut self,
        stage: RunStage,
        window: Window,
        params: &E::Params,
        tokenizer: &E::Tokenizer,
        dataset: &Dataset,
    ) -> BenchResult<(BatchStats, Vec<E::SampledBatch>)> {
        let prompts = self.tokenize_window(window, tokenizer, dataset)?;
        let engine = self.engine;
        let mut runner = PhaseRunner::new(engine, params, window, self.config.decode_steps())?;
        if stage == RunStage::Profile {
            if let Some(tracer) = self.tracer.as_deref_mut() {
                runner = runner.with_tracer(tracer);
            }
        }
        let state = engine
            .init_decode_state()
            .map_err(|e| ForgeBenchError::setup("init_decode_state", e))?;
        runner.run_window(&prompts, state)
    }

    fn tokenize_window(
        &self,
        window: Window,
        tokenizer: &E::Tokenizer,
        dataset: &Dataset,
    ) -> BenchResult<Vec<PaddedPrompt>> {
        let pad_length = self.config.max_prefill_predict_length;
        let mut prompts = Vec::with_capacity(window.len());
        for i in 0..window.len() {
            let record = dataset.get(window.row(i));
            if i == 0 {
                debug!(prompt = %record.prompt, "sample prompt");
            }
            prompts.push(
                tokenizer
                    .tokenize_and_pad(&record.prompt, true, pad_length)
                    .map_err(|e| ForgeBenchError::setup("tokenize_and_pad", e))?,
            );
        }
        Ok(prompts)
    }
}
