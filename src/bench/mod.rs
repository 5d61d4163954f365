//! The three-phase benchmark pipeline
//!
//! One window of dataset rows passes through three step kinds in order:
//! prefill (compute each prompt's initial representation), prefill-insert
//! (compute and place each representation into a decode slot), and
//! autoregressive (advance every slot one token per step). [`PhaseRunner`]
//! executes exactly one window, timing each phase between an explicit start
//! and a synchronization barrier so asynchronous engines are measured to
//! completion.

use std::collections::BTreeMap;
use std::fmt;
use std::time::{Duration, Instant};

use serde::Serialize;
use tracing::info;

use crate::dataset::Window;
use crate::engine::{DecodeEngine, PaddedPrompt, TraceSink};
use crate::error::{BenchResult, ForgeBenchError};
use crate::slots::SlotCycler;

pub mod orchestrator;

/// The step kind a phase executes.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize)]
pub enum Phase {
    Prefill,
    PrefillInsert,
    Autoregressive,
}

impl Phase {
    pub fn as_str(&self) -> &'static str {
        match self {
            Phase::Prefill => "prefill",
            Phase::PrefillInsert => "prefill_insert",
            Phase::Autoregressive => "autoregressive",
        }
    }
}

impl fmt::Display for Phase {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A metric produced by a phase. The set differs by phase: prefill and
/// prefill-insert report elapsed and per-sequence time only; the
/// autoregressive phase adds batch size, per-token time, and throughput.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize)]
pub enum Metric {
    GlobalBatchSize,
    MsecProfiled,
    MsecPerSeq,
    MsecPerToken,
    TokensPerSec,
}

impl Metric {
    pub fn as_str(&self) -> &'static str {
        match self {
            Metric::GlobalBatchSize => "global_batch_size",
            Metric::MsecProfiled => "msec_profiled",
            Metric::MsecPerSeq => "msec_per_seq",
            Metric::MsecPerToken => "msec_per_token",
            Metric::TokensPerSec => "tokens_per_sec",
        }
    }
}

impl fmt::Display for Metric {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Metrics produced by one phase over one window.
pub type PhaseStats = BTreeMap<Metric, f64>;

/// Per-phase metrics for one completed window.
#[derive(Debug, Clone)]
pub struct BatchStats {
    pub window: Window,
    pub prefill: PhaseStats,
    pub prefill_insert: PhaseStats,
    pub autoregressive: PhaseStats,
}

impl BatchStats {
    /// Phases in pipeline order.
    pub fn phases(&self) -> [(Phase, &PhaseStats); 3] {
        [
            (Phase::Prefill, &self.prefill),
            (Phase::PrefillInsert, &self.prefill_insert),
            (Phase::Autoregressive, &self.autoregressive),
        ]
    }
}

/// Elapsed-time metrics shared by the prefill and prefill-insert phases.
fn latency_stats(elapsed: Duration, batch_size: usize) -> PhaseStats {
    let msec = elapsed.as_secs_f64() * 1000.0;
    let mut stats = PhaseStats::new();
    stats.insert(Metric::MsecProfiled, msec);
    stats.insert(Metric::MsecPerSeq, msec / batch_size as f64);
    stats
}

/// Autoregressive metrics: per-token latency and throughput on top of the
/// shared latency metrics.
fn step_stats(elapsed: Duration, batch_size: usize, steps: usize) -> PhaseStats {
    let msec = elapsed.as_secs_f64() * 1000.0;
    let tokens = (steps * batch_size) as f64;
    let mut stats = latency_stats(elapsed, batch_size);
    stats.insert(Metric::GlobalBatchSize, batch_size as f64);
    stats.insert(Metric::MsecPerToken, msec / tokens);
    stats.insert(Metric::TokensPerSec, tokens / elapsed.as_secs_f64());
    stats
}

/// Executes the three benchmark phases for exactly one window.
///
/// The decode state is created by the caller, threaded through the insert
/// and autoregressive phases by value, and released (dropped) after the
/// autoregressive barrier. Engine calls are issued strictly sequentially:
/// each insert consumes the state the previous insert produced.
pub struct PhaseRunner<'a, E: DecodeEngine> {
    engine: &'a E,
    params: &'a E::Params,
    cycler: SlotCycler,
    window: Window,
    decode_steps: usize,
    tracer: Option<&'a mut dyn TraceSink>,
}

impl<'a, E: DecodeEngine> PhaseRunner<'a, E> {
    /// Build a runner for `window`, rejecting windows wider than the
    /// engine's slot count before any engine call is issued.
    pub fn new(
        engine: &'a E,
        params: &'a E::Params,
        window: Window,
        decode_steps: usize,
    ) -> BenchResult<Self> {
        let cycler = SlotCycler::new(engine.max_concurrent_decodes());
        cycler.check_window(window)?;
        debug_assert!(decode_steps > 0);
        Ok(PhaseRunner {
            engine,
            params,
            cycler,
            window,
            decode_steps,
            tracer: None,
        })
    }

    /// Bracket every phase with trace captures.
    pub fn with_tracer(mut self, tracer: &'a mut dyn TraceSink) -> Self {
        self.tracer = Some(tracer);
        self
    }

    fn trace_start(&mut self, phase: Phase) {
        if let Some(tracer) = self.tracer.as_deref_mut() {
            let label = format!("{}[{}:{}]", phase, self.window.start, self.window.end);
            tracer.activate(&label);
        }
    }

    fn trace_stop(&mut self) {
        if let Some(tracer) = self.tracer.as_deref_mut() {
            tracer.deactivate();
        }
    }

    /// Prefill every row in the window, discarding each result as soon as
    /// the next lands. The final result is retained only until the
    /// synchronization barrier confirms all issued work finished.
    pub fn run_prefill(&mut self, prompts: &[PaddedPrompt]) -> BenchResult<PhaseStats> {
        let phase = Phase::Prefill;
        let window = self.window;
        info!(window = %window, "benchmark prefill");
        self.trace_start(phase);
        let start = Instant::now();
        let mut last = None;
        for prompt in prompts {
            last = Some(
                self.engine
                    .prefill(self.params, &prompt.tokens, prompt.true_length)
                    .map_err(|e| ForgeBenchError::compute(phase, window, e))?,
            );
        }
        self.engine
            .synchronize()
            .map_err(|e| ForgeBenchError::compute(phase, window, e))?;
        let elapsed = start.elapsed();
        self.trace_stop();
        drop(last);
        Ok(latency_stats(elapsed, window.len()))
    }

    /// Prefill and insert every row into its assigned slot, threading the
    /// decode state through the chain in increasing row order. Returns the
    /// state holding the whole window.
    pub fn run_prefill_insert(
        &mut self,
        prompts: &[PaddedPrompt],
        state: E::DecodeState,
    ) -> BenchResult<(PhaseStats, E::DecodeState)> {
        let phase = Phase::PrefillInsert;
        let window = self.window;
        info!(window = %window, "benchmark prefill insert");
        self.trace_start(phase);
        let start = Instant::now();
        let mut state = state;
        for (i, prompt) in prompts.iter().enumerate() {
            let slot = self.cycler.assign(i);
            let prefill = self
                .engine
                .prefill(self.params, &prompt.tokens, prompt.true_length)
                .map_err(|e| ForgeBenchError::compute(phase, window, e))?;
            state = self
                .engine
                .insert(prefill, state, slot)
                .map_err(|e| ForgeBenchError::compute(phase, window, e))?;
        }
        self.engine
            .synchronize()
            .map_err(|e| ForgeBenchError::compute(phase, window, e))?;
        let elapsed = start.elapsed();
        self.trace_stop();
        Ok((latency_stats(elapsed, window.len()), state))
    }

    /// Run the configured number of decode steps, retaining every sampled
    /// batch in step order. Deliberately never stops early at end-of-sequence
    /// so the measurement covers worst-case steady-state cost. The final
    /// decode state is released after the barrier.
    pub fn run_autoregressive(
        &mut self,
        state: E::DecodeState,
    ) -> BenchResult<(PhaseStats, Vec<E::SampledBatch>)> {
        let phase = Phase::Autoregressive;
        let window = self.window;
        info!(window = %window, steps = self.decode_steps, "benchmark autoregressive");
        self.trace_start(phase);
        let start = Instant::now();
        let mut state = state;
        let mut sampled = Vec::with_capacity(self.decode_steps);
        for _ in 0..self.decode_steps {
            let (next, batch) = self
                .engine
                .generate(self.params, state)
                .map_err(|e| ForgeBenchError::compute(phase, window, e))?;
            state = next;
            sampled.push(batch);
        }
        self.engine
            .synchronize()
            .map_err(|e| ForgeBenchError::compute(phase, window, e))?;
        let elapsed = start.elapsed();
        self.trace_stop();
        drop(state);
        Ok((step_stats(elapsed, window.len(), self.decode_steps), sampled))
    }

    /// All three phases in pipeline order. Consumes the decode state; the
    /// caller creates a fresh one per window.
    pub fn run_window(
        &mut self,
        prompts: &[PaddedPrompt],
        state: E::DecodeState,
    ) -> BenchResult<(BatchStats, Vec<E::SampledBatch>)> {
        let prefill = self.run_prefill(prompts)?;
        let (prefill_insert, state) = self.run_prefill_insert(prompts, state)?;
        let (autoregressive, sampled) = self.run_autoregressive(state)?;
        Ok((
            BatchStats {
                window: self.window,
                prefill,
                prefill_insert,
                autoregressive,
            },
            sampled,
        ))
    }
}
