//! Capability interfaces for the external collaborators
//!
//! The benchmark core never touches model weights, vocabularies, or metric
//! computation directly; it drives them through the traits in this module.
//! Any concrete engine that satisfies [`DecodeEngine`] can be benchmarked.

use std::collections::BTreeMap;

use thiserror::Error;

/// Failure raised by an engine, tokenizer, or trace capability call.
///
/// The benchmark wraps this with the phase and window it occurred in; see
/// [`crate::error::ForgeBenchError::EngineCompute`].
#[derive(Debug, Error)]
#[error("{message}")]
pub struct EngineError {
    message: String,
}

impl EngineError {
    pub fn new(message: impl Into<String>) -> Self {
        EngineError {
            message: message.into(),
        }
    }
}

/// Result alias for capability calls
pub type EngineResult<T> = std::result::Result<T, EngineError>;

/// A prompt padded to a fixed prefill length.
///
/// `true_length` counts the meaningful tokens before padding; it is always
/// at most `tokens.len()`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PaddedPrompt {
    pub tokens: Vec<u32>,
    pub true_length: usize,
}

/// Per-slot access to the token batch sampled by one autoregressive step.
pub trait SlotTokens {
    /// Token id produced for `slot` by this step, if the slot was active.
    fn token_at_slot(&self, slot: usize) -> Option<u32>;
}

/// The generation engine being benchmarked.
///
/// Calls may dispatch work asynchronously to a device; [`synchronize`]
/// blocks until everything issued so far has completed. The benchmark calls
/// it before stopping each phase timer, so an engine that computes eagerly
/// can implement it as a no-op.
///
/// [`synchronize`]: DecodeEngine::synchronize
pub trait DecodeEngine {
    /// Loaded model parameters, opaque to the benchmark
    type Params;
    /// Result of prefilling one prompt, consumed by [`DecodeEngine::insert`]
    type PrefillResult;
    /// Aggregate decode state (cache + bookkeeping) shared across slots.
    /// Owned by the benchmark for exactly one window; every `insert` and
    /// `generate` call consumes it and produces the successor.
    type DecodeState;
    /// Token batch produced by one generate step
    type SampledBatch: SlotTokens;
    /// Tokenizer matching the engine's vocabulary
    type Tokenizer: PromptTokenizer;

    fn load_params(&self) -> EngineResult<Self::Params>;

    /// Create a fresh decode state with every slot empty.
    fn init_decode_state(&self) -> EngineResult<Self::DecodeState>;

    /// Compute the prefill representation of one padded prompt.
    fn prefill(
        &self,
        params: &Self::Params,
        padded_tokens: &[u32],
        true_length: usize,
    ) -> EngineResult<Self::PrefillResult>;

    /// Place a prefilled sequence into `slot` of the decode state.
    fn insert(
        &self,
        prefill: Self::PrefillResult,
        state: Self::DecodeState,
        slot: usize,
    ) -> EngineResult<Self::DecodeState>;

    /// Advance every active slot by one token.
    fn generate(
        &self,
        params: &Self::Params,
        state: Self::DecodeState,
    ) -> EngineResult<(Self::DecodeState, Self::SampledBatch)>;

    /// Number of sequences the engine can decode concurrently.
    fn max_concurrent_decodes(&self) -> usize;

    fn get_tokenizer(&self) -> EngineResult<Self::Tokenizer>;

    /// Block until all previously issued operations have completed.
    fn synchronize(&self) -> EngineResult<()>;
}

/// Tokenizer capability consumed by the benchmark.
pub trait PromptTokenizer {
    /// Tokenize `text` and pad the ids out to `pad_length`.
    fn tokenize_and_pad(
        &self,
        text: &str,
        is_bos: bool,
        pad_length: usize,
    ) -> EngineResult<PaddedPrompt>;

    /// Decode token ids back to text.
    fn decode(&self, token_ids: &[u32]) -> String;

    fn eos_id(&self) -> u32;

    fn pad_id(&self) -> u32;
}

/// Output-quality scoring capability (e.g. ROUGE against references).
pub trait QualityScorer {
    /// Score `predictions` against `references`, pairwise by index.
    /// Both slices always have equal length.
    fn score(&self, predictions: &[String], references: &[String]) -> BTreeMap<String, f64>;
}

/// Tracing/profiling capability bracketing a benchmark phase.
///
/// `activate` starts a capture named `label`; `deactivate` ends it. The
/// benchmark only brackets phases during the profile stage.
pub trait TraceSink {
    fn activate(&mut self, label: &str);
    fn deactivate(&mut self);
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn engine_error_displays_message() {
        let err = EngineError::new("prefill kernel failed");
        assert_eq!(err.to_string(), "prefill kernel failed");
    }

    #[test]
    fn padded_prompt_true_length_within_padding() {
        let prompt = PaddedPrompt {
            tokens: vec![1, 5, 9, 0, 0, 0, 0, 0],
            true_length: 3,
        };
        assert!(prompt.true_length <= prompt.tokens.len());
    }
}
