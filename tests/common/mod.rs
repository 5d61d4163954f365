//! Shared fixtures for the benchmark integration tests
//!
//! `MockEngine` stands in for a real decode engine: it emits deterministic
//! tokens, counts every capability call, and can be told to fail a specific
//! call so error propagation is testable. `MockTokenizer` pads with a hash
//! vocabulary, `RecordingScorer` captures every scoring call it receives.

#![allow(dead_code)]

use std::cell::{Cell, RefCell};
use std::collections::BTreeMap;
use std::time::Duration;

use forgebench::dataset::{Dataset, DatasetRecord};
use forgebench::engine::{
    DecodeEngine, EngineError, EngineResult, PaddedPrompt, PromptTokenizer, QualityScorer,
    SlotTokens, TraceSink,
};

pub const BOS_ID: u32 = 1;
pub const EOS_ID: u32 = 2;
pub const PAD_ID: u32 = 0;

pub struct MockParams;

pub struct MockPrefill {
    pub true_length: usize,
}

#[derive(Debug)]
pub struct MockState {
    pub step: usize,
    pub inserted: Vec<usize>,
}

pub struct MockSampled {
    tokens: Vec<u32>,
}

impl SlotTokens for MockSampled {
    fn token_at_slot(&self, slot: usize) -> Option<u32> {
        self.tokens.get(slot).copied()
    }
}

/// Deterministic decode engine double with call accounting.
pub struct MockEngine {
    slots: usize,
    step_tokens: Option<Vec<Vec<u32>>>,
    fail_prefill: bool,
    fail_generate: bool,
    pub prefill_calls: Cell<usize>,
    pub insert_calls: Cell<usize>,
    pub generate_calls: Cell<usize>,
    pub sync_calls: Cell<usize>,
    pub states_created: Cell<usize>,
}

impl MockEngine {
    pub fn new(slots: usize) -> Self {
        MockEngine {
            slots,
            step_tokens: None,
            fail_prefill: false,
            fail_generate: false,
            prefill_calls: Cell::new(0),
            insert_calls: Cell::new(0),
            generate_calls: Cell::new(0),
            sync_calls: Cell::new(0),
            states_created: Cell::new(0),
        }
    }

    /// Script the per-slot tokens emitted at each step; steps beyond the
    /// script emit padding.
    pub fn with_step_tokens(mut self, step_tokens: Vec<Vec<u32>>) -> Self {
        self.step_tokens = Some(step_tokens);
        self
    }

    pub fn failing_prefill(mut self) -> Self {
        self.fail_prefill = true;
        self
    }

    pub fn failing_generate(mut self) -> Self {
        self.fail_generate = true;
        self
    }

    fn emit(&self, step: usize) -> Vec<u32> {
        match &self.step_tokens {
            Some(script) => script
                .get(step)
                .cloned()
                .unwrap_or_else(|| vec![PAD_ID; self.slots]),
            // default emission stays clear of the stop-token ids
            None => (0..self.slots)
                .map(|slot| 100 + (step * 10 + slot) as u32)
                .collect(),
        }
    }
}

impl DecodeEngine for MockEngine {
    type Params = MockParams;
    type PrefillResult = MockPrefill;
    type DecodeState = MockState;
    type SampledBatch = MockSampled;
    type Tokenizer = MockTokenizer;

    fn load_params(&self) -> EngineResult<MockParams> {
        Ok(MockParams)
    }

    fn init_decode_state(&self) -> EngineResult<MockState> {
        self.states_created.set(self.states_created.get() + 1);
        Ok(MockState {
            step: 0,
            inserted: Vec::new(),
        })
    }

    fn prefill(
        &self,
        _params: &MockParams,
        padded_tokens: &[u32],
        true_length: usize,
    ) -> EngineResult<MockPrefill> {
        if self.fail_prefill {
            return Err(EngineError::new("injected prefill failure"));
        }
        assert!(true_length <= padded_tokens.len());
        self.prefill_calls.set(self.prefill_calls.get() + 1);
        Ok(MockPrefill { true_length })
    }

    fn insert(
        &self,
        _prefill: MockPrefill,
        mut state: MockState,
        slot: usize,
    ) -> EngineResult<MockState> {
        assert!(slot < self.slots, "slot {} out of range", slot);
        self.insert_calls.set(self.insert_calls.get() + 1);
        state.inserted.push(slot);
        Ok(state)
    }

    fn generate(
        &self,
        _params: &MockParams,
        mut state: MockState,
    ) -> EngineResult<(MockState, MockSampled)> {
        if self.fail_generate {
            return Err(EngineError::new("injected generate failure"));
        }
        self.generate_calls.set(self.generate_calls.get() + 1);
        let tokens = self.emit(state.step);
        state.step += 1;
        Ok((state, MockSampled { tokens }))
    }

    fn max_concurrent_decodes(&self) -> usize {
        self.slots
    }

    fn get_tokenizer(&self) -> EngineResult<MockTokenizer> {
        Ok(MockTokenizer)
    }

    fn synchronize(&self) -> EngineResult<()> {
        self.sync_calls.set(self.sync_calls.get() + 1);
        // keep phase timings measurably non-zero
        std::thread::sleep(Duration::from_millis(1));
        Ok(())
    }
}

/// Whitespace tokenizer over a hash vocabulary, ids clear of the
/// reserved bos/eos/pad range.
#[derive(Clone)]
pub struct MockTokenizer;

fn word_id(word: &str) -> u32 {
    let mut hash = 1u32;
    for byte in word.bytes() {
        hash = hash.wrapping_mul(31).wrapping_add(byte as u32);
    }
    3 + hash % 31997
}

impl PromptTokenizer for MockTokenizer {
    fn tokenize_and_pad(
        &self,
        text: &str,
        is_bos: bool,
        pad_length: usize,
    ) -> EngineResult<PaddedPrompt> {
        let mut tokens: Vec<u32> = text.split_whitespace().map(word_id).collect();
        if is_bos {
            tokens.insert(0, BOS_ID);
        }
        tokens.truncate(pad_length);
        let true_length = tokens.len();
        tokens.resize(pad_length, PAD_ID);
        Ok(PaddedPrompt {
            tokens,
            true_length,
        })
    }

    fn decode(&self, token_ids: &[u32]) -> String {
        token_ids
            .iter()
            .map(|id| id.to_string())
            .collect::<Vec<_>>()
            .join(" ")
    }

    fn eos_id(&self) -> u32 {
        EOS_ID
    }

    fn pad_id(&self) -> u32 {
        PAD_ID
    }
}

/// Scorer that records every call and reports exact-match percentage.
#[derive(Default)]
pub struct RecordingScorer {
    pub calls: RefCell<Vec<(Vec<String>, Vec<String>)>>,
}

impl QualityScorer for RecordingScorer {
    fn score(&self, predictions: &[String], references: &[String]) -> BTreeMap<String, f64> {
        assert_eq!(predictions.len(), references.len());
        self.calls
            .borrow_mut()
            .push((predictions.to_vec(), references.to_vec()));
        let matches = predictions
            .iter()
            .zip(references)
            .filter(|(p, r)| p == r)
            .count();
        let mut scores = BTreeMap::new();
        scores.insert(
            "exact_match".to_string(),
            100.0 * matches as f64 / predictions.len() as f64,
        );
        scores.insert("num_requests".to_string(), predictions.len() as f64);
        scores
    }
}

/// Trace sink that records activation labels and balanced deactivations.
#[derive(Default)]
pub struct MockTracer {
    pub labels: Vec<String>,
    pub deactivations: usize,
}

impl TraceSink for MockTracer {
    fn activate(&mut self, label: &str) {
        self.labels.push(label.to_string());
    }

    fn deactivate(&mut self) {
        self.deactivations += 1;
    }
}

/// A dataset of `n` distinct rows.
pub fn make_dataset(n: usize) -> Dataset {
    let records = (0..n)
        .map(|i| DatasetRecord {
            prompt: format!("benchmark prompt row {}", i),
            output: format!("reference output {}", i),
            len_prompt_tokens: 4 + i,
            len_output_tokens: 3 + i,
        })
        .collect();
    Dataset::from_records(records).expect("non-empty dataset")
}
