//! Token-to-text reconstruction of generated output
//!
//! The autoregressive phase leaves a step-ordered list of sampled batches.
//! For each slot this module collects the per-step token ids back into one
//! sequence and decodes it twice: in full, and truncated at the first
//! end-of-sequence or padding token. Quality scoring downstream consumes
//! both variants.

use tracing::debug;

use crate::engine::{PromptTokenizer, SlotTokens};

/// Decoded text for one window, one entry per slot.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DecodedOutputs {
    /// Every generated token decoded, stop tokens included
    pub full: Vec<String>,
    /// Decoding stops at the first stop token
    pub truncated: Vec<String>,
}

/// Step-ordered token ids for one slot.
pub fn slot_token_ids<B: SlotTokens>(steps: &[B], slot: usize) -> Vec<u32> {
    steps
        .iter()
        .filter_map(|batch| batch.token_at_slot(slot))
        .collect()
}

/// Prefix of `token_ids` ending before the first occurrence of a stop id.
pub fn truncate_at_stop<'a>(token_ids: &'a [u32], stop_ids: &[u32]) -> &'a [u32] {
    let cut = token_ids
        .iter()
        .position(|id| stop_ids.contains(id))
        .unwrap_or(token_ids.len());
    &token_ids[..cut]
}

/// Rebuilds per-slot text from sampled step batches.
pub struct TextReconstructor<'a, T: PromptTokenizer> {
    tokenizer: &'a T,
    stop_ids: [u32; 2],
}

impl<'a, T: PromptTokenizer> TextReconstructor<'a, T> {
    /// The stop set is the tokenizer's end-of-sequence and padding ids.
    pub fn new(tokenizer: &'a T) -> Self {
        let stop_ids = [tokenizer.eos_id(), tokenizer.pad_id()];
        debug!(?stop_ids, "stop tokens");
        TextReconstructor { tokenizer, stop_ids }
    }

    pub fn stop_ids(&self) -> &[u32] {
        &self.stop_ids
    }

    /// Decode all `batch_size` slots of a window. The truncation buffer is
    /// per slot; one slot's stop token never affects another slot's output.
    pub fn decode_window<B: SlotTokens>(&self, steps: &[B], batch_size: usize) -> DecodedOutputs {
        let mut full = Vec::with_capacity(batch_size);
        let mut truncated = Vec::with_capacity(batch_size);
        for slot in 0..batch_size {
            let token_ids = slot_token_ids(steps, slot);
            let stopped = truncate_at_stop(&token_ids, &self.stop_ids);
            debug!(
                slot,
                len_tok_ids = token_ids.len(),
                len_tok_ids_stop = stopped.len(),
                "reconstructed slot"
            );
            full.push(self.tokenizer.decode(&token_ids));
            truncated.push(self.tokenizer.decode(stopped));
        }
        DecodedOutputs { full, truncated }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::engine::{EngineResult, PaddedPrompt};

    struct StepBatch(Vec<u32>);

    impl SlotTokens for StepBatch {
        fn token_at_slot(&self, slot: usize) -> Option<u32> {
            self.0.get(slot).copied()
        }
    }

    struct IdTokenizer;

    impl PromptTokenizer for IdTokenizer {
        fn tokenize_and_pad(
            &self,
            _text: &str,
            _is_bos: bool,
            pad_length: usize,
        ) -> EngineResult<PaddedPrompt> {
            Ok(PaddedPrompt {
                tokens: vec![0; pad_length],
                true_length: 0,
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
            99
        }

        fn pad_id(&self) -> u32 {
            0
        }
    }

    fn steps_for_slot(token_ids: &[u32]) -> Vec<StepBatch> {
        token_ids.iter().map(|&id| StepBatch(vec![id])).collect()
    }

    #[test]
    fn truncation_stops_before_eos() {
        let ids = [5, 9, 2, 99, 7];
        assert_eq!(truncate_at_stop(&ids, &[99, 0]), &[5, 9, 2]);
    }

    #[test]
    fn truncation_keeps_sequence_without_stop() {
        let ids = [5, 9, 2, 7];
        assert_eq!(truncate_at_stop(&ids, &[99, 0]), &[5, 9, 2, 7]);
    }

    #[test]
    fn full_and_truncated_outputs_differ_after_stop() {
        let tokenizer = IdTokenizer;
        let reconstructor = TextReconstructor::new(&tokenizer);
        let steps = steps_for_slot(&[5, 9, 2, 99, 7]);
        let decoded = reconstructor.decode_window(&steps, 1);
        assert_eq!(decoded.full, vec!["5 9 2 99 7".to_string()]);
        assert_eq!(decoded.truncated, vec!["5 9 2".to_string()]);
    }

    #[test]
    fn truncation_buffer_resets_per_slot() {
        let tokenizer = IdTokenizer;
        let reconstructor = TextReconstructor::new(&tokenizer);
        // slot 0 hits eos at step 1, slot 1 never stops
        let steps = vec![
            StepBatch(vec![5, 11]),
            StepBatch(vec![99, 12]),
            StepBatch(vec![7, 13]),
        ];
        let decoded = reconstructor.decode_window(&steps, 2);
        assert_eq!(decoded.truncated[0], "5");
        assert_eq!(decoded.truncated[1], "11 12 13");
    }

    #[test]
    fn pad_id_also_terminates() {
        let tokenizer = IdTokenizer;
        let reconstructor = TextReconstructor::new(&tokenizer);
        let steps = steps_for_slot(&[4, 0, 6]);
        let decoded = reconstructor.decode_window(&steps, 1);
        assert_eq!(decoded.truncated, vec!["4".to_string()]);
        assert_eq!(decoded.full, vec!["4 0 6".to_string()]);
    }
}
