// ============================================================
// Layer 5 — Confidence-Gated Greedy Decoder
// ============================================================
// Turns a prompt into generated tokens one step at a time.
//
// Each step runs one forward pass over the full running
// sequence, takes the arg-max of the next-token distribution
// (ties broken towards the lowest token id), and appends it —
// unless the top probability falls below `min_prob`, in which
// case generation stops. The gate is a strict less-than: a
// token whose probability is exactly `min_prob` is accepted.
//
// The gate is what lets an early, undertrained model produce
// an honest empty continuation instead of confident noise.
// Generation is otherwise bounded by `max_new_tokens`.
//
// Greedy, non-batched, single-sequence by design: the output
// is read by a human during qualitative evaluation, so there
// is no beam search and no sampling temperature.
//
// The decoder only sees the NextTokenModel + TokenCodec
// traits, so these tests run against stub collaborators with
// no tensor math anywhere near them.

use anyhow::{bail, Result};

use crate::domain::error::LmError;
use crate::domain::traits::{NextTokenModel, TokenCodec};

pub struct ConfidenceGatedDecoder {
    /// Hard cap on the number of generated tokens
    max_new_tokens: usize,
    /// Minimum top-1 probability to keep generating
    min_prob: f64,
}

impl ConfidenceGatedDecoder {
    pub fn new(max_new_tokens: usize, min_prob: f64) -> Self {
        Self { max_new_tokens, min_prob }
    }

    /// Variant with the confidence gate disabled: no probability
    /// is strictly below 0.0, so every step passes the gate and
    /// only `max_new_tokens` bounds the loop.
    pub fn ungated(max_new_tokens: usize) -> Self {
        Self::new(max_new_tokens, 0.0)
    }

    /// Generate a continuation for `prompt` and return only the
    /// decoded suffix (the prompt text is not echoed back).
    pub fn decode(
        &self,
        model:  &impl NextTokenModel,
        codec:  &impl TokenCodec,
        prompt: &str,
    ) -> Result<String> {
        if prompt.is_empty() {
            return Err(LmError::InvalidArgument("prompt must not be empty".into()).into());
        }

        let mut ids = codec.encode(prompt)?;
        if ids.is_empty() {
            return Err(LmError::InvalidArgument("prompt produced no tokens".into()).into());
        }
        let input_len = ids.len();

        while ids.len() - input_len < self.max_new_tokens {
            let probs = model.next_token_probs(&ids)?;
            let Some((token_id, prob)) = argmax(&probs) else {
                bail!("model returned an empty probability distribution");
            };

            // Confidence gate: strictly below the threshold stops
            // generation; exactly at the threshold continues.
            if (prob as f64) < self.min_prob {
                tracing::debug!(
                    "Confidence gate hit after {} tokens (top prob {:.4} < {:.4})",
                    ids.len() - input_len, prob, self.min_prob,
                );
                break;
            }

            ids.push(token_id);
        }

        if ids.len() == input_len {
            return Ok(String::new());
        }
        codec.decode(&ids[input_len..])
    }
}

/// Deterministic arg-max: the first strictly-greater value
/// wins, so equal probabilities resolve to the lowest id.
fn argmax(probs: &[f32]) -> Option<(u32, f32)> {
    let mut best: Option<(u32, f32)> = None;
    for (id, &p) in probs.iter().enumerate() {
        match best {
            Some((_, bp)) if p <= bp => {}
            _ => best = Some((id as u32, p)),
        }
    }
    best
}

// ─── Unit Tests ───────────────────────────────────────────────────────────────
#[cfg(test)]
mod tests {
    use super::*;

    /// Model stub that returns the same distribution at every
    /// step, regardless of the sequence so far.
    struct FixedModel {
        probs: Vec<f32>,
    }

    impl NextTokenModel for FixedModel {
        fn next_token_probs(&self, _ids: &[u32]) -> Result<Vec<f32>> {
            Ok(self.probs.clone())
        }
    }

    /// Codec stub: every whitespace-separated word parses as its
    /// own id, ids decode back to the same digit words. Round
    /// trips exactly, which is all the decoder relies on.
    struct DigitCodec;

    impl TokenCodec for DigitCodec {
        fn encode(&self, text: &str) -> Result<Vec<u32>> {
            text.split_whitespace()
                .map(|w| w.parse::<u32>().map_err(Into::into))
                .collect()
        }

        fn decode(&self, ids: &[u32]) -> Result<String> {
            Ok(ids.iter().map(u32::to_string).collect::<Vec<_>>().join(" "))
        }

        fn token_surface(&self, id: u32) -> Option<String> {
            Some(id.to_string())
        }
    }

    /// Distribution with the given winner at `id`, remaining
    /// mass spread over id 0.
    fn peaked(vocab: usize, id: usize, prob: f32) -> Vec<f32> {
        let mut probs = vec![0.0; vocab];
        probs[id] = prob;
        probs[0] += 1.0 - prob;
        probs
    }

    #[test]
    fn test_generates_up_to_the_cap() {
        // Top prob 0.99 >= 0.95 every step → exactly 3 tokens
        let model = FixedModel { probs: peaked(10, 7, 0.99) };
        let out = ConfidenceGatedDecoder::new(3, 0.95)
            .decode(&model, &DigitCodec, "1 2")
            .unwrap();
        assert_eq!(out, "7 7 7");
    }

    #[test]
    fn test_gate_stops_generation_immediately() {
        // Top prob 0.5 < 0.95 on the first step → empty suffix
        let model = FixedModel { probs: peaked(10, 7, 0.5) };
        let out = ConfidenceGatedDecoder::new(8, 0.95)
            .decode(&model, &DigitCodec, "1 2")
            .unwrap();
        assert_eq!(out, "");
    }

    #[test]
    fn test_probability_equal_to_threshold_is_accepted() {
        // 0.75 is exactly representable in f32/f64, so the
        // boundary comparison is exact: equal → keep generating.
        let model = FixedModel { probs: peaked(10, 4, 0.75) };
        let out = ConfidenceGatedDecoder::new(2, 0.75)
            .decode(&model, &DigitCodec, "9")
            .unwrap();
        assert_eq!(out, "4 4");
    }

    #[test]
    fn test_ties_break_to_lowest_id() {
        let model = FixedModel { probs: vec![0.1, 0.4, 0.4, 0.1] };
        let out = ConfidenceGatedDecoder::new(1, 0.0)
            .decode(&model, &DigitCodec, "0")
            .unwrap();
        assert_eq!(out, "1");
    }

    #[test]
    fn test_only_the_suffix_is_returned() {
        let model = FixedModel { probs: peaked(10, 5, 1.0) };
        let out = ConfidenceGatedDecoder::new(2, 0.5)
            .decode(&model, &DigitCodec, "8 8 8")
            .unwrap();
        // Prompt ids (8 8 8) must not leak into the output
        assert_eq!(out, "5 5");
    }

    #[test]
    fn test_empty_prompt_is_invalid_argument() {
        let model = FixedModel { probs: peaked(10, 5, 1.0) };
        let err = ConfidenceGatedDecoder::new(2, 0.5)
            .decode(&model, &DigitCodec, "")
            .unwrap_err();
        assert!(matches!(
            err.downcast_ref::<LmError>(),
            Some(LmError::InvalidArgument(_)),
        ));
    }

    #[test]
    fn test_ungated_variant_runs_to_the_cap() {
        // Tiny top prob, but the gate is disabled → cap applies
        let model = FixedModel { probs: peaked(10, 3, 0.01) };
        let out = ConfidenceGatedDecoder::ungated(4)
            .decode(&model, &DigitCodec, "2")
            .unwrap();
        assert_eq!(out, "3 3 3 3");
    }

    #[test]
    fn test_gated_and_ungated_agree_when_model_is_confident() {
        // With every step above the threshold, the gate never
        // fires and both variants emit the same continuation.
        let model = FixedModel { probs: peaked(10, 6, 0.99) };
        let gated   = ConfidenceGatedDecoder::new(4, 0.9)
            .decode(&model, &DigitCodec, "1 2").unwrap();
        let ungated = ConfidenceGatedDecoder::ungated(4)
            .decode(&model, &DigitCodec, "1 2").unwrap();
        assert_eq!(gated, ungated);
    }

    #[test]
    fn test_codec_round_trip_contract() {
        // The boundary assumption the decoder builds on:
        // decode(encode(text)) == text for the codec.
        let text = "12 7 430 9";
        let ids = DigitCodec.encode(text).unwrap();
        assert_eq!(DigitCodec.decode(&ids).unwrap(), text);
    }
}
