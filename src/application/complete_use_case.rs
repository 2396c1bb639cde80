// ============================================================
// Layer 2 — Complete Use Case
// ============================================================
// The interactive inspection path: load the trained model and
// tokenizer from a checkpoint directory, then run the
// confidence-gated decoder on a user-supplied prompt.
//
// Generation limits default to the values the model was
// trained with (stored in train_config.json) and can be
// overridden per call.

use anyhow::Result;
use tokenizers::Tokenizer;

use crate::application::train_use_case::TrainConfig;
use crate::infra::{checkpoint::CheckpointManager, tokenizer_store::TokenizerStore};
use crate::ml::decoder::ConfidenceGatedDecoder;
use crate::ml::model::LmScorer;

pub struct CompleteUseCase {
    defaults:  TrainConfig,
    tokenizer: Tokenizer,
    scorer:    LmScorer<burn::backend::Wgpu>,
}

impl CompleteUseCase {
    pub fn new(checkpoint_dir: String) -> Result<Self> {
        let ckpt      = CheckpointManager::new(&checkpoint_dir);
        let defaults  = ckpt.load_config()?;
        let tokenizer = TokenizerStore::new(&checkpoint_dir).load()?;
        let scorer    = LmScorer::from_checkpoint(&ckpt)?;
        Ok(Self { defaults, tokenizer, scorer })
    }

    /// Generate a continuation for `prompt`. An empty string
    /// means the confidence gate stopped generation before the
    /// first token — the model wasn't sure enough to continue.
    pub fn complete(
        &self,
        prompt:         &str,
        max_new_tokens: Option<usize>,
        min_prob:       Option<f64>,
    ) -> Result<String> {
        let decoder = ConfidenceGatedDecoder::new(
            max_new_tokens.unwrap_or(self.defaults.max_gen_tokens),
            min_prob.unwrap_or(self.defaults.min_gen_prob),
        );
        decoder.decode(&self.scorer, &self.tokenizer, prompt)
    }
}
