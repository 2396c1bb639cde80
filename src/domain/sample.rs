// ============================================================
// Layer 3 — CodeSample Domain Type
// ============================================================
// One windowed group of consecutive cleaned source lines,
// used as a single next-token training/evaluation unit.
//
// A sample is created exactly once during corpus
// preprocessing (window the cleaned lines, tokenise the
// joined text) and never mutated afterwards.
//
// Reference: Rust Book §5 (Structs)

use serde::{Deserialize, Serialize};

/// Token id reserved for padding. Batches are padded with it
/// and the loss masks it out.
pub const PAD_ID: u32 = 0;

/// Token id for out-of-vocabulary words.
pub const UNK_ID: u32 = 1;

/// A fully tokenised training sample: `sample_span` cleaned
/// lines joined by newlines, plus their token ids.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CodeSample {
    /// The window text — cleaned lines joined with '\n'
    pub text: String,

    /// Token ids of `text` under the corpus tokenizer
    pub input_ids: Vec<u32>,
}

impl CodeSample {
    pub fn new(text: impl Into<String>, input_ids: Vec<u32>) -> Self {
        Self { text: text.into(), input_ids }
    }

    /// Number of tokens in this sample
    pub fn token_count(&self) -> usize {
        self.input_ids.len()
    }
}

// ─── Unit Tests ───────────────────────────────────────────────────────────────
#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_token_count() {
        let s = CodeSample::new("int a;\nint b;", vec![4, 5, 6]);
        assert_eq!(s.token_count(), 3);
    }
}
