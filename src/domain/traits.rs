// ============================================================
// Layer 3 — Core Traits (Abstractions)
// ============================================================
// By programming against traits instead of concrete types we
// can swap implementations without changing the code that
// uses them:
//   - SourceLoader implements CorpusSource
//   - the tokenizers-backed codec implements TokenCodec
//   - the Burn model (via LmScorer) implements NextTokenModel,
//     and so do the tiny stub models in the decoder tests
//
// The decoder and the evaluation reporter only ever see
// TokenCodec + NextTokenModel, so the core generation logic
// never depends on a specific model family and runs in unit
// tests without a GPU.
//
// Reference: Rust Book §10 (Traits: Defining Shared Behaviour)

use anyhow::Result;
use crate::domain::source_file::SourceFile;

// ─── CorpusSource ─────────────────────────────────────────────────────────────
/// Any component that can load raw source files for the corpus.
///
/// Implementations:
///   - SourceLoader → loads .cc/.h files from a directory
pub trait CorpusSource {
    /// Load all available files from this source, in a stable
    /// discovery order.
    fn load_all(&self) -> Result<Vec<SourceFile>>;
}

// ─── TokenCodec ───────────────────────────────────────────────────────────────
/// The narrow tokenizer capability the core depends on:
/// text → ids, ids → text, and a per-id surface form lookup
/// for the token-level report rendering.
pub trait TokenCodec {
    fn encode(&self, text: &str) -> Result<Vec<u32>>;

    fn decode(&self, ids: &[u32]) -> Result<String>;

    /// The vocabulary surface form of a single token id,
    /// or None for an id outside the vocabulary.
    fn token_surface(&self, id: u32) -> Option<String>;
}

// ─── NextTokenModel ───────────────────────────────────────────────────────────
/// One forward pass of a language model over a full token-id
/// sequence, reduced to the only thing greedy decoding needs:
/// the normalised probability distribution over the vocabulary
/// at the final position.
///
/// Implementors must already be in inference mode — no dropout,
/// no gradient tracking. `LmScorer` enforces this by being
/// constructed from `model.valid()`.
pub trait NextTokenModel {
    /// Probabilities for the next token after `ids`.
    /// The returned Vec has vocabulary length and sums to ~1.
    fn next_token_probs(&self, ids: &[u32]) -> Result<Vec<f32>>;
}
