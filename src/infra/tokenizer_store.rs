// ============================================================
// Layer 6 — Tokenizer Store
// ============================================================
// Builds, saves, and loads the corpus tokenizer.
//
// The vocabulary is word-level over whitespace-split code
// tokens, written directly as a HuggingFace tokenizer JSON and
// loaded back through the tokenizers crate — the same file is
// reused on resume and at inference time so train and
// generation always share one vocabulary.
//
// Code is case-sensitive, so there is no lowercasing and no
// punctuation stripping: `Board::Reset` and `board` are
// different tokens on purpose. The pre-tokenizer splits on
// whitespace only (WhitespaceSplit), matching how the
// vocabulary is counted here.
//
// Vocabulary ids are assigned by descending frequency with
// alphabetical tie-breaks, so an identical corpus always
// produces an identical tokenizer.

use anyhow::{Context, Result};
use std::path::PathBuf;
use tokenizers::Tokenizer;

use crate::domain::sample::{PAD_ID, UNK_ID};
use crate::domain::traits::TokenCodec;

pub struct TokenizerStore {
    dir: PathBuf,
}

impl TokenizerStore {
    pub fn new(dir: impl Into<String>) -> Self {
        Self { dir: PathBuf::from(dir.into()) }
    }

    /// Load existing tokenizer or build a new one from texts
    pub fn load_or_build(
        &self,
        texts:      &[String],
        vocab_size: usize,
    ) -> Result<Tokenizer> {
        let tok_path = self.dir.join("tokenizer.json");
        if tok_path.exists() {
            tracing::info!("Loading existing tokenizer from disk");
            self.load()
        } else {
            tracing::info!("Building new tokenizer (vocab_size={})", vocab_size);
            self.build_and_save(texts, vocab_size)
        }
    }

    /// Load a previously saved tokenizer from JSON file
    pub fn load(&self) -> Result<Tokenizer> {
        let path = self.dir.join("tokenizer.json");
        Tokenizer::from_file(&path)
            .map_err(|e| anyhow::anyhow!(
                "Cannot load tokenizer from '{}': {}", path.display(), e
            ))
    }

    /// Build a word-level vocabulary from the window texts and
    /// write a tokenizer JSON that Tokenizer::from_file accepts.
    fn build_and_save(&self, texts: &[String], vocab_size: usize) -> Result<Tokenizer> {
        std::fs::create_dir_all(&self.dir).ok();

        // ── Step 1: Count word frequencies ────────────────────────────────────
        use std::collections::HashMap;
        let mut freq: HashMap<String, usize> = HashMap::new();

        for text in texts {
            for word in text.split_whitespace() {
                *freq.entry(word.to_string()).or_insert(0) += 1;
            }
        }

        // Sort by frequency descending with alphabetical
        // tie-breaks — id assignment must be deterministic.
        let mut words: Vec<(String, usize)> = freq.into_iter().collect();
        words.sort_by(|a, b| b.1.cmp(&a.1).then_with(|| a.0.cmp(&b.0)));

        // Reserve 2 slots for the special tokens
        let max_words = vocab_size.saturating_sub(2);
        words.truncate(max_words);

        // ── Step 2: Build vocab JSON ──────────────────────────────────────────
        let mut vocab = serde_json::json!({
            "[PAD]": PAD_ID,
            "[UNK]": UNK_ID,
        });

        let mut next_id = 2usize;
        for (word, _) in &words {
            if vocab.get(word).is_none() {
                vocab[word] = serde_json::json!(next_id);
                next_id += 1;
            }
        }

        // ── Step 3: Write tokenizer JSON in HuggingFace format ────────────────
        let tokenizer_json = serde_json::json!({
            "version": "1.0",
            "truncation": null,
            "padding": null,
            "added_tokens": [
                {"id": PAD_ID, "content": "[PAD]", "single_word": false, "lstrip": false, "rstrip": false, "normalized": false, "special": true},
                {"id": UNK_ID, "content": "[UNK]", "single_word": false, "lstrip": false, "rstrip": false, "normalized": false, "special": true}
            ],
            "normalizer": null,
            "pre_tokenizer": {
                "type": "WhitespaceSplit"
            },
            "post_processor": null,
            "decoder": null,
            "model": {
                "type": "WordLevel",
                "vocab": vocab,
                "unk_token": "[UNK]"
            }
        });

        let tok_path = self.dir.join("tokenizer.json");
        std::fs::write(
            &tok_path,
            serde_json::to_string_pretty(&tokenizer_json)?
        ).with_context(|| "Cannot write tokenizer JSON")?;

        tracing::info!(
            "Tokenizer built with {} entries, saved to '{}'",
            next_id,
            tok_path.display()
        );

        Tokenizer::from_file(&tok_path)
            .map_err(|e| anyhow::anyhow!("Cannot reload tokenizer: {e}"))
    }
}

// ─── TokenCodec for the tokenizers crate ──────────────────────────────────────
// The rest of the system only sees this narrow interface.
impl TokenCodec for Tokenizer {
    fn encode(&self, text: &str) -> Result<Vec<u32>> {
        let enc = (**self).encode(text, false)
            .map_err(|e| anyhow::anyhow!("Tokenisation error: {e}"))?;
        Ok(enc.get_ids().to_vec())
    }

    fn decode(&self, ids: &[u32]) -> Result<String> {
        // skip_special_tokens = false: an [UNK] in a sample stays
        // visible instead of silently vanishing from the report.
        (**self).decode(ids, false)
            .map_err(|e| anyhow::anyhow!("Detokenisation error: {e}"))
    }

    fn token_surface(&self, id: u32) -> Option<String> {
        self.id_to_token(id)
    }
}

// ─── Unit Tests ───────────────────────────────────────────────────────────────
#[cfg(test)]
mod tests {
    use super::*;

    fn texts(items: &[&str]) -> Vec<String> {
        items.iter().map(|s| s.to_string()).collect()
    }

    #[test]
    fn test_build_encode_decode_round_trip() {
        let dir = tempfile::tempdir().unwrap();
        let store = TokenizerStore::new(dir.path().to_str().unwrap());

        let corpus = texts(&["int x = 1 ;", "int y = 2 ;"]);
        let tok = store.load_or_build(&corpus, 100).unwrap();

        // Space-separated code round-trips through the word-level vocab
        let ids = TokenCodec::encode(&tok, "int x = 1 ;").unwrap();
        assert_eq!(ids.len(), 5);
        assert_eq!(TokenCodec::decode(&tok, &ids).unwrap(), "int x = 1 ;");
    }

    #[test]
    fn test_case_is_preserved() {
        let dir = tempfile::tempdir().unwrap();
        let store = TokenizerStore::new(dir.path().to_str().unwrap());

        let corpus = texts(&["Reset reset"]);
        let tok = store.load_or_build(&corpus, 100).unwrap();

        let ids = TokenCodec::encode(&tok, "Reset reset").unwrap();
        assert_eq!(ids.len(), 2);
        assert_ne!(ids[0], ids[1]);
    }

    #[test]
    fn test_unknown_words_map_to_unk() {
        let dir = tempfile::tempdir().unwrap();
        let store = TokenizerStore::new(dir.path().to_str().unwrap());

        let corpus = texts(&["known words only"]);
        let tok = store.load_or_build(&corpus, 100).unwrap();

        let ids = TokenCodec::encode(&tok, "unseen").unwrap();
        assert_eq!(ids, vec![UNK_ID]);
    }

    #[test]
    fn test_surface_form_lookup() {
        let dir = tempfile::tempdir().unwrap();
        let store = TokenizerStore::new(dir.path().to_str().unwrap());

        let corpus = texts(&["alpha beta"]);
        let tok = store.load_or_build(&corpus, 100).unwrap();

        let ids = TokenCodec::encode(&tok, "alpha").unwrap();
        assert_eq!(tok.token_surface(ids[0]).as_deref(), Some("alpha"));
        assert_eq!(tok.token_surface(PAD_ID).as_deref(), Some("[PAD]"));
    }

    #[test]
    fn test_rebuild_from_identical_corpus_is_deterministic() {
        let corpus = texts(&["b b a a a c"]);

        let dir1 = tempfile::tempdir().unwrap();
        let tok1 = TokenizerStore::new(dir1.path().to_str().unwrap())
            .load_or_build(&corpus, 100).unwrap();
        let dir2 = tempfile::tempdir().unwrap();
        let tok2 = TokenizerStore::new(dir2.path().to_str().unwrap())
            .load_or_build(&corpus, 100).unwrap();

        let sentence = "a b c";
        assert_eq!(
            TokenCodec::encode(&tok1, sentence).unwrap(),
            TokenCodec::encode(&tok2, sentence).unwrap(),
        );
    }
}
