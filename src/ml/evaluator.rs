// ============================================================
// Layer 5 — Evaluation Reporter
// ============================================================
// Assembles one qualitative report from a model + codec and a
// sample source, then prints it. Four sections, fixed order:
//
//   1. Sample source text
//   2. Token-level rendering (surface form per id, wrapped)
//   3. The prompt handed to the decoder
//   4. The generated continuation
//
// The sample comes either from a dataset (picked uniformly
// with the run's seeded generator) or from literal text. The
// prompt is a slice of the sample's token ids chosen by the
// PromptStrategy.
//
// This is qualitative tooling: the trainer calls it once per
// epoch so a human can watch completions sharpen, and a
// failure here never blocks training (the controller logs and
// moves on).

use anyhow::Result;
use rand::rngs::StdRng;
use rand::Rng;

use crate::data::dataset::CodeDataset;
use crate::domain::error::LmError;
use crate::domain::traits::{NextTokenModel, TokenCodec};
use crate::ml::decoder::ConfidenceGatedDecoder;

/// Column width of the token rendering. Tokens are never split
/// across lines, so a single token longer than this gets its
/// own overlong line.
const REPORT_WIDTH: usize = 80;

const SEPARATOR: &str =
    "────────────────────────────────────────────────────────────────────────────────";

/// Where the evaluated sample comes from.
pub enum SampleSource<'a> {
    /// Pick one sample uniformly at random from a dataset
    Dataset(&'a CodeDataset),
    /// Encode the supplied text directly
    Literal(&'a str),
}

/// Which part of the sample's token ids becomes the prompt.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PromptStrategy {
    /// First floor(len/2) tokens
    Start,
    /// Everything after the first floor(len/2) tokens
    End,
    /// The entire sequence
    All,
}

impl PromptStrategy {
    /// The id slice this strategy selects as the prompt.
    pub fn slice<'a>(&self, ids: &'a [u32]) -> &'a [u32] {
        let half = ids.len() / 2;
        match self {
            PromptStrategy::Start => &ids[..half],
            PromptStrategy::End   => &ids[half..],
            PromptStrategy::All   => ids,
        }
    }
}

/// Decoder settings for the report's generation section.
#[derive(Debug, Clone, Copy)]
pub struct EvalOptions {
    pub max_new_tokens: usize,
    pub min_prob:       f64,
}

/// The assembled report. Write-only: built, printed, dropped.
struct Report {
    source_text:     String,
    token_rendering: String,
    prompt:          String,
    continuation:    String,
}

impl Report {
    fn print(&self) {
        println!("{SEPARATOR}");
        println!("Sample");
        println!("{SEPARATOR}");
        println!("{}", self.source_text);
        println!("{SEPARATOR}");
        println!("Tokens");
        println!("{SEPARATOR}");
        println!("{}", self.token_rendering);
        println!("{SEPARATOR}");
        println!("Prompt");
        println!("{SEPARATOR}");
        println!("{}", self.prompt);
        println!("{SEPARATOR}");
        println!("Generated");
        println!("{SEPARATOR}");
        println!("{}", self.continuation);
        println!("{SEPARATOR}");
    }
}

/// Build and print one qualitative report.
///
/// The model must already be in inference mode — the trainer
/// hands in an LmScorer built from `model.valid()`, so dropout
/// is off and nothing here touches training state.
pub fn evaluate(
    model:    &impl NextTokenModel,
    codec:    &impl TokenCodec,
    source:   SampleSource<'_>,
    strategy: PromptStrategy,
    opts:     EvalOptions,
    rng:      &mut StdRng,
) -> Result<()> {
    // ── Resolve the sample ────────────────────────────────────────────────────
    let (ids, source_text) = match source {
        SampleSource::Dataset(dataset) => {
            if dataset.is_empty() {
                return Err(LmError::InvalidArgument(
                    "evaluation dataset is empty".into(),
                ).into());
            }
            let index  = rng.gen_range(0..dataset.sample_count());
            let sample = dataset.get_sample(index).expect("index in range");
            let text   = codec.decode(&sample.input_ids)?;
            (sample.input_ids.clone(), text)
        }
        SampleSource::Literal(text) => {
            if text.is_empty() {
                return Err(LmError::InvalidArgument(
                    "literal evaluation text is empty".into(),
                ).into());
            }
            (codec.encode(text)?, text.to_string())
        }
    };

    // ── Token rendering ───────────────────────────────────────────────────────
    let surfaces: Vec<String> = ids
        .iter()
        .map(|&id| codec.token_surface(id).unwrap_or_else(|| format!("<{id}>")))
        .collect();
    let token_rendering = wrap_tokens(&surfaces, REPORT_WIDTH);

    // ── Prompt + continuation ─────────────────────────────────────────────────
    let prompt_ids = strategy.slice(&ids);
    let prompt     = codec.decode(prompt_ids)?;

    let decoder      = ConfidenceGatedDecoder::new(opts.max_new_tokens, opts.min_prob);
    let continuation = decoder.decode(model, codec, &prompt)?;

    Report { source_text, token_rendering, prompt, continuation }.print();
    Ok(())
}

/// Greedy word-wrap over token surface forms: tokens are
/// space-joined until the next one would cross `width`, then a
/// line break. A token is never split, and surface forms are
/// emitted verbatim (whitespace tokens included).
fn wrap_tokens(surfaces: &[String], width: usize) -> String {
    let mut lines: Vec<String> = Vec::new();
    let mut line = String::new();

    for token in surfaces {
        if line.is_empty() {
            line.push_str(token);
        } else if line.len() + 1 + token.len() <= width {
            line.push(' ');
            line.push_str(token);
        } else {
            lines.push(std::mem::take(&mut line));
            line.push_str(token);
        }
    }
    if !line.is_empty() {
        lines.push(line);
    }

    lines.join("\n")
}

// ─── Unit Tests ───────────────────────────────────────────────────────────────
#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::sample::CodeSample;
    use rand::SeedableRng;

    struct FixedModel {
        probs: Vec<f32>,
    }

    impl NextTokenModel for FixedModel {
        fn next_token_probs(&self, _ids: &[u32]) -> Result<Vec<f32>> {
            Ok(self.probs.clone())
        }
    }

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

    fn strings(items: &[&str]) -> Vec<String> {
        items.iter().map(|s| s.to_string()).collect()
    }

    #[test]
    fn test_wrap_fills_lines_without_splitting_tokens() {
        let tokens = strings(&["aaaa", "bbbb", "cccc", "dddd"]);
        // Width 9 fits "aaaa bbbb" but not a third token
        let wrapped = wrap_tokens(&tokens, 9);
        assert_eq!(wrapped, "aaaa bbbb\ncccc dddd");
    }

    #[test]
    fn test_wrap_overlong_token_gets_own_line() {
        let tokens = strings(&["ab", "cdefghijkl", "mn"]);
        let wrapped = wrap_tokens(&tokens, 6);
        assert_eq!(wrapped, "ab\ncdefghijkl\nmn");
    }

    #[test]
    fn test_prompt_strategy_slicing() {
        let ids = [1u32, 2, 3, 4, 5];
        // floor(5/2) = 2
        assert_eq!(PromptStrategy::Start.slice(&ids), &[1, 2]);
        assert_eq!(PromptStrategy::End.slice(&ids),   &[3, 4, 5]);
        assert_eq!(PromptStrategy::All.slice(&ids),   &[1, 2, 3, 4, 5]);
    }

    #[test]
    fn test_empty_literal_is_invalid_argument() {
        let model = FixedModel { probs: vec![1.0] };
        let mut rng = StdRng::seed_from_u64(0);
        let err = evaluate(
            &model, &DigitCodec,
            SampleSource::Literal(""),
            PromptStrategy::All,
            EvalOptions { max_new_tokens: 2, min_prob: 0.0 },
            &mut rng,
        ).unwrap_err();
        assert!(matches!(
            err.downcast_ref::<LmError>(),
            Some(LmError::InvalidArgument(_)),
        ));
    }

    #[test]
    fn test_empty_dataset_is_invalid_argument() {
        let model = FixedModel { probs: vec![1.0] };
        let dataset = CodeDataset::new(Vec::new());
        let mut rng = StdRng::seed_from_u64(0);
        let err = evaluate(
            &model, &DigitCodec,
            SampleSource::Dataset(&dataset),
            PromptStrategy::Start,
            EvalOptions { max_new_tokens: 2, min_prob: 0.0 },
            &mut rng,
        ).unwrap_err();
        assert!(matches!(
            err.downcast_ref::<LmError>(),
            Some(LmError::InvalidArgument(_)),
        ));
    }

    #[test]
    fn test_evaluate_literal_end_to_end() {
        let model = FixedModel { probs: vec![0.0, 0.0, 0.0, 1.0] };
        let mut rng = StdRng::seed_from_u64(7);
        evaluate(
            &model, &DigitCodec,
            SampleSource::Literal("1 2 3 0"),
            PromptStrategy::Start,
            EvalOptions { max_new_tokens: 2, min_prob: 0.5 },
            &mut rng,
        ).unwrap();
    }

    #[test]
    fn test_evaluate_dataset_end_to_end() {
        let model = FixedModel { probs: vec![0.0, 1.0] };
        let dataset = CodeDataset::new(vec![
            CodeSample::new("1 0 1 0", vec![1, 0, 1, 0]),
        ]);
        let mut rng = StdRng::seed_from_u64(7);
        evaluate(
            &model, &DigitCodec,
            SampleSource::Dataset(&dataset),
            PromptStrategy::End,
            EvalOptions { max_new_tokens: 3, min_prob: 0.0 },
            &mut rng,
        ).unwrap();
    }
}
