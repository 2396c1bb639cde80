// ============================================================
// Layer 1 — CLI Commands and Arguments
// ============================================================
// Defines the two subcommands: `train` and `complete`
// and all their configurable flags.
//
// clap's derive macros automatically generate help text,
// missing-argument errors, and type conversion.
//
// Reference: Rust Book §12 (Building a CLI Program)

use clap::{Args, Subcommand};
use crate::application::train_use_case::TrainConfig;
use crate::ml::schedule::SchedulerKind;

/// The two top-level subcommands available to the user
#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Train the code language model on a source corpus
    Train(TrainArgs),

    /// Generate a completion from a trained checkpoint
    Complete(CompleteArgs),
}

/// All arguments for the `train` command.
/// Each field becomes a --flag on the command line.
#[derive(Args, Debug)]
pub struct TrainArgs {
    /// Directory containing the .cc/.h source corpus
    #[arg(long, default_value = "data/corpus")]
    pub corpus_dir: String,

    /// Train on exactly one named file instead of a directory
    #[arg(long)]
    pub corpus_file: Option<String>,

    /// Directory for checkpoints, tokenizer, and metrics
    #[arg(long, default_value = "checkpoints")]
    pub checkpoint_dir: String,

    /// Cleaned lines per sample window
    #[arg(long, default_value_t = 16)]
    pub sample_span: usize,

    /// Lines the window advances between samples.
    /// Values above the span are legal and leave gaps.
    #[arg(long, default_value_t = 8)]
    pub sample_stride: usize,

    /// Fraction of samples held out for validation
    #[arg(long, default_value_t = 0.2)]
    pub validation_split: f64,

    /// Maximum number of tokens per input sequence
    #[arg(long, default_value_t = 512)]
    pub max_seq_len: usize,

    /// Number of samples processed together in one forward pass
    #[arg(long, default_value_t = 8)]
    pub batch_size: usize,

    /// Epoch budget for the training controller
    #[arg(long, default_value_t = 10)]
    pub epochs: usize,

    /// Peak learning rate after warmup
    #[arg(long, default_value_t = 3e-4)]
    pub learn_rate: f64,

    /// Learning-rate decay shape: constant, linear or cosine
    #[arg(long, default_value = "cosine")]
    pub scheduler: SchedulerKind,

    /// AdamW decoupled weight decay
    #[arg(long, default_value_t = 0.01)]
    pub weight_decay: f64,

    /// Optimiser steps of linear learning-rate warmup
    #[arg(long, default_value_t = 100)]
    pub warmup_steps: usize,

    /// Epochs without validation improvement before stopping
    #[arg(long, default_value_t = 3)]
    pub early_stop_patience: usize,

    /// Cap on tokens generated per qualitative report
    #[arg(long, default_value_t = 64)]
    pub max_gen_tokens: usize,

    /// Confidence gate: stop generating when the top token's
    /// probability drops below this value
    #[arg(long, default_value_t = 0.25)]
    pub min_gen_prob: f64,

    /// Seed for every randomised step of the run
    #[arg(long, default_value_t = 42)]
    pub seed: u64,

    /// Resume from the latest checkpoint at the output location
    /// (starting fresh when none exists)
    #[arg(long)]
    pub resume: bool,

    /// Run the hyperparameter search instead of direct training
    #[arg(long)]
    pub tune: bool,

    /// Number of search trials when --tune is set
    #[arg(long, default_value_t = 10)]
    pub trials: usize,

    /// Hidden dimension of the transformer
    #[arg(long, default_value_t = 256)]
    pub d_model: usize,

    /// Number of attention heads (d_model must divide evenly)
    #[arg(long, default_value_t = 8)]
    pub num_heads: usize,

    /// Number of stacked decoder layers
    #[arg(long, default_value_t = 6)]
    pub num_layers: usize,

    /// Inner dimension of the feed-forward network
    #[arg(long, default_value_t = 1024)]
    pub d_ff: usize,

    /// Dropout probability during training
    #[arg(long, default_value_t = 0.1)]
    pub dropout: f64,

    /// Maximum vocabulary entries (two reserved for specials)
    #[arg(long, default_value_t = 8192)]
    pub vocab_size: usize,
}

/// Convert CLI TrainArgs into the application-layer TrainConfig.
/// This is the boundary between Layer 1 and Layer 2 —
/// the application layer never sees clap types.
impl From<TrainArgs> for TrainConfig {
    fn from(a: TrainArgs) -> Self {
        TrainConfig {
            corpus_dir:          a.corpus_dir,
            corpus_file:         a.corpus_file,
            checkpoint_dir:      a.checkpoint_dir,
            sample_span:         a.sample_span,
            sample_stride:       a.sample_stride,
            validation_split:    a.validation_split,
            max_seq_len:         a.max_seq_len,
            batch_size:          a.batch_size,
            epochs:              a.epochs,
            learn_rate:          a.learn_rate,
            scheduler:           a.scheduler,
            weight_decay:        a.weight_decay,
            warmup_steps:        a.warmup_steps,
            early_stop_patience: a.early_stop_patience,
            max_gen_tokens:      a.max_gen_tokens,
            min_gen_prob:        a.min_gen_prob,
            seed:                a.seed,
            resume:              a.resume,
            tune:                a.tune,
            trials:              a.trials,
            d_model:             a.d_model,
            num_heads:           a.num_heads,
            num_layers:          a.num_layers,
            d_ff:                a.d_ff,
            dropout:             a.dropout,
            vocab_size:          a.vocab_size,
        }
    }
}

/// All arguments for the `complete` command
#[derive(Args, Debug)]
pub struct CompleteArgs {
    /// The code prompt to continue
    #[arg(long)]
    pub prompt: String,

    /// Directory where checkpoints were saved during training
    #[arg(long, default_value = "checkpoints")]
    pub checkpoint_dir: String,

    /// Override the trained cap on generated tokens
    #[arg(long)]
    pub max_new_tokens: Option<usize>,

    /// Override the trained confidence gate (0 disables it)
    #[arg(long)]
    pub min_prob: Option<f64>,
}
