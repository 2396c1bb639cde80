// ============================================================
// Layer 2 — TrainUseCase
// ============================================================
// Orchestrates the full training pipeline in order:
//
//   Step 1: Load .cc/.h source files    (Layer 4 - data)
//   Step 2: Clean + window into samples (Layer 4 - data)
//   Step 3: Build / load tokenizer      (Layer 6 - infra)
//   Step 4: Tokenise the windows        (Layer 4 - data)
//   Step 5: Split train/validation      (Layer 4 - data)
//   Step 6: Reject empty partitions     (Layer 3 - domain)
//   Step 7: Build datasets              (Layer 4 - data)
//   Step 8: Train — or run the
//           hyperparameter search       (Layer 5 - ml/tuning)
//
// The run's randomness has exactly one source: a StdRng seeded
// here from the configured seed and threaded through the
// splitter, the per-epoch evaluation sampling, and (as derived
// seeds) the tuner. Same seed, same corpus → byte-identical
// partitions and decode outputs.
//
// Reference: Burn Book §5 (Training)

use anyhow::Result;
use rand::rngs::StdRng;
use rand::SeedableRng;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;

use crate::data::{
    loader::SourceLoader,
    windower::CorpusWindower,
    splitter::split_train_val,
    dataset::CodeDataset,
};
use crate::domain::error::LmError;
use crate::domain::sample::CodeSample;
use crate::domain::traits::{CorpusSource, TokenCodec};
use crate::infra::{
    tokenizer_store::TokenizerStore,
    checkpoint::CheckpointManager,
};
use crate::ml::schedule::SchedulerKind;
use crate::ml::trainer::run_training;
use crate::tuning::search_space::{ParamValue, SearchSpace};
use crate::tuning::tuner::{choice_param, float_param, Tuner};

// ─── Training Configuration ──────────────────────────────────────────────────
// All options for a training run. Serialisable so it can be
// saved next to the checkpoint and reloaded for inference.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TrainConfig {
    pub corpus_dir:          String,
    pub corpus_file:         Option<String>,
    pub checkpoint_dir:      String,
    pub sample_span:         usize,
    pub sample_stride:       usize,
    pub validation_split:    f64,
    pub max_seq_len:         usize,
    pub batch_size:          usize,
    pub epochs:              usize,
    pub learn_rate:          f64,
    pub scheduler:           SchedulerKind,
    pub weight_decay:        f64,
    pub warmup_steps:        usize,
    pub early_stop_patience: usize,
    pub max_gen_tokens:      usize,
    pub min_gen_prob:        f64,
    pub seed:                u64,
    pub resume:              bool,
    pub tune:                bool,
    pub trials:              usize,
    pub d_model:             usize,
    pub num_heads:           usize,
    pub num_layers:          usize,
    pub d_ff:                usize,
    pub dropout:             f64,
    pub vocab_size:          usize,
}

impl Default for TrainConfig {
    fn default() -> Self {
        Self {
            corpus_dir:          "data/corpus".to_string(),
            corpus_file:         None,
            checkpoint_dir:      "checkpoints".to_string(),
            sample_span:         16,
            sample_stride:       8,
            validation_split:    0.2,
            max_seq_len:         512,
            batch_size:          8,
            epochs:              10,
            learn_rate:          3e-4,
            scheduler:           SchedulerKind::Cosine,
            weight_decay:        0.01,
            warmup_steps:        100,
            early_stop_patience: 3,
            max_gen_tokens:      64,
            min_gen_prob:        0.25,
            seed:                42,
            resume:              false,
            tune:                false,
            trials:              10,
            d_model:             256,
            num_heads:           8,
            num_layers:          6,
            d_ff:                1024,
            dropout:             0.1,
            vocab_size:          8192,
        }
    }
}

// ─── TrainUseCase ─────────────────────────────────────────────────────────────
pub struct TrainUseCase {
    config: TrainConfig,
}

impl TrainUseCase {
    pub fn new(config: TrainConfig) -> Self {
        Self { config }
    }

    /// Execute the full pipeline end to end.
    pub fn execute(&self) -> Result<()> {
        let cfg = &self.config;

        // The single seeded source of randomness for this run.
        let mut rng = StdRng::seed_from_u64(cfg.seed);

        // ── Step 1: Load the corpus ───────────────────────────────────────────
        let files = match &cfg.corpus_file {
            Some(path) => vec![SourceLoader::load_file(path)?],
            None       => SourceLoader::new(&cfg.corpus_dir).load_all()?,
        };
        let raw_lines: Vec<String> = files
            .iter()
            .flat_map(|f| f.lines.iter().cloned())
            .collect();
        tracing::info!("Corpus: {} files, {} raw lines", files.len(), raw_lines.len());

        // ── Step 2: Clean + window ────────────────────────────────────────────
        let windower = CorpusWindower::new(cfg.sample_span, cfg.sample_stride);
        let windows  = windower.clean_and_window(&raw_lines);
        tracing::info!("Built {} sample windows", windows.len());

        // ── Step 3: Build / load tokenizer ────────────────────────────────────
        let tok_store = TokenizerStore::new(&cfg.checkpoint_dir);
        let tokenizer = tok_store.load_or_build(&windows, cfg.vocab_size)?;

        // ── Step 4: Tokenise the windows ──────────────────────────────────────
        let samples = encode_samples(&windows, &tokenizer, cfg.max_seq_len)?;
        tracing::info!("Tokenised {} samples", samples.len());

        // ── Step 5: Seeded split ──────────────────────────────────────────────
        let (train_samples, val_samples) =
            split_train_val(samples, cfg.validation_split, &mut rng);
        tracing::info!(
            "Split: {} train, {} validation",
            train_samples.len(),
            val_samples.len(),
        );

        // ── Step 6: Reject empty partitions ───────────────────────────────────
        // An empty corpus propagates here as zero samples; the
        // trainer must not run over nothing, and the validation
        // pass needs at least one window too.
        if train_samples.is_empty() {
            return Err(LmError::EmptyPartition("training").into());
        }
        if val_samples.is_empty() {
            return Err(LmError::EmptyPartition("validation").into());
        }

        // ── Step 7: Build datasets ────────────────────────────────────────────
        let train_dataset = CodeDataset::new(train_samples);
        let val_dataset   = CodeDataset::new(val_samples);

        // ── Step 8: Train, or search ──────────────────────────────────────────
        if cfg.tune {
            self.run_search(train_dataset, val_dataset, &tokenizer)
        } else {
            let ckpt_manager = CheckpointManager::new(&cfg.checkpoint_dir);
            ckpt_manager.save_config(cfg)?;
            run_training(cfg, train_dataset, val_dataset, &tokenizer, ckpt_manager, &mut rng)?;
            Ok(())
        }
    }

    /// The hyperparameter-search branch: same prepared data,
    /// one full training run per trial, minimising the final
    /// validation loss.
    fn run_search(
        &self,
        train_dataset: CodeDataset,
        val_dataset:   CodeDataset,
        tokenizer:     &impl TokenCodec,
    ) -> Result<()> {
        let cfg   = &self.config;
        let space = SearchSpace::default_space(cfg.batch_size);
        let mut tuner = Tuner::seeded(cfg.trials, cfg.seed);

        let outcome = tuner.minimize(&space, |trial, params| {
            let trial_cfg  = apply_candidate(cfg, trial, params);
            let ckpt       = CheckpointManager::new(&trial_cfg.checkpoint_dir);
            ckpt.save_config(&trial_cfg)?;

            // Each trial replays the run RNG so trials differ
            // only in their hyperparameters.
            let mut trial_rng = StdRng::seed_from_u64(cfg.seed);
            run_training(
                &trial_cfg,
                train_dataset.clone(),
                val_dataset.clone(),
                tokenizer,
                ckpt,
                &mut trial_rng,
            )
        })?;

        println!(
            "Best trial: val_loss={:.4} with {:?}",
            outcome.best_objective, outcome.best_params,
        );
        tracing::info!(
            "Hyperparameter search finished after {} trials",
            outcome.trials_run,
        );
        Ok(())
    }
}

/// Overlay one sampled candidate onto the base configuration.
/// Trials never resume and each writes under its own directory.
fn apply_candidate(
    base:   &TrainConfig,
    trial:  usize,
    params: &HashMap<String, ParamValue>,
) -> TrainConfig {
    let mut cfg = base.clone();
    cfg.checkpoint_dir = format!("{}/trial_{}", base.checkpoint_dir, trial);
    cfg.resume = false;

    if let Some(lr) = float_param(params, "learn_rate") {
        cfg.learn_rate = lr;
    }
    if let Some(wd) = float_param(params, "weight_decay") {
        cfg.weight_decay = wd;
    }
    if let Some(kind) = choice_param(params, "scheduler") {
        if let Ok(parsed) = kind.parse() {
            cfg.scheduler = parsed;
        }
    }
    if let Some(bs) = choice_param(params, "batch_size") {
        if let Ok(parsed) = bs.parse() {
            cfg.batch_size = parsed;
        }
    }
    cfg
}

/// Tokenise windows into samples. Windows shorter than two
/// tokens cannot form a next-token pair and are skipped; long
/// windows are truncated to the model's position table.
fn encode_samples(
    windows:     &[String],
    tokenizer:   &impl TokenCodec,
    max_seq_len: usize,
) -> Result<Vec<CodeSample>> {
    let mut samples = Vec::with_capacity(windows.len());

    for window in windows {
        let mut ids = tokenizer.encode(window)?;
        ids.truncate(max_seq_len);
        if ids.len() < 2 {
            continue;
        }
        samples.push(CodeSample::new(window.clone(), ids));
    }

    Ok(samples)
}
