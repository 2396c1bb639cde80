// ============================================================
// Layer 6 — Checkpoint Manager
// ============================================================
// Saves and restores training state using Burn's
// CompactRecorder (MessagePack + gzip).
//
// What gets saved per checkpoint:
//   1. Model weights    (model_epoch_{n}.mpk.gz)
//   2. Optimizer state  (optim_epoch_{n}.mpk.gz) — Adam moments,
//      so a resumed run continues exactly where it left off
//   3. latest_epoch.json — which epoch was last saved
//   4. train_config.json — run configuration, saved once so
//      inference can rebuild the exact model architecture
//
// Retention is fixed at one: after epoch N is saved, every
// older model/optimizer file is removed.
//
// A missing checkpoint is a normal condition, not an error —
// `try_latest_epoch` returns None and training starts fresh.
//
// Reference: Burn Book §5 (Records and Checkpointing)

use anyhow::{Context, Result};
use std::{fs, path::PathBuf};
use burn::{
    prelude::*,
    record::{CompactRecorder, Record, Recorder},
    tensor::backend::AutodiffBackend,
};

use crate::application::train_use_case::TrainConfig;
use crate::ml::model::TransformerLmModel;

pub struct CheckpointManager {
    dir: PathBuf,
}

impl CheckpointManager {
    /// Creates the directory if it doesn't already exist.
    pub fn new(dir: impl Into<String>) -> Self {
        let dir = PathBuf::from(dir.into());
        fs::create_dir_all(&dir).ok();
        Self { dir }
    }

    /// Save model weights for a given epoch and advance the
    /// latest-epoch pointer.
    pub fn save_model<B: AutodiffBackend>(
        &self,
        model: &TransformerLmModel<B>,
        epoch: usize,
    ) -> Result<()> {
        let path = self.dir.join(format!("model_epoch_{epoch}"));

        CompactRecorder::new()
            .record(model.clone().into_record(), path.clone())
            .with_context(|| {
                format!("Failed to save checkpoint to '{}'", path.display())
            })?;

        let latest_path = self.dir.join("latest_epoch.json");
        fs::write(&latest_path, serde_json::to_string(&epoch)?)
            .with_context(|| "Failed to write latest_epoch.json")?;

        tracing::debug!("Saved checkpoint: epoch {}", epoch);
        Ok(())
    }

    /// Save the optimizer record for a given epoch.
    pub fn save_optimizer<B: AutodiffBackend, R: Record<B>>(
        &self,
        record: R,
        epoch:  usize,
    ) -> Result<()> {
        let path = self.dir.join(format!("optim_epoch_{epoch}"));
        CompactRecorder::new()
            .record(record, path.clone())
            .with_context(|| {
                format!("Failed to save optimizer state to '{}'", path.display())
            })?;
        Ok(())
    }

    /// Load model weights from the latest saved checkpoint.
    /// The model parameter must have the matching architecture.
    pub fn load_model<B: Backend>(
        &self,
        model:  TransformerLmModel<B>,
        device: &B::Device,
    ) -> Result<TransformerLmModel<B>> {
        let epoch = self.latest_epoch()?;
        let path  = self.dir.join(format!("model_epoch_{epoch}"));

        tracing::info!("Loading checkpoint from epoch {}", epoch);

        let record = CompactRecorder::new()
            .load(path.clone(), device)
            .with_context(|| {
                format!("Cannot load checkpoint '{}'. Have you trained the model first?",
                    path.display())
            })?;

        Ok(model.load_record(record))
    }

    /// Load the optimizer record saved for `epoch`.
    pub fn load_optimizer<B: AutodiffBackend, R: Record<B>>(
        &self,
        epoch:  usize,
        device: &B::Device,
    ) -> Result<R> {
        let path = self.dir.join(format!("optim_epoch_{epoch}"));
        CompactRecorder::new()
            .load(path.clone(), device)
            .with_context(|| {
                format!("Cannot load optimizer state '{}'", path.display())
            })
    }

    /// Keep only files belonging to `keep_epoch` — the single
    /// retained checkpoint.
    pub fn retain_latest(&self, keep_epoch: usize) -> Result<()> {
        for entry in fs::read_dir(&self.dir)
            .with_context(|| format!("Cannot read '{}'", self.dir.display()))?
        {
            let path = entry?.path();
            let Some(name) = path.file_name().and_then(|n| n.to_str()) else { continue };
            let Some(epoch) = parse_checkpoint_epoch(name) else { continue };
            if epoch < keep_epoch {
                if let Err(e) = fs::remove_file(&path) {
                    tracing::warn!("Could not remove old checkpoint '{}': {}", path.display(), e);
                }
            }
        }
        Ok(())
    }

    /// Save the training configuration so inference can rebuild
    /// the same model. Called once, before training starts.
    pub fn save_config(&self, cfg: &TrainConfig) -> Result<()> {
        let path = self.dir.join("train_config.json");
        let json = serde_json::to_string_pretty(cfg)?;
        fs::write(&path, json)
            .with_context(|| format!("Cannot write config to '{}'", path.display()))?;
        tracing::debug!("Saved training config to '{}'", path.display());
        Ok(())
    }

    pub fn load_config(&self) -> Result<TrainConfig> {
        let path = self.dir.join("train_config.json");
        let json = fs::read_to_string(&path)
            .with_context(|| {
                format!(
                    "Cannot read config from '{}'. \
                     Make sure you have run 'train' before 'complete'.",
                    path.display()
                )
            })?;
        Ok(serde_json::from_str(&json)?)
    }

    /// The epoch of the most recent checkpoint. Errors when no
    /// checkpoint exists — use `try_latest_epoch` when absence
    /// is an expected outcome.
    pub fn latest_epoch(&self) -> Result<usize> {
        let path = self.dir.join("latest_epoch.json");
        let s = fs::read_to_string(&path)
            .with_context(|| {
                "Cannot find 'latest_epoch.json'. Have you run 'train' first?"
            })?;
        Ok(serde_json::from_str::<usize>(&s)?)
    }

    /// Resume probe: Some(epoch) when a checkpoint exists at
    /// this location, None when training should start fresh.
    pub fn try_latest_epoch(&self) -> Result<Option<usize>> {
        let path = self.dir.join("latest_epoch.json");
        if !path.exists() {
            return Ok(None);
        }
        Ok(Some(self.latest_epoch()?))
    }
}

/// Extract the epoch number from a checkpoint file name, e.g.
/// "model_epoch_3.mpk.gz" → 3. Non-checkpoint files give None.
fn parse_checkpoint_epoch(name: &str) -> Option<usize> {
    let rest = name
        .strip_prefix("model_epoch_")
        .or_else(|| name.strip_prefix("optim_epoch_"))?;
    rest.split('.').next()?.parse().ok()
}

// ─── Unit Tests ───────────────────────────────────────────────────────────────
#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_checkpoint_epoch() {
        assert_eq!(parse_checkpoint_epoch("model_epoch_3.mpk.gz"), Some(3));
        assert_eq!(parse_checkpoint_epoch("optim_epoch_12.mpk.gz"), Some(12));
        assert_eq!(parse_checkpoint_epoch("latest_epoch.json"), None);
        assert_eq!(parse_checkpoint_epoch("tokenizer.json"), None);
    }

    #[test]
    fn test_try_latest_epoch_is_none_without_checkpoint() {
        let dir = tempfile::tempdir().unwrap();
        let ckpt = CheckpointManager::new(dir.path().to_str().unwrap());
        assert!(ckpt.try_latest_epoch().unwrap().is_none());
    }

    #[test]
    fn test_retain_latest_removes_older_files_only() {
        let dir = tempfile::tempdir().unwrap();
        for name in [
            "model_epoch_1.mpk.gz", "optim_epoch_1.mpk.gz",
            "model_epoch_2.mpk.gz", "optim_epoch_2.mpk.gz",
            "latest_epoch.json", "train_config.json",
        ] {
            fs::write(dir.path().join(name), b"x").unwrap();
        }

        let ckpt = CheckpointManager::new(dir.path().to_str().unwrap());
        ckpt.retain_latest(2).unwrap();

        let mut remaining: Vec<String> = fs::read_dir(dir.path()).unwrap()
            .map(|e| e.unwrap().file_name().to_string_lossy().into_owned())
            .collect();
        remaining.sort();
        assert_eq!(remaining, vec![
            "latest_epoch.json",
            "model_epoch_2.mpk.gz",
            "optim_epoch_2.mpk.gz",
            "train_config.json",
        ]);
    }
}
