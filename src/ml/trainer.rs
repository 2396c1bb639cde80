// ============================================================
// Layer 5 — Training Loop
// ============================================================
// Full train + validation loop using Burn's DataLoader and
// AdamW, driven by the TrainingController state machine.
//
// Per epoch:
//   1. Training phase on Autodiff<Wgpu>, one optimiser step per
//      batch with the scheduled learning rate
//   2. Validation phase on the inner backend via model.valid()
//      (dropout disabled, no autodiff overhead)
//   3. Metrics row + checkpoint (model + optimizer, retention 1)
//   4. Epoch-boundary signals: the controller counts down the
//      budget and triggers one qualitative report; the early
//      stopper watches validation loss. Either one's Stop ends
//      the run after the current epoch.
//
// Resumption: when cfg.resume is set and a checkpoint exists at
// the output location, model weights and optimizer state are
// restored and the epoch counter continues from there. No
// checkpoint means a fresh start, not an error.
//
// Reference: Burn Book §5, Loshchilov & Hutter (2019) AdamW

use anyhow::Result;
use burn::{
    data::dataloader::{DataLoader, DataLoaderBuilder},
    module::AutodiffModule,
    optim::{AdamWConfig, GradientsParams, Optimizer},
    prelude::*,
};
use rand::rngs::StdRng;

use crate::application::train_use_case::TrainConfig;
use crate::data::batcher::{LmBatch, LmBatcher};
use crate::data::dataset::CodeDataset;
use crate::domain::traits::TokenCodec;
use crate::infra::checkpoint::CheckpointManager;
use crate::infra::metrics::{EpochMetrics, MetricsLogger};
use crate::ml::controller::{ControlSignal, EarlyStopping, ReportRequest, TrainingController};
use crate::ml::evaluator::EvalOptions;
use crate::ml::model::{LmScorer, TransformerLmConfig, TransformerLmModel};
use crate::ml::schedule::LrSchedule;

type MyBackend      = burn::backend::Autodiff<burn::backend::Wgpu>;
type MyInnerBackend = burn::backend::Wgpu;

/// Run the full training loop and return the final validation
/// loss (the hyperparameter tuner minimises this value).
pub fn run_training<C: TokenCodec>(
    cfg:           &TrainConfig,
    train_dataset: CodeDataset,
    val_dataset:   CodeDataset,
    codec:         &C,
    ckpt_manager:  CheckpointManager,
    rng:           &mut StdRng,
) -> Result<f64> {
    let device = burn::backend::wgpu::WgpuDevice::default();
    tracing::info!("Using WGPU device: {:?}", device);
    train_loop(cfg, train_dataset, val_dataset, codec, ckpt_manager, rng, device)
}

fn train_loop<C: TokenCodec>(
    cfg:           &TrainConfig,
    train_dataset: CodeDataset,
    val_dataset:   CodeDataset,
    codec:         &C,
    ckpt_manager:  CheckpointManager,
    rng:           &mut StdRng,
    device:        burn::backend::wgpu::WgpuDevice,
) -> Result<f64> {

    // ── Build model ───────────────────────────────────────────────────────────
    let model_cfg = TransformerLmConfig::new(
        cfg.vocab_size, cfg.max_seq_len, cfg.d_model,
        cfg.num_heads, cfg.num_layers, cfg.d_ff, cfg.dropout,
    );
    let mut model: TransformerLmModel<MyBackend> = model_cfg.init(&device);
    tracing::info!("Model ready: {} layers, d_model={}", cfg.num_layers, cfg.d_model);

    // ── AdamW optimiser ───────────────────────────────────────────────────────
    // Decoupled weight decay — the decay is applied to the
    // weights directly, not folded into the gradient.
    let optim_cfg = AdamWConfig::new()
        .with_epsilon(1e-8)
        .with_weight_decay(cfg.weight_decay as f32);
    let mut optim = optim_cfg.init();

    // ── Checkpoint resumption ─────────────────────────────────────────────────
    // Absence of a checkpoint is a normal fresh start.
    let completed_epochs = if cfg.resume {
        match ckpt_manager.try_latest_epoch()? {
            Some(epoch) => {
                model = ckpt_manager.load_model(model, &device)?;
                match ckpt_manager.load_optimizer(epoch, &device) {
                    Ok(record) => {
                        optim = optim.load_record(record);
                        tracing::info!("Resumed model and optimizer from epoch {}", epoch);
                    }
                    Err(e) => {
                        tracing::warn!("Optimizer state not restored: {e}");
                    }
                }
                epoch
            }
            None => {
                tracing::info!("No checkpoint at the output location — starting fresh");
                0
            }
        }
    } else {
        0
    };

    // ── Data loaders ──────────────────────────────────────────────────────────
    let train_batcher = LmBatcher::<MyBackend>::new(device.clone());
    let train_loader  = DataLoaderBuilder::new(train_batcher)
        .batch_size(cfg.batch_size)
        .shuffle(cfg.seed)
        .num_workers(1)
        .build(train_dataset.clone());

    let val_batcher = LmBatcher::<MyInnerBackend>::new(device.clone());
    let val_loader  = DataLoaderBuilder::new(val_batcher)
        .batch_size(cfg.batch_size)
        .num_workers(1)
        .build(val_dataset);

    // ── Schedule, controller, early stopping, metrics ─────────────────────────
    let steps_per_epoch = train_dataset.sample_count().div_ceil(cfg.batch_size).max(1);
    let schedule = LrSchedule::new(
        cfg.learn_rate,
        cfg.warmup_steps,
        steps_per_epoch * cfg.epochs,
        cfg.scheduler,
    );
    let mut global_step = completed_epochs * steps_per_epoch;

    let remaining = cfg.epochs.saturating_sub(completed_epochs);
    let mut controller = TrainingController::new(remaining);
    let mut early_stop = EarlyStopping::new(cfg.early_stop_patience);
    let metrics = MetricsLogger::new(&cfg.checkpoint_dir)?;

    let eval_opts = EvalOptions {
        max_new_tokens: cfg.max_gen_tokens,
        min_prob:       cfg.min_gen_prob,
    };

    let mut final_val_loss = f64::NAN;

    // ── Epoch loop ────────────────────────────────────────────────────────────
    for epoch in (completed_epochs + 1)..=cfg.epochs {

        // ── Training phase ────────────────────────────────────────────────────
        let mut train_loss_sum = 0.0f64;
        let mut train_batches  = 0usize;

        for batch in train_loader.iter() {
            let (loss, _) = model.forward_loss(batch.inputs, batch.targets);

            let loss_val: f64 = loss.clone().into_scalar().elem::<f64>();
            train_loss_sum += loss_val;
            train_batches  += 1;

            // Backward pass + AdamW update at the scheduled rate
            let grads = loss.backward();
            let grads = GradientsParams::from_grads(grads, &model);
            model = optim.step(schedule.lr_at(global_step), model, grads);
            global_step += 1;
        }

        let avg_train_loss = if train_batches > 0 {
            train_loss_sum / train_batches as f64
        } else { f64::NAN };

        // ── Validation phase ──────────────────────────────────────────────────
        // model.valid() → TransformerLmModel<MyInnerBackend>
        let model_valid = model.valid();
        let avg_val_loss = validation_pass(&model_valid, val_loader.as_ref());
        final_val_loss = avg_val_loss;

        println!(
            "Epoch {:>3}/{} | train_loss={:.4} | val_loss={:.4} | ppl={:.2}",
            epoch, cfg.epochs, avg_train_loss, avg_val_loss, avg_val_loss.exp(),
        );
        metrics.log(&EpochMetrics::new(epoch, avg_train_loss, avg_val_loss))?;

        // ── Checkpoint (retention 1) ──────────────────────────────────────────
        ckpt_manager.save_model(&model, epoch)?;
        ckpt_manager.save_optimizer(optim.to_record(), epoch)?;
        ckpt_manager.retain_latest(epoch)?;

        // ── Epoch-boundary signals ────────────────────────────────────────────
        // The controller triggers one qualitative report, then
        // counts the epoch; the early stopper watches val loss.
        // Whichever requests Stop first wins.
        let scorer = LmScorer::new(model_valid, cfg.max_seq_len, device.clone());
        let budget_signal = controller.epoch_end(
            Some(ReportRequest {
                model:   &scorer,
                codec,
                dataset: &train_dataset,
                opts:    eval_opts,
            }),
            rng,
        );
        let early_signal = early_stop.observe(avg_val_loss);

        if budget_signal == ControlSignal::Stop {
            tracing::info!("Epoch budget exhausted — stopping after epoch {}", epoch);
            break;
        }
        if early_signal == ControlSignal::Stop {
            tracing::info!("Early stopping requested — stopping after epoch {}", epoch);
            break;
        }
    }

    // A resumed run whose checkpoint already covers the budget
    // never enters the loop; report from a validation pass.
    if final_val_loss.is_nan() {
        tracing::info!("Checkpoint already covers the epoch budget — evaluating only");
        final_val_loss = validation_pass(&model.valid(), val_loader.as_ref());
    }

    println!(
        "Training complete: val_loss={:.4} | perplexity={:.2}",
        final_val_loss,
        final_val_loss.exp(),
    );
    tracing::info!("Training complete");
    Ok(final_val_loss)
}

/// Average pad-masked cross-entropy over the validation loader.
fn validation_pass(
    model:  &TransformerLmModel<MyInnerBackend>,
    loader: &dyn DataLoader<LmBatch<MyInnerBackend>>,
) -> f64 {
    let mut val_loss_sum = 0.0f64;
    let mut val_batches  = 0usize;

    for batch in loader.iter() {
        let (loss, _) = model.forward_loss(batch.inputs, batch.targets);
        val_loss_sum += loss.into_scalar().elem::<f64>();
        val_batches  += 1;
    }

    if val_batches > 0 { val_loss_sum / val_batches as f64 } else { f64::NAN }
}
