// ============================================================
// Layer 5 — Training Controller (state machine)
// ============================================================
// Counts down the epoch budget and signals the trainer to
// halt. Two states:
//
//   Running { remaining_epochs } ──(budget hits zero)──▶ Stopped
//
// The trainer invokes `epoch_end` once at every epoch
// boundary. The transition does two things, in order:
//
//   1. If a report request is supplied, run the evaluation
//      reporter against a randomly selected training sample.
//      Qualitative only — an error is logged and swallowed,
//      never allowed to block training.
//   2. Decrement the budget; at zero, move to Stopped and
//      return ControlSignal::Stop.
//
// The returned signal is a request, not an abort: the trainer
// finishes the current epoch (checkpointing included) before
// honouring it.
//
// EarlyStopping lives alongside as an independent policy keyed
// on validation loss. The trainer stops when EITHER signals
// Stop — there is no priority between them.

use rand::rngs::StdRng;

use crate::data::dataset::CodeDataset;
use crate::domain::traits::{NextTokenModel, TokenCodec};
use crate::ml::evaluator::{self, EvalOptions, PromptStrategy, SampleSource};

/// What the controller tells the trainer after each epoch.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ControlSignal {
    Continue,
    Stop,
}

/// Controller state. The epoch counter lives here and nowhere
/// else; it is mutated only at epoch boundaries.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ControllerState {
    Running { remaining_epochs: usize },
    Stopped,
}

/// Everything the controller needs to trigger one qualitative
/// evaluation report.
pub struct ReportRequest<'a, M: NextTokenModel, C: TokenCodec> {
    pub model:   &'a M,
    pub codec:   &'a C,
    pub dataset: &'a CodeDataset,
    pub opts:    EvalOptions,
}

pub struct TrainingController {
    state: ControllerState,
}

impl TrainingController {
    /// A zero budget starts in Stopped — nothing to run.
    pub fn new(epoch_budget: usize) -> Self {
        let state = if epoch_budget == 0 {
            ControllerState::Stopped
        } else {
            ControllerState::Running { remaining_epochs: epoch_budget }
        };
        Self { state }
    }

    pub fn state(&self) -> ControllerState {
        self.state
    }

    pub fn is_stopped(&self) -> bool {
        self.state == ControllerState::Stopped
    }

    /// The epoch-boundary transition. Invoked by the trainer
    /// after each full pass over the training partition.
    pub fn epoch_end<M: NextTokenModel, C: TokenCodec>(
        &mut self,
        report: Option<ReportRequest<'_, M, C>>,
        rng:    &mut StdRng,
    ) -> ControlSignal {
        if let Some(req) = report {
            let outcome = evaluator::evaluate(
                req.model,
                req.codec,
                SampleSource::Dataset(req.dataset),
                PromptStrategy::Start,
                req.opts,
                rng,
            );
            if let Err(e) = outcome {
                tracing::warn!("Qualitative evaluation failed (ignored): {e}");
            }
        }

        match self.state {
            ControllerState::Stopped => ControlSignal::Stop,
            ControllerState::Running { remaining_epochs } => {
                let remaining = remaining_epochs - 1;
                if remaining == 0 {
                    self.state = ControllerState::Stopped;
                    ControlSignal::Stop
                } else {
                    self.state = ControllerState::Running { remaining_epochs: remaining };
                    ControlSignal::Continue
                }
            }
        }
    }
}

// ─── EarlyStopping ────────────────────────────────────────────────────────────
/// Stops training when validation loss has not improved for
/// `patience` consecutive epochs. Improvement means strictly
/// lower than the best loss seen so far.
pub struct EarlyStopping {
    patience:  usize,
    best_loss: f64,
    epochs_without_improvement: usize,
}

impl EarlyStopping {
    /// `patience` of at least 1 is expected; the configuration
    /// default is 3.
    pub fn new(patience: usize) -> Self {
        Self {
            patience,
            best_loss: f64::INFINITY,
            epochs_without_improvement: 0,
        }
    }

    pub fn best_loss(&self) -> f64 {
        self.best_loss
    }

    /// Feed one epoch's validation loss; returns Stop once the
    /// patience budget is exhausted.
    pub fn observe(&mut self, val_loss: f64) -> ControlSignal {
        if val_loss < self.best_loss {
            self.best_loss = val_loss;
            self.epochs_without_improvement = 0;
        } else {
            self.epochs_without_improvement += 1;
        }

        if self.epochs_without_improvement >= self.patience {
            tracing::info!(
                "Early stopping: no improvement for {} epochs (best val_loss {:.4})",
                self.patience, self.best_loss,
            );
            ControlSignal::Stop
        } else {
            ControlSignal::Continue
        }
    }
}

// ─── Unit Tests ───────────────────────────────────────────────────────────────
#[cfg(test)]
mod tests {
    use super::*;
    use anyhow::Result;
    use rand::SeedableRng;

    struct NullModel;

    impl NextTokenModel for NullModel {
        fn next_token_probs(&self, _ids: &[u32]) -> Result<Vec<f32>> {
            Ok(vec![1.0])
        }
    }

    struct NullCodec;

    impl TokenCodec for NullCodec {
        fn encode(&self, _text: &str) -> Result<Vec<u32>> { Ok(vec![0]) }
        fn decode(&self, _ids: &[u32]) -> Result<String> { Ok("0".into()) }
        fn token_surface(&self, id: u32) -> Option<String> { Some(id.to_string()) }
    }

    fn tick(controller: &mut TrainingController, rng: &mut StdRng) -> ControlSignal {
        controller.epoch_end(None::<ReportRequest<'_, NullModel, NullCodec>>, rng)
    }

    #[test]
    fn test_budget_of_five_stops_on_the_fifth_call() {
        let mut controller = TrainingController::new(5);
        let mut rng = StdRng::seed_from_u64(0);

        for _ in 0..4 {
            assert_eq!(tick(&mut controller, &mut rng), ControlSignal::Continue);
            assert!(!controller.is_stopped());
        }
        assert_eq!(tick(&mut controller, &mut rng), ControlSignal::Stop);
        assert!(controller.is_stopped());
    }

    #[test]
    fn test_stopped_controller_keeps_signalling_stop() {
        let mut controller = TrainingController::new(1);
        let mut rng = StdRng::seed_from_u64(0);

        assert_eq!(tick(&mut controller, &mut rng), ControlSignal::Stop);
        assert_eq!(tick(&mut controller, &mut rng), ControlSignal::Stop);
        assert!(controller.is_stopped());
    }

    #[test]
    fn test_zero_budget_starts_stopped() {
        let controller = TrainingController::new(0);
        assert!(controller.is_stopped());
    }

    #[test]
    fn test_early_stopping_fires_after_patience_epochs() {
        let mut es = EarlyStopping::new(2);
        assert_eq!(es.observe(1.0), ControlSignal::Continue); // baseline
        assert_eq!(es.observe(1.0), ControlSignal::Continue); // 1 without improvement
        assert_eq!(es.observe(1.1), ControlSignal::Stop);     // 2 without improvement
    }

    #[test]
    fn test_early_stopping_improvement_resets_patience() {
        let mut es = EarlyStopping::new(2);
        es.observe(1.0);
        es.observe(1.0);            // 1 bad epoch
        assert_eq!(es.observe(0.8), ControlSignal::Continue); // improvement resets
        assert_eq!(es.observe(0.9), ControlSignal::Continue);
        assert_eq!(es.observe(0.9), ControlSignal::Stop);
        assert!((es.best_loss() - 0.8).abs() < 1e-12);
    }
}
