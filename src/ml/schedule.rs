// ============================================================
// Layer 5 — Learning-Rate Schedule
// ============================================================
// Per-step learning rate with linear warmup followed by one of
// three decay shapes. Pure arithmetic — the trainer asks for
// lr_at(global_step) before every optimiser step.
//
//   warmup:    lr ramps linearly from ~0 to base_lr over
//              warmup_steps steps
//   constant:  base_lr for the rest of training
//   linear:    base_lr * (1 - progress) down to 0
//   cosine:    base_lr * 0.5 * (1 + cos(pi * progress))
//
// where progress runs over the post-warmup portion of
// total_steps and is clamped to [0, 1].
//
// Reference: Loshchilov & Hutter (2017) SGDR (cosine schedule)

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// The decay shape applied after warmup.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SchedulerKind {
    Constant,
    Linear,
    Cosine,
}

impl SchedulerKind {
    pub const ALL: [SchedulerKind; 3] =
        [SchedulerKind::Constant, SchedulerKind::Linear, SchedulerKind::Cosine];

    pub fn as_str(&self) -> &'static str {
        match self {
            SchedulerKind::Constant => "constant",
            SchedulerKind::Linear   => "linear",
            SchedulerKind::Cosine   => "cosine",
        }
    }
}

impl fmt::Display for SchedulerKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for SchedulerKind {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "constant" => Ok(SchedulerKind::Constant),
            "linear"   => Ok(SchedulerKind::Linear),
            "cosine"   => Ok(SchedulerKind::Cosine),
            other      => Err(format!("unknown scheduler '{other}' (expected constant, linear or cosine)")),
        }
    }
}

/// The full schedule for one training run.
pub struct LrSchedule {
    base_lr:      f64,
    warmup_steps: usize,
    total_steps:  usize,
    kind:         SchedulerKind,
}

impl LrSchedule {
    pub fn new(base_lr: f64, warmup_steps: usize, total_steps: usize, kind: SchedulerKind) -> Self {
        Self { base_lr, warmup_steps, total_steps, kind }
    }

    /// Learning rate for the given zero-based global step.
    pub fn lr_at(&self, step: usize) -> f64 {
        if step < self.warmup_steps {
            // step+1 so the very first step is non-zero
            return self.base_lr * (step + 1) as f64 / self.warmup_steps as f64;
        }

        let decay_steps = self.total_steps.saturating_sub(self.warmup_steps);
        if decay_steps == 0 {
            return self.base_lr;
        }
        let progress = ((step - self.warmup_steps) as f64 / decay_steps as f64).min(1.0);

        match self.kind {
            SchedulerKind::Constant => self.base_lr,
            SchedulerKind::Linear   => self.base_lr * (1.0 - progress),
            SchedulerKind::Cosine   => {
                self.base_lr * 0.5 * (1.0 + (std::f64::consts::PI * progress).cos())
            }
        }
    }
}

// ─── Unit Tests ───────────────────────────────────────────────────────────────
#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_warmup_ramps_to_base() {
        let s = LrSchedule::new(1e-3, 10, 100, SchedulerKind::Constant);
        assert!(s.lr_at(0) > 0.0);
        assert!(s.lr_at(0) < s.lr_at(5));
        assert!((s.lr_at(9) - 1e-3).abs() < 1e-12);
    }

    #[test]
    fn test_constant_after_warmup() {
        let s = LrSchedule::new(5e-4, 5, 50, SchedulerKind::Constant);
        assert_eq!(s.lr_at(5), 5e-4);
        assert_eq!(s.lr_at(49), 5e-4);
    }

    #[test]
    fn test_linear_decays_to_zero() {
        let s = LrSchedule::new(1e-3, 0, 100, SchedulerKind::Linear);
        assert_eq!(s.lr_at(0), 1e-3);
        assert!(s.lr_at(50) < s.lr_at(10));
        assert!(s.lr_at(100) < 1e-9);
    }

    #[test]
    fn test_cosine_endpoints() {
        let s = LrSchedule::new(1e-3, 0, 100, SchedulerKind::Cosine);
        assert!((s.lr_at(0) - 1e-3).abs() < 1e-12);
        // Halfway point: 0.5 * base
        assert!((s.lr_at(50) - 5e-4).abs() < 1e-9);
        assert!(s.lr_at(100) < 1e-9);
    }

    #[test]
    fn test_progress_is_clamped_past_total() {
        let s = LrSchedule::new(1e-3, 0, 10, SchedulerKind::Linear);
        assert_eq!(s.lr_at(10), s.lr_at(1000));
    }

    #[test]
    fn test_kind_parse_round_trip() {
        for kind in SchedulerKind::ALL {
            assert_eq!(kind.as_str().parse::<SchedulerKind>().unwrap(), kind);
        }
        assert!("warmup".parse::<SchedulerKind>().is_err());
    }
}
