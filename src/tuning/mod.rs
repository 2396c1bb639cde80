// ============================================================
// Layer 5.5 — Hyperparameter Tuning
// ============================================================
// The alternate execution path selected by `train --tune`.
//
// search_space.rs declares what may vary (ranges, categorical
// sets, the minimise direction); tuner.rs runs seeded trials
// against the training pipeline and keeps the best candidate.
// Sampler internals are deliberately behind the TrialSampler
// trait — the pipeline treats the optimisation strategy as an
// opaque service.

/// Parameter domains and the searched space
pub mod search_space;

/// Seeded trial loop and the TPE-style default sampler
pub mod tuner;
