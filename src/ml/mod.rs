// ============================================================
// Layer 5 — ML / Model Layer (Burn)
// ============================================================
// This layer contains the model architecture, the training
// loop, and the generation/evaluation machinery.
//
// The Burn-specific pieces (model.rs, trainer.rs) are kept
// apart from the pure control logic (decoder.rs, controller.rs,
// schedule.rs), which depends only on the Layer 3 traits and is
// fully unit-testable without a GPU.
//
//   model.rs      — decoder-only transformer LM: token +
//                   position embeddings, causally masked
//                   multi-head self-attention, GELU feed-forward
//                   blocks, LM head; plus LmScorer, the
//                   inference-mode adapter the decoder consumes
//
//   trainer.rs    — epoch loop: AdamW steps at the scheduled
//                   learning rate, validation passes,
//                   checkpointing, controller + early-stop
//                   signal handling
//
//   decoder.rs    — confidence-gated greedy decoding
//
//   evaluator.rs  — qualitative per-epoch report (sample,
//                   token rendering, prompt, continuation)
//
//   controller.rs — epoch-budget state machine + EarlyStopping
//
//   schedule.rs   — warmup + {constant, linear, cosine}
//                   learning-rate schedule
//
// Reference: Burn Book §3 (Building Blocks), §5 (Training)
//            Vaswani et al. (2017) Attention Is All You Need

/// Decoder-only transformer LM architecture
pub mod model;

/// Full training loop with validation and checkpointing
pub mod trainer;

/// Confidence-gated greedy decoder
pub mod decoder;

/// Qualitative evaluation reporting
pub mod evaluator;

/// Epoch-budget state machine and early stopping
pub mod controller;

/// Per-step learning-rate schedule
pub mod schedule;
