// ============================================================
// Layer 6 — Infrastructure Layer
// ============================================================
// Cross-cutting persistence concerns:
//
//   checkpoint.rs      — model + optimizer checkpoints via
//                        Burn's CompactRecorder, one retained
//                        at a time, with resume probing and the
//                        TrainConfig JSON round-trip
//
//   tokenizer_store.rs — word-level code tokenizer persistence,
//                        built once from the corpus and shared
//                        by training, resume, and inference
//
//   metrics.rs         — per-epoch loss/perplexity CSV
//
// Reference: Rust Book §7 (Modules), Burn Book §5 (Checkpointing)

/// Model/optimizer checkpoint saving and loading
pub mod checkpoint;

/// Tokenizer building, saving, and loading
pub mod tokenizer_store;

/// Training metrics CSV logger
pub mod metrics;
