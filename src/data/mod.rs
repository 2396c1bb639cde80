// ============================================================
// Layer 4 — Data Pipeline
// ============================================================
// Everything from raw source files to GPU-ready tensor batches.
//
// The pipeline flows in this order:
//
//   .cc / .h files
//       │
//       ▼
//   SourceLoader      → reads files, collects raw lines
//       │
//       ▼
//   CorpusWindower    → strips comments/includes, builds
//       │               overlapping fixed-span line windows
//       ▼
//   Tokenizer         → converts window text to token ids
//       │
//       ▼
//   split_train_val   → seeded shuffle + partition
//       │
//       ▼
//   CodeDataset       → implements Burn's Dataset trait
//       │
//       ▼
//   LmBatcher         → pads samples into tensor batches with
//       │               next-token shifted targets
//       ▼
//   DataLoader        → feeds batches to the training loop
//
// Each module is responsible for exactly one step, so each
// step is independently testable and replaceable.
//
// Reference: Burn Book §4 (Datasets and Dataloaders)

/// Loads .cc/.h source files from a directory
pub mod loader;

/// Cleans raw lines and builds overlapping sample windows
pub mod windower;

/// Shuffles and splits samples into train/validation sets
pub mod splitter;

/// Implements Burn's Dataset trait for code samples
pub mod dataset;

/// Implements Burn's Batcher trait to create tensor batches
pub mod batcher;
