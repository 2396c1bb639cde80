// ============================================================
// Layer 2 — Application / Use Cases
// ============================================================
// Orchestrates the other layers to accomplish one goal
// (training the model, or completing a prompt).
//
// Rules for this layer:
//   - No tensor math or model internals here
//   - No argument parsing or printing of reports (Layer 1)
//   - Only workflow coordination
//
// Reference: Rust Book §7 (Module System)

// The training workflow (and its hyperparameter-search branch)
pub mod train_use_case;

// The prompt-completion workflow
pub mod complete_use_case;
