// ============================================================
// Layer 3 — Domain Layer
// ============================================================
// Pure Rust structs, enums, and traits that define the core
// concepts of the system.
//
// Rules for this layer:
//   - NO Burn framework types allowed here
//   - NO file I/O or network calls
//   - Only plain Rust structs, enums, and traits
//
// Keeping this layer pure means every core algorithm that
// depends only on these types (the decoder, the controller)
// is unit-testable with stubs and without a GPU.
//
// Reference: Rust Book §5 (Structs), §10 (Traits)

// A raw source file loaded from disk
pub mod source_file;

// One windowed training/evaluation sample
pub mod sample;

// Core abstractions (traits) that other layers implement
pub mod traits;

// Typed error kinds for the predictable failure cases
pub mod error;
