// ============================================================
// Layer 3 — SourceFile Domain Type
// ============================================================
// Represents a single source file loaded from the corpus
// directory. A plain data struct with no behaviour — just a
// path for traceability and the raw lines in original order.
//
// Reference: Rust Book §5 (Structs and Methods)

use serde::{Deserialize, Serialize};

/// A raw source file loaded from disk.
/// The lines are kept exactly as read, in file order —
/// cleaning and windowing happen downstream and never
/// mutate this struct.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SourceFile {
    /// The filename or path — kept so samples can be traced
    /// back to the file they came from
    pub source: String,

    /// The raw lines of the file, in their original order
    pub lines: Vec<String>,
}

impl SourceFile {
    /// Create a new SourceFile from a path and raw content.
    /// Uses impl Into<String> so callers can pass &str or String.
    pub fn new(source: impl Into<String>, content: &str) -> Self {
        Self {
            source: source.into(),
            lines:  content.lines().map(str::to_string).collect(),
        }
    }

    pub fn line_count(&self) -> usize {
        self.lines.len()
    }
}
