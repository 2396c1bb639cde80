// ============================================================
// Layer 3 — Typed Error Kinds
// ============================================================
// The predictable input-validation failures are explicit enum
// variants rather than ad-hoc anyhow strings, so callers (and
// tests) can match on the kind instead of parsing messages.
// Everything else in the system still propagates through
// anyhow::Result with context.
//
// Reference: Rust Book §9 (Error Handling)

use thiserror::Error;

#[derive(Debug, Error)]
pub enum LmError {
    /// A caller-supplied argument was unusable: an empty prompt
    /// handed to the decoder, or an empty sample source handed
    /// to the evaluation reporter.
    #[error("invalid argument: {0}")]
    InvalidArgument(String),

    /// A train or validation partition came out empty. An empty
    /// corpus is not itself an error (windowing just yields zero
    /// samples), but training over zero samples is — this is the
    /// explicit rejection, raised before the trainer starts.
    #[error("{0} partition is empty — corpus too small for the configured span/split")]
    EmptyPartition(&'static str),
}

// ─── Unit Tests ───────────────────────────────────────────────────────────────
#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_display_messages() {
        let e = LmError::InvalidArgument("prompt must not be empty".into());
        assert!(e.to_string().contains("prompt must not be empty"));

        let e = LmError::EmptyPartition("validation");
        assert!(e.to_string().contains("validation"));
    }
}
