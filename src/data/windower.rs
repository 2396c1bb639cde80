// ============================================================
// Layer 4 — Corpus Windower
// ============================================================
// Turns raw source lines into overlapping fixed-span samples.
//
// Two stages, both pure:
//
//   1. Cleaning — per line:
//      - truncate at the first `//` line-comment marker,
//        keeping any code before it
//      - drop lines that are empty (or whitespace-only)
//        after comment removal
//      - drop `#include` directives (textual prefix match
//        on the left-trimmed line, not a parser)
//
//   2. Windowing — sliding window over the cleaned lines:
//      window i covers cleaned[i .. i+span], windows advance
//      by `stride`, each window is joined with '\n' into one
//      sample. With N cleaned lines this yields exactly
//      floor((N - span) / stride) + 1 samples, or zero when
//      N < span.
//
// Example with span=3, stride=1 over ["a","b","c","d"]:
//   Sample 1: "a\nb\nc"
//   Sample 2: "b\nc\nd"
//
// `stride > span` is legal and simply leaves gaps between
// windows.
//
// Reference: Rust Book §8 (Slices)

pub struct CorpusWindower {
    /// Number of cleaned lines per sample
    span: usize,
    /// Number of lines the window advances between samples
    stride: usize,
}

impl CorpusWindower {
    /// Line-comment marker of the corpus language.
    const LINE_COMMENT: &'static str = "//";

    /// Module-inclusion directive dropped from the corpus.
    const INCLUDE_DIRECTIVE: &'static str = "#include";

    /// Create a new CorpusWindower.
    ///
    /// # Panics
    /// Panics if span or stride is zero — a zero stride would
    /// loop forever and a zero span produces degenerate samples.
    pub fn new(span: usize, stride: usize) -> Self {
        assert!(span > 0, "span must be positive");
        assert!(stride > 0, "stride must be positive");
        Self { span, stride }
    }

    /// Clean raw lines: strip comments, drop blanks and
    /// include directives. Line order is preserved.
    pub fn clean_lines(raw_lines: &[String]) -> Vec<String> {
        let mut cleaned = Vec::new();

        for line in raw_lines {
            // Truncate at the first comment marker; code before
            // the marker survives, trailing whitespace does not.
            let code = match line.find(Self::LINE_COMMENT) {
                Some(pos) => &line[..pos],
                None      => line.as_str(),
            };
            let code = code.trim_end();

            // Empty (or whitespace-only) after comment removal
            if code.trim().is_empty() {
                continue;
            }

            // Include directives carry no trainable structure
            if code.trim_start().starts_with(Self::INCLUDE_DIRECTIVE) {
                continue;
            }

            cleaned.push(code.to_string());
        }

        cleaned
    }

    /// Build overlapping windows over already-cleaned lines.
    /// Returns one joined string per window. Fewer lines than
    /// `span` yields an empty Vec — never an error.
    pub fn windows(&self, cleaned_lines: &[String]) -> Vec<String> {
        let mut samples = Vec::new();
        let mut start   = 0usize;

        while start + self.span <= cleaned_lines.len() {
            samples.push(cleaned_lines[start..start + self.span].join("\n"));
            start += self.stride;
        }

        samples
    }

    /// Full pipeline: clean then window.
    pub fn clean_and_window(&self, raw_lines: &[String]) -> Vec<String> {
        let cleaned = Self::clean_lines(raw_lines);
        self.windows(&cleaned)
    }

    /// Returns how many samples `cleaned_count` cleaned lines
    /// would produce.
    pub fn sample_count(&self, cleaned_count: usize) -> usize {
        if cleaned_count < self.span {
            return 0;
        }
        (cleaned_count - self.span) / self.stride + 1
    }
}

// ─── Unit Tests ───────────────────────────────────────────────────────────────
#[cfg(test)]
mod tests {
    use super::*;

    fn lines(items: &[&str]) -> Vec<String> {
        items.iter().map(|s| s.to_string()).collect()
    }

    #[test]
    fn test_basic_windowing() {
        let w = CorpusWindower::new(3, 1);
        let cleaned = lines(&["a", "b", "c", "d"]);
        assert_eq!(w.windows(&cleaned), vec!["a\nb\nc", "b\nc\nd"]);
    }

    #[test]
    fn test_window_count_matches_formula() {
        // floor((N - span) / stride) + 1 for a spread of geometries
        for &(n, span, stride) in &[(10, 3, 1), (10, 3, 2), (10, 5, 5), (7, 7, 3), (12, 4, 6)] {
            let cleaned: Vec<String> = (0..n).map(|i| format!("line{i}")).collect();
            let w = CorpusWindower::new(span, stride);
            let expected = (n - span) / stride + 1;
            assert_eq!(w.windows(&cleaned).len(), expected, "n={n} span={span} stride={stride}");
            assert_eq!(w.sample_count(n), expected);
            // Every sample holds exactly `span` lines
            for s in w.windows(&cleaned) {
                assert_eq!(s.lines().count(), span);
            }
        }
    }

    #[test]
    fn test_fewer_lines_than_span_gives_no_samples() {
        let w = CorpusWindower::new(5, 1);
        let cleaned = lines(&["a", "b"]);
        assert!(w.windows(&cleaned).is_empty());
        assert_eq!(w.sample_count(2), 0);
    }

    #[test]
    fn test_stride_larger_than_span_is_legal() {
        // span=2, stride=3 over 5 lines → windows at 0 and 3
        let w = CorpusWindower::new(2, 3);
        let cleaned = lines(&["a", "b", "c", "d", "e"]);
        assert_eq!(w.windows(&cleaned), vec!["a\nb", "d\ne"]);
    }

    #[test]
    fn test_comment_truncation_keeps_code() {
        let raw = lines(&["int x = 1;  // counter", "// full-line comment", "   // indented comment"]);
        assert_eq!(CorpusWindower::clean_lines(&raw), vec!["int x = 1;"]);
    }

    #[test]
    fn test_include_and_blank_lines_dropped() {
        let raw = lines(&[
            "#include \"src/engine.h\"",
            "  #include <vector>",
            "",
            "   ",
            "namespace demo {",
        ]);
        assert_eq!(CorpusWindower::clean_lines(&raw), vec!["namespace demo {"]);
    }

    #[test]
    fn test_clean_and_window_end_to_end() {
        let raw = lines(&[
            "#include <cstdint>",
            "int a; // first",
            "",
            "int b;",
            "int c;",
            "// nothing here",
            "int d;",
        ]);
        let w = CorpusWindower::new(3, 1);
        assert_eq!(
            w.clean_and_window(&raw),
            vec!["int a;\nint b;\nint c;", "int b;\nint c;\nint d;"],
        );
    }
}
