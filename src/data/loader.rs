// ============================================================
// Layer 4 — Source File Loader
// ============================================================
// Loads the training corpus from disk: every file in the
// configured directory with one of the two recognised
// extensions (.cc implementation files and .h headers), read
// as plain text and split into lines.
//
// Files are visited in sorted path order so "discovery order"
// is stable across platforms — the reproducibility of the
// whole pipeline starts here.
//
// A single unreadable file is skipped with a warning rather
// than failing the run; a missing directory yields an empty
// corpus (the use case decides whether that is fatal).
//
// Reference: Rust Book §9 (Error Handling), §12 (I/O)

use anyhow::{Context, Result};
use std::{fs, path::Path, path::PathBuf};

use crate::domain::source_file::SourceFile;
use crate::domain::traits::CorpusSource;

/// Extensions recognised as corpus files.
const CORPUS_EXTENSIONS: [&str; 2] = ["cc", "h"];

/// Loads all .cc/.h files from a directory.
/// Implements the CorpusSource trait from Layer 3.
pub struct SourceLoader {
    dir: String,
}

impl SourceLoader {
    pub fn new(dir: impl Into<String>) -> Self {
        Self { dir: dir.into() }
    }

    /// Single-file variant: read exactly one named file,
    /// regardless of extension.
    pub fn load_file(path: impl AsRef<Path>) -> Result<SourceFile> {
        let path = path.as_ref();
        let content = fs::read_to_string(path)
            .with_context(|| format!("Cannot read '{}'", path.display()))?;
        let source = path
            .file_name()
            .and_then(|n| n.to_str())
            .unwrap_or("unknown")
            .to_string();
        Ok(SourceFile::new(source, &content))
    }
}

impl CorpusSource for SourceLoader {
    fn load_all(&self) -> Result<Vec<SourceFile>> {
        let dir = Path::new(&self.dir);

        if !dir.exists() {
            tracing::warn!(
                "Corpus directory '{}' does not exist — returning empty corpus",
                self.dir
            );
            return Ok(Vec::new());
        }

        // Collect matching paths first, then sort for a stable
        // discovery order.
        let mut paths: Vec<PathBuf> = Vec::new();
        for entry in fs::read_dir(dir)
            .with_context(|| format!("Cannot read directory '{}'", self.dir))?
        {
            let path = entry?.path();
            let ext = path.extension().and_then(|e| e.to_str());
            if ext.is_some_and(|e| CORPUS_EXTENSIONS.contains(&e)) {
                paths.push(path);
            }
        }
        paths.sort();

        let mut files = Vec::new();
        for path in paths {
            match Self::load_file(&path) {
                Ok(file) => {
                    tracing::debug!("Loaded: {} ({} lines)", file.source, file.line_count());
                    files.push(file);
                }
                // Log a warning but continue — don't fail on one bad file
                Err(e) => {
                    tracing::warn!("Skipping '{}': {}", path.display(), e);
                }
            }
        }

        tracing::info!("Loaded {} corpus files", files.len());
        Ok(files)
    }
}

// ─── Unit Tests ───────────────────────────────────────────────────────────────
#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_loads_only_recognised_extensions_in_sorted_order() {
        let dir = tempfile::tempdir().unwrap();
        fs::write(dir.path().join("b.cc"), "int b;\n").unwrap();
        fs::write(dir.path().join("a.h"), "int a;\n").unwrap();
        fs::write(dir.path().join("notes.txt"), "ignored\n").unwrap();

        let loader = SourceLoader::new(dir.path().to_str().unwrap());
        let files = loader.load_all().unwrap();

        let names: Vec<&str> = files.iter().map(|f| f.source.as_str()).collect();
        assert_eq!(names, vec!["a.h", "b.cc"]);
    }

    #[test]
    fn test_missing_directory_is_empty_corpus() {
        let loader = SourceLoader::new("/nonexistent/source-lm-test");
        assert!(loader.load_all().unwrap().is_empty());
    }

    #[test]
    fn test_single_file_variant() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("engine.cc");
        fs::write(&path, "int x;\nint y;\n").unwrap();

        let file = SourceLoader::load_file(&path).unwrap();
        assert_eq!(file.source, "engine.cc");
        assert_eq!(file.line_count(), 2);
    }
}
