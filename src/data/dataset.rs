use burn::data::dataset::Dataset;

use crate::domain::sample::CodeSample;

/// A partition of tokenised samples (train or validation),
/// exposed through Burn's Dataset trait so the DataLoader can
/// call .get(index) and .len() on it.
#[derive(Debug, Clone)]
pub struct CodeDataset {
    samples: Vec<CodeSample>,
}

impl CodeDataset {
    pub fn new(samples: Vec<CodeSample>) -> Self { Self { samples } }

    pub fn sample_count(&self) -> usize { self.samples.len() }

    pub fn is_empty(&self) -> bool { self.samples.is_empty() }

    pub fn get_sample(&self, index: usize) -> Option<&CodeSample> {
        self.samples.get(index)
    }
}

impl Dataset<CodeSample> for CodeDataset {
    fn get(&self, index: usize) -> Option<CodeSample> {
        self.samples.get(index).cloned()
    }

    fn len(&self) -> usize {
        self.samples.len()
    }
}
