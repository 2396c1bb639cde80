// ============================================================
// Layer 4 — Language-Model Batcher
// ============================================================
// Implements Burn's Batcher trait to convert a Vec<CodeSample>
// into tensors for next-token training.
//
// Samples in a batch can have different token counts, so the
// batcher pads every sequence to the longest one with PAD_ID.
// Targets are the inputs shifted left by one position:
//
//   ids:      [t0, t1, t2, t3]
//   inputs:   [t0, t1, t2, t3]
//   targets:  [t1, t2, t3, PAD]
//
// The trailing PAD (and every pad position) is masked out of
// the cross-entropy loss, so only real next-token predictions
// contribute.
//
// Reference: Burn Book §4 (Batcher)

use burn::{
    data::dataloader::batcher::Batcher,
    prelude::*,
};

use crate::domain::sample::{CodeSample, PAD_ID};

// ─── LmBatch ──────────────────────────────────────────────────────────────────
/// A batch ready for the model forward pass.
/// B is the Burn Backend — generic so the same batcher works
/// for training (autodiff) and validation (inner) backends.
#[derive(Debug, Clone)]
pub struct LmBatch<B: Backend> {
    /// Token id sequences — shape: [batch_size, seq_len]
    pub inputs: Tensor<B, 2, Int>,

    /// Next-token targets — shape: [batch_size, seq_len],
    /// inputs shifted left by one, padded with PAD_ID
    pub targets: Tensor<B, 2, Int>,
}

// ─── LmBatcher ────────────────────────────────────────────────────────────────
/// Holds the target device so tensors are created in the
/// right place.
#[derive(Clone, Debug)]
pub struct LmBatcher<B: Backend> {
    pub device: B::Device,
}

impl<B: Backend> LmBatcher<B> {
    pub fn new(device: B::Device) -> Self {
        Self { device }
    }
}

impl<B: Backend> Batcher<CodeSample, LmBatch<B>> for LmBatcher<B> {
    /// Pad all samples to the longest sequence in the batch,
    /// flatten to one Vec per tensor, then reshape to
    /// [batch_size, seq_len] (Burn uses i32 for Int tensors).
    fn batch(&self, items: Vec<CodeSample>) -> LmBatch<B> {
        let batch_size = items.len();
        let seq_len = items
            .iter()
            .map(|s| s.input_ids.len())
            .max()
            .unwrap_or(1)
            .max(1);

        let mut input_flat:  Vec<i32> = Vec::with_capacity(batch_size * seq_len);
        let mut target_flat: Vec<i32> = Vec::with_capacity(batch_size * seq_len);

        for sample in &items {
            let ids = &sample.input_ids;
            for t in 0..seq_len {
                input_flat.push(ids.get(t).copied().unwrap_or(PAD_ID) as i32);
                // Target at position t is the token at t+1
                target_flat.push(ids.get(t + 1).copied().unwrap_or(PAD_ID) as i32);
            }
        }

        let inputs = Tensor::<B, 1, Int>::from_ints(
            input_flat.as_slice(), &self.device,
        ).reshape([batch_size, seq_len]);

        let targets = Tensor::<B, 1, Int>::from_ints(
            target_flat.as_slice(), &self.device,
        ).reshape([batch_size, seq_len]);

        LmBatch { inputs, targets }
    }
}
