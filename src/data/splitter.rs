// ============================================================
// Layer 4 — Train/Validation Splitter
// ============================================================
// Shuffles samples with the run's seeded generator and splits
// them into two sets:
//   - Training set:   used to update model weights
//   - Validation set: used to measure loss on unseen windows
//
// The RNG handle is threaded in from the entry point rather
// than created here, so the shuffle (and with it the whole
// partition) is byte-identical across runs with the same seed.
//
// Split rule: validation_count = floor(validation_split * total),
// validation = the LAST validation_count elements after the
// shuffle, train = the remaining prefix. The two sets are
// disjoint and together cover the shuffled pool exactly.
//
// Uses Fisher-Yates via rand::seq::SliceRandom, the standard
// unbiased shuffle.
//
// Reference: rand crate documentation

use rand::rngs::StdRng;
use rand::seq::SliceRandom;

/// Shuffle `samples` with the supplied seeded generator and
/// split into (train, validation).
///
/// Degenerate splits do not panic: validation_split = 0.0
/// returns an empty validation set, 1.0 an empty training set.
/// Rejecting an empty partition is the caller's decision.
pub fn split_train_val<T>(
    mut samples:      Vec<T>,
    validation_split: f64,
    rng:              &mut StdRng,
) -> (Vec<T>, Vec<T>) {
    samples.shuffle(rng);

    let total            = samples.len();
    let validation_count = ((total as f64) * validation_split).floor() as usize;
    let validation_count = validation_count.min(total);

    // split_off(n) removes elements [n..] and returns them:
    // samples keeps the training prefix, val takes the suffix.
    let val = samples.split_off(total - validation_count);

    tracing::debug!(
        "Dataset split: {} training, {} validation",
        samples.len(),
        val.len(),
    );

    (samples, val)
}

// ─── Unit Tests ───────────────────────────────────────────────────────────────
#[cfg(test)]
mod tests {
    use super::*;
    use rand::SeedableRng;

    fn rng(seed: u64) -> StdRng {
        StdRng::seed_from_u64(seed)
    }

    #[test]
    fn test_validation_count_is_floor_of_split() {
        let items: Vec<usize> = (0..10).collect();
        let (train, val) = split_train_val(items, 0.2, &mut rng(42));
        assert_eq!(train.len(), 8);
        assert_eq!(val.len(),   2);
    }

    #[test]
    fn test_floor_rounding() {
        // 0.25 * 7 = 1.75 → floor → 1
        let items: Vec<usize> = (0..7).collect();
        let (train, val) = split_train_val(items, 0.25, &mut rng(1));
        assert_eq!(val.len(),   1);
        assert_eq!(train.len(), 6);
    }

    #[test]
    fn test_partitions_are_disjoint_and_exhaustive() {
        let items: Vec<usize> = (0..50).collect();
        let (train, val) = split_train_val(items, 0.3, &mut rng(7));

        let mut all: Vec<usize> = train.iter().chain(val.iter()).copied().collect();
        all.sort_unstable();
        assert_eq!(all, (0..50).collect::<Vec<_>>());
    }

    #[test]
    fn test_same_seed_gives_identical_partition() {
        let a = split_train_val((0..100).collect::<Vec<usize>>(), 0.2, &mut rng(99));
        let b = split_train_val((0..100).collect::<Vec<usize>>(), 0.2, &mut rng(99));
        assert_eq!(a.0, b.0);
        assert_eq!(a.1, b.1);
    }

    #[test]
    fn test_zero_split_gives_empty_validation() {
        let items: Vec<usize> = (0..10).collect();
        let (train, val) = split_train_val(items, 0.0, &mut rng(3));
        assert_eq!(train.len(), 10);
        assert!(val.is_empty());
    }

    #[test]
    fn test_full_split_gives_empty_training() {
        let items: Vec<usize> = (0..10).collect();
        let (train, val) = split_train_val(items, 1.0, &mut rng(3));
        assert!(train.is_empty());
        assert_eq!(val.len(), 10);
    }

    #[test]
    fn test_empty_input() {
        let items: Vec<usize> = Vec::new();
        let (train, val) = split_train_val(items, 0.2, &mut rng(5));
        assert!(train.is_empty());
        assert!(val.is_empty());
    }
}
