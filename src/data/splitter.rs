// ============================================================
// Layer 4 — Train/Validation Splitter
// ============================================================
// Randomly shuffles samples and splits them into two sets:
//   - Training set:   used to update model weights
//   - Validation set: used to measure performance on unseen data
//
// Shuffling first matters here: line datasets are usually ordered
// by writer or by form, and without shuffling the validation set
// would contain only a handful of writers.
//
// Uses Fisher-Yates shuffle via rand::seq::SliceRandom.
//
// Reference: rand crate documentation

use rand::seq::SliceRandom;

/// Randomly shuffle `samples` and split into (train, validation).
///
/// # Arguments
/// * `samples`        - All available samples (consumed by this function)
/// * `train_fraction` - Proportion for training, e.g. 0.8 = 80%
pub fn split_train_val<T>(mut samples: Vec<T>, train_fraction: f64) -> (Vec<T>, Vec<T>) {
    let mut rng = rand::thread_rng();
    samples.shuffle(&mut rng);

    let total    = samples.len();
    let split_at = ((total as f64) * train_fraction).round() as usize;

    // Clamp to valid range to avoid panics on tiny datasets
    let split_at = split_at.min(total);

    // After this: samples = [0..split_at], val = [split_at..total]
    let val = samples.split_off(split_at);

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

    #[test]
    fn test_correct_split_sizes() {
        let items: Vec<usize> = (0..100).collect();
        let (train, val)      = split_train_val(items, 0.8);
        assert_eq!(train.len(), 80);
        assert_eq!(val.len(),   20);
    }

    #[test]
    fn test_all_items_preserved() {
        let items: Vec<usize> = (0..50).collect();
        let (train, val)      = split_train_val(items, 0.7);
        assert_eq!(train.len() + val.len(), 50);
    }

    #[test]
    fn test_empty_dataset() {
        let items: Vec<usize> = Vec::new();
        let (train, val)      = split_train_val(items, 0.8);
        assert!(train.is_empty());
        assert!(val.is_empty());
    }

    #[test]
    fn test_full_training_split() {
        let items: Vec<usize> = (0..10).collect();
        let (train, val)      = split_train_val(items, 1.0);
        assert_eq!(train.len(), 10);
        assert!(val.is_empty());
    }
}
