// ============================================================
// Layer 4 — Line Batcher
// ============================================================
// Implements Burn's Batcher trait to convert a Vec<TrainingExample>
// into GPU-ready tensors.
//
// Input:  N examples, each with an image of height H padded to
//         width W and two token sequences of length Tx
// Output: LineBatch with
//   images          [N, 1, H, W]   f32, single grayscale channel
//   decoder_inputs  [N, Tx, V]     one-hot teacher-forcing feeds
//   targets         [N, Tx]        integer codes for the loss
//
// The adapter already padded everything to fixed sizes, so
// batching is pure flatten-and-reshape — no dynamic padding here.
//
// Reference: Burn Book §4 (Batcher)

use burn::{
    data::dataloader::batcher::Batcher,
    prelude::*,
};

use crate::data::adapter::TrainingExample;

// ─── LineBatch ────────────────────────────────────────────────────────────────
/// A batch of training examples ready for the model forward pass.
/// B is the Burn Backend (e.g. Wgpu, NdArray) —
/// generic so the same batcher works on any device.
#[derive(Debug, Clone)]
pub struct LineBatch<B: Backend> {
    /// Grayscale line images — shape: [batch, 1, height, width]
    pub images: Tensor<B, 4>,

    /// One-hot teacher-forcing inputs — shape: [batch, Tx, output_size]
    pub decoder_inputs: Tensor<B, 3>,

    /// Ground-truth token codes — shape: [batch, Tx]
    pub targets: Tensor<B, 2, Int>,
}

// ─── LineBatcher ──────────────────────────────────────────────────────────────
/// Holds the target device plus the vocabulary size needed to
/// expand token codes into one-hot vectors.
#[derive(Clone, Debug)]
pub struct LineBatcher<B: Backend> {
    pub device:      B::Device,
    pub output_size: usize,
}

impl<B: Backend> LineBatcher<B> {
    pub fn new(device: B::Device, output_size: usize) -> Self {
        Self { device, output_size }
    }
}

impl<B: Backend> Batcher<TrainingExample, LineBatch<B>> for LineBatcher<B> {
    fn batch(&self, items: Vec<TrainingExample>) -> LineBatch<B> {
        let batch_size = items.len();
        let height     = items[0].height;
        let width      = items[0].width;
        let seq_len    = items[0].input_tokens.len();
        let vocab      = self.output_size;

        // ── Images: flatten then reshape to [N, 1, H, W] ──────────────────────
        let pixel_flat: Vec<f32> = items
            .iter()
            .flat_map(|e| e.image.iter().copied())
            .collect();

        let images = Tensor::<B, 1>::from_floats(pixel_flat.as_slice(), &self.device)
            .reshape([batch_size, 1, height, width]);

        // ── Teacher-forcing inputs: expand codes to one-hot rows ─────────────
        let mut onehot_flat = vec![0.0f32; batch_size * seq_len * vocab];
        for (i, example) in items.iter().enumerate() {
            for (t, &code) in example.input_tokens.iter().enumerate() {
                onehot_flat[(i * seq_len + t) * vocab + code] = 1.0;
            }
        }

        let decoder_inputs = Tensor::<B, 1>::from_floats(onehot_flat.as_slice(), &self.device)
            .reshape([batch_size, seq_len, vocab]);

        // ── Targets: plain integer codes, one per decode step ────────────────
        let target_flat: Vec<i32> = items
            .iter()
            .flat_map(|e| e.target_tokens.iter().map(|&c| c as i32))
            .collect();

        let targets = Tensor::<B, 1, Int>::from_ints(target_flat.as_slice(), &self.device)
            .reshape([batch_size, seq_len]);

        LineBatch { images, decoder_inputs, targets }
    }
}

// ─── Unit Tests ───────────────────────────────────────────────────────────────
#[cfg(test)]
mod tests {
    use super::*;

    type TestBackend = burn::backend::NdArray;

    fn example() -> TrainingExample {
        TrainingExample {
            image:         vec![0.5; 4 * 8],
            height:        4,
            width:         8,
            input_tokens:  vec![0, 3, 4, 1],
            target_tokens: vec![3, 4, 1, 1],
        }
    }

    #[test]
    fn test_batch_shapes() {
        let device  = Default::default();
        let batcher = LineBatcher::<TestBackend>::new(device, 5);
        let batch   = batcher.batch(vec![example(), example()]);

        assert_eq!(batch.images.dims(),         [2, 1, 4, 8]);
        assert_eq!(batch.decoder_inputs.dims(), [2, 4, 5]);
        assert_eq!(batch.targets.dims(),        [2, 4]);
    }

    #[test]
    fn test_one_hot_rows_sum_to_one() {
        let device  = Default::default();
        let batcher = LineBatcher::<TestBackend>::new(device, 5);
        let batch   = batcher.batch(vec![example()]);

        let sums: Vec<f32> = batch
            .decoder_inputs
            .sum_dim(2)
            .into_data()
            .to_vec::<f32>()
            .unwrap();
        assert!(sums.iter().all(|&s| (s - 1.0).abs() < 1e-6));
    }

    #[test]
    fn test_one_hot_marks_the_right_code() {
        let device  = Default::default();
        let batcher = LineBatcher::<TestBackend>::new(device, 5);
        let batch   = batcher.batch(vec![example()]);

        let row: Vec<f32> = batch
            .decoder_inputs
            .slice([0..1, 1..2, 0..5])
            .into_data()
            .to_vec::<f32>()
            .unwrap();
        // input_tokens[1] == 3
        assert_eq!(row, vec![0.0, 0.0, 0.0, 1.0, 0.0]);
    }
}
