// ============================================================
// Layer 5 — Combined Model + Training Unroll
// ============================================================
// Owns the three sub-networks (encoder, attention, decoder) and
// the teacher-forced training unroll:
//
//   encode once → for t in 0..max_text_length:
//     context_t = attention(activations, h_t, c_t)
//     y_t       = ground-truth one-hot at position t
//     (y_hat_t, state_{t+1}) = decoder(context_t, y_t, state_t)
//
// The unroll has a fixed, shape-known step count so the autodiff
// graph is bounded — max_text_length must be known at
// construction time. The loss is categorical cross-entropy of
// each step's distribution against the target code at the same
// position, averaged over steps and batch.

use burn::prelude::*;

use crate::ml::attention::{Attention, AttentionConfig};
use crate::ml::decoder::{DecoderState, StepDecoder, StepDecoderConfig};
use crate::ml::encoder::{ConvEncoder, ConvEncoderConfig};

/// Floor for probabilities entering log() so a confident wrong
/// prediction cannot produce an infinite loss.
const PROB_FLOOR: f64 = 1e-7;

// NOTE: #[derive(Config)] already generates Clone and Serialize/Deserialize
// internally — do NOT add them again or you get conflicting impls.
#[derive(Config, Debug)]
pub struct HtrModelConfig {
    /// Fixed input image height in pixels
    pub height: usize,
    /// Hidden size of encoder/decoder LSTMs and of the context vector
    pub units: usize,
    /// Vocabulary size including SOS/EOS
    pub output_size: usize,
    /// Width training images are padded to
    pub max_image_width: usize,
    /// Decode steps unrolled during training
    pub max_text_length: usize,
    /// Start-of-sequence token code
    pub sos: usize,
    /// End-of-sequence token code
    pub eos: usize,
}

impl HtrModelConfig {
    pub fn init<B: Backend>(&self, device: &B::Device) -> HtrModel<B> {
        let encoder   = ConvEncoderConfig::new(self.height, self.units).init(device);
        let attention = AttentionConfig::new(self.units).init(device);
        let decoder   = StepDecoderConfig::new(self.units, self.output_size).init(device);

        HtrModel {
            encoder,
            attention,
            decoder,
            output_size:     self.output_size,
            max_text_length: self.max_text_length,
            sos:             self.sos,
            eos:             self.eos,
        }
    }
}

#[derive(Module, Debug)]
pub struct HtrModel<B: Backend> {
    pub encoder:   ConvEncoder<B>,
    pub attention: Attention<B>,
    pub decoder:   StepDecoder<B>,

    pub output_size:     usize,
    pub max_text_length: usize,
    pub sos:             usize,
    pub eos:             usize,
}

impl<B: Backend> HtrModel<B> {
    /// Teacher-forced unroll over exactly max_text_length steps.
    ///   images:         [batch, 1, height, width]
    ///   decoder_inputs: [batch, max_text_length, output_size] one-hot
    /// → one distribution [batch, output_size] per step.
    pub fn unroll(
        &self,
        images:         Tensor<B, 4>,
        decoder_inputs: Tensor<B, 3>,
    ) -> Vec<Tensor<B, 2>> {
        let encoded = self.encoder.forward(images);
        let [batch, _, vocab] = decoder_inputs.dims();

        // Decode starts from the encoder's final state
        let mut state = DecoderState::new(encoded.hidden.clone(), encoded.cell.clone());
        let mut outputs = Vec::with_capacity(self.max_text_length);

        for t in 0..self.max_text_length {
            let context = self.attention.forward(
                encoded.activations.clone(),
                state.hidden.clone(),
                state.cell.clone(),
            );

            // Ground-truth one-hot at position t (teacher forcing)
            let y_t = decoder_inputs
                .clone()
                .slice([0..batch, t..t + 1, 0..vocab])
                .reshape([batch, vocab]);

            let (y_hat, next) = self.decoder.forward(context, y_t, state);
            state = next;
            outputs.push(y_hat);
        }

        outputs
    }

    /// Categorical cross-entropy of the unrolled outputs against
    /// the target codes, averaged over steps and batch.
    ///   targets: [batch, max_text_length] Int
    pub fn training_loss(
        &self,
        outputs: &[Tensor<B, 2>],
        targets: Tensor<B, 2, Int>,
    ) -> Tensor<B, 1> {
        let [batch, _] = targets.dims();
        let device = targets.device();

        let mut total = Tensor::<B, 1>::zeros([1], &device);
        for (t, y_hat) in outputs.iter().enumerate() {
            // Pick each item's probability of its true token
            let target_t = targets.clone().slice([0..batch, t..t + 1]);
            let picked   = y_hat.clone().gather(1, target_t);

            total = total + picked.clamp_min(PROB_FLOOR).log().mean().neg();
        }

        total / (outputs.len().max(1) as f64)
    }
}

// ─── Unit Tests ───────────────────────────────────────────────────────────────
#[cfg(test)]
mod tests {
    use super::*;

    type TestBackend = burn::backend::NdArray;

    fn tiny_model(device: &<TestBackend as Backend>::Device) -> HtrModel<TestBackend> {
        // height 8, units 16, vocab 5, width 16, 4 decode steps
        HtrModelConfig::new(8, 16, 5, 16, 4, 0, 1).init(device)
    }

    fn one_hot_inputs(
        device: &<TestBackend as Backend>::Device,
        codes: &[usize],
        vocab: usize,
    ) -> Tensor<TestBackend, 3> {
        let mut flat = vec![0.0f32; codes.len() * vocab];
        for (t, &c) in codes.iter().enumerate() {
            flat[t * vocab + c] = 1.0;
        }
        Tensor::<TestBackend, 1>::from_floats(flat.as_slice(), device)
            .reshape([1, codes.len(), vocab])
    }

    #[test]
    fn test_unroll_produces_one_distribution_per_step() {
        let device = Default::default();
        let model  = tiny_model(&device);

        let images  = Tensor::zeros([1, 1, 8, 16], &device);
        let inputs  = one_hot_inputs(&device, &[0, 2, 3, 1], 5);
        let outputs = model.unroll(images, inputs);

        assert_eq!(outputs.len(), 4);
        for y_hat in &outputs {
            assert_eq!(y_hat.dims(), [1, 5]);
            let sums: Vec<f32> = y_hat
                .clone()
                .sum_dim(1)
                .into_data()
                .to_vec::<f32>()
                .unwrap();
            assert!((sums[0] - 1.0).abs() < 1e-5);
        }
    }

    #[test]
    fn test_training_loss_is_finite_and_positive() {
        let device = Default::default();
        let model  = tiny_model(&device);

        let images  = Tensor::zeros([1, 1, 8, 16], &device);
        let inputs  = one_hot_inputs(&device, &[0, 2, 3, 1], 5);
        let outputs = model.unroll(images, inputs);

        let targets = Tensor::<TestBackend, 1, Int>::from_ints([2, 3, 1, 1], &device)
            .reshape([1, 4]);
        let loss: f32 = model
            .training_loss(&outputs, targets)
            .into_scalar()
            .elem();

        assert!(loss.is_finite());
        assert!(loss > 0.0);
    }

    #[test]
    fn test_unroll_handles_batches() {
        let device = Default::default();
        let model  = tiny_model(&device);

        let images = Tensor::zeros([3, 1, 8, 16], &device);
        let inputs = Tensor::zeros([3, 4, 5], &device);

        let outputs = model.unroll(images, inputs);
        assert_eq!(outputs.len(), 4);
        assert_eq!(outputs[0].dims(), [3, 5]);
    }
}
