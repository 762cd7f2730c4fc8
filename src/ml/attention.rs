// ============================================================
// Layer 5 — Additive Attention
// ============================================================
// Computes, at each decode step, a context vector as a weighted
// sum of the encoder activations. The weights are derived from
// the CURRENT decoder state against the FIXED activations, so
// attention is recomputed fresh every step:
//
//   for each position p:
//     energy[p] = dense_1( relu( dense_10([h, c, activations[p]]) ) )
//   alphas  = softmax(energy over positions)      (sums to 1)
//   context = sum_p alphas[p] * activations[p]    ([batch, units])
//
// The tiny two-layer scorer (hidden size 10, then 1) is applied
// position-wise — Linear broadcasts over the leading dims, which
// is the time-distributed application we need.

use burn::{
    nn::{Linear, LinearConfig},
    prelude::*,
};
use burn::tensor::activation::{relu, softmax};

/// Hidden size of the position-wise energy scorer.
const ENERGY_HIDDEN: usize = 10;

#[derive(Config, Debug)]
pub struct AttentionConfig {
    /// Dimension of encoder activations and decoder state
    pub units: usize,
}

impl AttentionConfig {
    pub fn init<B: Backend>(&self, device: &B::Device) -> Attention<B> {
        // Scorer input per position: [h, c, activation] concatenated
        let energy_hidden = LinearConfig::new(3 * self.units, ENERGY_HIDDEN).init(device);
        let energy_out    = LinearConfig::new(ENERGY_HIDDEN, 1).init(device);

        Attention { energy_hidden, energy_out }
    }
}

#[derive(Module, Debug)]
pub struct Attention<B: Backend> {
    energy_hidden: Linear<B>,
    energy_out:    Linear<B>,
}

impl<B: Backend> Attention<B> {
    /// activations: [batch, positions, units], h/c: [batch, units]
    /// → context: [batch, units]
    pub fn forward(
        &self,
        activations: Tensor<B, 3>,
        hidden:      Tensor<B, 2>,
        cell:        Tensor<B, 2>,
    ) -> Tensor<B, 2> {
        self.forward_with_weights(activations, hidden, cell).0
    }

    /// Same as forward, but also returns the attention weights
    /// `alphas` of shape [batch, positions, 1] for inspection.
    pub fn forward_with_weights(
        &self,
        activations: Tensor<B, 3>,
        hidden:      Tensor<B, 2>,
        cell:        Tensor<B, 2>,
    ) -> (Tensor<B, 2>, Tensor<B, 3>) {
        let [batch, positions, units] = activations.dims();

        // Broadcast-repeat the state across every position
        let h_rep = hidden.unsqueeze_dim::<3>(1).expand([batch, positions, units]);
        let c_rep = cell.unsqueeze_dim::<3>(1).expand([batch, positions, units]);

        // [batch, positions, 3 * units]
        let scored = Tensor::cat(vec![h_rep, c_rep, activations.clone()], 2);

        let energies = self.energy_out.forward(relu(self.energy_hidden.forward(scored)));

        // Softmax over the POSITION axis — one weight per column
        let alphas = softmax(energies, 1);

        // Weighted sum of activations: [batch, 1, units] → [batch, units]
        let context = (activations * alphas.clone().expand([batch, positions, units]))
            .sum_dim(1)
            .reshape([batch, units]);

        (context, alphas)
    }
}

// ─── Unit Tests ───────────────────────────────────────────────────────────────
#[cfg(test)]
mod tests {
    use super::*;
    use burn::tensor::Distribution;

    type TestBackend = burn::backend::NdArray;

    fn random_inputs(
        device: &<TestBackend as Backend>::Device,
        batch: usize,
        positions: usize,
        units: usize,
    ) -> (Tensor<TestBackend, 3>, Tensor<TestBackend, 2>, Tensor<TestBackend, 2>) {
        let dist = Distribution::Uniform(-1.0, 1.0);
        (
            Tensor::random([batch, positions, units], dist, device),
            Tensor::random([batch, units], dist, device),
            Tensor::random([batch, units], dist, device),
        )
    }

    #[test]
    fn test_alphas_sum_to_one_per_item() {
        let device = Default::default();
        let attn   = AttentionConfig::new(16).init::<TestBackend>(&device);

        let (acts, h, c) = random_inputs(&device, 3, 7, 16);
        let (_, alphas)  = attn.forward_with_weights(acts, h, c);

        let sums: Vec<f32> = alphas.sum_dim(1).into_data().to_vec::<f32>().unwrap();
        assert_eq!(sums.len(), 3);
        assert!(sums.iter().all(|&s| (s - 1.0).abs() < 1e-5));
    }

    #[test]
    fn test_context_shape() {
        let device = Default::default();
        let attn   = AttentionConfig::new(16).init::<TestBackend>(&device);

        let (acts, h, c) = random_inputs(&device, 2, 5, 16);
        let context      = attn.forward(acts, h, c);
        assert_eq!(context.dims(), [2, 16]);
    }

    #[test]
    fn test_uniform_weights_give_mean_context() {
        // With a single position, the context must equal that
        // position's activation regardless of the learned scorer.
        let device = Default::default();
        let attn   = AttentionConfig::new(4).init::<TestBackend>(&device);

        let acts = Tensor::<TestBackend, 1>::from_floats([1.0, 2.0, 3.0, 4.0], &device)
            .reshape([1, 1, 4]);
        let h = Tensor::zeros([1, 4], &device);
        let c = Tensor::zeros([1, 4], &device);

        let context: Vec<f32> = attn
            .forward(acts, h, c)
            .into_data()
            .to_vec::<f32>()
            .unwrap();
        for (got, want) in context.iter().zip([1.0f32, 2.0, 3.0, 4.0]) {
            assert!((got - want).abs() < 1e-6);
        }
    }
}
