// ============================================================
// Layer 5 — Step Decoder
// ============================================================
// A single-timestep recurrent decoder cell:
//
//   z = [context ++ y_prev]          [batch, units + output_size]
//   reshape to a 1-step sequence     [batch, 1, units + output_size]
//   one LSTM step seeded with (h, c)
//   dense + softmax projection       [batch, output_size]
//
// The cell is a pure function of its inputs and parameters —
// there is no hidden mutation across calls. The caller threads
// the DecoderState through the decode loop, reassigning it from
// each step's return value. Both the training unroll and the
// greedy inference loop drive this one step function.

use burn::{
    nn::{Linear, LinearConfig, Lstm, LstmConfig, LstmState},
    prelude::*,
};
use burn::tensor::activation::softmax;

/// The decoder's recurrent state, owned by the decode loop and
/// replaced wholesale on every step.
#[derive(Debug, Clone)]
pub struct DecoderState<B: Backend> {
    /// [batch, units]
    pub hidden: Tensor<B, 2>,
    /// [batch, units]
    pub cell: Tensor<B, 2>,
}

impl<B: Backend> DecoderState<B> {
    pub fn new(hidden: Tensor<B, 2>, cell: Tensor<B, 2>) -> Self {
        Self { hidden, cell }
    }
}

#[derive(Config, Debug)]
pub struct StepDecoderConfig {
    /// Hidden size of the decoder LSTM (matches the encoder)
    pub units: usize,
    /// Vocabulary size including SOS/EOS
    pub output_size: usize,
}

impl StepDecoderConfig {
    pub fn init<B: Backend>(&self, device: &B::Device) -> StepDecoder<B> {
        let lstm = LstmConfig::new(self.units + self.output_size, self.units, true)
            .init(device);
        let projection = LinearConfig::new(self.units, self.output_size).init(device);

        StepDecoder { lstm, projection }
    }
}

#[derive(Module, Debug)]
pub struct StepDecoder<B: Backend> {
    lstm:       Lstm<B>,
    projection: Linear<B>,
}

impl<B: Backend> StepDecoder<B> {
    /// One decode step.
    ///   context: [batch, units], y_prev: [batch, output_size] one-hot
    /// → (y_hat: [batch, output_size] probabilities, next state)
    pub fn forward(
        &self,
        context: Tensor<B, 2>,
        y_prev:  Tensor<B, 2>,
        state:   DecoderState<B>,
    ) -> (Tensor<B, 2>, DecoderState<B>) {
        // [batch, 1, units + output_size]: a one-timestep sequence
        let z = Tensor::cat(vec![context, y_prev], 1).unsqueeze_dim::<3>(1);

        let seed = LstmState::new(state.cell, state.hidden);
        let (output, next) = self.lstm.forward(z, Some(seed));

        // Flatten the singleton time axis back out
        let [batch, _, units] = output.dims();
        let output = output.reshape([batch, units]);

        let y_hat = softmax(self.projection.forward(output), 1);

        (y_hat, DecoderState::new(next.hidden, next.cell))
    }
}

// ─── Unit Tests ───────────────────────────────────────────────────────────────
#[cfg(test)]
mod tests {
    use super::*;
    use burn::tensor::Distribution;

    type TestBackend = burn::backend::NdArray;

    fn decoder_and_inputs(
        units: usize,
        vocab: usize,
        batch: usize,
    ) -> (
        StepDecoder<TestBackend>,
        Tensor<TestBackend, 2>,
        Tensor<TestBackend, 2>,
        DecoderState<TestBackend>,
    ) {
        let device  = Default::default();
        let decoder = StepDecoderConfig::new(units, vocab).init(&device);
        let dist    = Distribution::Uniform(-1.0, 1.0);

        let context = Tensor::random([batch, units], dist, &device);
        let y_prev  = Tensor::random([batch, vocab], dist, &device);
        let state   = DecoderState::new(
            Tensor::random([batch, units], dist, &device),
            Tensor::random([batch, units], dist, &device),
        );
        (decoder, context, y_prev, state)
    }

    #[test]
    fn test_output_is_a_distribution() {
        let (decoder, context, y_prev, state) = decoder_and_inputs(8, 5, 3);
        let (y_hat, _) = decoder.forward(context, y_prev, state);

        assert_eq!(y_hat.dims(), [3, 5]);
        let sums: Vec<f32> = y_hat.sum_dim(1).into_data().to_vec::<f32>().unwrap();
        assert!(sums.iter().all(|&s| (s - 1.0).abs() < 1e-5));
    }

    #[test]
    fn test_state_dims_are_preserved() {
        let (decoder, context, y_prev, state) = decoder_and_inputs(8, 5, 2);
        let (_, next) = decoder.forward(context, y_prev, state);

        assert_eq!(next.hidden.dims(), [2, 8]);
        assert_eq!(next.cell.dims(),   [2, 8]);
    }

    #[test]
    fn test_step_advances_the_state() {
        let (decoder, context, y_prev, state) = decoder_and_inputs(8, 5, 1);
        let before: Vec<f32> = state.hidden.clone().into_data().to_vec::<f32>().unwrap();

        let (_, next) = decoder.forward(context, y_prev, state);
        let after: Vec<f32> = next.hidden.into_data().to_vec::<f32>().unwrap();

        assert_ne!(before, after);
    }
}
