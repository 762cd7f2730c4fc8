// ============================================================
// Layer 5 — Convolutional Line Encoder
// ============================================================
// Turns a grayscale line image into a left-to-right sequence of
// column activations:
//
//   [batch, 1, H, W]
//        │  conv 3x3 'same' + relu, maxpool 2x2
//        ▼
//   [batch, 32, H/2, W/2]
//        │  conv 3x3 'same' + relu, maxpool 2x2
//        ▼
//   [batch, 64, H/4, W/4]
//        │  collapse height into the feature axis
//        ▼
//   [batch, W/4, 64 * H/4]
//        │  LSTM scan, left to right
//        ▼
//   activations [batch, W/4, units] + final (h, c) [batch, units]
//
// The activations and final state are produced once per image and
// read many times by the decode loop — they are never mutated
// after encoding.

use burn::{
    nn::{
        conv::{Conv2d, Conv2dConfig},
        pool::{MaxPool2d, MaxPool2dConfig},
        Lstm, LstmConfig, PaddingConfig2d,
    },
    prelude::*,
};
use burn::tensor::activation::relu;

const CONV1_CHANNELS: usize = 32;
const CONV2_CHANNELS: usize = 64;

/// Width of the activation sequence for a given input width:
/// two 2x2 maxpools each halve the width (integer division).
pub fn output_width(image_width: usize) -> usize {
    (image_width / 2) / 2
}

/// Feature size of one column after the conv stack collapses
/// the (reduced) height into the channel axis.
pub fn column_features(height: usize) -> usize {
    CONV2_CHANNELS * (height / 4)
}

#[derive(Config, Debug)]
pub struct ConvEncoderConfig {
    /// Fixed input image height in pixels
    pub height: usize,
    /// Hidden size of the encoder LSTM (= activation dimension)
    pub units: usize,
}

impl ConvEncoderConfig {
    pub fn init<B: Backend>(&self, device: &B::Device) -> ConvEncoder<B> {
        let conv1 = Conv2dConfig::new([1, CONV1_CHANNELS], [3, 3])
            .with_padding(PaddingConfig2d::Same)
            .init(device);
        let conv2 = Conv2dConfig::new([CONV1_CHANNELS, CONV2_CHANNELS], [3, 3])
            .with_padding(PaddingConfig2d::Same)
            .init(device);
        let pool1 = MaxPool2dConfig::new([2, 2]).with_strides([2, 2]).init();
        let pool2 = MaxPool2dConfig::new([2, 2]).with_strides([2, 2]).init();
        let lstm  = LstmConfig::new(column_features(self.height), self.units, true)
            .init(device);

        ConvEncoder { conv1, pool1, conv2, pool2, lstm }
    }
}

/// The encoder output: one activation vector per reduced-width
/// column plus the LSTM's final state. Shared read-only by every
/// decode step of one image.
#[derive(Debug, Clone)]
pub struct EncodedLine<B: Backend> {
    /// [batch, positions, units]
    pub activations: Tensor<B, 3>,
    /// [batch, units]
    pub hidden: Tensor<B, 2>,
    /// [batch, units]
    pub cell: Tensor<B, 2>,
}

#[derive(Module, Debug)]
pub struct ConvEncoder<B: Backend> {
    conv1: Conv2d<B>,
    pool1: MaxPool2d,
    conv2: Conv2d<B>,
    pool2: MaxPool2d,
    lstm:  Lstm<B>,
}

impl<B: Backend> ConvEncoder<B> {
    /// images: [batch, 1, height, width] → activations + final state.
    /// Width may vary between calls; the LSTM scans whatever
    /// number of columns the conv stack produces.
    pub fn forward(&self, images: Tensor<B, 4>) -> EncodedLine<B> {
        let x = self.pool1.forward(relu(self.conv1.forward(images)));
        let x = self.pool2.forward(relu(self.conv2.forward(x)));

        // [batch, C, H', W'] → [batch, W', H' * C]: one feature
        // vector per image column, scanned left to right.
        let [batch, channels, h, w] = x.dims();
        let features = x.swap_dims(1, 3).reshape([batch, w, h * channels]);

        let (activations, state) = self.lstm.forward(features, None);

        EncodedLine {
            activations,
            hidden: state.hidden,
            cell:   state.cell,
        }
    }
}

// ─── Unit Tests ───────────────────────────────────────────────────────────────
#[cfg(test)]
mod tests {
    use super::*;

    type TestBackend = burn::backend::NdArray;

    #[test]
    fn test_activation_count_matches_output_width() {
        let device  = Default::default();
        let encoder = ConvEncoderConfig::new(8, 16).init::<TestBackend>(&device);

        let images = Tensor::zeros([2, 1, 8, 20], &device);
        let out    = encoder.forward(images);

        assert_eq!(out.activations.dims(), [2, output_width(20), 16]);
    }

    #[test]
    fn test_final_state_dims() {
        let device  = Default::default();
        let encoder = ConvEncoderConfig::new(8, 16).init::<TestBackend>(&device);

        let out = encoder.forward(Tensor::zeros([3, 1, 8, 16], &device));
        assert_eq!(out.hidden.dims(), [3, 16]);
        assert_eq!(out.cell.dims(),   [3, 16]);
    }

    #[test]
    fn test_output_width_halves_twice() {
        assert_eq!(output_width(1024), 256);
        assert_eq!(output_width(18),   4);
    }

    #[test]
    fn test_variable_width_inputs() {
        // same encoder, two different widths — the activation
        // sequence length follows the input
        let device  = Default::default();
        let encoder = ConvEncoderConfig::new(8, 16).init::<TestBackend>(&device);

        let narrow = encoder.forward(Tensor::zeros([1, 1, 8, 12], &device));
        let wide   = encoder.forward(Tensor::zeros([1, 1, 8, 40], &device));
        assert_eq!(narrow.activations.dims()[1], 3);
        assert_eq!(wide.activations.dims()[1],   10);
    }
}
