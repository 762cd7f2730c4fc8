// ============================================================
// Layer 5 — Greedy Inference Loop
// ============================================================
// Autoregressive decoding of one line image at a time:
//
//   y_prev = one-hot(SOS); state = encoder final (h, c)
//   loop:
//     context = attention(activations, h, c)
//     (y_hat, state) = decoder(context, y_prev, state)
//     code   = argmax(y_hat)
//     y_prev = one-hot(code)
//     then, in this exact order:
//       1. code == EOS or the step cap reached → stop, drop code
//       2. code == SOS → skip it and keep looping
//       3. otherwise append code
//
// Two deliberate behaviours to be aware of:
//
//   - A mid-stream SOS is skipped but STILL fed back as the next
//     input, so the decoder can in principle emit SOS repeatedly
//     without making progress. This matches the long-standing
//     behaviour of the trained models in production; downstream
//     consumers may depend on it, so it is preserved as-is.
//
//   - The step cap (100) is a liveness safeguard, not an error:
//     a line that never produces EOS is silently truncated. It
//     also bounds the SOS self-loop above.
//
// Batched prediction is a per-item loop — items share no state.

use burn::prelude::*;

use crate::domain::line::LineImage;
use crate::ml::decoder::DecoderState;
use crate::ml::model::HtrModel;

/// Hard cap on decode steps when EOS never shows up.
pub const MAX_DECODE_STEPS: usize = 100;

/// What the decode loop does with one emitted code.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StepOutcome {
    /// Terminate the loop without appending
    Stop,
    /// Drop the code but keep decoding
    Skip,
    /// Append the code to the label sequence
    Emit(usize),
}

/// The append/skip/stop policy, separated from the tensor loop so
/// it can be exercised with scripted code sequences. `step` is the
/// zero-based index of the decode step that produced `code`.
pub fn classify_step(code: usize, step: usize, sos: usize, eos: usize) -> StepOutcome {
    if code == eos || step >= MAX_DECODE_STEPS {
        StepOutcome::Stop
    } else if code == sos {
        StepOutcome::Skip
    } else {
        StepOutcome::Emit(code)
    }
}

pub struct Inferencer<B: Backend> {
    model:  HtrModel<B>,
    device: B::Device,
}

impl<B: Backend> Inferencer<B> {
    pub fn new(model: HtrModel<B>, device: B::Device) -> Self {
        Self { model, device }
    }

    /// Greedy-decode one preprocessed line image into label codes.
    /// SOS/EOS never appear in the returned sequence.
    pub fn recognize_line(&self, image: &LineImage) -> Vec<usize> {
        let images = Tensor::<B, 1>::from_floats(image.pixels.as_slice(), &self.device)
            .reshape([1, 1, image.height, image.width]);

        // Encode once; activations/h/c are read-only from here on
        let encoded = self.model.encoder.forward(images);
        let mut state  = DecoderState::new(encoded.hidden.clone(), encoded.cell.clone());
        let mut y_prev = self.one_hot(self.model.sos);

        let mut labels = Vec::new();
        for step in 0.. {
            let context = self.model.attention.forward(
                encoded.activations.clone(),
                state.hidden.clone(),
                state.cell.clone(),
            );

            let (y_hat, next) = self.model.decoder.forward(context, y_prev, state);
            state = next;

            let code = y_hat.argmax(1).into_scalar().elem::<i64>() as usize;

            // The prediction is fed back regardless of the policy
            // outcome — including a skipped SOS.
            y_prev = self.one_hot(code);

            match classify_step(code, step, self.model.sos, self.model.eos) {
                StepOutcome::Stop       => break,
                StepOutcome::Skip       => continue,
                StepOutcome::Emit(code) => labels.push(code),
            }
        }

        labels
    }

    /// Decode a batch of images independently, in order.
    pub fn predict(&self, images: &[LineImage]) -> Vec<Vec<usize>> {
        images.iter().map(|img| self.recognize_line(img)).collect()
    }

    fn one_hot(&self, code: usize) -> Tensor<B, 2> {
        let mut flat = vec![0.0f32; self.model.output_size];
        flat[code] = 1.0;
        Tensor::<B, 1>::from_floats(flat.as_slice(), &self.device)
            .reshape([1, self.model.output_size])
    }
}

// ─── Unit Tests ───────────────────────────────────────────────────────────────
#[cfg(test)]
mod tests {
    use super::*;

    const SOS: usize = 0;
    const EOS: usize = 1;

    /// Drive the policy with a scripted code sequence, the way the
    /// tensor loop does with real argmax predictions.
    fn collect_labels(codes: &[usize]) -> Vec<usize> {
        let mut labels = Vec::new();
        for (step, &code) in codes.iter().enumerate() {
            match classify_step(code, step, SOS, EOS) {
                StepOutcome::Stop       => break,
                StepOutcome::Skip       => continue,
                StepOutcome::Emit(code) => labels.push(code),
            }
        }
        labels
    }

    #[test]
    fn test_stops_at_eos_and_excludes_it() {
        assert_eq!(collect_labels(&[3, 4, 1]), vec![3, 4]);
    }

    #[test]
    fn test_midstream_sos_is_skipped() {
        assert_eq!(collect_labels(&[0, 3, 1]), vec![3]);
    }

    #[test]
    fn test_stops_on_first_eos_only() {
        assert_eq!(collect_labels(&[2, 1, 3, 1]), vec![2]);
    }

    #[test]
    fn test_never_emits_more_than_the_cap() {
        // a decoder that never produces EOS
        let endless = vec![5usize; MAX_DECODE_STEPS * 2];
        let labels  = collect_labels(&endless);
        assert_eq!(labels.len(), MAX_DECODE_STEPS);
    }

    #[test]
    fn test_sos_self_loop_still_terminates() {
        // the preserved skip-and-refeed quirk must not hang
        let endless_sos = vec![SOS; MAX_DECODE_STEPS * 2];
        assert!(collect_labels(&endless_sos).is_empty());
    }

    #[test]
    fn test_output_never_contains_reserved_codes() {
        let labels = collect_labels(&[0, 2, 0, 3, 0, 4, 1]);
        assert!(!labels.contains(&SOS));
        assert!(!labels.contains(&EOS));
        assert_eq!(labels, vec![2, 3, 4]);
    }
}
