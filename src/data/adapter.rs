// ============================================================
// Layer 4 — Training Adapter
// ============================================================
// Turns a preprocessed (image, token codes) pair into one
// teacher-forcing training example.
//
// The adapter is constructed with the model's max_text_length
// MINUS ONE as its transcript capacity: position 0 of the decoder
// input sequence is always the SOS feed, so only Tx - 1 slots
// remain for real transcript tokens.
//
// For a transcript y_0 .. y_{k-1} (k <= Tx - 1) and Tx decode steps:
//
//   decoder input:  [ SOS, y_0, y_1, ..., y_{k-1}, EOS, EOS, ... ]   (len Tx)
//   target:         [ y_0, y_1, ..., y_{k-1}, EOS,  EOS, EOS, ... ]  (len Tx)
//
// so at step t the decoder is fed the true token t-1 and trained
// to produce token t — classic teacher forcing. EOS doubles as
// the padding target, which teaches the decoder to keep emitting
// EOS once the line is finished.
//
// Images are padded on the right with zero pixels to the fixed
// max_image_width so a whole batch shares one static shape.

use crate::domain::line::LineImage;

/// One fully adapted training sample, ready for the batcher.
#[derive(Debug, Clone)]
pub struct TrainingExample {
    /// Row-major pixels, height * max_image_width
    pub image:  Vec<f32>,
    pub height: usize,
    pub width:  usize,

    /// Teacher-forcing decoder inputs (token codes, len = Tx)
    pub input_tokens: Vec<usize>,

    /// Expected decoder outputs (token codes, len = Tx)
    pub target_tokens: Vec<usize>,
}

#[derive(Debug, Clone)]
pub struct TrainingAdapter {
    sos:             usize,
    eos:             usize,
    output_size:     usize,
    max_image_width: usize,
    /// Transcript capacity = model max_text_length - 1
    max_text_length: usize,
}

impl TrainingAdapter {
    pub fn new(
        sos:             usize,
        eos:             usize,
        output_size:     usize,
        max_image_width: usize,
        max_text_length: usize,
    ) -> Self {
        debug_assert!(sos < output_size && eos < output_size);
        Self { sos, eos, output_size, max_image_width, max_text_length }
    }

    /// Number of decode steps in the examples this adapter produces.
    pub fn sequence_length(&self) -> usize {
        self.max_text_length + 1
    }

    pub fn output_size(&self) -> usize {
        self.output_size
    }

    /// Build one training example from a preprocessed image and
    /// its encoded transcript. Transcripts longer than the
    /// capacity are truncated; images wider than max_image_width
    /// are cropped.
    pub fn adapt(&self, image: &LineImage, codes: &[usize]) -> TrainingExample {
        let seq_len = self.sequence_length();

        let mut codes = codes.to_vec();
        codes.truncate(self.max_text_length);

        // decoder input: SOS, then the ground truth shifted right
        let mut input_tokens = Vec::with_capacity(seq_len);
        input_tokens.push(self.sos);
        input_tokens.extend_from_slice(&codes);
        input_tokens.resize(seq_len, self.eos);

        // target: the ground truth, then EOS padding
        let mut target_tokens = Vec::with_capacity(seq_len);
        target_tokens.extend_from_slice(&codes);
        target_tokens.resize(seq_len, self.eos);

        TrainingExample {
            image:  self.pad_image(image),
            height: image.height,
            width:  self.max_image_width,
            input_tokens,
            target_tokens,
        }
    }

    /// Right-pad (or crop) every row to max_image_width.
    fn pad_image(&self, image: &LineImage) -> Vec<f32> {
        let copy_width = image.width.min(self.max_image_width);
        let mut pixels = vec![0.0f32; image.height * self.max_image_width];

        for row in 0..image.height {
            let src = row * image.width;
            let dst = row * self.max_image_width;
            pixels[dst..dst + copy_width]
                .copy_from_slice(&image.pixels[src..src + copy_width]);
        }

        pixels
    }
}

// ─── Unit Tests ───────────────────────────────────────────────────────────────
#[cfg(test)]
mod tests {
    use super::*;

    fn adapter() -> TrainingAdapter {
        // sos=0, eos=1, vocab of 5, width 8, transcript capacity 3 (Tx = 4)
        TrainingAdapter::new(0, 1, 5, 8, 3)
    }

    fn image(height: usize, width: usize) -> LineImage {
        LineImage::new(vec![0.5; height * width], height, width)
    }

    #[test]
    fn test_teacher_forcing_layout() {
        let ex = adapter().adapt(&image(4, 8), &[3, 4]);
        assert_eq!(ex.input_tokens,  vec![0, 3, 4, 1]);
        assert_eq!(ex.target_tokens, vec![3, 4, 1, 1]);
    }

    #[test]
    fn test_sequence_length_is_capacity_plus_one() {
        // one decoder-input slot is reserved for the SOS feed
        assert_eq!(adapter().sequence_length(), 4);
    }

    #[test]
    fn test_long_transcripts_are_truncated() {
        let ex = adapter().adapt(&image(4, 8), &[2, 3, 4, 2, 3]);
        assert_eq!(ex.input_tokens,  vec![0, 2, 3, 4]);
        assert_eq!(ex.target_tokens, vec![2, 3, 4, 1]);
    }

    #[test]
    fn test_image_padded_to_max_width() {
        let ex = adapter().adapt(&image(2, 5), &[2]);
        assert_eq!(ex.width, 8);
        assert_eq!(ex.image.len(), 2 * 8);
        // padded region is zero
        assert_eq!(ex.image[5], 0.0);
        assert_eq!(ex.image[7], 0.0);
        // original pixels survive
        assert_eq!(ex.image[0], 0.5);
        assert_eq!(ex.image[8 + 4], 0.5);
    }

    #[test]
    fn test_wide_image_is_cropped() {
        let ex = adapter().adapt(&image(2, 12), &[2]);
        assert_eq!(ex.width, 8);
        assert_eq!(ex.image.len(), 2 * 8);
    }

    #[test]
    fn test_empty_transcript_is_all_eos() {
        let ex = adapter().adapt(&image(2, 4), &[]);
        assert_eq!(ex.input_tokens,  vec![0, 1, 1, 1]);
        assert_eq!(ex.target_tokens, vec![1, 1, 1, 1]);
    }
}
