// ============================================================
// Layer 4 — Line Preprocessor
// ============================================================
// Brings every raw line image into the shape the encoder expects:
//
//   1. Scale to the model's fixed height, preserving the aspect
//      ratio (width varies per line — the encoder handles that)
//   2. Normalise pixels from [0, 255] to [0.0, 1.0]
//   3. Optionally invert, for corpora with white ink on black
//
// The preprocessor is configured from an opaque key/value map so
// a saved model can restore the exact same options on load —
// training and inference must preprocess identically or the
// pixel statistics shift under the trained weights.
//
// Recognised option keys:
//   "target_height" (number) — overrides the scaling height
//   "normalize"     (bool)   — divide pixels by 255 (default true)
//   "invert"        (bool)   — flip foreground/background (default false)
//
// Unknown keys are carried along untouched.

use serde_json::{Map, Value};

use crate::domain::line::LineImage;

pub struct LinePreprocessor {
    target_height: usize,
    normalize:     bool,
    invert:        bool,
}

impl LinePreprocessor {
    /// Create a preprocessor scaling to the given height,
    /// with default options (normalise on, invert off).
    pub fn new(target_height: usize) -> Self {
        Self {
            target_height,
            normalize: true,
            invert:    false,
        }
    }

    /// Apply saved preprocessing options. Consumed keys set the
    /// matching field; anything else is ignored here and preserved
    /// verbatim by the checkpoint round-trip.
    pub fn configure(&mut self, options: &Map<String, Value>) {
        if let Some(h) = options.get("target_height").and_then(Value::as_u64) {
            self.target_height = h as usize;
        }
        if let Some(n) = options.get("normalize").and_then(Value::as_bool) {
            self.normalize = n;
        }
        if let Some(i) = options.get("invert").and_then(Value::as_bool) {
            self.invert = i;
        }
    }

    /// The current options as the opaque map persisted in params.json.
    pub fn options(&self) -> Map<String, Value> {
        let mut m = Map::new();
        m.insert("target_height".into(), Value::from(self.target_height as u64));
        m.insert("normalize".into(),     Value::from(self.normalize));
        m.insert("invert".into(),        Value::from(self.invert));
        m
    }

    /// Scale + normalise one line image.
    pub fn process(&self, image: &LineImage) -> LineImage {
        let scaled = self.scale_to_height(image);

        let pixels: Vec<f32> = scaled
            .pixels
            .iter()
            .map(|&p| {
                let p = if self.normalize { p / 255.0 } else { p };
                if self.invert {
                    let max = if self.normalize { 1.0 } else { 255.0 };
                    max - p
                } else {
                    p
                }
            })
            .collect();

        LineImage::new(pixels, scaled.height, scaled.width)
    }

    /// Nearest-neighbour rescale to target_height, keeping the
    /// aspect ratio. Nearest-neighbour is enough here: the conv
    /// stack immediately downsamples anyway.
    fn scale_to_height(&self, image: &LineImage) -> LineImage {
        if image.height == self.target_height {
            return image.clone();
        }

        let new_height = self.target_height;
        let new_width = ((image.width * new_height) / image.height.max(1)).max(1);

        let mut pixels = Vec::with_capacity(new_height * new_width);
        for row in 0..new_height {
            let src_row = (row * image.height / new_height).min(image.height - 1);
            for col in 0..new_width {
                let src_col = (col * image.width / new_width).min(image.width - 1);
                pixels.push(image.at(src_row, src_col));
            }
        }

        LineImage::new(pixels, new_height, new_width)
    }
}

// ─── Unit Tests ───────────────────────────────────────────────────────────────
#[cfg(test)]
mod tests {
    use super::*;

    fn flat_image(value: f32, height: usize, width: usize) -> LineImage {
        LineImage::new(vec![value; height * width], height, width)
    }

    #[test]
    fn test_scales_to_target_height_keeping_aspect() {
        let p   = LinePreprocessor::new(32);
        let out = p.process(&flat_image(255.0, 64, 128));
        assert_eq!(out.height, 32);
        assert_eq!(out.width,  64);
    }

    #[test]
    fn test_normalizes_to_unit_range() {
        let p   = LinePreprocessor::new(4);
        let out = p.process(&flat_image(255.0, 4, 4));
        assert!(out.pixels.iter().all(|&v| (v - 1.0).abs() < 1e-6));
    }

    #[test]
    fn test_invert_flips_foreground() {
        let mut p = LinePreprocessor::new(4);
        let mut opts = Map::new();
        opts.insert("invert".into(), Value::from(true));
        p.configure(&opts);

        let out = p.process(&flat_image(255.0, 4, 4));
        assert!(out.pixels.iter().all(|&v| v.abs() < 1e-6));
    }

    #[test]
    fn test_configure_round_trips_through_options() {
        let mut a = LinePreprocessor::new(48);
        let mut opts = Map::new();
        opts.insert("target_height".into(), Value::from(32u64));
        opts.insert("normalize".into(),     Value::from(false));
        a.configure(&opts);

        let mut b = LinePreprocessor::new(64);
        b.configure(&a.options());
        assert_eq!(b.target_height, 32);
        assert!(!b.normalize);
    }

    #[test]
    fn test_same_height_is_untouched() {
        let p   = LinePreprocessor::new(8);
        let img = flat_image(10.0, 8, 20);
        let out = p.process(&img);
        assert_eq!(out.width, 20);
        assert_eq!(out.height, 8);
    }
}
