// ============================================================
// Layer 3 — Line Image Domain Types
// ============================================================
// Plain data structs for a single handwritten text line.
// By the time a LineImage exists, the pixels have already been
// decoded from whatever file format they came in — this layer
// never sees PNG/JPEG internals.
//
// Reference: Rust Book §5 (Structs and Methods)

use serde::{Deserialize, Serialize};

/// A grayscale line image, row-major, one f32 per pixel.
/// Raw pixels are in [0, 255] as loaded; the preprocessor
/// owns normalisation and rescaling.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LineImage {
    pub pixels: Vec<f32>,
    pub height: usize,
    pub width:  usize,
}

impl LineImage {
    pub fn new(pixels: Vec<f32>, height: usize, width: usize) -> Self {
        debug_assert_eq!(pixels.len(), height * width);
        Self { pixels, height, width }
    }

    /// Pixel at (row, col). Callers guarantee bounds.
    pub fn at(&self, row: usize, col: usize) -> f32 {
        self.pixels[row * self.width + col]
    }
}

/// A training sample: one line image plus its ground-truth text.
#[derive(Debug, Clone)]
pub struct LabeledLine {
    /// The filename — kept for traceability in log messages
    pub source: String,

    /// The decoded grayscale image
    pub image: LineImage,

    /// The ground-truth transcription of the line
    pub transcript: String,
}

impl LabeledLine {
    pub fn new(source: impl Into<String>, image: LineImage, transcript: impl Into<String>) -> Self {
        Self {
            source:     source.into(),
            image,
            transcript: transcript.into(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_pixel_indexing_is_row_major() {
        let img = LineImage::new(vec![0.0, 1.0, 2.0, 3.0, 4.0, 5.0], 2, 3);
        assert_eq!(img.at(0, 2), 2.0);
        assert_eq!(img.at(1, 0), 3.0);
    }
}
