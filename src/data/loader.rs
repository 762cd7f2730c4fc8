// ============================================================
// Layer 4 — Line Image Loader
// ============================================================
// Loads labelled line images from a directory.
//
// Expected layout: for every image file the transcript lives in
// a sibling .txt file with the same stem:
//
//   data/lines/
//     a01-000u-00.png
//     a01-000u-00.txt   ← "A MOVE to stop Mr. Gaitskell"
//     a01-000u-01.png
//     a01-000u-01.txt
//     ...
//
// Images are decoded with the `image` crate and converted to
// 8-bit grayscale; the raw [0, 255] pixel values are kept so the
// preprocessor stays in charge of normalisation.
//
// Reference: image crate documentation
//            Rust Book §9 (Error Handling)

use anyhow::{Context, Result};
use std::{fs, path::Path};

use crate::domain::line::{LabeledLine, LineImage};
use crate::domain::traits::SampleSource;

/// File extensions treated as line images.
const IMAGE_EXTENSIONS: [&str; 4] = ["png", "jpg", "jpeg", "bmp"];

/// Loads all labelled line images from a given directory.
/// Implements the SampleSource trait from Layer 3.
pub struct LineLoader {
    /// Path to the directory containing images + transcripts
    dir: String,
}

impl LineLoader {
    /// Create a new LineLoader pointed at a directory
    pub fn new(dir: impl Into<String>) -> Self {
        Self { dir: dir.into() }
    }
}

impl SampleSource for LineLoader {
    fn load_all(&self) -> Result<Vec<LabeledLine>> {
        let dir = Path::new(&self.dir);

        // If the directory doesn't exist, return empty rather than crashing.
        if !dir.exists() {
            tracing::warn!(
                "Data directory '{}' does not exist — returning empty corpus",
                self.dir
            );
            return Ok(Vec::new());
        }

        let mut samples = Vec::new();

        for entry in fs::read_dir(dir)
            .with_context(|| format!("Cannot read directory '{}'", self.dir))?
        {
            let entry = entry?;
            let path  = entry.path();

            if !is_image_file(&path) {
                continue;
            }

            // Transcript lives next to the image with a .txt extension
            let transcript_path = path.with_extension("txt");
            if !transcript_path.exists() {
                tracing::warn!("No transcript for '{}' — skipping", path.display());
                continue;
            }

            match load_single_line(&path, &transcript_path) {
                Ok(sample) => {
                    tracing::debug!(
                        "Loaded: {} ({}x{}, {} chars)",
                        sample.source,
                        sample.image.width,
                        sample.image.height,
                        sample.transcript.len()
                    );
                    samples.push(sample);
                }
                // Log a warning but continue — don't fail on one bad file
                Err(e) => {
                    tracing::warn!("Skipping '{}': {}", path.display(), e);
                }
            }
        }

        tracing::info!("Successfully loaded {} line samples", samples.len());
        Ok(samples)
    }
}

pub fn is_image_file(path: &Path) -> bool {
    path.extension()
        .and_then(|e| e.to_str())
        .map(|e| IMAGE_EXTENSIONS.contains(&e.to_ascii_lowercase().as_str()))
        .unwrap_or(false)
}

/// Decode one image file into a grayscale LineImage.
/// Exposed so the recognize use case can load input images the
/// exact same way training data is loaded.
pub fn load_line_image(path: &Path) -> Result<LineImage> {
    let img = image::open(path)
        .with_context(|| format!("Cannot decode image '{}'", path.display()))?
        .to_luma8();

    let (width, height) = img.dimensions();
    let pixels: Vec<f32> = img.into_raw().into_iter().map(|p| p as f32).collect();

    Ok(LineImage::new(pixels, height as usize, width as usize))
}

fn load_single_line(image_path: &Path, transcript_path: &Path) -> Result<LabeledLine> {
    let image = load_line_image(image_path)?;

    let transcript = fs::read_to_string(transcript_path)
        .with_context(|| format!("Cannot read '{}'", transcript_path.display()))?
        .trim()
        .to_string();

    let source = image_path
        .file_name()
        .and_then(|n| n.to_str())
        .unwrap_or("unknown")
        .to_string();

    Ok(LabeledLine::new(source, image, transcript))
}
