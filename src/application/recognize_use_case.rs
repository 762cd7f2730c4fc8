// ============================================================
// Layer 2 — Recognize Use Case
// ============================================================
// Loads a trained model and transcribes line images:
//   1. Read params.json, rebuild the model, load the weights
//   2. Restore the saved preprocessing options verbatim
//   3. Load the saved charset
//   4. Per image: preprocess → greedy decode → map codes to text
//
// Each image is decoded independently, one at a time — there is
// no shared mutable state between items.

use anyhow::{bail, Result};
use std::path::Path;

use crate::data::loader::{is_image_file, load_line_image};
use crate::data::preprocessor::LinePreprocessor;
use crate::domain::charset::Charset;
use crate::domain::line::LineImage;
use crate::domain::traits::LineRecognizer;
use crate::infra::charset_store::CharsetStore;
use crate::infra::checkpoint::CheckpointManager;
use crate::ml::inferencer::Inferencer;

type InferBackend = burn::backend::Wgpu;

pub struct RecognizeUseCase {
    inferencer:   Inferencer<InferBackend>,
    charset:      Charset,
    preprocessor: LinePreprocessor,
}

impl RecognizeUseCase {
    pub fn new(model_dir: &str) -> Result<Self> {
        let device = burn::backend::wgpu::WgpuDevice::default();

        let ckpt = CheckpointManager::new(model_dir);
        let (model, params, preprocessing) = ckpt.load::<InferBackend>(&device)?;

        // Preprocess exactly as during training
        let mut preprocessor = LinePreprocessor::new(params.height);
        preprocessor.configure(&preprocessing);

        let charset = CharsetStore::new(model_dir).load()?;
        if charset.output_size() != params.output_size {
            bail!(
                "Charset size {} does not match model output size {} — \
                 the charset file does not belong to this model",
                charset.output_size(),
                params.output_size,
            );
        }

        let inferencer = Inferencer::new(model, device);

        Ok(Self { inferencer, charset, preprocessor })
    }

    /// Transcribe a single image file, or every image in a directory.
    /// Returns (path, transcription) pairs in directory order.
    pub fn recognize_path(&self, input: &str) -> Result<Vec<(String, String)>> {
        let path = Path::new(input);

        if path.is_dir() {
            let mut results = Vec::new();
            for entry in std::fs::read_dir(path)? {
                let entry = entry?;
                let file  = entry.path();
                if !is_image_file(&file) {
                    continue;
                }
                match self.recognize_file(&file) {
                    Ok(text) => results.push((file.display().to_string(), text)),
                    Err(e)   => tracing::warn!("Skipping '{}': {}", file.display(), e),
                }
            }
            Ok(results)
        } else {
            let text = self.recognize_file(path)?;
            Ok(vec![(input.to_string(), text)])
        }
    }

    fn recognize_file(&self, path: &Path) -> Result<String> {
        let image = load_line_image(path)?;
        self.recognize(&image)
    }
}

impl LineRecognizer for RecognizeUseCase {
    fn recognize(&self, image: &LineImage) -> Result<String> {
        let processed = self.preprocessor.process(image);
        let codes     = self.inferencer.recognize_line(&processed);
        Ok(self.charset.decode(&codes))
    }
}
