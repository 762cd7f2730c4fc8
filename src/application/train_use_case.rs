// ============================================================
// Layer 2 — TrainUseCase
// ============================================================
// Orchestrates the full training pipeline in order:
//
//   Step 1: Load labelled line images  (Layer 4 - data)
//   Step 2: Preprocess the images      (Layer 4 - data)
//   Step 3: Build/load the charset     (Layer 6 - infra)
//   Step 4: Adapt to training examples (Layer 4 - data)
//   Step 5: Split train/validation     (Layer 4 - data)
//   Step 6: Build datasets             (Layer 4 - data)
//   Step 7: Run training loop          (Layer 5 - ml)
//
// Reference: Burn Book §5 (Training)

use anyhow::{bail, Result};
use serde::{Deserialize, Serialize};

use crate::data::{
    adapter::TrainingAdapter,
    dataset::LineDataset,
    loader::LineLoader,
    preprocessor::LinePreprocessor,
    splitter::split_train_val,
};
use crate::domain::traits::SampleSource;
use crate::infra::{charset_store::CharsetStore, checkpoint::CheckpointManager};
use crate::ml::model::HtrModelConfig;
use crate::ml::trainer::run_training;

// ─── Training Configuration ──────────────────────────────────────────────────
// All hyperparameters for a training run.
// Serialisable so it can be logged and inspected later.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TrainConfig {
    pub data_dir:        String,
    pub model_dir:       String,
    pub height:          usize,
    pub units:           usize,
    pub max_image_width: usize,
    pub max_text_length: usize,
    pub batch_size:      usize,
    pub epochs:          usize,
    pub lr:              f64,
}

impl Default for TrainConfig {
    fn default() -> Self {
        Self {
            data_dir:        "data/lines".to_string(),
            model_dir:       "model".to_string(),
            height:          64,
            units:           128,
            max_image_width: 1024,
            max_text_length: 64,
            batch_size:      8,
            epochs:          10,
            lr:              1e-3,
        }
    }
}

// ─── TrainUseCase ─────────────────────────────────────────────────────────────
// Owns the config and runs the full training pipeline.
pub struct TrainUseCase {
    config: TrainConfig,
}

impl TrainUseCase {
    pub fn new(config: TrainConfig) -> Self {
        Self { config }
    }

    /// Execute the full training pipeline end to end
    pub fn execute(&self) -> Result<()> {
        let cfg = &self.config;

        // ── Step 1: Load all labelled line images ─────────────────────────────
        tracing::info!("Loading line images from '{}'", cfg.data_dir);
        let loader  = LineLoader::new(&cfg.data_dir);
        let samples = loader.load_all()?;

        if samples.is_empty() {
            bail!("No labelled line images found in '{}'", cfg.data_dir);
        }
        if cfg.max_text_length < 2 {
            bail!("max_text_length must be at least 2 (one slot is reserved for SOS)");
        }

        // ── Step 2: Preprocess (scale to model height, normalise) ─────────────
        let preprocessor = LinePreprocessor::new(cfg.height);

        // ── Step 3: Build / load the charset ──────────────────────────────────
        // If a charset was already built and saved, reuse it so the
        // code assignment stays stable across resumed runs.
        let charset_store = CharsetStore::new(&cfg.model_dir);
        let charset = charset_store
            .load_or_build(samples.iter().map(|s| s.transcript.as_str()))?;

        // ── Step 4: Adapt to teacher-forcing training examples ────────────────
        // The adapter's transcript capacity is max_text_length - 1:
        // decoder-input position 0 is reserved for the SOS feed.
        let adapter = TrainingAdapter::new(
            charset.sos(),
            charset.eos(),
            charset.output_size(),
            cfg.max_image_width,
            cfg.max_text_length - 1,
        );

        let examples: Vec<_> = samples
            .iter()
            .map(|s| {
                let image = preprocessor.process(&s.image);
                let codes = charset.encode(&s.transcript);
                adapter.adapt(&image, &codes)
            })
            .collect();
        tracing::info!("Built {} training examples", examples.len());

        // ── Step 5: Train / validation split (80/20) ──────────────────────────
        let (train_examples, val_examples) = split_train_val(examples, 0.8);
        tracing::info!(
            "Split: {} train, {} validation",
            train_examples.len(),
            val_examples.len()
        );

        // ── Step 6: Build Burn datasets ───────────────────────────────────────
        let train_dataset = LineDataset::new(train_examples);
        let val_dataset   = LineDataset::new(val_examples);

        // ── Step 7: Run training loop (Layer 5) ───────────────────────────────
        // The trainer persists params.json + the three sub-network
        // artifacts after every epoch, preprocessing options included.
        let model_cfg = HtrModelConfig::new(
            cfg.height,
            cfg.units,
            charset.output_size(),
            cfg.max_image_width,
            cfg.max_text_length,
            charset.sos(),
            charset.eos(),
        );

        let ckpt_manager = CheckpointManager::new(&cfg.model_dir);

        run_training(
            cfg,
            &model_cfg,
            &preprocessor.options(),
            train_dataset,
            val_dataset,
            ckpt_manager,
        )?;

        Ok(())
    }
}
