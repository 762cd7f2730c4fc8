// ============================================================
// Layer 6 — Checkpoint Manager
// ============================================================
// Saves and restores the model using Burn's CompactRecorder.
//
// What gets saved in the model directory:
//   1. encoder.mpk.gz   — encoder weights
//   2. decoder.mpk.gz   — decoder weights
//   3. attention.mpk.gz — attention weights
//   4. params.json      — architecture + preprocessing options
//
// The three sub-networks are persisted independently so each can
// be inspected or swapped on its own; params.json carries enough
// to rebuild the exact architecture before loading weights into
// it. Without it, we can't reconstruct the model.
//
// params.json format:
//   {
//     "name": "ConvolutionalEncoderDecoderWithAttention",
//     "params": { height, units, output_size, max_image_width,
//                 max_text_length, sos, eos },
//     "preprocessing": { ...opaque key/value options... }
//   }
//
// Burn's CompactRecorder:
//   - Serialises parameters to MessagePack format
//   - Compresses with gzip for smaller file size
//   - Type-safe: loading fails if the architecture doesn't match
//
// Reference: Burn Book §5 (Records and Checkpointing)

use anyhow::{Context, Result};
use std::{fs, path::PathBuf};
use burn::{
    prelude::*,
    record::{CompactRecorder, Recorder},
};
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

use crate::ml::model::{HtrModel, HtrModelConfig};

/// The model identifier written into params.json.
pub const MODEL_NAME: &str = "ConvolutionalEncoderDecoderWithAttention";

/// The on-disk configuration record.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ModelParamsFile {
    pub name:          String,
    pub params:        HtrModelConfig,
    pub preprocessing: Map<String, Value>,
}

/// Manages saving and loading of the model directory.
pub struct CheckpointManager {
    dir: PathBuf,
}

impl CheckpointManager {
    /// Create a new CheckpointManager.
    /// Creates the directory if it doesn't already exist.
    pub fn new(dir: impl Into<String>) -> Self {
        let dir = PathBuf::from(dir.into());
        fs::create_dir_all(&dir).ok();
        Self { dir }
    }

    /// Persist the model: params.json plus the three sub-network
    /// artifacts, each recorded independently.
    pub fn save<B: Backend>(
        &self,
        model:         &HtrModel<B>,
        config:        &HtrModelConfig,
        preprocessing: &Map<String, Value>,
    ) -> Result<()> {
        let recorder = CompactRecorder::new();

        recorder
            .record(model.encoder.clone().into_record(), self.dir.join("encoder"))
            .with_context(|| "Failed to save encoder weights")?;
        recorder
            .record(model.decoder.clone().into_record(), self.dir.join("decoder"))
            .with_context(|| "Failed to save decoder weights")?;
        recorder
            .record(model.attention.clone().into_record(), self.dir.join("attention"))
            .with_context(|| "Failed to save attention weights")?;

        let record = ModelParamsFile {
            name:          MODEL_NAME.to_string(),
            params:        config.clone(),
            preprocessing: preprocessing.clone(),
        };

        let path = self.dir.join("params.json");
        fs::write(&path, serde_json::to_string_pretty(&record)?)
            .with_context(|| format!("Cannot write '{}'", path.display()))?;

        tracing::debug!("Saved model to '{}'", self.dir.display());
        Ok(())
    }

    /// Rebuild the model from params.json and the three artifacts.
    /// Returns the model plus the preprocessing options verbatim.
    pub fn load<B: Backend>(
        &self,
        device: &B::Device,
    ) -> Result<(HtrModel<B>, HtrModelConfig, Map<String, Value>)> {
        let record = self.load_params()?;

        // Fresh architecture first, then weights loaded into it —
        // load_record returns a new module with the loaded weights.
        let HtrModel {
            encoder,
            attention,
            decoder,
            output_size,
            max_text_length,
            sos,
            eos,
        } = record.params.init::<B>(device);

        let recorder = CompactRecorder::new();

        let encoder = encoder.load_record(
            recorder
                .load(self.dir.join("encoder"), device)
                .with_context(|| self.missing_artifact("encoder"))?,
        );
        let decoder = decoder.load_record(
            recorder
                .load(self.dir.join("decoder"), device)
                .with_context(|| self.missing_artifact("decoder"))?,
        );
        let attention = attention.load_record(
            recorder
                .load(self.dir.join("attention"), device)
                .with_context(|| self.missing_artifact("attention"))?,
        );

        let model = HtrModel {
            encoder,
            attention,
            decoder,
            output_size,
            max_text_length,
            sos,
            eos,
        };

        tracing::info!("Loaded model from '{}'", self.dir.display());
        Ok((model, record.params, record.preprocessing))
    }

    /// Read and parse params.json.
    pub fn load_params(&self) -> Result<ModelParamsFile> {
        let path = self.dir.join("params.json");

        let json = fs::read_to_string(&path)
            .with_context(|| {
                format!(
                    "Cannot read '{}'. Make sure you have run 'train' before 'recognize'.",
                    path.display()
                )
            })?;

        Ok(serde_json::from_str(&json)?)
    }

    fn missing_artifact(&self, name: &str) -> String {
        format!(
            "Cannot load {} weights from '{}'. Have you trained the model first?",
            name,
            self.dir.display()
        )
    }
}
