// ============================================================
// Layer 4 — Data Pipeline
// ============================================================
// This layer handles everything from raw image files
// all the way to GPU-ready tensor batches.
//
// The pipeline flows in this order:
//
//   image files + .txt transcripts
//       │
//       ▼
//   LineLoader        → decodes images, reads transcripts
//       │
//       ▼
//   LinePreprocessor  → scales to model height, normalises pixels
//       │
//       ▼
//   Charset           → converts transcripts to token codes
//       │
//       ▼
//   TrainingAdapter   → pads images, builds teacher-forcing sequences
//       │
//       ▼
//   LineDataset       → implements Burn's Dataset trait
//       │
//       ▼
//   LineBatcher       → stacks samples into tensor batches
//       │
//       ▼
//   DataLoader        → feeds batches to the training loop
//
// Each module is responsible for exactly one step.
// This makes each step independently testable and replaceable.
//
// Reference: Burn Book §4 (Datasets and Dataloaders)

/// Loads line images and transcripts using the image crate
pub mod loader;

/// Scales, normalises and optionally inverts line images
pub mod preprocessor;

/// Turns (image, codes) pairs into teacher-forcing training examples
pub mod adapter;

/// Implements Burn's Dataset trait for training examples
pub mod dataset;

/// Implements Burn's Batcher trait to create tensor batches
pub mod batcher;

/// Shuffles and splits data into train/validation sets
pub mod splitter;
