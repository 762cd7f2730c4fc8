// ============================================================
// Layer 3 — Core Traits (Abstractions)
// ============================================================
// By programming against traits instead of concrete types,
// we can swap implementations without changing the code
// that uses them. For example:
//   - LineLoader implements SampleSource
//   - A future IAM/Bentham dataset reader could also implement
//     SampleSource, and the application layer would not change
//
// This is the Dependency Inversion Principle from SOLID,
// applied using Rust's trait system.
//
// Reference: Rust Book §10 (Traits: Defining Shared Behaviour)

use anyhow::Result;
use crate::domain::line::{LabeledLine, LineImage};

// ─── SampleSource ─────────────────────────────────────────────────────────────
/// Any component that can load labelled line images from a source.
///
/// Implementations:
///   - LineLoader → loads image files with sibling .txt transcripts
pub trait SampleSource {
    /// Load all available samples from this source.
    fn load_all(&self) -> Result<Vec<LabeledLine>>;
}

// ─── LineRecognizer ───────────────────────────────────────────────────────────
/// Any component that can transcribe a single line image.
///
/// Implementations:
///   - RecognizeUseCase → uses the attention encoder-decoder
pub trait LineRecognizer {
    /// Transcribe one raw (unpreprocessed) line image into text.
    fn recognize(&self, image: &LineImage) -> Result<String>;
}
