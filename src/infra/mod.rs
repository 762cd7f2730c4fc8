// ============================================================
// Layer 6 — Infrastructure Layer
// ============================================================
// Handles all cross-cutting concerns that don't belong in
// any specific business layer:
//
//   checkpoint.rs    — Model persistence. Writes params.json
//                      (architecture + preprocessing options)
//                      plus three independently recorded
//                      sub-network artifacts (encoder, decoder,
//                      attention) via Burn's CompactRecorder.
//
//   charset_store.rs — Charset persistence. Builds the character
//                      alphabet from the training transcripts if
//                      none exists, or loads a previously saved
//                      one. Ensures training and recognition use
//                      the same code assignment.
//
//   metrics.rs       — Training metrics logging. Writes
//                      epoch-level metrics (loss, accuracy) to a
//                      CSV file for later analysis.
//
// Reference: Rust Book §7 (Modules)
//            Burn Book §5 (Checkpointing)

/// Model saving and loading (params.json + three sub-networks)
pub mod checkpoint;

/// Charset building, saving, and loading
pub mod charset_store;

/// Training metrics CSV logger
pub mod metrics;
