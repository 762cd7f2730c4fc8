// ============================================================
// Layer 5 — ML / Model Layer (Burn)
// ============================================================
// This layer contains ALL Burn framework specific code.
// No other layer imports from burn directly — only this one
// (and the data layer's Dataset/Batcher glue).
//
// What's in this layer:
//
//   encoder.rs    — Convolutional feature extractor + LSTM scan.
//                   Turns a line image into a sequence of column
//                   activations plus a final recurrent state.
//
//   attention.rs  — Additive attention. At every decode step it
//                   scores each encoder column against the current
//                   decoder state and builds a context vector.
//
//   decoder.rs    — Single-timestep LSTM decoder. Consumes
//                   (context ++ previous-token one-hot), emits a
//                   token distribution and the next state.
//
//   model.rs      — Combines the three sub-networks. Owns the
//                   teacher-forced training unroll and the
//                   cross-entropy loss over its outputs.
//
//   inferencer.rs — Greedy autoregressive decoding: feed back the
//                   argmax token until EOS or the step cap.
//
//   trainer.rs    — The training loop: forward, loss, backward,
//                   Adam step, validation, checkpoint per epoch.
//
// The step logic is written once (attention + decoder) and driven
// by two thin loops: a fixed-count unroll for training and a
// condition-terminated loop for inference.
//
// Reference: Burn Book §3 (Building Blocks)
//            Burn Book §5 (Training)
//            Bahdanau et al. (2015) Neural Machine Translation
//            by Jointly Learning to Align and Translate

/// Convolutional + recurrent line encoder
pub mod encoder;

/// Additive attention over encoder activations
pub mod attention;

/// Single-step recurrent decoder
pub mod decoder;

/// The combined model, training unroll and loss
pub mod model;

/// Greedy decoding loop
pub mod inferencer;

/// Full training loop with validation and checkpointing
pub mod trainer;
