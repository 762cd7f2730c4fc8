// ============================================================
// Layer 1 — CLI Commands and Arguments
// ============================================================
// Defines the two subcommands: `train` and `recognize`
// and all their configurable flags.
//
// clap's derive macros automatically generate:
//   - help text (--help)
//   - error messages for missing args
//   - type conversion (string → usize, f64, etc.)
//
// Reference: Rust Book §12 (Building a CLI Program)

use clap::{Args, Subcommand};
use crate::application::train_use_case::TrainConfig;

/// The two top-level subcommands available to the user
#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Train the recognizer on a directory of labelled line images
    Train(TrainArgs),

    /// Transcribe line images using a previously trained model
    Recognize(RecognizeArgs),
}

/// All arguments for the `train` command.
/// Each field becomes a --flag on the command line.
#[derive(Args, Debug)]
pub struct TrainArgs {
    /// Directory of line images (.png/.jpg) with sibling .txt transcripts
    #[arg(long, default_value = "data/lines")]
    pub data_dir: String,

    /// Directory to save the trained model and charset
    #[arg(long, default_value = "model")]
    pub model_dir: String,

    /// Fixed pixel height every line image is scaled to
    #[arg(long, default_value_t = 64)]
    pub height: usize,

    /// Hidden size of the encoder and decoder LSTMs
    #[arg(long, default_value_t = 128)]
    pub units: usize,

    /// Width (in pixels) training images are padded to.
    /// Must be wide enough for the widest line in the corpus.
    #[arg(long, default_value_t = 1024)]
    pub max_image_width: usize,

    /// Number of decode steps unrolled during training.
    /// One step is reserved for the initial start-of-sequence feed,
    /// so transcripts longer than this minus one are truncated.
    #[arg(long, default_value_t = 64)]
    pub max_text_length: usize,

    /// Number of samples processed together in one forward pass
    #[arg(long, default_value_t = 8)]
    pub batch_size: usize,

    /// Number of full passes through the training data
    #[arg(long, default_value_t = 10)]
    pub epochs: usize,

    /// Adam learning rate
    #[arg(long, default_value_t = 1e-3)]
    pub lr: f64,
}

/// Convert CLI TrainArgs into the application-layer TrainConfig.
/// This is the boundary between Layer 1 and Layer 2 —
/// the application layer never sees clap types.
impl From<TrainArgs> for TrainConfig {
    fn from(a: TrainArgs) -> Self {
        TrainConfig {
            data_dir:        a.data_dir,
            model_dir:       a.model_dir,
            height:          a.height,
            units:           a.units,
            max_image_width: a.max_image_width,
            max_text_length: a.max_text_length,
            batch_size:      a.batch_size,
            epochs:          a.epochs,
            lr:              a.lr,
        }
    }
}

/// All arguments for the `recognize` command
#[derive(Args, Debug)]
pub struct RecognizeArgs {
    /// A line image file, or a directory of line images
    #[arg(long)]
    pub input: String,

    /// Directory where the trained model was saved
    #[arg(long, default_value = "model")]
    pub model_dir: String,
}
