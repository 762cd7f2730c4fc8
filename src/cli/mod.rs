// ============================================================
// Layer 1 — CLI / Presentation Layer
// ============================================================
// This is the entry point for all user interaction.
// It uses the `clap` crate to parse command line arguments.
// All business logic is delegated to Layer 2 (application).
//
// Two commands are supported:
//   1. `train`     — trains the recognizer on labelled line images
//   2. `recognize` — loads a saved model and transcribes images
//
// Reference: Rust Book §7 (Modules), §12 (CLI programs)

// Declare the commands submodule
pub mod commands;

use anyhow::Result;
use clap::Parser;
use commands::{Commands, TrainArgs, RecognizeArgs};

/// The main CLI struct — clap reads the fields and generates
/// argument parsing code automatically via the Parser derive macro.
#[derive(Parser, Debug)]
#[command(
    name = "htr-attention",
    version = "0.1.0",
    about = "Train an attention encoder-decoder on handwritten text lines, then recognize new images."
)]
pub struct Cli {
    /// The subcommand to run (train or recognize)
    #[command(subcommand)]
    pub command: Commands,
}

impl Cli {
    /// Match on the subcommand and dispatch to the correct use case.
    /// This keeps the CLI layer thin — it only routes, never computes.
    pub fn run(self) -> Result<()> {
        match self.command {
            Commands::Train(args)     => Self::run_train(args),
            Commands::Recognize(args) => Self::run_recognize(args),
        }
    }

    /// Handles the `train` subcommand.
    /// Converts CLI args into a TrainConfig and hands off to Layer 2.
    fn run_train(args: TrainArgs) -> Result<()> {
        use crate::application::train_use_case::TrainUseCase;

        tracing::info!("Starting training on line images in: {}", args.data_dir);

        // Convert CLI args → application config (separates presentation from domain)
        let use_case = TrainUseCase::new(args.into());
        use_case.execute()?;

        println!("Training complete. Model saved.");
        Ok(())
    }

    /// Handles the `recognize` subcommand.
    /// Loads the saved model and prints one transcription per image.
    fn run_recognize(args: RecognizeArgs) -> Result<()> {
        use crate::application::recognize_use_case::RecognizeUseCase;

        let use_case = RecognizeUseCase::new(&args.model_dir)?;

        for (path, text) in use_case.recognize_path(&args.input)? {
            println!("{}\t{}", path, text);
        }
        Ok(())
    }
}
