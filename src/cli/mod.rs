// ============================================================
// Layer 1 — CLI / Presentation Layer
// ============================================================
// The entry point for all user interaction, parsed with clap.
// All business logic is delegated to Layer 2 (application).
//
// Two commands are supported:
//   1. `train`    — trains the model on a source corpus
//   2. `complete` — loads a checkpoint and continues a prompt
//
// Reference: Rust Book §7 (Modules), §12 (CLI programs)

// Declare the commands submodule
pub mod commands;

use anyhow::Result;
use clap::Parser;
use commands::{Commands, TrainArgs, CompleteArgs};

/// The main CLI struct — clap reads the fields and generates
/// argument parsing code automatically via the Parser derive macro.
#[derive(Parser, Debug)]
#[command(
    name = "source-lm",
    version = "0.1.0",
    about = "Train a next-token transformer on C++ sources, then generate completions."
)]
pub struct Cli {
    /// The subcommand to run (train or complete)
    #[command(subcommand)]
    pub command: Commands,
}

impl Cli {
    /// Match on the subcommand and dispatch to the correct use
    /// case. The CLI layer only routes, never computes.
    pub fn run(self) -> Result<()> {
        match self.command {
            Commands::Train(args)    => Self::run_train(args),
            Commands::Complete(args) => Self::run_complete(args),
        }
    }

    /// Handles the `train` subcommand.
    fn run_train(args: TrainArgs) -> Result<()> {
        use crate::application::train_use_case::TrainUseCase;

        tracing::info!("Starting training on corpus: {}", args.corpus_dir);

        // Convert CLI args → application config
        let use_case = TrainUseCase::new(args.into());
        use_case.execute()?;

        println!("Training run finished. Checkpoint saved.");
        Ok(())
    }

    /// Handles the `complete` subcommand.
    fn run_complete(args: CompleteArgs) -> Result<()> {
        use crate::application::complete_use_case::CompleteUseCase;

        let use_case = CompleteUseCase::new(args.checkpoint_dir.clone())?;
        let generated = use_case.complete(
            &args.prompt,
            args.max_new_tokens,
            args.min_prob,
        )?;

        if generated.is_empty() {
            println!("(no continuation — the confidence gate stopped at the first token)");
        } else {
            println!("\n{}", generated);
        }
        Ok(())
    }
}
