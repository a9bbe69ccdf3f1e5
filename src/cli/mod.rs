// ============================================================
// Layer 1 — CLI / Presentation Layer
// ============================================================
// Entry point for all user interaction, parsed with `clap`.
// All work is delegated to Layer 2 (application).
//
// Three commands are supported:
//   1. `train`      : trains the β-VAE on a folder of images
//   2. `reconstruct`: reconstruction grid from a checkpoint
//   3. `traverse`   : latent traversal grid from a checkpoint

pub mod commands;

use anyhow::Result;
use clap::Parser;
use commands::{Commands, ReconstructArgs, TrainArgs, TraverseArgs};

use crate::application::{train_use_case::TrainUseCase, visualize_use_case::VisualizeUseCase};

#[derive(Parser, Debug)]
#[command(
    name = "beta-vae",
    version,
    about = "Train a β-VAE on face images, then inspect its reconstructions and latent space."
)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Commands,
}

impl Cli {
    /// Dispatch to the matching use case.
    pub fn run(self) -> Result<()> {
        match self.command {
            Commands::Train(args)       => run_train(args),
            Commands::Reconstruct(args) => run_reconstruct(args),
            Commands::Traverse(args)    => run_traverse(args),
        }
    }
}

fn run_train(args: TrainArgs) -> Result<()> {
    tracing::info!("Starting training on images in: {}", args.data_dir);

    let report = TrainUseCase::new(args.into()).execute()?;

    if let Some(last) = report.last() {
        println!(
            "Training complete after {} epochs (test_loss={:.4}). Checkpoint: {}",
            last.epoch,
            last.test_loss,
            report.checkpoint.display()
        );
    }
    Ok(())
}

fn run_reconstruct(args: ReconstructArgs) -> Result<()> {
    VisualizeUseCase::new(args.checkpoint_dir, args.device)?
        .reconstruct(args.count, args.mean, &args.output)?;
    println!("Reconstructions written to {}", args.output.display());
    Ok(())
}

fn run_traverse(args: TraverseArgs) -> Result<()> {
    VisualizeUseCase::new(args.checkpoint_dir, args.device)?
        .traverse(args.index, args.dims, args.steps, args.range, &args.output)?;
    println!("Traversal written to {}", args.output.display());
    Ok(())
}
