// ============================================================
// Layer 1 — CLI Commands and Arguments
// ============================================================
// Defines the three subcommands: `train`, `reconstruct` and
// `traverse`, with all their configurable flags.
//
// Enum flags (--optimizer, --noise, --device) are parsed with
// their FromStr impls from the domain layer.

use std::path::PathBuf;

use clap::{Args, Subcommand};

use crate::application::train_use_case::TrainConfig;
use crate::domain::settings::{ComputeDevice, NoiseDistribution, OptimizerKind};

/// The top-level subcommands available to the user
#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Train the β-VAE on a folder of face images
    Train(TrainArgs),

    /// Write a grid of test images next to their reconstructions
    Reconstruct(ReconstructArgs),

    /// Write a grid of latent traversals for one test image
    Traverse(TraverseArgs),
}

/// All arguments for the `train` command.
#[derive(Args, Debug)]
pub struct TrainArgs {
    /// Directory containing the training images
    #[arg(long, default_value = "data/img_align_celeba")]
    pub data_dir: String,

    /// Glob pattern, relative to --data-dir, selecting image files
    #[arg(long, default_value = "*.jpg")]
    pub pattern: String,

    /// Directory for weights, config and metrics
    #[arg(long, default_value = "checkpoints")]
    pub checkpoint_dir: String,

    #[arg(long, default_value_t = 32)]
    pub batch_size: usize,

    /// Number of images (taken from the end of the sorted list) held out for testing
    #[arg(long, default_value_t = 16)]
    pub test_size: usize,

    /// Dimensionality of the latent code
    #[arg(long, default_value_t = 10)]
    pub latent_size: usize,

    /// Weight of the KL term; 1.0 is a plain VAE
    #[arg(long, default_value_t = 3.0)]
    pub beta: f64,

    #[arg(long, default_value_t = 10)]
    pub epochs: usize,

    #[arg(long, default_value_t = 1e-3)]
    pub lr: f64,

    /// adam | sgd
    #[arg(long, default_value = "adam")]
    pub optimizer: OptimizerKind,

    /// Noise used by the sampler: normal | uniform
    #[arg(long, default_value = "normal")]
    pub noise: NoiseDistribution,

    /// cpu | gpu
    #[arg(long, default_value = "cpu")]
    pub device: ComputeDevice,

    /// Seeds the backend RNG and the shuffle order
    #[arg(long, default_value_t = 42)]
    pub seed: u64,

    /// DataLoader worker threads (0 decodes on the training thread)
    #[arg(long, default_value_t = 2)]
    pub num_workers: usize,

    /// Side length the images are resized to (at least 15)
    #[arg(long, default_value_t = 64)]
    pub image_size: usize,

    /// Side length of the center crop taken before resizing
    #[arg(long, default_value_t = 178)]
    pub crop_size: usize,
}

/// Convert CLI TrainArgs into the application-layer TrainConfig.
impl From<TrainArgs> for TrainConfig {
    fn from(a: TrainArgs) -> Self {
        TrainConfig {
            data_dir:       a.data_dir,
            pattern:        a.pattern,
            checkpoint_dir: a.checkpoint_dir,
            batch_size:     a.batch_size,
            test_size:      a.test_size,
            latent_size:    a.latent_size,
            beta:           a.beta,
            epochs:         a.epochs,
            lr:             a.lr,
            optimizer:      a.optimizer,
            noise:          a.noise,
            device:         a.device,
            seed:           a.seed,
            num_workers:    a.num_workers,
            image_size:     a.image_size,
            crop_size:      a.crop_size,
        }
    }
}

/// All arguments for the `reconstruct` command
#[derive(Args, Debug)]
pub struct ReconstructArgs {
    /// Directory where `train` saved its checkpoint
    #[arg(long, default_value = "checkpoints")]
    pub checkpoint_dir: PathBuf,

    /// Number of test images to reconstruct
    #[arg(long, default_value_t = 8)]
    pub count: usize,

    #[arg(long, default_value = "reconstructions.png")]
    pub output: PathBuf,

    /// Decode mu directly instead of a sampled code
    #[arg(long)]
    pub mean: bool,

    /// Override the device stored in the checkpoint config
    #[arg(long)]
    pub device: Option<ComputeDevice>,
}

/// All arguments for the `traverse` command
#[derive(Args, Debug)]
pub struct TraverseArgs {
    /// Directory where `train` saved its checkpoint
    #[arg(long, default_value = "checkpoints")]
    pub checkpoint_dir: PathBuf,

    /// Position of the image within the test split
    #[arg(long, default_value_t = 0)]
    pub index: usize,

    /// How many latent dimensions to traverse (one grid row each)
    #[arg(long, default_value_t = 10)]
    pub dims: usize,

    /// Values per dimension (grid columns)
    #[arg(long, default_value_t = 9)]
    pub steps: usize,

    /// Each dimension is swept over [-range, range]
    #[arg(long, default_value_t = 3.0)]
    pub range: f32,

    #[arg(long, default_value = "traversal.png")]
    pub output: PathBuf,

    /// Override the device stored in the checkpoint config
    #[arg(long)]
    pub device: Option<ComputeDevice>,
}
