// ============================================================
// Layer 2 — Visualize Use Case
// ============================================================
// Loads a trained checkpoint and renders PNG grids from the
// held-out test split:
//
//   reconstruct → row 1: inputs, row 2: reconstructions
//                 (sampled, or decoded from mu with `mean`)
//   traverse    → one row per latent dimension, one column
//                 per step in [-range, range]
//
// The backend comes from the saved TrainConfig unless the
// caller overrides it.

use std::path::{Path, PathBuf};

use anyhow::{anyhow, ensure, Result};
use burn::{prelude::*, tensor::backend::AutodiffBackend};

use crate::application::train_use_case::TrainConfig;
use crate::domain::settings::ComputeDevice;
use crate::infra::{
    checkpoint::CheckpointManager,
    image_grid::{render_grid, save_grid},
};
use crate::ml::{
    backend::{dispatch, BackendTask},
    inferencer::VaeInferencer,
};

pub struct VisualizeUseCase {
    ckpt_manager: CheckpointManager,
    device:       Option<ComputeDevice>,
}

impl VisualizeUseCase {
    pub fn new(checkpoint_dir: impl Into<PathBuf>, device: Option<ComputeDevice>) -> Result<Self> {
        let ckpt_manager = CheckpointManager::open(checkpoint_dir)?;
        Ok(Self { ckpt_manager, device })
    }

    /// Reconstruct the first `count` test images and write the grid to `output`.
    pub fn reconstruct(&self, count: usize, mean: bool, output: &Path) -> Result<()> {
        ensure!(count > 0, "count must be positive");
        let (cfg, test_paths) = self.test_split()?;

        let paths: Vec<PathBuf> = test_paths.into_iter().take(count).collect();
        if paths.len() < count {
            tracing::warn!("Only {} test images available, requested {count}", paths.len());
        }

        let task = ReconstructTask { ckpt_manager: &self.ckpt_manager, paths, mean, seed: cfg.seed };
        let grid = dispatch(self.device.unwrap_or(cfg.device), task)?;
        save_grid(&grid, output)
    }

    /// Traverse the latent code of test image `index` and write the grid to `output`.
    pub fn traverse(
        &self,
        index:  usize,
        dims:   usize,
        steps:  usize,
        range:  f32,
        output: &Path,
    ) -> Result<()> {
        let (cfg, test_paths) = self.test_split()?;
        let total = test_paths.len();
        let path  = test_paths
            .into_iter()
            .nth(index)
            .ok_or_else(|| anyhow!("index {index} is out of range for {total} test images"))?;
        tracing::info!("Traversing latent code of '{}'", path.display());

        let task = TraverseTask { ckpt_manager: &self.ckpt_manager, path, dims, steps, range };
        let grid = dispatch(self.device.unwrap_or(cfg.device), task)?;
        save_grid(&grid, output)
    }

    fn test_split(&self) -> Result<(TrainConfig, Vec<PathBuf>)> {
        let cfg = self.ckpt_manager.load_config()?;
        let (_, test_paths) = cfg.split_paths()?;
        ensure!(
            !test_paths.is_empty(),
            "The checkpoint in '{}' was trained without a test split",
            self.ckpt_manager.dir().display()
        );
        Ok((cfg, test_paths))
    }
}

// ─── Backend Tasks ────────────────────────────────────────────────────────────
// Inference runs on B::InnerBackend: no gradients are needed.

struct ReconstructTask<'a> {
    ckpt_manager: &'a CheckpointManager,
    paths:        Vec<PathBuf>,
    mean:         bool,
    seed:         u64,
}

impl BackendTask for ReconstructTask<'_> {
    type Output = image::RgbImage;

    fn run<B: AutodiffBackend>(self, device: B::Device) -> Result<image::RgbImage> {
        <B::InnerBackend as Backend>::seed(self.seed);
        let inferencer = VaeInferencer::<B::InnerBackend>::from_checkpoint(self.ckpt_manager, device)?;
        let images     = inferencer.load_images(&self.paths)?;
        let recon      = if self.mean {
            inferencer.reconstruct_mean(images.clone())
        } else {
            inferencer.reconstruct(images.clone())
        };

        let pixels = tensor_pixels(Tensor::cat(vec![images, recon], 0))?;
        render_grid(&pixels, inferencer.config().image_size, self.paths.len())
    }
}

struct TraverseTask<'a> {
    ckpt_manager: &'a CheckpointManager,
    path:         PathBuf,
    dims:         usize,
    steps:        usize,
    range:        f32,
}

impl BackendTask for TraverseTask<'_> {
    type Output = image::RgbImage;

    fn run<B: AutodiffBackend>(self, device: B::Device) -> Result<image::RgbImage> {
        let inferencer = VaeInferencer::<B::InnerBackend>::from_checkpoint(self.ckpt_manager, device)?;
        let image      = inferencer.load_images(std::slice::from_ref(&self.path))?;
        let decoded    = inferencer.traverse(image, self.dims, self.steps, self.range)?;

        let pixels = tensor_pixels(decoded)?;
        render_grid(&pixels, inferencer.config().image_size, self.steps)
    }
}

fn tensor_pixels<B: Backend>(images: Tensor<B, 4>) -> Result<Vec<f32>> {
    images
        .into_data()
        .to_vec::<f32>()
        .map_err(|e| anyhow!("Cannot read image tensor: {e:?}"))
}
