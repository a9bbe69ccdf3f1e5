// ============================================================
// Layer 2 — TrainUseCase
// ============================================================
// Orchestrates the full training pipeline in order:
//
//   Step 1: Validate the configuration
//   Step 2: Enumerate image files          (Layer 4 - data)
//   Step 3: Hold out the test split        (Layer 4 - data)
//   Step 4: Build datasets                 (Layer 4 - data)
//   Step 5: Save config next to weights    (Layer 6 - infra)
//   Step 6: Run training loop              (Layer 5 - ml)

use std::path::PathBuf;

use anyhow::{ensure, Result};
use serde::{Deserialize, Serialize};

use crate::data::{
    dataset::FaceDataset,
    loader::ImageFolder,
    preprocessor::FaceTransform,
    splitter::split_holdout,
};
use crate::domain::{
    settings::{ComputeDevice, NoiseDistribution, OptimizerKind},
    traits::ImageSource,
};
use crate::infra::{checkpoint::CheckpointManager, metrics::MetricsLogger};
use crate::ml::{
    model::{BetaVaeConfig, MIN_IMAGE_SIZE},
    trainer::{run_training, TrainReport},
};

// ─── Training Configuration ──────────────────────────────────────────────────
// All hyperparameters for a training run.
// Serialisable so it can be saved to disk and reloaded for inference.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TrainConfig {
    pub data_dir:       String,
    pub pattern:        String,
    pub checkpoint_dir: String,
    pub batch_size:     usize,
    pub test_size:      usize,
    pub latent_size:    usize,
    pub beta:           f64,
    pub epochs:         usize,
    pub lr:             f64,
    pub optimizer:      OptimizerKind,
    pub noise:          NoiseDistribution,
    pub device:         ComputeDevice,
    pub seed:           u64,
    pub num_workers:    usize,
    pub image_size:     usize,
    pub crop_size:      usize,
}

impl Default for TrainConfig {
    fn default() -> Self {
        Self {
            data_dir:       "data/img_align_celeba".to_string(),
            pattern:        "*.jpg".to_string(),
            checkpoint_dir: "checkpoints".to_string(),
            batch_size:     32,
            test_size:      16,
            latent_size:    10,
            beta:           3.0,
            epochs:         10,
            lr:             1e-3,
            optimizer:      OptimizerKind::Adam,
            noise:          NoiseDistribution::Normal,
            device:         ComputeDevice::Cpu,
            seed:           42,
            num_workers:    2,
            image_size:     64,
            crop_size:      178,
        }
    }
}

impl TrainConfig {
    /// Reject values the model or data loader cannot work with.
    pub fn validate(&self) -> Result<()> {
        ensure!(self.batch_size  > 0, "batch_size must be positive");
        ensure!(self.latent_size > 0, "latent_size must be positive");
        ensure!(self.crop_size   > 0, "crop_size must be positive");
        ensure!(
            self.image_size >= MIN_IMAGE_SIZE,
            "image_size must be at least {MIN_IMAGE_SIZE} (got {})",
            self.image_size
        );
        ensure!(self.beta >= 0.0 && self.beta.is_finite(), "beta must be a non-negative number");
        ensure!(self.lr > 0.0 && self.lr.is_finite(), "lr must be a positive number");
        Ok(())
    }

    /// Architecture described by this run.
    pub fn model_config(&self) -> BetaVaeConfig {
        BetaVaeConfig::new()
            .with_latent_size(self.latent_size)
            .with_image_size(self.image_size)
            .with_noise(self.noise)
    }

    /// Deterministic crop + resize used for every image.
    pub fn transform(&self) -> FaceTransform {
        FaceTransform::new(self.crop_size, self.image_size)
    }

    /// The image directory as configured.
    pub fn image_folder(&self) -> ImageFolder {
        ImageFolder::new(PathBuf::from(&self.data_dir), self.pattern.clone())
    }

    /// Enumerate images and split them into (train, test) paths.
    pub fn split_paths(&self) -> Result<(Vec<PathBuf>, Vec<PathBuf>)> {
        let folder = self.image_folder();
        tracing::debug!("Enumerating '{}' with '{}'", folder.dir().display(), self.pattern);
        let paths = folder.image_paths()?;
        Ok(split_holdout(paths, self.test_size))
    }
}

// ─── TrainUseCase ─────────────────────────────────────────────────────────────
pub struct TrainUseCase {
    config: TrainConfig,
}

impl TrainUseCase {
    pub fn new(config: TrainConfig) -> Self {
        Self { config }
    }

    /// Execute the full training pipeline end to end
    pub fn execute(&self) -> Result<TrainReport> {
        let cfg = &self.config;

        // ── Step 1: Validate ──────────────────────────────────────────────────
        cfg.validate()?;

        // ── Step 2 + 3: Enumerate and split ───────────────────────────────────
        tracing::info!("Loading images from '{}'", cfg.data_dir);
        let (train_paths, test_paths) = cfg.split_paths()?;
        ensure!(
            !train_paths.is_empty(),
            "No training images left in '{}' (pattern '{}', test_size {})",
            cfg.data_dir, cfg.pattern, cfg.test_size
        );

        // ── Step 4: Build Burn datasets ───────────────────────────────────────
        let train_dataset = FaceDataset::new(train_paths);
        let test_dataset  = FaceDataset::new(test_paths);
        tracing::info!(
            "Split: {} train, {} test",
            train_dataset.image_count(),
            test_dataset.image_count()
        );

        // ── Step 5: Save config for inference ─────────────────────────────────
        let ckpt_manager = CheckpointManager::new(&cfg.checkpoint_dir)?;
        ckpt_manager.save_config(cfg)?;
        let metrics = MetricsLogger::new(&cfg.checkpoint_dir)?;
        tracing::info!("Epoch metrics go to '{}'", metrics.csv_path().display());

        // ── Step 6: Run training loop (Layer 5) ───────────────────────────────
        run_training(cfg, train_dataset, test_dataset, &ckpt_manager, &metrics)
    }
}

// ─── Unit Tests ───────────────────────────────────────────────────────────────
#[cfg(test)]
mod tests {
    use super::*;
    use image::{Rgb, RgbImage};

    #[test]
    fn test_default_config_is_valid() {
        TrainConfig::default().validate().unwrap();
    }

    #[test]
    fn test_rejects_bad_values() {
        let tiny = TrainConfig { image_size: 8, ..TrainConfig::default() };
        assert!(tiny.validate().is_err());
        let no_batch = TrainConfig { batch_size: 0, ..TrainConfig::default() };
        assert!(no_batch.validate().is_err());
        let bad_beta = TrainConfig { beta: f64::NAN, ..TrainConfig::default() };
        assert!(bad_beta.validate().is_err());
    }

    #[test]
    fn test_split_paths_holds_out_tail() {
        let dir = tempfile::tempdir().unwrap();
        for i in 0..5 {
            std::fs::write(dir.path().join(format!("{i:03}.jpg")), b"x").unwrap();
        }
        let cfg = TrainConfig {
            data_dir:  dir.path().to_string_lossy().into_owned(),
            test_size: 2,
            ..TrainConfig::default()
        };
        let (train, test) = cfg.split_paths().unwrap();
        assert_eq!(train.len(), 3);
        assert!(test[0].ends_with("003.jpg"));
        assert!(test[1].ends_with("004.jpg"));
    }

    #[test]
    fn test_execute_fails_without_training_images() {
        let data = tempfile::tempdir().unwrap();
        let ckpt = tempfile::tempdir().unwrap();
        RgbImage::from_pixel(20, 20, Rgb([1, 2, 3])).save(data.path().join("only.png")).unwrap();

        let cfg = TrainConfig {
            data_dir:       data.path().to_string_lossy().into_owned(),
            pattern:        "*.png".to_string(),
            checkpoint_dir: ckpt.path().to_string_lossy().into_owned(),
            test_size:      4,
            ..TrainConfig::default()
        };
        assert!(TrainUseCase::new(cfg).execute().is_err());
    }

    #[test]
    fn test_execute_trains_and_writes_artifacts() {
        let data = tempfile::tempdir().unwrap();
        let ckpt = tempfile::tempdir().unwrap();
        for (i, shade) in [30u8, 120, 200].into_iter().enumerate() {
            RgbImage::from_pixel(24, 24, Rgb([shade, 255 - shade, shade / 2]))
                .save(data.path().join(format!("face_{i}.png")))
                .unwrap();
        }

        let cfg = TrainConfig {
            data_dir:       data.path().to_string_lossy().into_owned(),
            pattern:        "*.png".to_string(),
            checkpoint_dir: ckpt.path().to_string_lossy().into_owned(),
            batch_size:     2,
            test_size:      1,
            latent_size:    2,
            epochs:         1,
            num_workers:    0,
            image_size:     16,
            ..TrainConfig::default()
        };
        let report = TrainUseCase::new(cfg.clone()).execute().unwrap();

        assert_eq!(report.epochs.len(), 1);
        assert!(report.checkpoint.exists());
        assert!(ckpt.path().join("metrics.csv").exists());

        let saved = CheckpointManager::open(ckpt.path()).unwrap().load_config().unwrap();
        assert_eq!(saved, cfg);
    }
}
