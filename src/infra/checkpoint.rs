// ============================================================
// Layer 6 — Checkpoint Manager
// ============================================================
// Saves and restores model weights with Burn's file recorders.
//
// What gets saved:
//   1. Model weights (beta_vae.mpk.gz): written once, after the
//      final epoch, at full f32 precision so a reload reproduces
//      forward passes bit for bit
//   2. train_config.json: every hyperparameter, written before
//      training so inference can rebuild the same architecture
//
// File layout:
//   checkpoints/
//     beta_vae.mpk.gz     ← weights (MessagePack + gzip)
//     train_config.json   ← TrainConfig
//     metrics.csv         ← see metrics.rs

use std::{fs, path::{Path, PathBuf}};

use anyhow::{Context, Result};
use burn::{
    prelude::*,
    record::{FullPrecisionSettings, NamedMpkGzFileRecorder, Recorder},
};

use crate::application::train_use_case::TrainConfig;
use crate::ml::model::BetaVae;

type CheckpointRecorder = NamedMpkGzFileRecorder<FullPrecisionSettings>;

/// Fixed stem of the weights file; the recorder appends ".mpk.gz".
const MODEL_STEM:  &str = "beta_vae";
const CONFIG_FILE: &str = "train_config.json";

/// Manages saving and loading of the checkpoint directory.
#[derive(Debug, Clone)]
pub struct CheckpointManager {
    dir: PathBuf,
}

impl CheckpointManager {
    /// Create a new CheckpointManager, creating the directory if needed.
    pub fn new(dir: impl Into<PathBuf>) -> Result<Self> {
        let dir = dir.into();
        fs::create_dir_all(&dir)
            .with_context(|| format!("Cannot create checkpoint directory '{}'", dir.display()))?;
        Ok(Self { dir })
    }

    /// Open an existing checkpoint directory without creating it.
    pub fn open(dir: impl Into<PathBuf>) -> Result<Self> {
        let dir = dir.into();
        anyhow::ensure!(
            dir.is_dir(),
            "Checkpoint directory '{}' not found. Have you run 'train' first?",
            dir.display()
        );
        Ok(Self { dir })
    }

    pub fn dir(&self) -> &Path {
        &self.dir
    }

    /// Full path of the weights file as written by the recorder.
    pub fn model_file(&self) -> PathBuf {
        self.dir.join(format!("{MODEL_STEM}.mpk.gz"))
    }

    /// Save model weights and return the file written.
    pub fn save_model<B: Backend>(&self, model: &BetaVae<B>) -> Result<PathBuf> {
        let stem = self.dir.join(MODEL_STEM);

        CheckpointRecorder::new()
            .record(model.clone().into_record(), stem.clone())
            .with_context(|| format!("Failed to save checkpoint to '{}'", stem.display()))?;

        let file = self.model_file();
        tracing::debug!("Saved checkpoint '{}'", file.display());
        Ok(file)
    }

    /// Load saved weights into `model`, which must have the same architecture.
    pub fn load_model<B: Backend>(&self, model: BetaVae<B>, device: &B::Device) -> Result<BetaVae<B>> {
        let stem = self.dir.join(MODEL_STEM);

        let record = CheckpointRecorder::new()
            .load(stem.clone(), device)
            .with_context(|| {
                format!("Cannot load checkpoint '{}'. Have you trained the model first?",
                    self.model_file().display())
            })?;

        tracing::info!("Loaded checkpoint '{}'", self.model_file().display());
        Ok(model.load_record(record))
    }

    /// Save the training configuration to JSON.
    pub fn save_config(&self, cfg: &TrainConfig) -> Result<()> {
        let path = self.dir.join(CONFIG_FILE);
        let json = serde_json::to_string_pretty(cfg)?;

        fs::write(&path, json)
            .with_context(|| format!("Cannot write config to '{}'", path.display()))?;

        tracing::debug!("Saved training config to '{}'", path.display());
        Ok(())
    }

    /// Load the training configuration from JSON.
    pub fn load_config(&self) -> Result<TrainConfig> {
        let path = self.dir.join(CONFIG_FILE);

        let json = fs::read_to_string(&path)
            .with_context(|| {
                format!(
                    "Cannot read config from '{}'. \
                     Make sure you have run 'train' first.",
                    path.display()
                )
            })?;

        serde_json::from_str(&json)
            .with_context(|| format!("Malformed config '{}'", path.display()))
    }
}
